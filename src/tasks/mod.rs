//! Background scheduled tasks for the application.
//!
//! Currently a single recurring job: the lottery auto-draw sweep. The same sweep is
//! also reachable through `POST /cron/auto-draw` for deployments that prefer an
//! external scheduler. Call `spawn_all` once during startup.

use crate::services::LotteryService;
use chrono::Utc;

/// Spawn all background tasks.
///
/// An interval of 0 disables the in-process sweep.
pub fn spawn_all(lottery_service: LotteryService, auto_draw_interval_secs: u64) {
    if auto_draw_interval_secs == 0 {
        log::info!("In-process auto draw disabled; relying on /cron/auto-draw");
        return;
    }

    // 到期抽奖自动开奖
    {
        let svc = lottery_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.auto_draw(Utc::now()).await {
                    Ok(summary) if summary.errors > 0 => {
                        log::warn!("Auto draw finished with {} errors", summary.errors)
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to run auto draw: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(auto_draw_interval_secs)).await;
            }
        });
    }
}
