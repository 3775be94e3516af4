use crate::config::CronConfig;
use crate::error::AppError;
use crate::services::LotteryService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

pub const CRON_SECRET_HEADER: &str = "X-Cron-Secret";

/// 配置了密钥时校验请求头
fn authorize(config: &CronConfig, req: &HttpRequest) -> Result<(), AppError> {
    let Some(expected) = config.secret.as_deref() else {
        return Ok(());
    };
    let provided = req
        .headers()
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(AppError::AuthError("Invalid cron secret".to_string()))
    }
}

/// 外部定时器入口：对所有到期的抽奖执行开奖
pub async fn auto_draw(
    service: web::Data<LotteryService>,
    config: web::Data<CronConfig>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = authorize(&config, &req) {
        return Ok(e.error_response());
    }
    match service.auto_draw(Utc::now()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": summary }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn cron_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/cron").route("/auto-draw", web::post().to(auto_draw)));
}
