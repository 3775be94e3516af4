use crate::entities::{
    LotteryStatus, PointKind, lottery_entity as lotteries, lottery_entry_entity as entries,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AutoDrawSummary, CreateLotteryRequest, DrawResponse, DrawResult, EnterLotteryResponse,
    LotteryDetailResponse, LotteryEntryResponse, LotteryResponse, PaginatedResponse,
    PaginationParams,
};
use crate::services::PointsService;
use crate::utils::{KeyedLock, pick_winners};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;

/// 参与人数不足时顺延的时长
pub const DRAW_EXTENSION_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawSkipReason {
    NotDue,
    AlreadyEnded,
}

impl std::fmt::Display for DrawSkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawSkipReason::NotDue => write!(f, "draw time has not been reached"),
            DrawSkipReason::AlreadyEnded => write!(f, "lottery has already been drawn"),
        }
    }
}

/// 一次开奖尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn {
        winners: Vec<i64>,
        winners_to_pick: i64,
        marked: i64,
    },
    /// 人数不足，开奖时间顺延
    Extended { new_draw_at: DateTime<Utc> },
    Skipped(DrawSkipReason),
}

impl DrawOutcome {
    pub fn into_response(self, lottery_id: i64) -> DrawResponse {
        let mut response = DrawResponse {
            lottery_id,
            result: DrawResult::Skipped,
            winners: Vec::new(),
            winners_to_pick: 0,
            marked: 0,
            new_draw_at: None,
            skip_reason: None,
        };
        match self {
            DrawOutcome::Drawn {
                winners,
                winners_to_pick,
                marked,
            } => {
                response.result = DrawResult::Drawn;
                response.winners = winners;
                response.winners_to_pick = winners_to_pick;
                response.marked = marked;
            }
            DrawOutcome::Extended { new_draw_at } => {
                response.result = DrawResult::Extended;
                response.new_draw_at = Some(new_draw_at);
            }
            DrawOutcome::Skipped(reason) => {
                response.skip_reason = Some(reason.to_string());
            }
        }
        response
    }
}

/// 积分抽奖
///
/// 开奖按抽奖 ID 串行执行：同一期的两次并发开奖只有一次会抽取中奖者。
#[derive(Clone)]
pub struct LotteryService {
    pool: DatabaseConnection,
    draw_locks: KeyedLock<i64>,
}

impl LotteryService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool,
            draw_locks: KeyedLock::new(),
        }
    }

    pub async fn create_lottery(&self, req: CreateLotteryRequest) -> AppResult<LotteryResponse> {
        let title = req.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::ValidationError("Title is required".into()));
        }
        if req.winners_count < 1 {
            return Err(AppError::ValidationError(
                "winners_count must be at least 1".into(),
            ));
        }
        if req.entry_cost < 0 {
            return Err(AppError::ValidationError(
                "entry_cost must not be negative".into(),
            ));
        }
        if let Some(min) = req.min_participants
            && min < 0
        {
            return Err(AppError::ValidationError(
                "min_participants must not be negative".into(),
            ));
        }

        let now = Utc::now();
        let model = lotteries::ActiveModel {
            title: Set(title),
            description: Set(req.description),
            prizes: Set(req.prizes.map(|p| json!(p))),
            draw_at: Set(req.draw_at),
            winners_count: Set(req.winners_count),
            entry_cost: Set(req.entry_cost),
            min_participants: Set(req.min_participants),
            participant_count: Set(0),
            status: Set(LotteryStatus::Pending),
            drawn_at: Set(None),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Lottery {} created, draws at {}", model.id, model.draw_at);
        Ok(model.into())
    }

    pub async fn list_lotteries(
        &self,
        params: &PaginationParams,
        status: Option<LotteryStatus>,
    ) -> AppResult<PaginatedResponse<LotteryResponse>> {
        let mut base_query = lotteries::Entity::find();
        if let Some(status) = status {
            base_query = base_query.filter(lotteries::Column::Status.eq(status));
        }

        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_desc(lotteries::Column::DrawAt)
            .order_by_desc(lotteries::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(LotteryResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }

    /// 抽奖详情；user_id 为当前用户时附带其参与记录
    pub async fn get_lottery(
        &self,
        lottery_id: i64,
        user_id: Option<i64>,
    ) -> AppResult<LotteryDetailResponse> {
        let lottery = self.find_lottery(lottery_id).await?;

        let my_entry = match user_id {
            Some(uid) => entries::Entity::find()
                .filter(entries::Column::LotteryId.eq(lottery_id))
                .filter(entries::Column::UserId.eq(uid))
                .one(&self.pool)
                .await?
                .map(LotteryEntryResponse::from),
            None => None,
        };

        let winners = if lottery.status == LotteryStatus::Ended {
            entries::Entity::find()
                .select_only()
                .column(entries::Column::UserId)
                .filter(entries::Column::LotteryId.eq(lottery_id))
                .filter(entries::Column::IsWinner.eq(true))
                .order_by_asc(entries::Column::Id)
                .into_tuple::<i64>()
                .all(&self.pool)
                .await?
        } else {
            Vec::new()
        };

        Ok(LotteryDetailResponse {
            lottery: lottery.into(),
            my_entry,
            winners,
        })
    }

    pub async fn list_entries(
        &self,
        lottery_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<LotteryEntryResponse>> {
        self.find_lottery(lottery_id).await?;

        let base_query = entries::Entity::find().filter(entries::Column::LotteryId.eq(lottery_id));
        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_asc(entries::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(LotteryEntryResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }

    /// 参与抽奖：写入参与记录、扣除积分、更新人数在同一事务中完成
    pub async fn enter(
        &self,
        lottery_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<EnterLotteryResponse> {
        let txn = self.pool.begin().await?;

        let lottery = lotteries::Entity::find_by_id(lottery_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Lottery not found".into()))?;
        if lottery.status == LotteryStatus::Ended {
            return Err(AppError::ValidationError("Lottery has already been drawn".into()));
        }
        if lottery.is_due(now) {
            return Err(AppError::ValidationError(
                "Lottery is closed for new entries".into(),
            ));
        }

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if user.points < lottery.entry_cost {
            return Err(AppError::InsufficientPoints {
                required: lottery.entry_cost,
                available: user.points,
            });
        }

        let inserted = entries::Entity::insert(entries::ActiveModel {
            lottery_id: Set(lottery_id),
            user_id: Set(user_id),
            cost: Set(lottery.entry_cost),
            is_winner: Set(false),
            created_at: Set(Some(now)),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([entries::Column::LotteryId, entries::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        if inserted == 0 {
            return Err(AppError::ValidationError(
                "Already entered this lottery".into(),
            ));
        }

        let balance = if lottery.entry_cost > 0 {
            PointsService::apply_delta_in(
                &txn,
                user_id,
                lottery.entry_cost,
                &format!("lottery entry: {}", lottery.title),
                PointKind::Spend,
            )
            .await?
        } else {
            user.points
        };

        lotteries::Entity::update_many()
            .col_expr(
                lotteries::Column::ParticipantCount,
                Expr::col(lotteries::Column::ParticipantCount).add(1),
            )
            .col_expr(lotteries::Column::UpdatedAt, Expr::value(now))
            .filter(lotteries::Column::Id.eq(lottery_id))
            .exec(&txn)
            .await?;

        let entry = entries::Entity::find()
            .filter(entries::Column::LotteryId.eq(lottery_id))
            .filter(entries::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::InternalError("Lottery entry vanished".into()))?;
        txn.commit().await?;

        log::info!("User {user_id} entered lottery {lottery_id} (cost {})", lottery.entry_cost);
        Ok(EnterLotteryResponse {
            entry: entry.into(),
            balance,
        })
    }

    pub async fn attempt_draw(&self, lottery_id: i64, now: DateTime<Utc>) -> AppResult<DrawOutcome> {
        let mut rng = StdRng::from_entropy();
        self.attempt_draw_with_rng(lottery_id, now, &mut rng).await
    }

    /// 开奖
    ///
    /// - 已开奖或未到时间：跳过
    /// - 参与人数少于 min_participants：开奖时间顺延 24 小时，状态不变
    /// - 否则用 Fisher-Yates 洗牌抽取 min(winners_count, 参与人数) 名中奖者，
    ///   逐条标记后把状态置为 ended；需要标记却一条都没写入时返回 ConsistencyFault
    pub async fn attempt_draw_with_rng<R: Rng + Send>(
        &self,
        lottery_id: i64,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> AppResult<DrawOutcome> {
        let _guard = self.draw_locks.lock(lottery_id).await;

        let lottery = self.find_lottery(lottery_id).await?;
        if lottery.status == LotteryStatus::Ended {
            return Ok(DrawOutcome::Skipped(DrawSkipReason::AlreadyEnded));
        }
        if !lottery.is_due(now) {
            return Ok(DrawOutcome::Skipped(DrawSkipReason::NotDue));
        }

        let entry_count = entries::Entity::find()
            .filter(entries::Column::LotteryId.eq(lottery_id))
            .count(&self.pool)
            .await? as i64;

        if entry_count < lottery.min_required() {
            let new_draw_at = now + Duration::hours(DRAW_EXTENSION_HOURS);
            lotteries::Entity::update_many()
                .col_expr(lotteries::Column::DrawAt, Expr::value(new_draw_at))
                .col_expr(lotteries::Column::UpdatedAt, Expr::value(now))
                .filter(lotteries::Column::Id.eq(lottery_id))
                .filter(lotteries::Column::Status.eq(LotteryStatus::Pending))
                .exec(&self.pool)
                .await?;
            log::info!(
                "Lottery {} has {}/{} participants, draw postponed to {}",
                lottery_id,
                entry_count,
                lottery.min_required(),
                new_draw_at
            );
            return Ok(DrawOutcome::Extended { new_draw_at });
        }

        let user_ids: Vec<i64> = entries::Entity::find()
            .select_only()
            .column(entries::Column::UserId)
            .filter(entries::Column::LotteryId.eq(lottery_id))
            .order_by_asc(entries::Column::Id)
            .into_tuple::<i64>()
            .all(&self.pool)
            .await?;

        let winners_to_pick = lottery.winners_count.min(user_ids.len() as i64).max(0);
        let winners = pick_winners(user_ids, winners_to_pick as usize, rng);

        let mut marked = 0i64;
        for user_id in &winners {
            let result = entries::Entity::update_many()
                .col_expr(entries::Column::IsWinner, Expr::value(true))
                .filter(entries::Column::LotteryId.eq(lottery_id))
                .filter(entries::Column::UserId.eq(*user_id))
                .exec(&self.pool)
                .await;
            match result {
                Ok(r) if r.rows_affected > 0 => marked += 1,
                Ok(_) => log::warn!("Winner entry of user {user_id} in lottery {lottery_id} was not updated"),
                Err(e) => log::error!("Failed to mark winner {user_id} in lottery {lottery_id}: {e}"),
            }
        }

        lotteries::Entity::update_many()
            .col_expr(lotteries::Column::Status, Expr::value(LotteryStatus::Ended))
            .col_expr(lotteries::Column::DrawnAt, Expr::value(now))
            .col_expr(lotteries::Column::UpdatedAt, Expr::value(now))
            .filter(lotteries::Column::Id.eq(lottery_id))
            .exec(&self.pool)
            .await?;

        if winners_to_pick > 0 && marked == 0 {
            return Err(AppError::ConsistencyFault(format!(
                "lottery {lottery_id}: none of {winners_to_pick} winner updates were applied"
            )));
        }

        log::info!(
            "Lottery {} drawn: {}/{} winners marked",
            lottery_id,
            marked,
            winners_to_pick
        );
        Ok(DrawOutcome::Drawn {
            winners,
            winners_to_pick,
            marked,
        })
    }

    /// 扫描所有到期未开奖的抽奖并逐个开奖，单个失败不影响其它
    pub async fn auto_draw(&self, now: DateTime<Utc>) -> AppResult<AutoDrawSummary> {
        let due_ids: Vec<i64> = lotteries::Entity::find()
            .select_only()
            .column(lotteries::Column::Id)
            .filter(lotteries::Column::Status.eq(LotteryStatus::Pending))
            .filter(lotteries::Column::DrawAt.lte(now))
            .order_by_asc(lotteries::Column::DrawAt)
            .into_tuple::<i64>()
            .all(&self.pool)
            .await?;

        let mut summary = AutoDrawSummary {
            checked: due_ids.len(),
            ..Default::default()
        };
        for id in due_ids {
            match self.attempt_draw(id, now).await {
                Ok(DrawOutcome::Drawn { .. }) => summary.drawn += 1,
                Ok(DrawOutcome::Extended { .. }) => summary.extended += 1,
                Ok(DrawOutcome::Skipped(_)) => summary.skipped += 1,
                Err(e) => {
                    log::error!("Auto draw of lottery {id} failed: {e}");
                    if matches!(e, AppError::ConsistencyFault(_)) {
                        summary.consistency_faults += 1;
                    }
                    summary.errors += 1;
                }
            }
        }

        if summary.checked > 0 {
            log::info!(
                "Auto draw: checked {}, drawn {}, extended {}, skipped {}, errors {}",
                summary.checked,
                summary.drawn,
                summary.extended,
                summary.skipped,
                summary.errors
            );
        }
        Ok(summary)
    }

    async fn find_lottery(&self, lottery_id: i64) -> AppResult<lotteries::Model> {
        lotteries::Entity::find_by_id(lottery_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Lottery not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_user, setup_db};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap()
    }

    fn lottery_req(
        draw_at: DateTime<Utc>,
        winners: i64,
        cost: i64,
        min: Option<i64>,
    ) -> CreateLotteryRequest {
        CreateLotteryRequest {
            title: "Weekly draw".into(),
            description: None,
            prizes: Some(vec!["Gift card".into()]),
            draw_at,
            winners_count: winners,
            entry_cost: cost,
            min_participants: min,
        }
    }

    async fn funded_user(db: &DatabaseConnection, name: &str, points: i64) -> i64 {
        let user = create_user(db, name).await;
        if points > 0 {
            PointsService::new(db.clone())
                .apply_delta(user.id, points, "seed", PointKind::Earn)
                .await
                .unwrap();
        }
        user.id
    }

    #[tokio::test]
    async fn test_enter_spends_points_once() {
        let db = setup_db().await;
        let svc = LotteryService::new(db.clone());
        let lottery = svc.create_lottery(lottery_req(at(12), 1, 30, None)).await.unwrap();
        let user = funded_user(&db, "a", 100).await;

        let entered = svc.enter(lottery.id, user, at(9)).await.unwrap();
        assert_eq!(entered.balance, 70);
        assert_eq!(entered.entry.cost, 30);

        let err = svc.enter(lottery.id, user, at(9)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let detail = svc.get_lottery(lottery.id, Some(user)).await.unwrap();
        assert_eq!(detail.lottery.participant_count, 1);
        assert!(detail.my_entry.is_some());

        let balance = PointsService::new(db.clone()).balance(user).await.unwrap();
        assert_eq!(balance.points, 70);

        // 到达开奖时间后不再接受参与
        let late = funded_user(&db, "b", 100).await;
        let err = svc.enter(lottery.id, late, at(12)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_enter_without_enough_points() {
        let db = setup_db().await;
        let svc = LotteryService::new(db.clone());
        let lottery = svc.create_lottery(lottery_req(at(12), 1, 30, None)).await.unwrap();
        let user = funded_user(&db, "poor", 10).await;

        let err = svc.enter(lottery.id, user, at(9)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientPoints {
                required: 30,
                available: 10
            }
        ));
        let entries = svc
            .list_entries(lottery.id, &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(entries.total, 0);
    }

    #[tokio::test]
    async fn test_draw_extends_when_under_subscribed() {
        let db = setup_db().await;
        let svc = LotteryService::new(db.clone());
        let lottery = svc.create_lottery(lottery_req(at(12), 1, 0, Some(3))).await.unwrap();
        for name in ["a", "b"] {
            let uid = funded_user(&db, name, 0).await;
            svc.enter(lottery.id, uid, at(9)).await.unwrap();
        }

        let outcome = svc.attempt_draw(lottery.id, at(13)).await.unwrap();
        assert_eq!(
            outcome,
            DrawOutcome::Extended {
                new_draw_at: at(13) + Duration::hours(24)
            }
        );

        let detail = svc.get_lottery(lottery.id, None).await.unwrap();
        assert_eq!(detail.lottery.status, LotteryStatus::Pending);
        assert_eq!(detail.lottery.draw_at, at(13) + Duration::hours(24));
        assert!(detail.winners.is_empty());
    }

    #[tokio::test]
    async fn test_draw_marks_every_entry_when_winners_exceed_entries() {
        let db = setup_db().await;
        let svc = LotteryService::new(db.clone());
        let lottery = svc.create_lottery(lottery_req(at(12), 10, 0, None)).await.unwrap();
        let mut ids = Vec::new();
        for name in ["a", "b", "c", "d"] {
            let uid = funded_user(&db, name, 0).await;
            svc.enter(lottery.id, uid, at(9)).await.unwrap();
            ids.push(uid);
        }

        let mut rng = StdRng::seed_from_u64(7);
        let outcome = svc
            .attempt_draw_with_rng(lottery.id, at(12), &mut rng)
            .await
            .unwrap();
        let DrawOutcome::Drawn {
            mut winners,
            winners_to_pick,
            marked,
        } = outcome
        else {
            panic!("expected a draw, got {outcome:?}");
        };
        assert_eq!(winners_to_pick, 4);
        assert_eq!(marked, 4);
        winners.sort();
        assert_eq!(winners, ids);

        let detail = svc.get_lottery(lottery.id, None).await.unwrap();
        assert_eq!(detail.lottery.status, LotteryStatus::Ended);
        assert_eq!(detail.lottery.drawn_at, Some(at(12)));
        assert_eq!(detail.winners.len(), 4);
    }

    #[tokio::test]
    async fn test_draw_picks_distinct_winners() {
        let db = setup_db().await;
        let svc = LotteryService::new(db.clone());
        let lottery = svc.create_lottery(lottery_req(at(12), 2, 0, None)).await.unwrap();
        for i in 0..6 {
            let uid = funded_user(&db, &format!("u{i}"), 0).await;
            svc.enter(lottery.id, uid, at(9)).await.unwrap();
        }

        let outcome = svc.attempt_draw(lottery.id, at(12)).await.unwrap();
        let DrawOutcome::Drawn { winners, marked, .. } = outcome else {
            panic!("expected a draw");
        };
        assert_eq!(marked, 2);
        assert_ne!(winners[0], winners[1]);

        // 再次开奖不会重新抽取
        let again = svc.attempt_draw(lottery.id, at(14)).await.unwrap();
        assert_eq!(again, DrawOutcome::Skipped(DrawSkipReason::AlreadyEnded));
        let detail = svc.get_lottery(lottery.id, None).await.unwrap();
        let mut stored = detail.winners.clone();
        let mut expected = winners.clone();
        stored.sort();
        expected.sort();
        assert_eq!(stored, expected);
    }

    #[tokio::test]
    async fn test_draw_not_due_and_zero_minimum() {
        let db = setup_db().await;
        let svc = LotteryService::new(db.clone());
        let lottery = svc.create_lottery(lottery_req(at(12), 1, 0, Some(0))).await.unwrap();

        let outcome = svc.attempt_draw(lottery.id, at(11)).await.unwrap();
        assert_eq!(outcome, DrawOutcome::Skipped(DrawSkipReason::NotDue));

        // 最少人数为 0 时没有参与者也会直接结束
        let outcome = svc.attempt_draw(lottery.id, at(12)).await.unwrap();
        assert_eq!(
            outcome,
            DrawOutcome::Drawn {
                winners: vec![],
                winners_to_pick: 0,
                marked: 0
            }
        );

        let late = funded_user(&db, "late", 0).await;
        let err = svc.enter(lottery.id, late, at(9)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_auto_draw_summary() {
        let db = setup_db().await;
        let svc = LotteryService::new(db.clone());
        let ready = svc.create_lottery(lottery_req(at(10), 1, 0, None)).await.unwrap();
        svc.create_lottery(lottery_req(at(11), 1, 0, Some(2))).await.unwrap();
        svc.create_lottery(lottery_req(at(20), 1, 0, None)).await.unwrap();
        let uid = funded_user(&db, "a", 0).await;
        svc.enter(ready.id, uid, at(9)).await.unwrap();

        let summary = svc.auto_draw(at(12)).await.unwrap();
        assert_eq!(
            summary,
            AutoDrawSummary {
                checked: 2,
                drawn: 1,
                extended: 1,
                skipped: 0,
                errors: 0,
                consistency_faults: 0,
            }
        );

        // 顺延后的那期不在下一轮扫描范围内
        let summary = svc.auto_draw(at(12)).await.unwrap();
        assert_eq!(summary.checked, 0);
    }

    #[tokio::test]
    async fn test_unmarked_winners_report_consistency_fault() {
        use sea_orm::ConnectionTrait;

        let db = setup_db().await;
        let svc = LotteryService::new(db.clone());
        let manual = svc.create_lottery(lottery_req(at(10), 1, 0, None)).await.unwrap();
        let swept = svc.create_lottery(lottery_req(at(11), 1, 0, None)).await.unwrap();
        let uid = funded_user(&db, "a", 0).await;
        svc.enter(manual.id, uid, at(9)).await.unwrap();
        svc.enter(swept.id, uid, at(9)).await.unwrap();

        // 让中奖标记的 UPDATE 静默失效
        db.execute_unprepared(
            "CREATE TRIGGER ignore_entry_updates BEFORE UPDATE ON lottery_entries \
             BEGIN SELECT RAISE(IGNORE); END;",
        )
        .await
        .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let err = svc
            .attempt_draw_with_rng(manual.id, at(12), &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConsistencyFault(_)));
        let detail = svc.get_lottery(manual.id, None).await.unwrap();
        assert_eq!(detail.lottery.status, LotteryStatus::Ended);

        let summary = svc.auto_draw(at(12)).await.unwrap();
        assert_eq!(summary.checked, 1);
        assert_eq!(summary.drawn, 0);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.consistency_faults, 1);

        // 已经 ended，再次开奖是空操作
        let outcome = svc.attempt_draw(swept.id, at(13)).await.unwrap();
        assert!(matches!(outcome, DrawOutcome::Skipped(DrawSkipReason::AlreadyEnded)));
    }

    #[test]
    fn test_draw_outcome_response() {
        let response = DrawOutcome::Extended {
            new_draw_at: at(12),
        }
        .into_response(9);
        assert_eq!(response.result, DrawResult::Extended);
        assert_eq!(response.new_draw_at, Some(at(12)));

        let response = DrawOutcome::Skipped(DrawSkipReason::NotDue).into_response(9);
        assert_eq!(response.result, DrawResult::Skipped);
        assert!(response.skip_reason.is_some());
    }
}
