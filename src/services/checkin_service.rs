use crate::entities::{PointKind, checkin_entity as checkins, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{CheckinResponse, CheckinStatusResponse};
use crate::services::PointsService;
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};

/// 统计连续签到时展示的最近天数
const RECENT_DAYS: i64 = 30;

#[derive(Clone)]
pub struct CheckinService {
    pool: DatabaseConnection,
    reward_points: i64,
}

impl CheckinService {
    pub fn new(pool: DatabaseConnection, reward_points: i64) -> Self {
        Self {
            pool,
            reward_points: reward_points.max(0),
        }
    }

    /// 每日签到：同一天重复签到返回 ValidationError，不会重复发放
    pub async fn check_in(&self, user_id: i64, today: NaiveDate) -> AppResult<CheckinResponse> {
        let txn = self.pool.begin().await?;

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        // 插入签到标记，若已存在则不影响（DO NOTHING）
        let insert = Query::insert()
            .into_table(checkins::Entity)
            .columns([
                checkins::Column::UserId,
                checkins::Column::CheckinDate,
                checkins::Column::Points,
                checkins::Column::CreatedAt,
            ])
            .values_panic([
                user_id.into(),
                today.into(),
                self.reward_points.into(),
                Utc::now().into(),
            ])
            .on_conflict(
                OnConflict::columns([checkins::Column::UserId, checkins::Column::CheckinDate])
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();
        let backend = txn.get_database_backend();
        let res = txn.execute(backend.build(&insert)).await?;
        if res.rows_affected() == 0 {
            return Err(AppError::ValidationError("Already checked in today".into()));
        }

        let balance = if self.reward_points > 0 {
            PointsService::apply_delta_in(
                &txn,
                user_id,
                self.reward_points,
                "daily check-in",
                PointKind::Earn,
            )
            .await?
        } else {
            user.points
        };
        txn.commit().await?;

        let dates = self.recent_dates(user_id, today).await?;
        log::info!("User {user_id} checked in on {today}, +{}", self.reward_points);

        Ok(CheckinResponse {
            checkin_date: today,
            points_awarded: self.reward_points,
            balance,
            streak: consecutive_streak(&dates, today),
        })
    }

    pub async fn status(&self, user_id: i64, today: NaiveDate) -> AppResult<CheckinStatusResponse> {
        let dates = self.recent_dates(user_id, today).await?;
        Ok(CheckinStatusResponse {
            today,
            checked_in_today: dates.first() == Some(&today),
            streak: consecutive_streak(&dates, today),
            reward_points: self.reward_points,
            recent_dates: dates,
        })
    }

    /// 最近的签到日期，倒序
    async fn recent_dates(&self, user_id: i64, today: NaiveDate) -> AppResult<Vec<NaiveDate>> {
        let since = today - Duration::days(RECENT_DAYS);
        let dates = checkins::Entity::find()
            .select_only()
            .column(checkins::Column::CheckinDate)
            .filter(checkins::Column::UserId.eq(user_id))
            .filter(checkins::Column::CheckinDate.gt(since))
            .filter(checkins::Column::CheckinDate.lte(today))
            .order_by_desc(checkins::Column::CheckinDate)
            .into_tuple::<NaiveDate>()
            .all(&self.pool)
            .await?;
        Ok(dates)
    }
}

/// 连续签到天数：从今天（今天未签到则从昨天）往前数
pub fn consecutive_streak(dates_desc: &[NaiveDate], today: NaiveDate) -> i64 {
    let mut expected = match dates_desc.first() {
        Some(d) if *d == today => today,
        Some(d) if *d == today - Duration::days(1) => *d,
        _ => return 0,
    };
    let mut streak = 0;
    for d in dates_desc {
        if *d != expected {
            break;
        }
        streak += 1;
        expected -= Duration::days(1);
    }
    streak
}
