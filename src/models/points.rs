use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{PointKind, point_log_entity as point_logs};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointBalanceResponse {
    pub user_id: i64,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointLogResponse {
    pub id: i64,
    /// 带符号变动值
    pub amount: i64,
    pub kind: PointKind,
    pub reason: String,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

impl From<point_logs::Model> for PointLogResponse {
    fn from(m: point_logs::Model) -> Self {
        PointLogResponse {
            id: m.id,
            amount: m.amount,
            kind: m.kind,
            reason: m.reason,
            balance_after: m.balance_after,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 管理员手动调整积分
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdjustPointsRequest {
    /// 非负数量，方向由 kind 决定
    pub amount: i64,
    pub kind: PointKind,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckinResponse {
    pub checkin_date: NaiveDate,
    pub points_awarded: i64,
    pub balance: i64,
    pub streak: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckinStatusResponse {
    pub today: NaiveDate,
    pub checked_in_today: bool,
    /// 截至今天（或昨天）的连续签到天数
    pub streak: i64,
    pub reward_points: i64,
    pub recent_dates: Vec<NaiveDate>,
}
