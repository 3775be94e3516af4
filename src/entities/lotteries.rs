use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum LotteryStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "ended")]
    Ended,
}

/// 积分抽奖实体
/// 说明:
/// - participant_count 只是展示用缓存，开奖时以 lottery_entries 实际条数为准
/// - min_participants 为 NULL 时按 1 处理
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "lotteries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub prizes: Option<Json>,
    pub draw_at: DateTime<Utc>,
    pub winners_count: i64,
    pub entry_cost: i64,
    pub min_participants: Option<i64>,
    pub participant_count: i64,
    pub status: LotteryStatus,
    pub drawn_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn min_required(&self) -> i64 {
        self.min_participants.unwrap_or(1)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.draw_at
    }

    pub fn prize_list(&self) -> Vec<String> {
        self.prizes
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
