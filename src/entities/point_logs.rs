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
pub enum PointKind {
    #[sea_orm(string_value = "earn")]
    Earn,
    #[sea_orm(string_value = "spend")]
    Spend,
}

impl PointKind {
    /// 把非负的数量转换成带符号的变动值
    pub fn signed(self, amount: i64) -> i64 {
        match self {
            PointKind::Earn => amount,
            PointKind::Spend => -amount,
        }
    }
}

impl std::fmt::Display for PointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointKind::Earn => write!(f, "earn"),
            PointKind::Spend => write!(f, "spend"),
        }
    }
}

/// 积分流水实体（只追加）
/// - amount: 带符号变动值，所有流水之和等于 users.points
/// - balance_after: 本次变动后的余额快照
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "point_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub kind: PointKind,
    pub reason: String,
    pub balance_after: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
