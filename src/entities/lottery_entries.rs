use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 抽奖参与记录，is_winner 只允许开奖流程修改
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "lottery_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub lottery_id: i64,
    pub user_id: i64,
    pub cost: i64,
    pub is_winner: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
