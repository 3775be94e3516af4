use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 拼团成员实体，(campaign_id, user_id) 唯一
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "campaign_participants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub quantity: i64,
    pub contact: Option<String>,
    pub contacted: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 占用份数，历史数据中未设置或非法的数量按 1 计
    pub fn units(&self) -> i64 {
        self.quantity.max(1)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
