use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 拼团状态
/// - 数据库只保存人工覆盖值 (open / ended)
/// - locked 只由人数推导得出
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "locked")]
    Locked,
    #[sea_orm(string_value = "ended")]
    Ended,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Open => write!(f, "open"),
            CampaignStatus::Locked => write!(f, "locked"),
            CampaignStatus::Ended => write!(f, "ended"),
        }
    }
}

/// 根据人工覆盖值与已报名数量推导有效状态（纯函数）
pub fn derive_status(
    manual: Option<CampaignStatus>,
    enrolled_quantity: i64,
    target_count: i64,
) -> CampaignStatus {
    if manual == Some(CampaignStatus::Ended) {
        return CampaignStatus::Ended;
    }
    if enrolled_quantity >= target_count {
        CampaignStatus::Locked
    } else {
        CampaignStatus::Open
    }
}

/// 拼团活动实体
/// 说明:
/// - enrolled_quantity: 所有成员 quantity 之和的缓存，只能通过带上限的原子更新修改
/// - title 可能带有系列后缀 " #<n>"，续期时据此编号
/// - parent_id: 续期来源活动
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub features: Option<Json>,
    pub price: f64,
    pub target_count: i64,
    pub enrolled_quantity: i64,
    pub status: Option<CampaignStatus>,
    pub auto_renew: bool,
    pub is_hot: bool,
    pub image_url: Option<String>,
    pub parent_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn effective_status(&self) -> CampaignStatus {
        derive_status(self.status, self.enrolled_quantity, self.target_count)
    }

    pub fn is_ended(&self) -> bool {
        self.status == Some(CampaignStatus::Ended)
    }

    /// 是否已满员（不考虑是否结算）
    pub fn is_full(&self) -> bool {
        self.enrolled_quantity >= self.target_count
    }

    /// 剩余名额，满员或超额时为 0
    pub fn remaining(&self) -> i64 {
        (self.target_count - self.enrolled_quantity).max(0)
    }

    pub fn feature_list(&self) -> Vec<String> {
        self.features
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_status_by_quantity() {
        assert_eq!(derive_status(None, 5, 5), CampaignStatus::Locked);
        assert_eq!(derive_status(None, 3, 5), CampaignStatus::Open);
        assert_eq!(derive_status(None, 0, 5), CampaignStatus::Open);
    }

    #[test]
    fn test_derive_status_manual_override() {
        assert_eq!(
            derive_status(Some(CampaignStatus::Ended), 0, 5),
            CampaignStatus::Ended
        );
        assert_eq!(
            derive_status(Some(CampaignStatus::Ended), 5, 5),
            CampaignStatus::Ended
        );
        // open 覆盖值不会阻止满员推导为 locked
        assert_eq!(
            derive_status(Some(CampaignStatus::Open), 5, 5),
            CampaignStatus::Locked
        );
    }
}
