use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    CampaignStatus, campaign_entity as campaigns, participant_entity as participants,
};

/// 创建拼团活动请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCampaignRequest {
    pub title: String,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    /// 单价，结算时按 floor(数量 × 单价) 发放积分
    pub price: f64,
    /// 成团所需份数
    pub target_count: i64,
    pub auto_renew: Option<bool>,
    pub is_hot: Option<bool>,
    pub image_url: Option<String>,
}

/// 修改拼团活动请求（只修改提供的字段）
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub price: Option<f64>,
    pub target_count: Option<i64>,
    pub auto_renew: Option<bool>,
    pub is_hot: Option<bool>,
    pub image_url: Option<String>,
}

/// 拼团活动响应，status 为推导后的有效状态
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub price: f64,
    pub target_count: i64,
    pub enrolled_quantity: i64,
    pub remaining: i64,
    pub status: CampaignStatus,
    pub auto_renew: bool,
    pub is_hot: bool,
    pub image_url: Option<String>,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<campaigns::Model> for CampaignResponse {
    fn from(m: campaigns::Model) -> Self {
        CampaignResponse {
            status: m.effective_status(),
            remaining: m.remaining(),
            features: m.feature_list(),
            id: m.id,
            title: m.title,
            description: m.description,
            price: m.price,
            target_count: m.target_count,
            enrolled_quantity: m.enrolled_quantity,
            auto_renew: m.auto_renew,
            is_hot: m.is_hot,
            image_url: m.image_url,
            parent_id: m.parent_id,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 参团请求
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct JoinCampaignRequest {
    /// 份数 (默认 1)
    pub quantity: Option<i64>,
    /// 联系方式
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantResponse {
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub quantity: i64,
    pub contact: Option<String>,
    pub contacted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<participants::Model> for ParticipantResponse {
    fn from(m: participants::Model) -> Self {
        ParticipantResponse {
            quantity: m.units(),
            id: m.id,
            campaign_id: m.campaign_id,
            user_id: m.user_id,
            contact: m.contact,
            contacted: m.contacted,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 参团结果；满员触发自动续期时附带新开的下一期
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JoinCampaignResponse {
    pub participant: ParticipantResponse,
    pub campaign: CampaignResponse,
    pub successor: Option<CampaignResponse>,
}

/// 用户修改自己的联系方式
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateContactRequest {
    pub contact: String,
}

/// 管理员修改成员（数量 / 联系方式 / 是否已联系）
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateParticipantRequest {
    pub quantity: Option<i64>,
    pub contact: Option<String>,
    pub contacted: Option<bool>,
}

/// 把成员从当前活动移到另一个活动
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MoveParticipantRequest {
    pub user_id: i64,
    pub to_campaign_id: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MoveParticipantResponse {
    pub participant: ParticipantResponse,
    /// 目标活动中已有该用户时合并数量
    pub merged: bool,
    pub from: CampaignResponse,
    pub to: CampaignResponse,
    pub successor: Option<CampaignResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpdateParticipantResponse {
    pub participant: ParticipantResponse,
    pub campaign: CampaignResponse,
    pub successor: Option<CampaignResponse>,
}

/// 修改活动状态，目前只接受 ended（结算）
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateCampaignStatusRequest {
    pub status: CampaignStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Paid,
    /// 积分为 0，无需发放
    Skipped,
    Failed,
}

/// 单个成员的结算发放结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayoutOutcome {
    pub user_id: i64,
    pub quantity: i64,
    pub points: i64,
    pub status: PayoutStatus,
    pub balance_after: Option<i64>,
    pub error: Option<String>,
}

/// 结算报告：逐个成员记录发放结果，单个失败不影响其它成员
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettlementReport {
    pub campaign: CampaignResponse,
    /// 之前已经结算过，本次没有发放
    pub already_settled: bool,
    pub payouts: Vec<PayoutOutcome>,
    pub paid: usize,
    pub failed: usize,
    pub successor: Option<CampaignResponse>,
}

impl SettlementReport {
    pub fn new(
        campaign: CampaignResponse,
        already_settled: bool,
        payouts: Vec<PayoutOutcome>,
    ) -> Self {
        let paid = payouts
            .iter()
            .filter(|p| p.status == PayoutStatus::Paid)
            .count();
        let failed = payouts
            .iter()
            .filter(|p| p.status == PayoutStatus::Failed)
            .count();
        Self {
            campaign,
            already_settled,
            payouts,
            paid,
            failed,
            successor: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RenewBlockCode {
    AutoRenewDisabled,
    NotFull,
    UnfilledSibling,
}

/// 续期结果（API 形状）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewResponse {
    pub renewed: bool,
    pub campaign: Option<CampaignResponse>,
    pub blocked_code: Option<RenewBlockCode>,
    pub blocked_reason: Option<String>,
    /// 阻止续期的未满员同系列活动
    pub sibling_id: Option<i64>,
}

/// 我的拼团：成员记录及所在活动
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MyParticipationResponse {
    pub participant: ParticipantResponse,
    pub campaign: CampaignResponse,
}
