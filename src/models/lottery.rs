use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{LotteryStatus, lottery_entity as lotteries, lottery_entry_entity as entries};

/// 创建抽奖请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLotteryRequest {
    pub title: String,
    pub description: Option<String>,
    pub prizes: Option<Vec<String>>,
    /// 开奖时间
    pub draw_at: DateTime<Utc>,
    /// 中奖人数
    pub winners_count: i64,
    /// 参与消耗积分
    pub entry_cost: i64,
    /// 最少参与人数 (默认 1)，不足时自动延期 24 小时
    pub min_participants: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LotteryResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub prizes: Vec<String>,
    pub draw_at: DateTime<Utc>,
    pub winners_count: i64,
    pub entry_cost: i64,
    pub min_participants: i64,
    pub participant_count: i64,
    pub status: LotteryStatus,
    pub drawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<lotteries::Model> for LotteryResponse {
    fn from(m: lotteries::Model) -> Self {
        LotteryResponse {
            min_participants: m.min_required(),
            prizes: m.prize_list(),
            id: m.id,
            title: m.title,
            description: m.description,
            draw_at: m.draw_at,
            winners_count: m.winners_count,
            entry_cost: m.entry_cost,
            participant_count: m.participant_count,
            status: m.status,
            drawn_at: m.drawn_at,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LotteryEntryResponse {
    pub id: i64,
    pub lottery_id: i64,
    pub user_id: i64,
    pub cost: i64,
    pub is_winner: bool,
    pub created_at: DateTime<Utc>,
}

impl From<entries::Model> for LotteryEntryResponse {
    fn from(m: entries::Model) -> Self {
        LotteryEntryResponse {
            id: m.id,
            lottery_id: m.lottery_id,
            user_id: m.user_id,
            cost: m.cost,
            is_winner: m.is_winner,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 抽奖详情：当前用户的参与记录，开奖后附带中奖用户
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LotteryDetailResponse {
    pub lottery: LotteryResponse,
    pub my_entry: Option<LotteryEntryResponse>,
    pub winners: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnterLotteryResponse {
    pub entry: LotteryEntryResponse,
    /// 扣除后的积分余额
    pub balance: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DrawResult {
    Drawn,
    Extended,
    Skipped,
}

/// 开奖结果（API 形状）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResponse {
    pub lottery_id: i64,
    pub result: DrawResult,
    pub winners: Vec<i64>,
    pub winners_to_pick: i64,
    /// 实际成功标记的中奖记录数
    pub marked: i64,
    pub new_draw_at: Option<DateTime<Utc>>,
    pub skip_reason: Option<String>,
}

/// 自动开奖扫描汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AutoDrawSummary {
    pub checked: usize,
    pub drawn: usize,
    pub extended: usize,
    pub skipped: usize,
    pub errors: usize,
    /// errors 中属于写入被存储层静默拒绝的数量
    pub consistency_faults: usize,
}

/// 抽奖列表查询
#[derive(Debug, Clone, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LotteryListQuery {
    /// 页码 (默认1)
    pub page: Option<u32>,
    /// 每页数量 (默认20)
    pub per_page: Option<u32>,
    /// 按状态过滤
    pub status: Option<LotteryStatus>,
}
