//! 分页相关的数据结构

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{
    CampaignResponse, LotteryEntryResponse, LotteryResponse, ParticipantResponse,
    PointLogResponse,
};

/// 列表查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20，最大 100)
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationParams {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl PaginationParams {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1) as u64,
            page_size: per_page.unwrap_or(20).clamp(1, 100) as u64,
        }
    }

    pub fn get_offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    pub fn get_limit(&self) -> u64 {
        self.page_size
    }
}

impl From<&ListQuery> for PaginationParams {
    fn from(q: &ListQuery) -> Self {
        PaginationParams::new(q.page, q.per_page)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(
    CampaignPage = PaginatedResponse<CampaignResponse>,
    ParticipantPage = PaginatedResponse<ParticipantResponse>,
    LotteryPage = PaginatedResponse<LotteryResponse>,
    LotteryEntryPage = PaginatedResponse<LotteryEntryResponse>,
    PointLogPage = PaginatedResponse<PointLogResponse>
)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        let total_pages = total.div_ceil(params.page_size);
        Self {
            data,
            page: params.page,
            page_size: params.page_size,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params() {
        let params = PaginationParams::new(Some(2), Some(10));
        assert_eq!(params.page, 2);
        assert_eq!(params.get_offset(), 10);
        assert_eq!(params.get_limit(), 10);
    }

    #[test]
    fn test_pagination_params_defaults_and_clamp() {
        let params = PaginationParams::new(None, None);
        assert_eq!(params.page, 1);
        assert_eq!(params.get_offset(), 0);
        assert_eq!(params.get_limit(), 20);

        let params = PaginationParams::new(Some(0), Some(1000));
        assert_eq!(params.page, 1);
        assert_eq!(params.get_limit(), 100);
    }

    #[test]
    fn test_total_pages() {
        let params = PaginationParams::new(Some(2), Some(10));
        let page = PaginatedResponse::new(vec![1, 2, 3], &params, 25);
        assert_eq!(page.total_pages, 3);

        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], &params, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
