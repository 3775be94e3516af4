use crate::handlers::current_user;
use crate::models::*;
use crate::services::LotteryService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/lotteries",
    tag = "lottery",
    params(LotteryListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取抽奖列表成功", body = LotteryPage),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_lotteries(
    service: web::Data<LotteryService>,
    query: web::Query<LotteryListQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let params = PaginationParams::new(query.page, query.per_page);
    match service.list_lotteries(&params, query.status).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/lotteries/{id}",
    tag = "lottery",
    params(
        ("id" = i64, Path, description = "抽奖ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取抽奖详情成功", body = LotteryDetailResponse),
        (status = 404, description = "抽奖不存在")
    )
)]
/// 抽奖详情，包含当前用户的参与记录；开奖后附带中奖用户
pub async fn get_lottery(
    service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match service.get_lottery(path.into_inner(), Some(user.id)).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/lotteries/{id}/enter",
    tag = "lottery",
    params(
        ("id" = i64, Path, description = "抽奖ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "参与成功", body = EnterLotteryResponse),
        (status = 400, description = "积分不足、重复参与或已开奖"),
        (status = 404, description = "抽奖不存在")
    )
)]
/// 参与抽奖:
/// 1. 检查抽奖未到开奖时间、未重复参与
/// 2. 扣除参与积分
/// 3. 写入参与记录并更新参与人数
pub async fn enter_lottery(
    service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match service.enter(path.into_inner(), user.id, Utc::now()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn lottery_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lotteries")
            .route("", web::get().to(list_lotteries))
            .route("/{id}", web::get().to(get_lottery))
            .route("/{id}/enter", web::post().to(enter_lottery)),
    );
}
