use crate::handlers::current_user;
use crate::models::*;
use crate::services::{CheckinService, PointsService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/points",
    tag = "points",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取积分余额成功", body = PointBalanceResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_balance(
    service: web::Data<PointsService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match service.balance(user.id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/points/logs",
    tag = "points",
    params(ListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取积分流水成功", body = PointLogPage),
        (status = 401, description = "未授权")
    )
)]
/// 分页获取积分流水（倒序）
pub async fn get_logs(
    service: web::Data<PointsService>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let params = PaginationParams::from(&query.into_inner());
    match service.list_logs(user.id, &params).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/checkin",
    tag = "points",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "签到成功", body = CheckinResponse),
        (status = 400, description = "今天已签到")
    )
)]
pub async fn check_in(
    service: web::Data<CheckinService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match service.check_in(user.id, Utc::now().date_naive()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/checkin/status",
    tag = "points",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取签到状态成功", body = CheckinStatusResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn checkin_status(
    service: web::Data<CheckinService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match service.status(user.id, Utc::now().date_naive()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn points_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/points", web::get().to(get_balance))
        .route("/points/logs", web::get().to(get_logs))
        .route("/checkin", web::post().to(check_in))
        .route("/checkin/status", web::get().to(checkin_status));
}
