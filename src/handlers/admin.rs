use crate::handlers::require_admin;
use crate::models::*;
use crate::services::{CampaignService, LotteryService, PointsService, RenewService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin/campaigns",
    tag = "admin",
    params(ListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取全部拼团（含已结算）", body = CampaignPage),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_all_campaigns(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    let params = PaginationParams::from(&query.into_inner());
    match service.list_campaigns(&params, true).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/campaigns",
    tag = "admin",
    request_body = CreateCampaignRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建拼团成功", body = CampaignResponse),
        (status = 400, description = "参数错误"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn create_campaign(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    body: web::Json<CreateCampaignRequest>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    match service.create_campaign(body.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/campaigns/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "拼团ID")
    ),
    request_body = UpdateCampaignRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "修改拼团成功", body = CampaignResponse),
        (status = 400, description = "目标人数低于已报名数量或拼团已结束"),
        (status = 404, description = "拼团不存在")
    )
)]
pub async fn update_campaign(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateCampaignRequest>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    match service
        .update_campaign(path.into_inner(), body.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/campaigns/{id}/status",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "拼团ID")
    ),
    request_body = UpdateCampaignStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "结算报告", body = SettlementReport),
        (status = 400, description = "不支持的状态"),
        (status = 404, description = "拼团不存在")
    )
)]
/// 设置为 ended 即结算：按 floor(份数 × 单价) 给每个成员发放积分，重复调用不会重复发放
pub async fn update_campaign_status(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateCampaignStatusRequest>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    match service
        .update_status(path.into_inner(), body.into_inner().status)
        .await
    {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": report }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/campaigns/{id}/renew",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "拼团ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "续期结果", body = RenewResponse),
        (status = 404, description = "拼团不存在")
    )
)]
/// 手动触发续期；不满足条件时 renewed = false 并给出原因
pub async fn renew_campaign(
    service: web::Data<RenewService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    match service.try_renew(path.into_inner()).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": RenewResponse::from(outcome)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/campaigns/{id}/participants",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "拼团ID"),
        ListQuery
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取成员列表成功", body = ParticipantPage),
        (status = 404, description = "拼团不存在")
    )
)]
pub async fn list_participants(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    let params = PaginationParams::from(&query.into_inner());
    match service.list_participants(path.into_inner(), &params).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/campaigns/{id}/participants/move",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "来源拼团ID")
    ),
    request_body = MoveParticipantRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "移动成功", body = MoveParticipantResponse),
        (status = 400, description = "目标名额不足或已结束"),
        (status = 404, description = "成员或拼团不存在")
    )
)]
pub async fn move_participant(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<MoveParticipantRequest>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    match service
        .move_participant(path.into_inner(), body.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/campaigns/{id}/participants/{user_id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "拼团ID"),
        ("user_id" = i64, Path, description = "用户ID")
    ),
    request_body = UpdateParticipantRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "修改成员成功", body = UpdateParticipantResponse),
        (status = 400, description = "名额不足或拼团已结束"),
        (status = 404, description = "成员不存在")
    )
)]
pub async fn update_participant(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
    body: web::Json<UpdateParticipantRequest>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    let (campaign_id, user_id) = path.into_inner();
    match service
        .update_participant(campaign_id, user_id, body.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/campaigns/{id}/participants/{user_id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "拼团ID"),
        ("user_id" = i64, Path, description = "用户ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "移除成员成功", body = CampaignResponse),
        (status = 404, description = "成员不存在")
    )
)]
pub async fn remove_participant(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    let (campaign_id, user_id) = path.into_inner();
    match service.remove_participant(campaign_id, user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/lotteries",
    tag = "admin",
    request_body = CreateLotteryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建抽奖成功", body = LotteryResponse),
        (status = 400, description = "参数错误")
    )
)]
pub async fn create_lottery(
    service: web::Data<LotteryService>,
    req: HttpRequest,
    body: web::Json<CreateLotteryRequest>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    match service.create_lottery(body.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/lotteries/{id}/entries",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "抽奖ID"),
        ListQuery
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取参与记录成功", body = LotteryEntryPage),
        (status = 404, description = "抽奖不存在")
    )
)]
pub async fn list_entries(
    service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    let params = PaginationParams::from(&query.into_inner());
    match service.list_entries(path.into_inner(), &params).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/lotteries/{id}/draw",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "抽奖ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "开奖结果（已开奖 / 顺延 / 跳过）", body = DrawResponse),
        (status = 404, description = "抽奖不存在"),
        (status = 500, description = "中奖标记全部写入失败")
    )
)]
/// 立即尝试开奖；未到开奖时间时跳过
pub async fn draw_lottery(
    service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    let lottery_id = path.into_inner();
    match service.attempt_draw(lottery_id, Utc::now()).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": outcome.into_response(lottery_id)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/lotteries/auto-draw",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "扫描完成", body = AutoDrawSummary)
    )
)]
pub async fn auto_draw(
    service: web::Data<LotteryService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    require_admin(&req)?;
    match service.auto_draw(Utc::now()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": summary }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/users/{id}/points",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "用户ID")
    ),
    request_body = AdjustPointsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "调整成功，返回新余额", body = PointBalanceResponse),
        (status = 400, description = "余额不足或参数错误"),
        (status = 404, description = "用户不存在")
    )
)]
/// 手动增减积分，写入一条流水
pub async fn adjust_points(
    service: web::Data<PointsService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<AdjustPointsRequest>,
) -> Result<HttpResponse> {
    let admin = require_admin(&req)?;
    let user_id = path.into_inner();
    let body = body.into_inner();
    log::info!(
        "Admin {} adjusts points of user {}: {} {}",
        admin.id,
        user_id,
        body.kind,
        body.amount
    );
    match service
        .apply_delta(user_id, body.amount, &body.reason, body.kind)
        .await
    {
        Ok(points) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": PointBalanceResponse { user_id, points }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/campaigns", web::get().to(list_all_campaigns))
            .route("/campaigns", web::post().to(create_campaign))
            .route("/campaigns/{id}", web::put().to(update_campaign))
            .route("/campaigns/{id}/status", web::put().to(update_campaign_status))
            .route("/campaigns/{id}/renew", web::post().to(renew_campaign))
            .route(
                "/campaigns/{id}/participants",
                web::get().to(list_participants),
            )
            .route(
                "/campaigns/{id}/participants/move",
                web::post().to(move_participant),
            )
            .route(
                "/campaigns/{id}/participants/{user_id}",
                web::put().to(update_participant),
            )
            .route(
                "/campaigns/{id}/participants/{user_id}",
                web::delete().to(remove_participant),
            )
            .route("/lotteries", web::post().to(create_lottery))
            .route("/lotteries/auto-draw", web::post().to(auto_draw))
            .route("/lotteries/{id}/entries", web::get().to(list_entries))
            .route("/lotteries/{id}/draw", web::post().to(draw_lottery))
            .route("/users/{id}/points", web::post().to(adjust_points)),
    );
}
