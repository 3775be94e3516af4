use crate::handlers::current_user;
use crate::models::*;
use crate::services::CampaignService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/campaigns",
    tag = "campaign",
    params(ListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取拼团列表成功", body = CampaignPage),
        (status = 401, description = "未授权")
    )
)]
/// 未结算的拼团列表，热门优先
pub async fn list_campaigns(
    service: web::Data<CampaignService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::from(&query.into_inner());
    match service.list_campaigns(&params, false).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/campaigns/mine",
    tag = "campaign",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取我的拼团成功", body = [MyParticipationResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn my_campaigns(
    service: web::Data<CampaignService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match service.list_user_participations(user.id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    tag = "campaign",
    params(
        ("id" = i64, Path, description = "拼团ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取拼团详情成功", body = CampaignResponse),
        (status = 404, description = "拼团不存在")
    )
)]
pub async fn get_campaign(
    service: web::Data<CampaignService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.get_campaign(path.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/join",
    tag = "campaign",
    params(
        ("id" = i64, Path, description = "拼团ID")
    ),
    request_body = JoinCampaignRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "参团成功", body = JoinCampaignResponse),
        (status = 400, description = "名额不足或拼团已结束"),
        (status = 404, description = "拼团不存在")
    )
)]
/// 参团；已参加时累加份数。满员且开启自动续期时返回新开的下一期
pub async fn join_campaign(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<JoinCampaignRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match service
        .join(path.into_inner(), user.id, body.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/campaigns/{id}/join",
    tag = "campaign",
    params(
        ("id" = i64, Path, description = "拼团ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "退出成功", body = CampaignResponse),
        (status = 400, description = "拼团已结束"),
        (status = 404, description = "未参加该拼团")
    )
)]
pub async fn leave_campaign(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match service.leave(path.into_inner(), user.id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/campaigns/{id}/contact",
    tag = "campaign",
    params(
        ("id" = i64, Path, description = "拼团ID")
    ),
    request_body = UpdateContactRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "联系方式已更新", body = ParticipantResponse),
        (status = 404, description = "未参加该拼团")
    )
)]
pub async fn update_contact(
    service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateContactRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let contact = Some(body.into_inner().contact);
    match service
        .update_participant_contact(path.into_inner(), user.id, contact, None)
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn campaign_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/campaigns")
            .route("", web::get().to(list_campaigns))
            .route("/mine", web::get().to(my_campaigns))
            .route("/{id}", web::get().to(get_campaign))
            .route("/{id}/join", web::post().to(join_campaign))
            .route("/{id}/join", web::delete().to(leave_campaign))
            .route("/{id}/contact", web::put().to(update_contact)),
    );
}
