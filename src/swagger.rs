use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{CampaignStatus, LotteryStatus, PointKind};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::campaign::list_campaigns,
        handlers::campaign::my_campaigns,
        handlers::campaign::get_campaign,
        handlers::campaign::join_campaign,
        handlers::campaign::leave_campaign,
        handlers::campaign::update_contact,
        handlers::lottery::list_lotteries,
        handlers::lottery::get_lottery,
        handlers::lottery::enter_lottery,
        handlers::points::get_balance,
        handlers::points::get_logs,
        handlers::points::check_in,
        handlers::points::checkin_status,
        handlers::admin::list_all_campaigns,
        handlers::admin::create_campaign,
        handlers::admin::update_campaign,
        handlers::admin::update_campaign_status,
        handlers::admin::renew_campaign,
        handlers::admin::list_participants,
        handlers::admin::move_participant,
        handlers::admin::update_participant,
        handlers::admin::remove_participant,
        handlers::admin::create_lottery,
        handlers::admin::list_entries,
        handlers::admin::draw_lottery,
        handlers::admin::auto_draw,
        handlers::admin::adjust_points,
    ),
    components(
        schemas(
            CampaignStatus,
            LotteryStatus,
            PointKind,
            ListQuery,
            LotteryListQuery,
            CampaignPage,
            ParticipantPage,
            LotteryPage,
            LotteryEntryPage,
            PointLogPage,
            CreateCampaignRequest,
            UpdateCampaignRequest,
            UpdateCampaignStatusRequest,
            CampaignResponse,
            JoinCampaignRequest,
            JoinCampaignResponse,
            UpdateContactRequest,
            ParticipantResponse,
            MyParticipationResponse,
            UpdateParticipantRequest,
            UpdateParticipantResponse,
            MoveParticipantRequest,
            MoveParticipantResponse,
            PayoutStatus,
            PayoutOutcome,
            SettlementReport,
            RenewBlockCode,
            RenewResponse,
            CreateLotteryRequest,
            LotteryResponse,
            LotteryEntryResponse,
            LotteryDetailResponse,
            EnterLotteryResponse,
            DrawResult,
            DrawResponse,
            AutoDrawSummary,
            PointBalanceResponse,
            PointLogResponse,
            AdjustPointsRequest,
            CheckinResponse,
            CheckinStatusResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "campaign", description = "Group-buy campaign API"),
        (name = "lottery", description = "Points lottery API"),
        (name = "points", description = "Points ledger and daily check-in API"),
        (name = "admin", description = "Administration API"),
    ),
    info(
        title = "Pintuan Backend API",
        version = "1.0.0",
        description = "Group-buy, lottery and points REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
