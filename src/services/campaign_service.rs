use crate::entities::{
    CampaignStatus, PointKind, campaign_entity as campaigns, participant_entity as participants,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CampaignResponse, CreateCampaignRequest, JoinCampaignRequest, JoinCampaignResponse,
    MoveParticipantRequest, MoveParticipantResponse, MyParticipationResponse, PaginatedResponse,
    PaginationParams, ParticipantResponse, PayoutOutcome, PayoutStatus, SettlementReport,
    UpdateCampaignRequest, UpdateParticipantRequest, UpdateParticipantResponse,
};
use crate::services::{PointsService, RenewOutcome, RenewService};
use chrono::Utc;
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;

const MAX_TITLE_LEN: usize = 255;
const MAX_CONTACT_LEN: usize = 255;

/// 结算积分 = floor(份数 × 单价)
///
/// 加一个极小量再取整，避免 0.29 × 100 = 28.999… 这类浮点误差少发 1 分
pub fn settlement_points(quantity: i64, price: f64) -> i64 {
    if !price.is_finite() || price <= 0.0 || quantity <= 0 {
        return 0;
    }
    (quantity as f64 * price + 1e-9).floor() as i64
}

/// 未结算条件：status IS NULL OR status != 'ended'
fn not_ended() -> Condition {
    Condition::any()
        .add(campaigns::Column::Status.is_null())
        .add(campaigns::Column::Status.ne(CampaignStatus::Ended))
}

fn normalize_contact(contact: Option<String>) -> AppResult<Option<String>> {
    match contact.map(|c| c.trim().to_string()) {
        Some(c) if c.len() > MAX_CONTACT_LEN => Err(AppError::ValidationError(format!(
            "Contact must be at most {MAX_CONTACT_LEN} characters"
        ))),
        Some(c) if c.is_empty() => Ok(None),
        other => Ok(other),
    }
}

fn validate_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::ValidationError("Title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::ValidationError(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_price(price: f64) -> AppResult<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::ValidationError(
            "Price must be a non-negative number".into(),
        ));
    }
    Ok(price)
}

fn validate_target(target: i64) -> AppResult<i64> {
    if target < 1 {
        return Err(AppError::ValidationError(
            "target_count must be at least 1".into(),
        ));
    }
    Ok(target)
}

/// 拼团活动生命周期
///
/// enrolled_quantity 只通过 [`reserve_capacity`](Self::reserve_capacity) 与
/// [`release_capacity`](Self::release_capacity) 的原子更新修改，任何并发顺序下都不会超过 target_count。
#[derive(Clone)]
pub struct CampaignService {
    pool: DatabaseConnection,
    points_service: PointsService,
    renew_service: RenewService,
}

impl CampaignService {
    pub fn new(
        pool: DatabaseConnection,
        points_service: PointsService,
        renew_service: RenewService,
    ) -> Self {
        Self {
            pool,
            points_service,
            renew_service,
        }
    }

    pub async fn create_campaign(&self, req: CreateCampaignRequest) -> AppResult<CampaignResponse> {
        let title = validate_title(&req.title)?;
        let price = validate_price(req.price)?;
        let target_count = validate_target(req.target_count)?;

        let now = Utc::now();
        let model = campaigns::ActiveModel {
            title: Set(title),
            description: Set(req.description),
            features: Set(req.features.map(|f| json!(f))),
            price: Set(price),
            target_count: Set(target_count),
            enrolled_quantity: Set(0),
            status: Set(None),
            auto_renew: Set(req.auto_renew.unwrap_or(false)),
            is_hot: Set(req.is_hot.unwrap_or(false)),
            image_url: Set(req.image_url),
            parent_id: Set(None),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Campaign {} created: {}", model.id, model.title);
        Ok(model.into())
    }

    /// 修改活动，target_count 不能低于已报名数量
    pub async fn update_campaign(
        &self,
        campaign_id: i64,
        req: UpdateCampaignRequest,
    ) -> AppResult<CampaignResponse> {
        let txn = self.pool.begin().await?;
        let campaign = Self::find_campaign(&txn, campaign_id).await?;
        if campaign.is_ended() {
            return Err(AppError::ValidationError(
                "Campaign has ended and can no longer be edited".into(),
            ));
        }

        if let Some(target) = req.target_count {
            let target = validate_target(target)?;
            let result = campaigns::Entity::update_many()
                .col_expr(campaigns::Column::TargetCount, Expr::value(target))
                .filter(campaigns::Column::Id.eq(campaign_id))
                .filter(campaigns::Column::EnrolledQuantity.lte(target))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                return Err(AppError::ValidationError(format!(
                    "target_count cannot be lower than the enrolled quantity ({})",
                    campaign.enrolled_quantity
                )));
            }
        }

        let mut am = campaign.into_active_model();
        if let Some(title) = req.title {
            am.title = Set(validate_title(&title)?);
        }
        if let Some(description) = req.description {
            am.description = Set(Some(description));
        }
        if let Some(features) = req.features {
            am.features = Set(Some(json!(features)));
        }
        if let Some(price) = req.price {
            am.price = Set(validate_price(price)?);
        }
        if let Some(auto_renew) = req.auto_renew {
            am.auto_renew = Set(auto_renew);
        }
        if let Some(is_hot) = req.is_hot {
            am.is_hot = Set(is_hot);
        }
        if let Some(image_url) = req.image_url {
            am.image_url = Set(Some(image_url));
        }
        am.updated_at = Set(Some(Utc::now()));
        am.update(&txn).await?;
        txn.commit().await?;

        // 降低目标人数可能使活动直接满员
        let campaign = Self::find_campaign(&self.pool, campaign_id).await?;
        self.renew_if_filled(&campaign).await;
        Ok(campaign.into())
    }

    pub async fn get_campaign(&self, campaign_id: i64) -> AppResult<CampaignResponse> {
        Ok(Self::find_campaign(&self.pool, campaign_id).await?.into())
    }

    /// 活动列表：热门优先，其次按创建倒序
    pub async fn list_campaigns(
        &self,
        params: &PaginationParams,
        include_ended: bool,
    ) -> AppResult<PaginatedResponse<CampaignResponse>> {
        let mut base_query = campaigns::Entity::find();
        if !include_ended {
            base_query = base_query.filter(not_ended());
        }

        let total = base_query.clone().count(&self.pool).await?;

        let items = base_query
            .order_by_desc(campaigns::Column::IsHot)
            .order_by_desc(campaigns::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(CampaignResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn list_participants(
        &self,
        campaign_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ParticipantResponse>> {
        Self::find_campaign(&self.pool, campaign_id).await?;

        let base_query = participants::Entity::find()
            .filter(participants::Column::CampaignId.eq(campaign_id));
        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_asc(participants::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(ParticipantResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }

    /// 当前用户参加的所有拼团
    pub async fn list_user_participations(
        &self,
        user_id: i64,
    ) -> AppResult<Vec<MyParticipationResponse>> {
        let rows = participants::Entity::find()
            .filter(participants::Column::UserId.eq(user_id))
            .order_by_desc(participants::Column::Id)
            .all(&self.pool)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|p| p.campaign_id).collect();
        let campaign_map: std::collections::HashMap<i64, campaigns::Model> =
            campaigns::Entity::find()
                .filter(campaigns::Column::Id.is_in(ids))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect();

        Ok(rows
            .into_iter()
            .filter_map(|p| {
                let campaign = campaign_map.get(&p.campaign_id)?.clone();
                Some(MyParticipationResponse {
                    participant: p.into(),
                    campaign: campaign.into(),
                })
            })
            .collect())
    }

    /// 参团；已参加时累加份数
    pub async fn join(
        &self,
        campaign_id: i64,
        user_id: i64,
        req: JoinCampaignRequest,
    ) -> AppResult<JoinCampaignResponse> {
        let quantity = req.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(AppError::ValidationError(
                "Quantity must be at least 1".into(),
            ));
        }
        let contact = normalize_contact(req.contact)?;

        let txn = self.pool.begin().await?;
        let campaign = Self::find_campaign(&txn, campaign_id).await?;
        if campaign.is_ended() {
            return Err(AppError::ValidationError("Campaign has ended".into()));
        }
        Self::reserve_capacity(&txn, campaign_id, quantity).await?;

        let now = Utc::now();
        let participant = match Self::find_participant(&txn, campaign_id, user_id).await? {
            Some(existing) => {
                let units = existing.units() + quantity;
                let mut am = existing.into_active_model();
                am.quantity = Set(units);
                if contact.is_some() {
                    am.contact = Set(contact);
                }
                am.updated_at = Set(Some(now));
                am.update(&txn).await?
            }
            None => {
                participants::ActiveModel {
                    campaign_id: Set(campaign_id),
                    user_id: Set(user_id),
                    quantity: Set(quantity),
                    contact: Set(contact),
                    contacted: Set(false),
                    created_at: Set(Some(now)),
                    updated_at: Set(Some(now)),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };
        txn.commit().await?;

        log::info!("User {user_id} joined campaign {campaign_id} x{quantity}");

        let campaign = Self::find_campaign(&self.pool, campaign_id).await?;
        let successor = self.renew_if_filled(&campaign).await;
        Ok(JoinCampaignResponse {
            participant: participant.into(),
            campaign: campaign.into(),
            successor,
        })
    }

    /// 用户退出拼团
    pub async fn leave(&self, campaign_id: i64, user_id: i64) -> AppResult<CampaignResponse> {
        self.remove_participant(campaign_id, user_id).await
    }

    /// 移除成员并释放其占用的名额；已结算的活动不允许
    pub async fn remove_participant(
        &self,
        campaign_id: i64,
        user_id: i64,
    ) -> AppResult<CampaignResponse> {
        let txn = self.pool.begin().await?;
        let campaign = Self::find_campaign(&txn, campaign_id).await?;
        if campaign.is_ended() {
            return Err(AppError::ValidationError(
                "Campaign has ended; members can no longer be removed".into(),
            ));
        }
        let participant = Self::find_participant(&txn, campaign_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".into()))?;
        let units = participant.units();

        participants::Entity::delete_by_id(participant.id)
            .exec(&txn)
            .await?;
        Self::release_capacity(&txn, campaign_id, units).await?;
        txn.commit().await?;

        log::info!("User {user_id} left campaign {campaign_id} (-{units})");
        Ok(Self::find_campaign(&self.pool, campaign_id).await?.into())
    }

    /// 把成员移到另一个活动；目标中已有该用户时合并份数
    pub async fn move_participant(
        &self,
        from_campaign_id: i64,
        req: MoveParticipantRequest,
    ) -> AppResult<MoveParticipantResponse> {
        let to_campaign_id = req.to_campaign_id;
        let user_id = req.user_id;
        if from_campaign_id == to_campaign_id {
            return Err(AppError::ValidationError(
                "Source and target campaign are the same".into(),
            ));
        }

        let txn = self.pool.begin().await?;
        // 已结算活动的份数已经发放过积分，不能再转到别的活动
        if Self::find_campaign(&txn, from_campaign_id).await?.is_ended() {
            return Err(AppError::ValidationError("Campaign has ended".into()));
        }
        let source = Self::find_participant(&txn, from_campaign_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".into()))?;
        let target = campaigns::Entity::find_by_id(to_campaign_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Target campaign not found".into()))?;
        if target.is_ended() {
            return Err(AppError::ValidationError(
                "Target campaign has ended".into(),
            ));
        }

        let moving = source.units();
        Self::reserve_capacity(&txn, to_campaign_id, moving).await?;

        let now = Utc::now();
        let existing = Self::find_participant(&txn, to_campaign_id, user_id).await?;
        let merged = existing.is_some();
        let participant = match existing {
            Some(dest) => {
                let units = dest.units() + moving;
                let contact = dest.contact.clone().or(source.contact.clone());
                let mut am = dest.into_active_model();
                am.quantity = Set(units);
                am.contact = Set(contact);
                am.updated_at = Set(Some(now));
                let updated = am.update(&txn).await?;
                participants::Entity::delete_by_id(source.id)
                    .exec(&txn)
                    .await?;
                updated
            }
            None => {
                let mut am = source.into_active_model();
                am.campaign_id = Set(to_campaign_id);
                am.updated_at = Set(Some(now));
                am.update(&txn).await?
            }
        };
        Self::release_capacity(&txn, from_campaign_id, moving).await?;
        txn.commit().await?;

        log::info!(
            "Moved user {user_id} x{moving} from campaign {from_campaign_id} to {to_campaign_id} (merged: {merged})"
        );

        let from = Self::find_campaign(&self.pool, from_campaign_id).await?;
        let to = Self::find_campaign(&self.pool, to_campaign_id).await?;
        let successor = self.renew_if_filled(&to).await;
        Ok(MoveParticipantResponse {
            participant: participant.into(),
            merged,
            from: from.into(),
            to: to.into(),
            successor,
        })
    }

    /// 修改成员份数，差值通过原子更新占用或释放名额
    pub async fn edit_participant_quantity(
        &self,
        campaign_id: i64,
        user_id: i64,
        quantity: i64,
    ) -> AppResult<ParticipantResponse> {
        if quantity < 1 {
            return Err(AppError::ValidationError(
                "Quantity must be at least 1".into(),
            ));
        }

        let txn = self.pool.begin().await?;
        let campaign = Self::find_campaign(&txn, campaign_id).await?;
        if campaign.is_ended() {
            return Err(AppError::ValidationError("Campaign has ended".into()));
        }
        let participant = Self::find_participant(&txn, campaign_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".into()))?;

        let delta = quantity - participant.units();
        if delta > 0 {
            Self::reserve_capacity(&txn, campaign_id, delta).await?;
        } else if delta < 0 {
            Self::release_capacity(&txn, campaign_id, -delta).await?;
        }

        let mut am = participant.into_active_model();
        am.quantity = Set(quantity);
        am.updated_at = Set(Some(Utc::now()));
        let updated = am.update(&txn).await?;
        txn.commit().await?;

        Ok(updated.into())
    }

    /// 修改联系方式或“已联系”标记
    pub async fn update_participant_contact(
        &self,
        campaign_id: i64,
        user_id: i64,
        contact: Option<String>,
        contacted: Option<bool>,
    ) -> AppResult<ParticipantResponse> {
        let participant = Self::find_participant(&self.pool, campaign_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".into()))?;

        let mut am = participant.into_active_model();
        if contact.is_some() {
            am.contact = Set(normalize_contact(contact)?);
        }
        if let Some(contacted) = contacted {
            am.contacted = Set(contacted);
        }
        am.updated_at = Set(Some(Utc::now()));
        Ok(am.update(&self.pool).await?.into())
    }

    /// 管理员修改成员：份数与联系方式
    pub async fn update_participant(
        &self,
        campaign_id: i64,
        user_id: i64,
        req: UpdateParticipantRequest,
    ) -> AppResult<UpdateParticipantResponse> {
        // 先校验联系方式，避免份数已提交后才报错
        normalize_contact(req.contact.clone())?;
        let mut participant = match req.quantity {
            Some(quantity) => {
                Some(
                    self.edit_participant_quantity(campaign_id, user_id, quantity)
                        .await?,
                )
            }
            None => None,
        };
        if req.contact.is_some() || req.contacted.is_some() {
            participant = Some(
                self.update_participant_contact(campaign_id, user_id, req.contact, req.contacted)
                    .await?,
            );
        }
        let participant = match participant {
            Some(p) => p,
            None => Self::find_participant(&self.pool, campaign_id, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Participant not found".into()))?
                .into(),
        };

        let campaign = Self::find_campaign(&self.pool, campaign_id).await?;
        let successor = self.renew_if_filled(&campaign).await;
        Ok(UpdateParticipantResponse {
            participant,
            campaign: campaign.into(),
            successor,
        })
    }

    /// 结算：把活动置为 ended，并给每个成员发放 floor(份数 × 单价) 积分
    ///
    /// 状态切换是条件更新，重复或并发调用只有第一次会发放。
    /// 单个成员发放失败会记录在报告中，不影响其它成员。
    pub async fn settle(&self, campaign_id: i64) -> AppResult<SettlementReport> {
        let campaign = Self::find_campaign(&self.pool, campaign_id).await?;
        if campaign.is_ended() {
            return Ok(SettlementReport::new(campaign.into(), true, Vec::new()));
        }

        let result = campaigns::Entity::update_many()
            .col_expr(campaigns::Column::Status, Expr::value(CampaignStatus::Ended))
            .col_expr(campaigns::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(campaigns::Column::Id.eq(campaign_id))
            .filter(not_ended())
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            let campaign = Self::find_campaign(&self.pool, campaign_id).await?;
            return Ok(SettlementReport::new(campaign.into(), true, Vec::new()));
        }

        let members = participants::Entity::find()
            .filter(participants::Column::CampaignId.eq(campaign_id))
            .order_by_asc(participants::Column::Id)
            .all(&self.pool)
            .await?;

        let reason = format!("campaign settlement: {}", campaign.title);
        let mut payouts = Vec::with_capacity(members.len());
        for member in members {
            let quantity = member.units();
            let points = settlement_points(quantity, campaign.price);
            let mut outcome = PayoutOutcome {
                user_id: member.user_id,
                quantity,
                points,
                status: PayoutStatus::Skipped,
                balance_after: None,
                error: None,
            };
            if points > 0 {
                match self
                    .points_service
                    .apply_delta(member.user_id, points, &reason, PointKind::Earn)
                    .await
                {
                    Ok(balance) => {
                        outcome.status = PayoutStatus::Paid;
                        outcome.balance_after = Some(balance);
                    }
                    Err(e) => {
                        log::error!(
                            "Settlement payout failed for user {} in campaign {}: {}",
                            member.user_id,
                            campaign_id,
                            e
                        );
                        outcome.status = PayoutStatus::Failed;
                        outcome.error = Some(e.to_string());
                    }
                }
            }
            payouts.push(outcome);
        }

        let settled = Self::find_campaign(&self.pool, campaign_id).await?;
        let successor = self.renew_if_filled(&settled).await;
        let mut report = SettlementReport::new(settled.into(), false, payouts);
        report.successor = successor;

        log::info!(
            "Campaign {} settled: {} paid, {} failed",
            campaign_id,
            report.paid,
            report.failed
        );
        Ok(report)
    }

    /// 修改活动状态；目前只有 ended 是有效的人工覆盖值
    pub async fn update_status(
        &self,
        campaign_id: i64,
        status: CampaignStatus,
    ) -> AppResult<SettlementReport> {
        match status {
            CampaignStatus::Ended => self.settle(campaign_id).await,
            other => Err(AppError::ValidationError(format!(
                "Status '{other}' is derived from enrollment and cannot be set manually"
            ))),
        }
    }

    /// 原子占用名额：enrolled + quantity <= target 且未结算
    async fn reserve_capacity<C: ConnectionTrait>(
        db: &C,
        campaign_id: i64,
        quantity: i64,
    ) -> AppResult<()> {
        let result = campaigns::Entity::update_many()
            .col_expr(
                campaigns::Column::EnrolledQuantity,
                Expr::col(campaigns::Column::EnrolledQuantity).add(quantity),
            )
            .col_expr(campaigns::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(campaigns::Column::Id.eq(campaign_id))
            .filter(
                Expr::col(campaigns::Column::EnrolledQuantity)
                    .lte(Expr::col(campaigns::Column::TargetCount).sub(quantity)),
            )
            .filter(not_ended())
            .exec(db)
            .await?;

        if result.rows_affected == 1 {
            return Ok(());
        }

        let campaign = Self::find_campaign(db, campaign_id).await?;
        if campaign.is_ended() {
            return Err(AppError::ValidationError("Campaign has ended".into()));
        }
        Err(AppError::CapacityExceeded {
            requested: quantity,
            available: campaign.remaining(),
        })
    }

    async fn release_capacity<C: ConnectionTrait>(
        db: &C,
        campaign_id: i64,
        quantity: i64,
    ) -> AppResult<()> {
        campaigns::Entity::update_many()
            .col_expr(
                campaigns::Column::EnrolledQuantity,
                Expr::col(campaigns::Column::EnrolledQuantity).sub(quantity),
            )
            .col_expr(campaigns::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(campaigns::Column::Id.eq(campaign_id))
            .exec(db)
            .await?;
        Ok(())
    }

    /// 满员且开启自动续期时尝试开出下一期；续期失败只记录日志
    async fn renew_if_filled(&self, campaign: &campaigns::Model) -> Option<CampaignResponse> {
        if !campaign.auto_renew || !campaign.is_full() {
            return None;
        }
        match self.renew_service.try_renew(campaign.id).await {
            Ok(RenewOutcome::Renewed(model)) => Some(model.into()),
            Ok(RenewOutcome::Blocked(reason)) => {
                log::debug!("Campaign {} not renewed: {}", campaign.id, reason);
                None
            }
            Err(e) => {
                log::warn!("Auto renew of campaign {} failed: {}", campaign.id, e);
                None
            }
        }
    }

    async fn find_campaign<C: ConnectionTrait>(
        db: &C,
        campaign_id: i64,
    ) -> AppResult<campaigns::Model> {
        campaigns::Entity::find_by_id(campaign_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".into()))
    }

    async fn find_participant<C: ConnectionTrait>(
        db: &C,
        campaign_id: i64,
        user_id: i64,
    ) -> AppResult<Option<participants::Model>> {
        Ok(participants::Entity::find()
            .filter(participants::Column::CampaignId.eq(campaign_id))
            .filter(participants::Column::UserId.eq(user_id))
            .one(db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_user, setup_db};

    fn service(db: &DatabaseConnection) -> CampaignService {
        CampaignService::new(
            db.clone(),
            PointsService::new(db.clone()),
            RenewService::new(db.clone()),
        )
    }

    fn campaign_req(title: &str, target: i64, price: f64) -> CreateCampaignRequest {
        CreateCampaignRequest {
            title: title.to_string(),
            description: None,
            features: Some(vec!["4K".into()]),
            price,
            target_count: target,
            auto_renew: Some(false),
            is_hot: None,
            image_url: None,
        }
    }

    fn join_req(quantity: i64) -> JoinCampaignRequest {
        JoinCampaignRequest {
            quantity: Some(quantity),
            contact: None,
        }
    }

    #[test]
    fn test_settlement_points() {
        assert_eq!(settlement_points(2, 10.0), 20);
        assert_eq!(settlement_points(3, 9.99), 29);
        assert_eq!(settlement_points(100, 0.29), 29);
        assert_eq!(settlement_points(1, 0.0), 0);
        assert_eq!(settlement_points(1, f64::NAN), 0);
    }

    #[tokio::test]
    async fn test_join_respects_capacity() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let b = create_user(&db, "b").await;
        let c = create_user(&db, "c").await;
        let campaign = svc.create_campaign(campaign_req("Plan", 5, 10.0)).await.unwrap();

        svc.join(campaign.id, a.id, join_req(3)).await.unwrap();
        let err = svc.join(campaign.id, b.id, join_req(3)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::CapacityExceeded {
                requested: 3,
                available: 2
            }
        ));

        let joined = svc.join(campaign.id, b.id, join_req(2)).await.unwrap();
        assert_eq!(joined.campaign.enrolled_quantity, 5);
        assert_eq!(joined.campaign.status, CampaignStatus::Locked);
        assert!(joined.successor.is_none());

        let err = svc.join(campaign.id, c.id, join_req(1)).await.unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded { .. }));
    }

    // 测试库只有一个连接，这里的 join 实际是依次执行的，
    // 覆盖的是名额条件更新在连续请求下的结果
    #[tokio::test]
    async fn test_joins_beyond_target_are_rejected() {
        let db = setup_db().await;
        let svc = service(&db);
        let campaign = svc.create_campaign(campaign_req("Race", 4, 1.0)).await.unwrap();
        let mut users = Vec::new();
        for i in 0..6 {
            users.push(create_user(&db, &format!("u{i}")).await);
        }

        let results = futures_util::future::join_all(
            users
                .iter()
                .map(|u| svc.join(campaign.id, u.id, join_req(1))),
        )
        .await;
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 4);

        let campaign = svc.get_campaign(campaign.id).await.unwrap();
        assert_eq!(campaign.enrolled_quantity, 4);
    }

    #[tokio::test]
    async fn test_join_again_accumulates_quantity() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let campaign = svc.create_campaign(campaign_req("Plan", 5, 10.0)).await.unwrap();

        svc.join(campaign.id, a.id, join_req(1)).await.unwrap();
        let again = svc
            .join(
                campaign.id,
                a.id,
                JoinCampaignRequest {
                    quantity: Some(2),
                    contact: Some(" wechat:abc ".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(again.participant.quantity, 3);
        assert_eq!(again.participant.contact.as_deref(), Some("wechat:abc"));
        assert_eq!(again.campaign.enrolled_quantity, 3);
    }

    #[tokio::test]
    async fn test_leave_releases_capacity() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let campaign = svc.create_campaign(campaign_req("Plan", 5, 10.0)).await.unwrap();
        svc.join(campaign.id, a.id, join_req(2)).await.unwrap();

        let after = svc.leave(campaign.id, a.id).await.unwrap();
        assert_eq!(after.enrolled_quantity, 0);

        let err = svc.leave(campaign.id, a.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_settle_pays_once() {
        let db = setup_db().await;
        let svc = service(&db);
        let points = PointsService::new(db.clone());
        let a = create_user(&db, "a").await;
        let b = create_user(&db, "b").await;
        let campaign = svc.create_campaign(campaign_req("Plan", 5, 10.0)).await.unwrap();
        svc.join(campaign.id, a.id, join_req(2)).await.unwrap();
        svc.join(campaign.id, b.id, join_req(3)).await.unwrap();

        let report = svc.settle(campaign.id).await.unwrap();
        assert!(!report.already_settled);
        assert_eq!(report.paid, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.campaign.status, CampaignStatus::Ended);
        assert_eq!(points.balance(a.id).await.unwrap().points, 20);
        assert_eq!(points.balance(b.id).await.unwrap().points, 30);

        let again = svc.settle(campaign.id).await.unwrap();
        assert!(again.already_settled);
        assert!(again.payouts.is_empty());
        assert_eq!(points.balance(a.id).await.unwrap().points, 20);
        assert_eq!(points.balance(b.id).await.unwrap().points, 30);
    }

    #[tokio::test]
    async fn test_ended_campaign_rejects_changes() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let b = create_user(&db, "b").await;
        let campaign = svc.create_campaign(campaign_req("Plan", 5, 0.0)).await.unwrap();
        svc.join(campaign.id, a.id, join_req(1)).await.unwrap();
        svc.update_status(campaign.id, CampaignStatus::Ended)
            .await
            .unwrap();

        let err = svc.join(campaign.id, b.id, join_req(1)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let err = svc.leave(campaign.id, a.id).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let err = svc
            .edit_participant_quantity(campaign.id, a.id, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = svc
            .update_status(campaign.id, CampaignStatus::Locked)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_move_merges_into_existing_membership() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let other = create_user(&db, "other").await;
        let from = svc.create_campaign(campaign_req("A", 5, 1.0)).await.unwrap();
        let to = svc.create_campaign(campaign_req("B", 10, 1.0)).await.unwrap();
        svc.join(from.id, a.id, join_req(2)).await.unwrap();
        svc.join(to.id, a.id, join_req(3)).await.unwrap();
        svc.join(to.id, other.id, join_req(1)).await.unwrap();

        let moved = svc
            .move_participant(
                from.id,
                MoveParticipantRequest {
                    user_id: a.id,
                    to_campaign_id: to.id,
                },
            )
            .await
            .unwrap();
        assert!(moved.merged);
        assert_eq!(moved.participant.quantity, 5);
        assert_eq!(moved.from.enrolled_quantity, 0);
        assert_eq!(moved.to.enrolled_quantity, 6);

        let remaining = svc
            .list_participants(from.id, &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(remaining.total, 0);
    }

    #[tokio::test]
    async fn test_move_without_room_changes_nothing() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let b = create_user(&db, "b").await;
        let from = svc.create_campaign(campaign_req("A", 5, 1.0)).await.unwrap();
        let to = svc.create_campaign(campaign_req("B", 3, 1.0)).await.unwrap();
        svc.join(from.id, a.id, join_req(2)).await.unwrap();
        svc.join(to.id, b.id, join_req(2)).await.unwrap();

        let err = svc
            .move_participant(
                from.id,
                MoveParticipantRequest {
                    user_id: a.id,
                    to_campaign_id: to.id,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::CapacityExceeded {
                requested: 2,
                available: 1
            }
        ));
        assert_eq!(svc.get_campaign(from.id).await.unwrap().enrolled_quantity, 2);
        assert_eq!(svc.get_campaign(to.id).await.unwrap().enrolled_quantity, 2);
    }

    #[tokio::test]
    async fn test_move_out_of_settled_campaign_is_rejected() {
        let db = setup_db().await;
        let svc = service(&db);
        let points = PointsService::new(db.clone());
        let u = create_user(&db, "u").await;
        let from = svc.create_campaign(campaign_req("A", 5, 10.0)).await.unwrap();
        let to = svc.create_campaign(campaign_req("B", 5, 10.0)).await.unwrap();
        svc.join(from.id, u.id, join_req(2)).await.unwrap();
        svc.settle(from.id).await.unwrap();
        assert_eq!(points.balance(u.id).await.unwrap().points, 20);

        let err = svc
            .move_participant(
                from.id,
                MoveParticipantRequest {
                    user_id: u.id,
                    to_campaign_id: to.id,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        // 已结算的份数保持不变，目标活动结算也不会再发一次
        assert_eq!(svc.get_campaign(from.id).await.unwrap().enrolled_quantity, 2);
        svc.settle(to.id).await.unwrap();
        assert_eq!(points.balance(u.id).await.unwrap().points, 20);
    }

    #[tokio::test]
    async fn test_update_participant_rejects_bad_contact_before_quantity() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let campaign = svc.create_campaign(campaign_req("Plan", 4, 1.0)).await.unwrap();
        svc.join(campaign.id, a.id, join_req(1)).await.unwrap();

        let err = svc
            .update_participant(
                campaign.id,
                a.id,
                UpdateParticipantRequest {
                    quantity: Some(3),
                    contact: Some("x".repeat(MAX_CONTACT_LEN + 1)),
                    contacted: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let campaign = svc.get_campaign(campaign.id).await.unwrap();
        assert_eq!(campaign.enrolled_quantity, 1);
    }

    #[tokio::test]
    async fn test_edit_quantity_checks_capacity() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let b = create_user(&db, "b").await;
        let campaign = svc.create_campaign(campaign_req("Plan", 4, 1.0)).await.unwrap();
        svc.join(campaign.id, a.id, join_req(1)).await.unwrap();
        svc.join(campaign.id, b.id, join_req(2)).await.unwrap();

        let err = svc
            .edit_participant_quantity(campaign.id, a.id, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded { .. }));

        let updated = svc
            .update_participant(
                campaign.id,
                a.id,
                UpdateParticipantRequest {
                    quantity: Some(2),
                    contact: None,
                    contacted: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.participant.quantity, 2);
        assert!(updated.participant.contacted);
        assert_eq!(updated.campaign.enrolled_quantity, 4);

        svc.edit_participant_quantity(campaign.id, b.id, 1)
            .await
            .unwrap();
        assert_eq!(svc.get_campaign(campaign.id).await.unwrap().enrolled_quantity, 3);
    }

    #[tokio::test]
    async fn test_update_target_cannot_drop_below_enrolled() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let campaign = svc.create_campaign(campaign_req("Plan", 5, 1.0)).await.unwrap();
        svc.join(campaign.id, a.id, join_req(3)).await.unwrap();

        let err = svc
            .update_campaign(
                campaign.id,
                UpdateCampaignRequest {
                    target_count: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let updated = svc
            .update_campaign(
                campaign.id,
                UpdateCampaignRequest {
                    target_count: Some(3),
                    is_hot: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.target_count, 3);
        assert_eq!(updated.status, CampaignStatus::Locked);
        assert!(updated.is_hot);
    }

    #[tokio::test]
    async fn test_filling_auto_renew_campaign_opens_next() {
        let db = setup_db().await;
        let svc = service(&db);
        let a = create_user(&db, "a").await;
        let mut req = campaign_req("Family Plan", 2, 5.0);
        req.auto_renew = Some(true);
        let campaign = svc.create_campaign(req).await.unwrap();

        let joined = svc.join(campaign.id, a.id, join_req(2)).await.unwrap();
        let successor = joined.successor.expect("successor opened");
        assert_eq!(successor.title, "Family Plan #2");
        assert_eq!(successor.parent_id, Some(campaign.id));
        assert_eq!(successor.enrolled_quantity, 0);

        // 结算时 #2 尚未满员，不会再开新一期
        let report = svc.settle(campaign.id).await.unwrap();
        assert!(report.successor.is_none());
    }

    #[tokio::test]
    async fn test_list_campaigns_hides_ended_by_default() {
        let db = setup_db().await;
        let svc = service(&db);
        let open = svc.create_campaign(campaign_req("Open", 5, 1.0)).await.unwrap();
        let closed = svc.create_campaign(campaign_req("Closed", 5, 1.0)).await.unwrap();
        svc.settle(closed.id).await.unwrap();

        let params = PaginationParams::default();
        let visible = svc.list_campaigns(&params, false).await.unwrap();
        assert_eq!(visible.total, 1);
        assert_eq!(visible.data[0].id, open.id);

        let all = svc.list_campaigns(&params, true).await.unwrap();
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn test_create_campaign_validation() {
        let db = setup_db().await;
        let svc = service(&db);
        assert!(matches!(
            svc.create_campaign(campaign_req("  ", 5, 1.0)).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_campaign(campaign_req("Plan", 0, 1.0)).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_campaign(campaign_req("Plan", 5, -1.0)).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
