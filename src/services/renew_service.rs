use crate::entities::campaign_entity as campaigns;
use crate::error::{AppError, AppResult};
use crate::models::{RenewBlockCode, RenewResponse};
use crate::utils::{KeyedLock, base_title, next_series_title};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// 续期被拒绝的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewBlockReason {
    AutoRenewDisabled,
    NotFull { enrolled: i64, target: i64 },
    /// 同系列还有未满员的活动
    UnfilledSibling { campaign_id: i64, title: String },
}

impl RenewBlockReason {
    pub fn code(&self) -> RenewBlockCode {
        match self {
            RenewBlockReason::AutoRenewDisabled => RenewBlockCode::AutoRenewDisabled,
            RenewBlockReason::NotFull { .. } => RenewBlockCode::NotFull,
            RenewBlockReason::UnfilledSibling { .. } => RenewBlockCode::UnfilledSibling,
        }
    }
}

impl std::fmt::Display for RenewBlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenewBlockReason::AutoRenewDisabled => write!(f, "auto renew is disabled"),
            RenewBlockReason::NotFull { enrolled, target } => {
                write!(f, "campaign is not full ({enrolled}/{target})")
            }
            RenewBlockReason::UnfilledSibling { campaign_id, title } => {
                write!(f, "campaign {campaign_id} ({title}) in the same series is still open")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum RenewOutcome {
    Renewed(campaigns::Model),
    Blocked(RenewBlockReason),
}

impl From<RenewOutcome> for RenewResponse {
    fn from(outcome: RenewOutcome) -> Self {
        match outcome {
            RenewOutcome::Renewed(model) => RenewResponse {
                renewed: true,
                campaign: Some(model.into()),
                blocked_code: None,
                blocked_reason: None,
                sibling_id: None,
            },
            RenewOutcome::Blocked(reason) => RenewResponse {
                renewed: false,
                campaign: None,
                blocked_code: Some(reason.code()),
                sibling_id: match &reason {
                    RenewBlockReason::UnfilledSibling { campaign_id, .. } => Some(*campaign_id),
                    _ => None,
                },
                blocked_reason: Some(reason.to_string()),
            },
        }
    }
}

/// 拼团自动续期：满员后按系列开出下一期
///
/// 同一系列的续期按基础标题串行执行，保证并发触发时最多只开出一期。
#[derive(Clone)]
pub struct RenewService {
    pool: DatabaseConnection,
    series_locks: KeyedLock<String>,
}

impl RenewService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool,
            series_locks: KeyedLock::new(),
        }
    }

    pub async fn try_renew(&self, campaign_id: i64) -> AppResult<RenewOutcome> {
        let campaign = campaigns::Entity::find_by_id(campaign_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".into()))?;

        if !campaign.auto_renew {
            return Ok(RenewOutcome::Blocked(RenewBlockReason::AutoRenewDisabled));
        }
        if !campaign.is_full() {
            return Ok(RenewOutcome::Blocked(RenewBlockReason::NotFull {
                enrolled: campaign.enrolled_quantity,
                target: campaign.target_count,
            }));
        }

        let base = base_title(&campaign.title).to_string();
        let _guard = self.series_locks.lock(base.clone()).await;

        // 前缀只用于缩小查询范围，系列归属以基础标题完全相等为准
        let series: Vec<campaigns::Model> = campaigns::Entity::find()
            .filter(campaigns::Column::Title.starts_with(&base))
            .all(&self.pool)
            .await?
            .into_iter()
            .filter(|c| base_title(&c.title) == base)
            .collect();

        if let Some(sibling) = series
            .iter()
            .find(|c| c.id != campaign.id && !c.is_ended() && !c.is_full())
        {
            log::info!(
                "Renew of campaign {} blocked by unfilled sibling {}",
                campaign.id,
                sibling.id
            );
            return Ok(RenewOutcome::Blocked(RenewBlockReason::UnfilledSibling {
                campaign_id: sibling.id,
                title: sibling.title.clone(),
            }));
        }

        let title = next_series_title(&base, series.iter().map(|c| c.title.as_str()));
        let now = Utc::now();
        let renewed = campaigns::ActiveModel {
            title: Set(title),
            description: Set(campaign.description.clone()),
            features: Set(campaign.features.clone()),
            price: Set(campaign.price),
            target_count: Set(campaign.target_count),
            enrolled_quantity: Set(0),
            status: Set(None),
            auto_renew: Set(campaign.auto_renew),
            is_hot: Set(campaign.is_hot),
            image_url: Set(campaign.image_url.clone()),
            parent_id: Set(Some(campaign.id)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Campaign {} renewed as {} ({})",
            campaign.id,
            renewed.id,
            renewed.title
        );
        Ok(RenewOutcome::Renewed(renewed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CampaignStatus;
    use crate::test_support::setup_db;

    async fn insert_campaign(
        db: &DatabaseConnection,
        title: &str,
        enrolled: i64,
        target: i64,
        auto_renew: bool,
    ) -> campaigns::Model {
        campaigns::ActiveModel {
            title: Set(title.to_string()),
            description: Set(Some("shared plan".into())),
            features: Set(None),
            price: Set(12.5),
            target_count: Set(target),
            enrolled_quantity: Set(enrolled),
            status: Set(None),
            auto_renew: Set(auto_renew),
            is_hot: Set(true),
            image_url: Set(None),
            parent_id: Set(None),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_renew_numbers_after_highest_sibling() {
        let db = setup_db().await;
        let svc = RenewService::new(db.clone());
        insert_campaign(&db, "X", 5, 5, true).await;
        insert_campaign(&db, "X #2", 5, 5, true).await;
        let latest = insert_campaign(&db, "X #5", 5, 5, true).await;
        // 名字相近但不属于同一系列
        insert_campaign(&db, "X Premium", 1, 5, true).await;

        let outcome = svc.try_renew(latest.id).await.unwrap();
        let RenewOutcome::Renewed(model) = outcome else {
            panic!("expected renewal, got {outcome:?}");
        };
        assert_eq!(model.title, "X #6");
        assert_eq!(model.enrolled_quantity, 0);
        assert_eq!(model.parent_id, Some(latest.id));
        assert_eq!(model.price, 12.5);
        assert!(model.is_hot);
    }

    #[tokio::test]
    async fn test_renew_is_blocked_by_unfilled_sibling() {
        let db = setup_db().await;
        let svc = RenewService::new(db.clone());
        let first = insert_campaign(&db, "Y", 3, 3, true).await;

        let RenewOutcome::Renewed(second) = svc.try_renew(first.id).await.unwrap() else {
            panic!("first renewal should succeed");
        };
        assert_eq!(second.title, "Y #2");

        // 重复触发：#2 还没满，不会再开 #3
        let outcome = svc.try_renew(first.id).await.unwrap();
        assert_eq!(
            match outcome {
                RenewOutcome::Blocked(reason) => reason,
                other => panic!("expected block, got {other:?}"),
            },
            RenewBlockReason::UnfilledSibling {
                campaign_id: second.id,
                title: "Y #2".into()
            }
        );
    }

    #[tokio::test]
    async fn test_ended_sibling_does_not_block() {
        let db = setup_db().await;
        let svc = RenewService::new(db.clone());
        let full = insert_campaign(&db, "Z", 4, 4, true).await;
        let stale = insert_campaign(&db, "Z #2", 1, 4, true).await;
        let mut am: campaigns::ActiveModel = stale.into();
        am.status = Set(Some(CampaignStatus::Ended));
        am.update(&db).await.unwrap();

        let RenewOutcome::Renewed(model) = svc.try_renew(full.id).await.unwrap() else {
            panic!("ended sibling must not block renewal");
        };
        assert_eq!(model.title, "Z #3");
    }

    #[tokio::test]
    async fn test_renew_preconditions() {
        let db = setup_db().await;
        let svc = RenewService::new(db.clone());
        let disabled = insert_campaign(&db, "A", 5, 5, false).await;
        let partial = insert_campaign(&db, "B", 2, 5, true).await;

        let response: RenewResponse = svc.try_renew(disabled.id).await.unwrap().into();
        assert!(!response.renewed);
        assert_eq!(response.blocked_code, Some(RenewBlockCode::AutoRenewDisabled));

        let response: RenewResponse = svc.try_renew(partial.id).await.unwrap().into();
        assert_eq!(response.blocked_code, Some(RenewBlockCode::NotFull));

        let err = svc.try_renew(999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_renew_creates_one_successor() {
        let db = setup_db().await;
        let svc = RenewService::new(db.clone());
        let full = insert_campaign(&db, "C", 2, 2, true).await;

        let (a, b) = tokio::join!(svc.try_renew(full.id), svc.try_renew(full.id));
        let renewed = [a.unwrap(), b.unwrap()]
            .into_iter()
            .filter(|o| matches!(o, RenewOutcome::Renewed(_)))
            .count();
        assert_eq!(renewed, 1);

        let count = campaigns::Entity::find()
            .filter(campaigns::Column::Title.eq("C #2"))
            .all(&db)
            .await
            .unwrap()
            .len();
        assert_eq!(count, 1);
    }
}
