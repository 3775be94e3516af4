use crate::entities::{PointKind, point_log_entity as point_logs, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{PaginatedResponse, PaginationParams, PointBalanceResponse, PointLogResponse};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 积分账本
///
/// 余额变动与流水写入在同一事务中完成：
/// - 余额使用 `points = points ± amount` 原子更新，并发来源不会丢失更新
/// - 扣减额外带 `points >= amount` 条件，余额不足时不会写入任何内容
/// - 流水写入失败会回滚余额，保证余额始终等于流水之和
#[derive(Clone)]
pub struct PointsService {
    pool: DatabaseConnection,
}

impl PointsService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 变动积分并返回新余额
    pub async fn apply_delta(
        &self,
        user_id: i64,
        amount: i64,
        reason: &str,
        kind: PointKind,
    ) -> AppResult<i64> {
        let txn = self.pool.begin().await?;
        let balance = Self::apply_delta_in(&txn, user_id, amount, reason, kind).await?;
        txn.commit().await?;
        Ok(balance)
    }

    /// 在调用方的事务（或连接）中变动积分
    pub async fn apply_delta_in<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        amount: i64,
        reason: &str,
        kind: PointKind,
    ) -> AppResult<i64> {
        if amount < 0 {
            return Err(AppError::ValidationError(
                "Point amount must not be negative".into(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Point change reason is required".into(),
            ));
        }

        let delta = kind.signed(amount);
        let mut update = users::Entity::update_many()
            .col_expr(users::Column::Points, Expr::col(users::Column::Points).add(delta))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id));
        if kind == PointKind::Spend {
            update = update.filter(users::Column::Points.gte(amount));
        }
        let result = update.exec(db).await?;

        if result.rows_affected == 0 {
            let user = users::Entity::find_by_id(user_id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".into()))?;
            return Err(AppError::InsufficientPoints {
                required: amount,
                available: user.points,
            });
        }

        let balance = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .map(|u| u.points)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        point_logs::ActiveModel {
            user_id: Set(user_id),
            amount: Set(delta),
            kind: Set(kind),
            reason: Set(reason.to_string()),
            balance_after: Set(balance),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(db)
        .await?;

        log::info!("Points {kind} {amount} for user {user_id} ({reason}), balance {balance}");
        Ok(balance)
    }

    pub async fn balance(&self, user_id: i64) -> AppResult<PointBalanceResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        Ok(PointBalanceResponse {
            user_id,
            points: user.points,
        })
    }

    /// 积分流水（倒序分页）
    pub async fn list_logs(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PointLogResponse>> {
        let base_query =
            point_logs::Entity::find().filter(point_logs::Column::UserId.eq(user_id));

        let total = base_query.clone().count(&self.pool).await?;

        let items = base_query
            .order_by_desc(point_logs::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(PointLogResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_user, setup_db};

    async fn log_sum(db: &DatabaseConnection, user_id: i64) -> i64 {
        point_logs::Entity::find()
            .filter(point_logs::Column::UserId.eq(user_id))
            .all(db)
            .await
            .unwrap()
            .iter()
            .map(|l| l.amount)
            .sum()
    }

    #[tokio::test]
    async fn test_earn_and_spend_keep_balance_equal_to_log_sum() {
        let db = setup_db().await;
        let user = create_user(&db, "alice").await;
        let svc = PointsService::new(db.clone());

        assert_eq!(svc.apply_delta(user.id, 50, "bonus", PointKind::Earn).await.unwrap(), 50);
        assert_eq!(svc.apply_delta(user.id, 20, "shop", PointKind::Spend).await.unwrap(), 30);
        assert_eq!(svc.apply_delta(user.id, 5, "bonus", PointKind::Earn).await.unwrap(), 35);

        let balance = svc.balance(user.id).await.unwrap();
        assert_eq!(balance.points, 35);
        assert_eq!(log_sum(&db, user.id).await, 35);

        let logs = svc
            .list_logs(user.id, &PaginationParams::new(None, None))
            .await
            .unwrap();
        assert_eq!(logs.total, 3);
        // 最新的在前
        assert_eq!(logs.data[0].amount, 5);
        assert_eq!(logs.data[1].amount, -20);
        assert_eq!(logs.data[1].balance_after, 30);
    }

    #[tokio::test]
    async fn test_spend_more_than_balance_is_rejected_without_writes() {
        let db = setup_db().await;
        let user = create_user(&db, "bob").await;
        let svc = PointsService::new(db.clone());
        svc.apply_delta(user.id, 10, "bonus", PointKind::Earn).await.unwrap();

        let err = svc
            .apply_delta(user.id, 11, "shop", PointKind::Spend)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientPoints {
                required: 11,
                available: 10
            }
        ));
        assert_eq!(svc.balance(user.id).await.unwrap().points, 10);
        assert_eq!(log_sum(&db, user.id).await, 10);
    }

    #[tokio::test]
    async fn test_unknown_user_and_bad_amount() {
        let db = setup_db().await;
        let svc = PointsService::new(db.clone());

        let err = svc.apply_delta(999, 5, "bonus", PointKind::Earn).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let user = create_user(&db, "carol").await;
        let err = svc
            .apply_delta(user.id, -5, "bonus", PointKind::Earn)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
