//! 测试用的内存 SQLite 数据库（使用真实迁移建表）

use crate::entities::{UserRole, user_entity as users};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

/// 内存库只能用单连接，否则每个连接看到的是不同的库
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> users::Model {
    create_user_with_role(db, username, UserRole::User).await
}

pub async fn create_user_with_role(
    db: &DatabaseConnection,
    username: &str,
    role: UserRole,
) -> users::Model {
    users::ActiveModel {
        username: Set(username.to_string()),
        role: Set(role),
        points: Set(0),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}
