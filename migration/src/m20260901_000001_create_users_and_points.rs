use sea_orm_migration::prelude::*;

/// 用户表（账号由外部认证服务开通，这里只保存角色与积分余额）
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Role,
    Points,
    CreatedAt,
    UpdatedAt,
}

/// 积分流水（只追加，不修改）
#[derive(DeriveIden)]
enum PointLogs {
    Table,
    Id,
    UserId,
    Amount,
    Kind,
    Reason,
    BalanceAfter,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Users::Points)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PointLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PointLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PointLogs::UserId).big_integer().not_null())
                    // 有符号：earn 为正，spend 为负
                    .col(ColumnDef::new(PointLogs::Amount).big_integer().not_null())
                    .col(ColumnDef::new(PointLogs::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(PointLogs::Reason).string_len(255).not_null())
                    .col(
                        ColumnDef::new(PointLogs::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_point_logs_user")
                            .from(PointLogs::Table, PointLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_logs_user")
                    .table(PointLogs::Table)
                    .col(PointLogs::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(PointLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
