use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Checkins {
    Table,
    Id,
    UserId,
    CheckinDate,
    Points,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Checkins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Checkins::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Checkins::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Checkins::CheckinDate).date().not_null())
                    .col(
                        ColumnDef::new(Checkins::Points)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Checkins::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_checkins_user")
                            .from(Checkins::Table, Checkins::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每人每天一次，签到的幂等性依赖这个唯一索引 (ON CONFLICT DO NOTHING)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_checkins_user_date_unique")
                    .table(Checkins::Table)
                    .col(Checkins::UserId)
                    .col(Checkins::CheckinDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Checkins::Table).to_owned())
            .await?;
        Ok(())
    }
}
