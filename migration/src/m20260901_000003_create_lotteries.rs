use sea_orm_migration::prelude::*;

/// 积分抽奖
#[derive(DeriveIden)]
enum Lotteries {
    Table,
    Id,
    Title,
    Description,
    Prizes,
    DrawAt,
    WinnersCount,
    EntryCost,
    MinParticipants,
    ParticipantCount,
    Status,
    DrawnAt,
    CreatedAt,
    UpdatedAt,
}

/// 抽奖参与记录
#[derive(DeriveIden)]
enum LotteryEntries {
    Table,
    Id,
    LotteryId,
    UserId,
    Cost,
    IsWinner,
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
                    .table(Lotteries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lotteries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lotteries::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Lotteries::Description).text().null())
                    .col(ColumnDef::new(Lotteries::Prizes).json().null())
                    .col(
                        ColumnDef::new(Lotteries::DrawAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Lotteries::WinnersCount)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Lotteries::EntryCost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    // NULL 视为 1
                    .col(
                        ColumnDef::new(Lotteries::MinParticipants)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lotteries::ParticipantCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Lotteries::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Lotteries::DrawnAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lotteries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Lotteries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 自动开奖扫描: status = pending AND draw_at <= now
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_lotteries_status_draw_at")
                    .table(Lotteries::Table)
                    .col(Lotteries::Status)
                    .col(Lotteries::DrawAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LotteryEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LotteryEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LotteryEntries::LotteryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LotteryEntries::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LotteryEntries::Cost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LotteryEntries::IsWinner)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LotteryEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lottery_entries_lottery")
                            .from(LotteryEntries::Table, LotteryEntries::LotteryId)
                            .to(Lotteries::Table, Lotteries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lottery_entries_user")
                            .from(LotteryEntries::Table, LotteryEntries::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个用户每期只能参与一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_lottery_entries_lottery_user_unique")
                    .table(LotteryEntries::Table)
                    .col(LotteryEntries::LotteryId)
                    .col(LotteryEntries::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(LotteryEntries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Lotteries::Table).to_owned())
            .await?;
        Ok(())
    }
}
