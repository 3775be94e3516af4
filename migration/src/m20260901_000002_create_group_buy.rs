use sea_orm_migration::prelude::*;

/// 拼团活动
#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    Title,
    Description,
    Features,
    Price,
    TargetCount,
    EnrolledQuantity,
    Status,
    AutoRenew,
    IsHot,
    ImageUrl,
    ParentId,
    CreatedAt,
    UpdatedAt,
}

/// 拼团成员
#[derive(DeriveIden)]
enum CampaignParticipants {
    Table,
    Id,
    CampaignId,
    UserId,
    Quantity,
    Contact,
    Contacted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 状态说明:
/// - status 只保存人工覆盖值 (open / ended)，NULL 表示按人数推导
/// - locked 永远是推导出来的 (enrolled_quantity >= target_count)，不落库
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Campaigns::Description).text().null())
                    .col(ColumnDef::new(Campaigns::Features).json().null())
                    .col(
                        ColumnDef::new(Campaigns::Price)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::TargetCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::EnrolledQuantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Campaigns::Status).string_len(16).null())
                    .col(
                        ColumnDef::new(Campaigns::AutoRenew)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Campaigns::IsHot)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Campaigns::ImageUrl).string_len(512).null())
                    .col(ColumnDef::new(Campaigns::ParentId).big_integer().null())
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaigns_parent")
                            .from(Campaigns::Table, Campaigns::ParentId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 续期时按标题前缀扫描同系列
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaigns_title")
                    .table(Campaigns::Table)
                    .col(Campaigns::Title)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CampaignParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignParticipants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CampaignParticipants::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignParticipants::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignParticipants::Quantity)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(CampaignParticipants::Contact)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CampaignParticipants::Contacted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CampaignParticipants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CampaignParticipants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_participants_campaign")
                            .from(CampaignParticipants::Table, CampaignParticipants::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_participants_user")
                            .from(CampaignParticipants::Table, CampaignParticipants::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一活动同一用户只能有一行
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaign_participants_campaign_user_unique")
                    .table(CampaignParticipants::Table)
                    .col(CampaignParticipants::CampaignId)
                    .col(CampaignParticipants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaign_participants_user")
                    .table(CampaignParticipants::Table)
                    .col(CampaignParticipants::UserId)
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
                    .table(CampaignParticipants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Campaigns::Table).to_owned())
            .await?;
        Ok(())
    }
}
