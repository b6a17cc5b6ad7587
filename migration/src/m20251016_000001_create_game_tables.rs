use sea_orm_migration::prelude::*;

/// Prizes (奖品配置表, 按商户划分)
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    EstablishmentId,
    Name,
    Quantity,
    RemainingQuantity,
    Weight,
    CostCents,
    CreatedAt,
    UpdatedAt,
}

/// Participants (参与记录 / 中奖记录)
#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    EstablishmentId,
    Email,
    Phone,
    ParticipatedAt,
    PrizeId,
    PrizeName,
    PrizeCode,
    Redeemed,
    RedeemedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 约束说明:
/// - remaining_quantity 在 0..=quantity 之间 (CHECK)
/// - 同一商户下 email / phone / prize_code 各自唯一 (NULL 不参与唯一性比较)
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 奖品表
        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Prizes::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Prizes::EstablishmentId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Prizes::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Prizes::Quantity)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Prizes::Quantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Prizes::RemainingQuantity)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Prizes::RemainingQuantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Prizes::Weight)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .col(
                        ColumnDef::new(Prizes::CostCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Prizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Prizes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .check(
                        Expr::col(Prizes::RemainingQuantity).lte(Expr::col(Prizes::Quantity)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prizes_establishment")
                    .table(Prizes::Table)
                    .col(Prizes::EstablishmentId)
                    .to_owned(),
            )
            .await?;

        // 参与记录表
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participants::EstablishmentId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Participants::Email).string_len(320).null())
                    .col(ColumnDef::new(Participants::Phone).string_len(32).null())
                    .col(
                        ColumnDef::new(Participants::ParticipatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Participants::PrizeId).uuid().not_null())
                    .col(
                        ColumnDef::new(Participants::PrizeName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::PrizeCode)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::Redeemed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Participants::RedeemedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一商户一人一次: email / phone 各自唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_establishment_email_unique")
                    .table(Participants::Table)
                    .col(Participants::EstablishmentId)
                    .col(Participants::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_establishment_phone_unique")
                    .table(Participants::Table)
                    .col(Participants::EstablishmentId)
                    .col(Participants::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_establishment_code_unique")
                    .table(Participants::Table)
                    .col(Participants::EstablishmentId)
                    .col(Participants::PrizeCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 外键（不级联删除，参与记录保留奖品快照）
        manager
            .alter_table(
                Table::alter()
                    .table(Participants::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_participants_prize")
                            .from_tbl(Participants::Table)
                            .from_col(Participants::PrizeId)
                            .to_tbl(Prizes::Table)
                            .to_col(Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：参与记录 -> 奖品
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Participants::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;

        Ok(())
    }
}
