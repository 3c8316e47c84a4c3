use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create outbox_records table
        manager
            .create_table(
                Table::create()
                    .table(OutboxRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OutboxRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OutboxRecords::TaskId).uuid().not_null())
                    .col(
                        ColumnDef::new(OutboxRecords::IdempotencyKey)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(OutboxRecords::Payload).json().not_null())
                    .col(ColumnDef::new(OutboxRecords::Status).string().not_null())
                    .col(
                        ColumnDef::new(OutboxRecords::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OutboxRecords::MaxRetries)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(OutboxRecords::ErrorMessage).string())
                    .col(
                        ColumnDef::new(OutboxRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(OutboxRecords::ProcessingAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(OutboxRecords::ProcessedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(OutboxRecords::NextAttemptAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_outbox_records_status")
                    .table(OutboxRecords::Table)
                    .col(OutboxRecords::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_outbox_records_created_at")
                    .table(OutboxRecords::Table)
                    .col(OutboxRecords::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OutboxRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OutboxRecords {
    Table,
    Id,
    TaskId,
    IdempotencyKey,
    Payload,
    Status,
    RetryCount,
    MaxRetries,
    ErrorMessage,
    CreatedAt,
    ProcessingAt,
    ProcessedAt,
    NextAttemptAt,
}
