use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create crawl_tasks table
        manager
            .create_table(
                Table::create()
                    .table(CrawlTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrawlTasks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrawlTasks::SchedulerId).uuid().not_null())
                    .col(ColumnDef::new(CrawlTasks::SellerId).uuid().not_null())
                    .col(ColumnDef::new(CrawlTasks::TaskType).string().not_null())
                    .col(ColumnDef::new(CrawlTasks::Endpoint).string().not_null())
                    .col(ColumnDef::new(CrawlTasks::Status).string().not_null())
                    .col(
                        ColumnDef::new(CrawlTasks::IdempotencyKey)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CrawlTasks::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CrawlTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CrawlTasks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crawl_tasks_status")
                    .table(CrawlTasks::Table)
                    .col(CrawlTasks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crawl_tasks_seller_id")
                    .table(CrawlTasks::Table)
                    .col(CrawlTasks::SellerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrawlTasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CrawlTasks {
    Table,
    Id,
    SchedulerId,
    SellerId,
    TaskType,
    Endpoint,
    Status,
    IdempotencyKey,
    RetryCount,
    CreatedAt,
    UpdatedAt,
}
