use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create user_agents table
        manager
            .create_table(
                Table::create()
                    .table(UserAgents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserAgents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserAgents::AgentKey)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(UserAgents::SessionToken).string())
                    .col(ColumnDef::new(UserAgents::TokenIssuedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(UserAgents::TokenTtlSeconds)
                            .big_integer()
                            .not_null()
                            .default(3600),
                    )
                    .col(ColumnDef::new(UserAgents::Status).string().not_null())
                    .col(ColumnDef::new(UserAgents::LastUsedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(UserAgents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UserAgents::UpdatedAt)
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
                    .name("idx_user_agents_status_last_used")
                    .table(UserAgents::Table)
                    .col(UserAgents::Status)
                    .col(UserAgents::LastUsedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserAgents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserAgents {
    Table,
    Id,
    AgentKey,
    SessionToken,
    TokenIssuedAt,
    TokenTtlSeconds,
    Status,
    LastUsedAt,
    CreatedAt,
    UpdatedAt,
}
