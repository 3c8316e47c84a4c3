// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::user_agent::{UserAgent, UserAgentStatus};
use crate::domain::repositories::crawl_task_repository::RepositoryError;
use crate::domain::repositories::user_agent_repository::UserAgentRepository;
use crate::infrastructure::database::entities::user_agent as agent_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{LockBehavior, LockType, NullOrdering},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 用户代理仓库实现
///
/// LRU选择在一个短事务内完成"行锁选取最旧 + 推到队尾"，
/// 行锁配SKIP LOCKED让并发调用者各自拿到不同的身份，
/// 而不是全部撞在同一个最旧身份上。
#[derive(Clone)]
pub struct UserAgentRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl UserAgentRepositoryImpl {
    /// 创建新的用户代理仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<agent_entity::Model> for UserAgent {
    fn from(model: agent_entity::Model) -> Self {
        Self {
            id: model.id,
            agent_key: model.agent_key,
            session_token: model.session_token,
            token_issued_at: model.token_issued_at,
            token_ttl_seconds: model.token_ttl_seconds,
            status: model.status.parse().unwrap_or_default(),
            last_used_at: model.last_used_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<UserAgent> for agent_entity::ActiveModel {
    fn from(agent: UserAgent) -> Self {
        Self {
            id: Set(agent.id),
            agent_key: Set(agent.agent_key.clone()),
            session_token: Set(agent.session_token.clone()),
            token_issued_at: Set(agent.token_issued_at),
            token_ttl_seconds: Set(agent.token_ttl_seconds),
            status: Set(agent.status.to_string()),
            last_used_at: Set(agent.last_used_at),
            created_at: Set(agent.created_at),
            updated_at: Set(agent.updated_at),
        }
    }
}

#[async_trait]
impl UserAgentRepository for UserAgentRepositoryImpl {
    async fn create(&self, agent: &UserAgent) -> Result<UserAgent, RepositoryError> {
        let model: agent_entity::ActiveModel = agent.clone().into();

        model.insert(self.db.as_ref()).await?;
        Ok(agent.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAgent>, RepositoryError> {
        let model = agent_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn acquire_least_recently_used(&self) -> Result<Option<UserAgent>, RepositoryError> {
        let txn = self.db.begin().await?;

        // 显式NULLS FIRST：Postgres的ASC默认把NULL排最后，
        // 不显式声明会让从未用过的身份被无限饿死
        let model = agent_entity::Entity::find()
            .filter(agent_entity::Column::Status.eq(UserAgentStatus::Active.to_string()))
            .order_by_with_nulls(
                agent_entity::Column::LastUsedAt,
                Order::Asc,
                NullOrdering::First,
            )
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&txn)
            .await?;

        let acquired = if let Some(model) = model {
            let mut active: agent_entity::ActiveModel = model.into();
            active.last_used_at = Set(Some(Utc::now().into()));
            active.updated_at = Set(Utc::now().into());
            let updated = active.update(&txn).await?;
            Some(updated.into())
        } else {
            None
        };

        txn.commit().await?;
        Ok(acquired)
    }

    async fn save_token(
        &self,
        id: Uuid,
        token: &str,
        issued_at: DateTime<Utc>,
        ttl_seconds: i64,
    ) -> Result<(), RepositoryError> {
        let model = agent_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: agent_entity::ActiveModel = model.into();
        active.session_token = Set(Some(token.to_owned()));
        active.token_issued_at = Set(Some(issued_at.into()));
        active.token_ttl_seconds = Set(ttl_seconds);
        active.updated_at = Set(Utc::now().into());
        active.update(self.db.as_ref()).await?;

        Ok(())
    }

    async fn record_usage(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let model = agent_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: agent_entity::ActiveModel = model.into();
        active.last_used_at = Set(Some(used_at.into()));
        active.updated_at = Set(Utc::now().into());
        active.update(self.db.as_ref()).await?;

        Ok(())
    }
}
