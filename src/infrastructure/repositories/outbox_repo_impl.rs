// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_task::CrawlTask;
use crate::domain::models::outbox_record::{OutboxRecord, OutboxStatus};
use crate::domain::repositories::crawl_task_repository::RepositoryError;
use crate::domain::repositories::outbox_repository::OutboxRepository;
use crate::infrastructure::database::entities::crawl_task as task_entity;
use crate::infrastructure::database::entities::outbox_record as outbox_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// Outbox仓库实现
///
/// 领取操作在单个事务内完成"行锁选取 + 转入Processing"，
/// 配合SKIP LOCKED保证并发扫描的实例各自领到互不重叠的
/// 记录。发布调用本身永远不在这些事务里。
#[derive(Clone)]
pub struct OutboxRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl OutboxRepositoryImpl {
    /// 创建新的Outbox仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 可重新尝试条件：Pending且到达重试时间，或Failed未
    /// 超限且到达重试时间
    fn retryable_condition() -> Condition {
        let due = Condition::any()
            .add(outbox_entity::Column::NextAttemptAt.is_null())
            .add(outbox_entity::Column::NextAttemptAt.lte(Utc::now()));

        Condition::any()
            .add(
                Condition::all()
                    .add(outbox_entity::Column::Status.eq(OutboxStatus::Pending.to_string()))
                    .add(due.clone()),
            )
            .add(
                Condition::all()
                    .add(outbox_entity::Column::Status.eq(OutboxStatus::Failed.to_string()))
                    .add(
                        Expr::col(outbox_entity::Column::RetryCount)
                            .lt(Expr::col(outbox_entity::Column::MaxRetries)),
                    )
                    .add(due),
            )
    }

    /// 领取条件：可重新尝试的记录，加上Processing卡滞超过
    /// 阈值的记录（崩溃恢复）
    fn claimable_condition(stale_threshold: chrono::DateTime<Utc>) -> Condition {
        Self::retryable_condition().add(
            Condition::all()
                .add(outbox_entity::Column::Status.eq(OutboxStatus::Processing.to_string()))
                .add(outbox_entity::Column::ProcessingAt.lte(stale_threshold)),
        )
    }
}

impl From<outbox_entity::Model> for OutboxRecord {
    fn from(model: outbox_entity::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            idempotency_key: model.idempotency_key,
            payload: model.payload,
            status: model.status.parse().unwrap_or_default(),
            retry_count: model.retry_count,
            max_retries: model.max_retries,
            error_message: model.error_message,
            created_at: model.created_at,
            processing_at: model.processing_at,
            processed_at: model.processed_at,
            next_attempt_at: model.next_attempt_at,
        }
    }
}

impl From<OutboxRecord> for outbox_entity::ActiveModel {
    fn from(record: OutboxRecord) -> Self {
        Self {
            id: Set(record.id),
            task_id: Set(record.task_id),
            idempotency_key: Set(record.idempotency_key.clone()),
            payload: Set(record.payload.clone()),
            status: Set(record.status.to_string()),
            retry_count: Set(record.retry_count),
            max_retries: Set(record.max_retries),
            error_message: Set(record.error_message.clone()),
            created_at: Set(record.created_at),
            processing_at: Set(record.processing_at),
            processed_at: Set(record.processed_at),
            next_attempt_at: Set(record.next_attempt_at),
        }
    }
}

#[async_trait]
impl OutboxRepository for OutboxRepositoryImpl {
    async fn create_with_task(
        &self,
        task: &CrawlTask,
        record: &OutboxRecord,
    ) -> Result<OutboxRecord, RepositoryError> {
        let txn = self.db.begin().await?;

        let task_model: task_entity::ActiveModel = task.clone().into();
        task_model.insert(&txn).await?;

        let record_model: outbox_entity::ActiveModel = record.clone().into();
        record_model.insert(&txn).await?;

        txn.commit().await?;
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OutboxRecord>, RepositoryError> {
        let model = outbox_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<OutboxRecord>, RepositoryError> {
        let model = outbox_entity::Entity::find()
            .filter(outbox_entity::Column::IdempotencyKey.eq(idempotency_key))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn claim_due(
        &self,
        batch_size: u64,
        stale_after: chrono::Duration,
    ) -> Result<Vec<OutboxRecord>, RepositoryError> {
        let txn = self.db.begin().await?;
        let stale_threshold = Utc::now() - stale_after;

        let models = outbox_entity::Entity::find()
            .filter(Self::claimable_condition(stale_threshold))
            .order_by_asc(outbox_entity::Column::CreatedAt)
            .limit(batch_size)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .all(&txn)
            .await?;

        let mut claimed = Vec::with_capacity(models.len());
        for model in models {
            let mut active: outbox_entity::ActiveModel = model.into();
            active.status = Set(OutboxStatus::Processing.to_string());
            active.processing_at = Set(Some(Utc::now().into()));
            let updated = active.update(&txn).await?;
            claimed.push(updated.into());
        }

        txn.commit().await?;
        Ok(claimed)
    }

    async fn claim_one(&self, id: Uuid) -> Result<Option<OutboxRecord>, RepositoryError> {
        let txn = self.db.begin().await?;

        let model = outbox_entity::Entity::find()
            .filter(outbox_entity::Column::Id.eq(id))
            .filter(Self::retryable_condition())
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&txn)
            .await?;

        let claimed = if let Some(model) = model {
            let mut active: outbox_entity::ActiveModel = model.into();
            active.status = Set(OutboxStatus::Processing.to_string());
            active.processing_at = Set(Some(Utc::now().into()));
            let updated = active.update(&txn).await?;
            Some(updated.into())
        } else {
            None
        };

        txn.commit().await?;
        Ok(claimed)
    }

    async fn update(&self, record: &OutboxRecord) -> Result<OutboxRecord, RepositoryError> {
        let model: outbox_entity::ActiveModel = record.clone().into();
        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }
}
