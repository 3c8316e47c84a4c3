// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_task::{CrawlTask, CrawlTaskStatus};
use crate::domain::repositories::crawl_task_repository::{CrawlTaskRepository, RepositoryError};
use crate::infrastructure::database::entities::crawl_task as task_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 爬取任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层
#[derive(Clone)]
pub struct CrawlTaskRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl CrawlTaskRepositoryImpl {
    /// 创建新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<task_entity::Model> for CrawlTask {
    fn from(model: task_entity::Model) -> Self {
        Self {
            id: model.id,
            scheduler_id: model.scheduler_id,
            seller_id: model.seller_id,
            task_type: model.task_type.parse().unwrap_or_default(),
            endpoint: model.endpoint,
            status: model.status.parse().unwrap_or_default(),
            idempotency_key: model.idempotency_key,
            retry_count: model.retry_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<CrawlTask> for task_entity::ActiveModel {
    fn from(task: CrawlTask) -> Self {
        Self {
            id: Set(task.id),
            scheduler_id: Set(task.scheduler_id),
            seller_id: Set(task.seller_id),
            task_type: Set(task.task_type.to_string()),
            endpoint: Set(task.endpoint.clone()),
            status: Set(task.status.to_string()),
            idempotency_key: Set(task.idempotency_key.clone()),
            retry_count: Set(task.retry_count),
            created_at: Set(task.created_at),
            updated_at: Set(task.updated_at),
        }
    }
}

#[async_trait]
impl CrawlTaskRepository for CrawlTaskRepositoryImpl {
    async fn create(&self, task: &CrawlTask) -> Result<CrawlTask, RepositoryError> {
        let model: task_entity::ActiveModel = task.clone().into();

        model.insert(self.db.as_ref()).await?;
        Ok(task.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrawlTask>, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: CrawlTaskStatus,
    ) -> Result<(), RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: task_entity::ActiveModel = model.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(self.db.as_ref()).await?;

        Ok(())
    }

    async fn find_by_seller_id(&self, seller_id: Uuid) -> Result<Vec<CrawlTask>, RepositoryError> {
        let models = task_entity::Entity::find()
            .filter(task_entity::Column::SellerId.eq(seller_id))
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(CrawlTask::from).collect())
    }
}
