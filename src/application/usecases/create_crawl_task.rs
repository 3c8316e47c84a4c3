// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::domain::models::crawl_task::{CrawlTask, CrawlTaskType};
use crate::domain::models::outbox_record::OutboxRecord;
use crate::domain::repositories::crawl_task_repository::RepositoryError;
use crate::domain::repositories::outbox_repository::OutboxRepository;
use crate::queue::outbox_dispatcher::OutboxDispatcher;

/// 创建任务请求DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCrawlTaskRequest {
    /// 调度器ID
    pub scheduler_id: Uuid,
    /// 卖家ID
    pub seller_id: Uuid,
    /// 任务类型
    pub task_type: CrawlTaskType,
    /// 目标端点URL
    pub endpoint: String,
}

/// 创建任务错误类型
#[derive(Error, Debug)]
pub enum CreateTaskError {
    /// 请求校验失败
    #[error("Validation error: {0}")]
    Validation(String),

    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 创建爬取任务用例
///
/// 事务性Outbox的写入侧：任务与Outbox记录在同一个本地
/// 事务中落库，提交后触发一次尽力而为的立即发布。事件
/// 触发失败不影响任务创建结果，周期扫描会兜底。
pub struct CreateCrawlTaskUseCase {
    outbox: Arc<dyn OutboxRepository>,
    dispatcher: Arc<OutboxDispatcher>,
}

impl CreateCrawlTaskUseCase {
    /// 创建新的用例实例
    pub fn new(outbox: Arc<dyn OutboxRepository>, dispatcher: Arc<OutboxDispatcher>) -> Self {
        Self { outbox, dispatcher }
    }

    /// 执行任务创建
    ///
    /// # 参数
    ///
    /// * `request` - 创建任务请求
    ///
    /// # 返回值
    ///
    /// 返回已持久化的任务
    pub async fn execute(
        &self,
        request: CreateCrawlTaskRequest,
    ) -> Result<CrawlTask, CreateTaskError> {
        Url::parse(&request.endpoint)
            .map_err(|e| CreateTaskError::Validation(format!("Invalid endpoint URL: {}", e)))?;

        let task = CrawlTask::new(
            request.scheduler_id,
            request.seller_id,
            request.task_type,
            request.endpoint,
        );

        let record = OutboxRecord::new(
            task.id,
            task.idempotency_key.clone(),
            json!({
                "task_id": task.id,
                "scheduler_id": task.scheduler_id,
                "seller_id": task.seller_id,
                "task_type": task.task_type,
                "endpoint": task.endpoint,
                "idempotency_key": task.idempotency_key,
            }),
        );

        self.outbox.create_with_task(&task, &record).await?;

        // 提交后的事件触发，失败留给周期扫描
        let dispatcher = self.dispatcher.clone();
        let record_id = record.id;
        tokio::spawn(async move {
            if let Err(e) = dispatcher.process_one(record_id).await {
                warn!(record_id = %record_id, error = %e, "Post-commit dispatch failed");
            }
        });

        Ok(task)
    }
}
