// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_task::{CrawlTask, CrawlTaskStatus};
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 爬取任务仓库特质
///
/// 定义任务数据访问接口。任务从不删除，只做状态转换。
#[async_trait]
pub trait CrawlTaskRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, task: &CrawlTask) -> Result<CrawlTask, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrawlTask>, RepositoryError>;
    /// 更新任务状态
    async fn update_status(
        &self,
        id: Uuid,
        status: CrawlTaskStatus,
    ) -> Result<(), RepositoryError>;
    /// 根据卖家ID查找任务
    async fn find_by_seller_id(&self, seller_id: Uuid) -> Result<Vec<CrawlTask>, RepositoryError>;
}
