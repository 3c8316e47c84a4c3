// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::usecases::create_crawl_task::{
    CreateCrawlTaskRequest, CreateCrawlTaskUseCase,
};
use crate::domain::models::crawl_task::CrawlTask;
use crate::domain::repositories::crawl_task_repository::{CrawlTaskRepository, RepositoryError};
use crate::presentation::errors::AppError;

/// 创建爬取任务
///
/// 任务与其Outbox记录在同一事务中落库后立即返回，消息
/// 发布异步进行。
pub async fn create_task(
    Extension(usecase): Extension<Arc<CreateCrawlTaskUseCase>>,
    Json(request): Json<CreateCrawlTaskRequest>,
) -> Result<(StatusCode, Json<CrawlTask>), AppError> {
    let task = usecase.execute(request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// 查询单个任务
pub async fn get_task(
    Extension(repo): Extension<Arc<dyn CrawlTaskRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CrawlTask>, AppError> {
    let task = repo
        .find_by_id(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(Json(task))
}
