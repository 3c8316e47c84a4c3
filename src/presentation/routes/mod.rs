// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::Extension;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::usecases::create_crawl_task::CreateCrawlTaskUseCase;
use crate::domain::repositories::crawl_task_repository::CrawlTaskRepository;
use crate::domain::services::user_agent_provisioner::UserAgentProvisioner;
use crate::presentation::handlers::{
    health_handler, outbox_handler, task_handler, user_agent_handler,
};
use crate::queue::outbox_dispatcher::OutboxDispatcher;

/// 构建应用路由
///
/// # 参数
///
/// * `usecase` - 任务创建用例
/// * `tasks` - 任务仓库
/// * `dispatcher` - Outbox发布管道
/// * `provisioner` - 身份供给编排器
pub fn app_router(
    usecase: Arc<CreateCrawlTaskUseCase>,
    tasks: Arc<dyn CrawlTaskRepository>,
    dispatcher: Arc<OutboxDispatcher>,
    provisioner: Arc<dyn UserAgentProvisioner>,
) -> Router {
    Router::new()
        .route("/health", get(health_handler::health))
        .route("/v1/tasks", post(task_handler::create_task))
        .route("/v1/tasks/{id}", get(task_handler::get_task))
        .route("/admin/outbox/process", post(outbox_handler::process_outbox))
        .route(
            "/admin/user-agents/acquire",
            post(user_agent_handler::acquire_user_agent),
        )
        .layer(Extension(usecase))
        .layer(Extension(tasks))
        .layer(Extension(dispatcher))
        .layer(Extension(provisioner))
        .layer(TraceLayer::new_for_http())
}
