// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::usecases::create_crawl_task::CreateTaskError;
use crate::domain::repositories::crawl_task_repository::RepositoryError;
use crate::domain::services::user_agent_provisioner::ProvisionError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口。
/// 资源竞争类信号映射为可重试的状态码，基础设施故障
/// 一律500。
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(e) = self.0.downcast_ref::<ProvisionError>() {
            return provision_error_response(e);
        }

        let status = match self.0.downcast_ref::<CreateTaskError>() {
            Some(CreateTaskError::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(CreateTaskError::Repository(RepositoryError::NotFound)) => StatusCode::NOT_FOUND,
            Some(CreateTaskError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            None => match self.0.downcast_ref::<RepositoryError>() {
                Some(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

fn provision_error_response(e: &ProvisionError) -> Response {
    match e {
        ProvisionError::RateLimited { retry_after_ms, .. } => {
            let body = Json(json!({
                "error": e.to_string(),
                "retry_after_ms": retry_after_ms,
            }));
            (StatusCode::TOO_MANY_REQUESTS, body).into_response()
        }
        ProvisionError::LockContended { .. } => {
            let body = Json(json!({ "error": e.to_string() }));
            (StatusCode::CONFLICT, body).into_response()
        }
        ProvisionError::PoolExhausted | ProvisionError::CircuitOpen { .. } => {
            let body = Json(json!({ "error": e.to_string() }));
            (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
        }
        ProvisionError::Issuance(_) => {
            let body = Json(json!({ "error": e.to_string() }));
            (StatusCode::BAD_GATEWAY, body).into_response()
        }
        _ => {
            let body = Json(json!({ "error": e.to_string() }));
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
