// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::Extension;
use axum::Json;
use std::sync::Arc;

use crate::domain::services::user_agent_provisioner::{ProvisionedUserAgent, UserAgentProvisioner};
use crate::presentation::errors::AppError;

/// 取得一个配额清算完毕的身份
///
/// 竞争信号（锁占用、限流）映射为可重试的状态码，调用方
/// 按响应中的提示退避。
pub async fn acquire_user_agent(
    Extension(provisioner): Extension<Arc<dyn UserAgentProvisioner>>,
) -> Result<Json<ProvisionedUserAgent>, AppError> {
    let provisioned = provisioner.acquire().await?;
    Ok(Json(provisioned))
}
