// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::Extension;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::presentation::errors::AppError;
use crate::queue::outbox_dispatcher::OutboxDispatcher;

/// 手动触发一轮Outbox扫描
///
/// 运维入口，和周期扫描完全等价。
pub async fn process_outbox(
    Extension(dispatcher): Extension<Arc<OutboxDispatcher>>,
) -> Result<Json<Value>, AppError> {
    let processed = dispatcher.sweep().await?;
    Ok(Json(json!({ "processed": processed })))
}
