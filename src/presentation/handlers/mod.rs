// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 处理器模块
pub mod health_handler;
pub mod outbox_handler;
pub mod task_handler;
pub mod user_agent_handler;
