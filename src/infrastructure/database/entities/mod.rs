// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
pub mod crawl_task;
pub mod outbox_record;
pub mod user_agent;
