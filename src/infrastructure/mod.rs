// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施模块
///
/// 领域端口的具体实现：Redis共享状态原语、数据库连接与
/// 实体映射、仓库实现、外部服务客户端与可观测性。
pub mod cache;
pub mod database;
pub mod observability;
pub mod repositories;
pub mod services;
