// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
pub mod crawl_task_repo_impl;
pub mod outbox_repo_impl;
pub mod user_agent_repo_impl;

#[cfg(test)]
mod outbox_repo_impl_test;
#[cfg(test)]
mod user_agent_repo_impl_test;
