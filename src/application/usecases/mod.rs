// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
pub mod create_crawl_task;

#[cfg(test)]
mod create_crawl_task_test;
