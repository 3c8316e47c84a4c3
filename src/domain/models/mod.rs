// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 爬取任务（crawl_task）：一次针对市场的爬取意图
/// - Outbox记录（outbox_record）：任务的发布意图，与任务同事务创建
/// - 用户代理（user_agent）：池中的一个受配额约束的身份
///
/// 所有状态字段都是封闭的枚举类型，状态转换由实体方法
/// 按总转换表约束，非法转换在边界处被拒绝。
pub mod crawl_task;
pub mod outbox_record;
pub mod user_agent;

#[cfg(test)]
mod transitions_test;
