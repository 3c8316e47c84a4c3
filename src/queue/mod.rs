// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// Outbox管道的下游出口与发布调度：消息发布端口及其
/// SQS实现，发布管道负责领取记录、推进状态机与退避重试。
pub mod message_publisher;
pub mod outbox_dispatcher;
