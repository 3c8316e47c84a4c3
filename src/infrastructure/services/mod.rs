// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务模块
///
/// 领域服务端口的具体实现：市场令牌签发客户端与身份
/// 供给编排器。
pub mod marketplace_token_client;
pub mod user_agent_provisioner_impl;

#[cfg(test)]
mod user_agent_provisioner_impl_test;
