// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块定义跨实例共享资源的原子操作端口与编排接口：
/// - 分布式锁（distributed_lock）：TTL限定的命名互斥原语
/// - 限流器（rate_limiter）：共享令牌桶的原子检查扣减
/// - 熔断器（circuit_breaker）：外部调用护栏
/// - 令牌签发客户端（session_token_client）：市场侧会话签发
/// - 身份供给编排器（user_agent_provisioner）：组合以上端口
///   产出配额清算完毕的身份
///
/// 共享可变状态（池、桶、锁键空间）一律建模为显式的外部
/// 存储端口，不允许进程内单例，正确性依赖跨实例可见性。
pub mod circuit_breaker;
pub mod distributed_lock;
pub mod rate_limiter;
pub mod session_token_client;
pub mod user_agent_provisioner;
