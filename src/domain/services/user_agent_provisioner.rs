// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::repositories::crawl_task_repository::RepositoryError;
use crate::domain::services::circuit_breaker::CircuitBreakerError;
use crate::domain::services::distributed_lock::LockError;
use crate::domain::services::rate_limiter::RateLimitError;
use crate::domain::services::session_token_client::TokenClientError;

/// 已完成配额清算的身份
///
/// 编排器的产出：持有有效令牌且本次配额已扣减的身份。
/// 调用方借用而不拥有该身份。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedUserAgent {
    /// 身份ID
    pub user_agent_id: Uuid,
    /// 身份字符串
    pub agent_key: String,
    /// 当前有效的会话令牌
    pub session_token: String,
    /// 本次消费后桶内剩余令牌数
    pub remaining_tokens: f64,
}

/// 身份供给错误分类
///
/// 资源竞争（锁、限流）是预期内的非致命信号，携带重试
/// 提示；池耗尽是独立的运维信号；外部依赖失败带来源。
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// 身份锁被占用，属正常竞争
    #[error("User agent {agent_key} is locked by another caller")]
    LockContended { agent_key: String },

    /// 配额不足，携带重试等待提示
    #[error("Rate limited for {agent_key}, retry after {retry_after_ms}ms")]
    RateLimited {
        agent_key: String,
        retry_after_ms: u64,
    },

    /// 池中没有任何Active身份，运维告警条件
    #[error("No active user agent available in the pool")]
    PoolExhausted,

    /// 熔断器打开，快速失败，未发起外部调用
    #[error("Circuit breaker open for {agent_key}")]
    CircuitOpen { agent_key: String },

    /// 外部令牌签发失败
    #[error("Token issuance failed: {0}")]
    Issuance(#[from] TokenClientError),

    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 分布式锁基础设施错误
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    /// 限流器基础设施错误
    #[error("Rate limiter error: {0}")]
    RateLimiter(#[from] RateLimitError),

    /// 熔断器基础设施错误
    #[error("Circuit breaker error: {0}")]
    CircuitBreaker(#[from] CircuitBreakerError),
}

/// 身份供给编排器特质
///
/// 每次调用执行 SELECT → LOCK → LOAD →（过期则REISSUE）→
/// RATE-CHECK → CONSUME+RECORD → RELEASE 流程，所有退出
/// 路径都保证释放锁。每次调用至多一次外部签发，不做内部
/// 重试，保持临界区短小。
#[async_trait]
pub trait UserAgentProvisioner: Send + Sync {
    /// 取得下一个可用身份
    async fn acquire(&self) -> Result<ProvisionedUserAgent, ProvisionError>;
}
