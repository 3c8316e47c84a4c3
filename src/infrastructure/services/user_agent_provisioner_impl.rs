// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::models::user_agent::UserAgent;
use crate::domain::repositories::crawl_task_repository::RepositoryError;
use crate::domain::repositories::user_agent_repository::UserAgentRepository;
use crate::domain::services::circuit_breaker::CircuitBreaker;
use crate::domain::services::distributed_lock::DistributedLock;
use crate::domain::services::rate_limiter::{RateLimitPolicy, RateLimiter};
use crate::domain::services::session_token_client::SessionTokenClient;
use crate::domain::services::user_agent_provisioner::{
    ProvisionError, ProvisionedUserAgent, UserAgentProvisioner,
};

/// 身份供给编排器实现
///
/// 串联池选择、分布式锁、令牌签发、熔断器与令牌桶：
/// SELECT → LOCK → LOAD →（过期则REISSUE）→ RATE-CHECK →
/// CONSUME+RECORD → RELEASE。锁在所有退出路径上都会释放，
/// 临界区内不做任何重试，每次调用至多一次外部签发。
pub struct UserAgentProvisionerImpl {
    /// 身份池仓库
    user_agents: Arc<dyn UserAgentRepository>,
    /// 分布式锁
    lock: Arc<dyn DistributedLock>,
    /// 令牌桶限流器
    rate_limiter: Arc<dyn RateLimiter>,
    /// 签发调用熔断器
    circuit_breaker: Arc<dyn CircuitBreaker>,
    /// 会话令牌签发客户端
    token_client: Arc<dyn SessionTokenClient>,
    /// 每个身份的配额策略
    policy: RateLimitPolicy,
    /// 身份锁TTL（毫秒），必须覆盖签发超时
    lock_ttl_ms: u64,
}

impl UserAgentProvisionerImpl {
    /// 创建新的编排器实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_agents: Arc<dyn UserAgentRepository>,
        lock: Arc<dyn DistributedLock>,
        rate_limiter: Arc<dyn RateLimiter>,
        circuit_breaker: Arc<dyn CircuitBreaker>,
        token_client: Arc<dyn SessionTokenClient>,
        policy: RateLimitPolicy,
        lock_ttl_ms: u64,
    ) -> Self {
        Self {
            user_agents,
            lock,
            rate_limiter,
            circuit_breaker,
            token_client,
            policy,
            lock_ttl_ms,
        }
    }

    /// 持锁期间的主体流程
    ///
    /// 重新加载权威状态、按需换发令牌、配额清算。调用方
    /// 负责锁的获取与释放。
    async fn provision_locked(
        &self,
        selected: &UserAgent,
    ) -> Result<ProvisionedUserAgent, ProvisionError> {
        // 选取与加锁之间状态可能已被其他实例变更，重新加载
        let agent = self
            .user_agents
            .find_by_id(selected.id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let now = Utc::now();
        let session_token = if agent.token_expired(now) {
            self.reissue_token(&agent).await?
        } else {
            // token_expired为false时令牌必然存在
            agent
                .session_token
                .clone()
                .ok_or(RepositoryError::NotFound)?
        };

        let decision = self
            .rate_limiter
            .try_consume(&agent.agent_key, 1, self.policy)
            .await?;

        if !decision.allowed {
            counter!("user_agent_rate_limited_total").increment(1);
            return Err(ProvisionError::RateLimited {
                agent_key: agent.agent_key.clone(),
                retry_after_ms: decision.retry_after_ms,
            });
        }

        self.user_agents.record_usage(agent.id, now).await?;

        debug!(
            agent_key = %agent.agent_key,
            remaining_tokens = decision.current_tokens,
            "User agent provisioned"
        );

        Ok(ProvisionedUserAgent {
            user_agent_id: agent.id,
            agent_key: agent.agent_key,
            session_token,
            remaining_tokens: decision.current_tokens,
        })
    }

    /// 为持锁身份换发会话令牌
    ///
    /// 签发调用受熔断器护栏；成功的令牌在锁释放之前持久化。
    async fn reissue_token(&self, agent: &UserAgent) -> Result<String, ProvisionError> {
        if !self.circuit_breaker.allow_request(&agent.agent_key).await? {
            counter!("token_issuance_short_circuited_total").increment(1);
            return Err(ProvisionError::CircuitOpen {
                agent_key: agent.agent_key.clone(),
            });
        }

        match self.token_client.issue(&agent.agent_key).await {
            Ok(issued) => {
                self.circuit_breaker
                    .record_success(&agent.agent_key)
                    .await?;
                let issued_at = Utc::now();
                self.user_agents
                    .save_token(agent.id, &issued.token, issued_at, issued.ttl_seconds)
                    .await?;
                counter!("token_issuance_total", "outcome" => "success").increment(1);
                Ok(issued.token)
            }
            Err(e) => {
                self.circuit_breaker
                    .record_failure(&agent.agent_key)
                    .await?;
                counter!("token_issuance_total", "outcome" => "failure").increment(1);
                Err(ProvisionError::Issuance(e))
            }
        }
    }
}

#[async_trait]
impl UserAgentProvisioner for UserAgentProvisionerImpl {
    async fn acquire(&self) -> Result<ProvisionedUserAgent, ProvisionError> {
        let selected = match self.user_agents.acquire_least_recently_used().await? {
            Some(agent) => agent,
            None => {
                counter!("user_agent_pool_exhausted_total").increment(1);
                warn!("User agent pool exhausted, no active agent available");
                return Err(ProvisionError::PoolExhausted);
            }
        };

        let token = match self
            .lock
            .try_acquire(&selected.agent_key, self.lock_ttl_ms)
            .await?
        {
            Some(token) => token,
            None => {
                counter!("user_agent_lock_contended_total").increment(1);
                return Err(ProvisionError::LockContended {
                    agent_key: selected.agent_key,
                });
            }
        };

        let result = self.provision_locked(&selected).await;

        // 释放失败不掩盖业务结果，锁靠TTL自行过期
        match self.lock.release(&token).await {
            Ok(false) => warn!(key = %token.key, "Lock already expired before release"),
            Err(e) => warn!(key = %token.key, error = %e, "Failed to release lock"),
            Ok(true) => {}
        }

        result
    }
}
