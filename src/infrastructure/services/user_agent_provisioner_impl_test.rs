// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    use crate::domain::models::user_agent::UserAgent;
    use crate::domain::repositories::crawl_task_repository::RepositoryError;
    use crate::domain::repositories::user_agent_repository::UserAgentRepository;
    use crate::domain::services::circuit_breaker::{
        CircuitBreaker, CircuitBreakerError, CircuitStatus,
    };
    use crate::domain::services::distributed_lock::{DistributedLock, LockError, LockToken};
    use crate::domain::services::rate_limiter::{
        RateLimitDecision, RateLimitError, RateLimitPolicy, RateLimiter,
    };
    use crate::domain::services::session_token_client::{
        IssuedToken, SessionTokenClient, TokenClientError,
    };
    use crate::domain::services::user_agent_provisioner::{ProvisionError, UserAgentProvisioner};
    use crate::infrastructure::services::user_agent_provisioner_impl::UserAgentProvisionerImpl;

    struct FakeUserAgentRepo {
        agents: Mutex<Vec<UserAgent>>,
    }

    impl FakeUserAgentRepo {
        fn new(agents: Vec<UserAgent>) -> Self {
            Self {
                agents: Mutex::new(agents),
            }
        }
    }

    #[async_trait]
    impl UserAgentRepository for FakeUserAgentRepo {
        async fn create(&self, agent: &UserAgent) -> Result<UserAgent, RepositoryError> {
            self.agents.lock().unwrap().push(agent.clone());
            Ok(agent.clone())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAgent>, RepositoryError> {
            Ok(self
                .agents
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned())
        }

        async fn acquire_least_recently_used(&self) -> Result<Option<UserAgent>, RepositoryError> {
            let mut agents = self.agents.lock().unwrap();
            let candidate = agents
                .iter_mut()
                .filter(|a| a.is_active())
                .min_by_key(|a| a.last_used_at);
            if let Some(agent) = candidate {
                agent.last_used_at = Some(Utc::now().into());
                return Ok(Some(agent.clone()));
            }
            Ok(None)
        }

        async fn save_token(
            &self,
            id: Uuid,
            token: &str,
            issued_at: DateTime<Utc>,
            ttl_seconds: i64,
        ) -> Result<(), RepositoryError> {
            let mut agents = self.agents.lock().unwrap();
            let agent = agents
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(RepositoryError::NotFound)?;
            agent.refresh_token(token.to_string(), issued_at, ttl_seconds);
            Ok(())
        }

        async fn record_usage(
            &self,
            id: Uuid,
            used_at: DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            let mut agents = self.agents.lock().unwrap();
            let agent = agents
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(RepositoryError::NotFound)?;
            agent.touch(used_at);
            Ok(())
        }
    }

    struct FakeLock {
        contended: bool,
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    impl FakeLock {
        fn new(contended: bool) -> Self {
            Self {
                contended,
                acquired: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DistributedLock for FakeLock {
        async fn try_acquire(
            &self,
            key: &str,
            _ttl_ms: u64,
        ) -> Result<Option<LockToken>, LockError> {
            if self.contended {
                return Ok(None);
            }
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Some(LockToken {
                key: key.to_string(),
                owner: Uuid::new_v4().to_string(),
            }))
        }

        async fn release(&self, _token: &LockToken) -> Result<bool, LockError> {
            self.released.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    struct FakeRateLimiter {
        decision: RateLimitDecision,
    }

    #[async_trait]
    impl RateLimiter for FakeRateLimiter {
        async fn try_consume(
            &self,
            _bucket_key: &str,
            _tokens: u32,
            _policy: RateLimitPolicy,
        ) -> Result<RateLimitDecision, RateLimitError> {
            Ok(self.decision)
        }
    }

    struct FakeCircuitBreaker {
        allow: bool,
        successes: AtomicUsize,
        failures: AtomicUsize,
    }

    impl FakeCircuitBreaker {
        fn new(allow: bool) -> Self {
            Self {
                allow,
                successes: AtomicUsize::new(0),
                failures: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CircuitBreaker for FakeCircuitBreaker {
        async fn allow_request(&self, _key: &str) -> Result<bool, CircuitBreakerError> {
            Ok(self.allow)
        }

        async fn record_success(&self, _key: &str) -> Result<(), CircuitBreakerError> {
            self.successes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn record_failure(&self, _key: &str) -> Result<(), CircuitBreakerError> {
            self.failures.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn state(&self, _key: &str) -> Result<CircuitStatus, CircuitBreakerError> {
            Ok(CircuitStatus::Closed)
        }
    }

    struct FakeTokenClient {
        outcome: Result<IssuedToken, u16>,
        calls: AtomicUsize,
    }

    impl FakeTokenClient {
        fn succeeding(token: &str) -> Self {
            Self {
                outcome: Ok(IssuedToken {
                    token: token.to_string(),
                    ttl_seconds: 1800,
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                outcome: Err(status),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SessionTokenClient for FakeTokenClient {
        async fn issue(&self, _agent_key: &str) -> Result<IssuedToken, TokenClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(token) => Ok(token.clone()),
                Err(status) => Err(TokenClientError::Rejected(*status)),
            }
        }
    }

    fn agent_with_valid_token(key: &str) -> UserAgent {
        let mut agent = UserAgent::new(key.to_string(), 3600);
        agent.refresh_token("valid-token".to_string(), Utc::now(), 3600);
        agent
    }

    fn agent_with_expired_token(key: &str) -> UserAgent {
        let mut agent = UserAgent::new(key.to_string(), 3600);
        agent.refresh_token(
            "stale-token".to_string(),
            Utc::now() - Duration::seconds(7200),
            3600,
        );
        agent
    }

    fn allowed_decision() -> RateLimitDecision {
        RateLimitDecision {
            allowed: true,
            current_tokens: 79.0,
            retry_after_ms: 0,
        }
    }

    fn denied_decision(retry_after_ms: u64) -> RateLimitDecision {
        RateLimitDecision {
            allowed: false,
            current_tokens: 0.4,
            retry_after_ms,
        }
    }

    struct Setup {
        repo: Arc<FakeUserAgentRepo>,
        lock: Arc<FakeLock>,
        breaker: Arc<FakeCircuitBreaker>,
        client: Arc<FakeTokenClient>,
        provisioner: UserAgentProvisionerImpl,
    }

    fn build(
        agents: Vec<UserAgent>,
        lock: FakeLock,
        decision: RateLimitDecision,
        breaker: FakeCircuitBreaker,
        client: FakeTokenClient,
    ) -> Setup {
        let repo = Arc::new(FakeUserAgentRepo::new(agents));
        let lock = Arc::new(lock);
        let breaker = Arc::new(breaker);
        let client = Arc::new(client);

        let provisioner = UserAgentProvisionerImpl::new(
            repo.clone(),
            lock.clone(),
            Arc::new(FakeRateLimiter { decision }),
            breaker.clone(),
            client.clone(),
            RateLimitPolicy::default(),
            30_000,
        );

        Setup {
            repo,
            lock,
            breaker,
            client,
            provisioner,
        }
    }

    #[tokio::test]
    async fn test_acquire_with_valid_token_skips_issuance() {
        let setup = build(
            vec![agent_with_valid_token("agent-1")],
            FakeLock::new(false),
            allowed_decision(),
            FakeCircuitBreaker::new(true),
            FakeTokenClient::succeeding("unused"),
        );

        let provisioned = setup.provisioner.acquire().await.unwrap();
        assert_eq!(provisioned.agent_key, "agent-1");
        assert_eq!(provisioned.session_token, "valid-token");
        assert_eq!(setup.client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(setup.lock.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_acquire_reissues_expired_token() {
        let setup = build(
            vec![agent_with_expired_token("agent-1")],
            FakeLock::new(false),
            allowed_decision(),
            FakeCircuitBreaker::new(true),
            FakeTokenClient::succeeding("fresh-token"),
        );

        let provisioned = setup.provisioner.acquire().await.unwrap();
        assert_eq!(provisioned.session_token, "fresh-token");
        assert_eq!(setup.client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(setup.breaker.successes.load(Ordering::SeqCst), 1);

        // 新令牌连同签发响应的有效期窗口在返回前已持久化
        let agents = setup.repo.agents.lock().unwrap();
        assert_eq!(agents[0].session_token.as_deref(), Some("fresh-token"));
        assert_eq!(agents[0].token_ttl_seconds, 1800);
    }

    #[tokio::test]
    async fn test_issuance_failure_releases_lock_and_records_failure() {
        let setup = build(
            vec![agent_with_expired_token("agent-1")],
            FakeLock::new(false),
            allowed_decision(),
            FakeCircuitBreaker::new(true),
            FakeTokenClient::failing(503),
        );

        let err = setup.provisioner.acquire().await.unwrap_err();
        assert!(matches!(err, ProvisionError::Issuance(_)));
        assert_eq!(setup.breaker.failures.load(Ordering::SeqCst), 1);
        // 签发失败的路径同样必须释放锁
        assert_eq!(setup.lock.released.load(Ordering::SeqCst), 1);

        // 旧令牌保持不变
        let agents = setup.repo.agents.lock().unwrap();
        assert_eq!(agents[0].session_token.as_deref(), Some("stale-token"));
    }

    #[tokio::test]
    async fn test_rate_denied_returns_retry_hint_and_releases_lock() {
        let setup = build(
            vec![agent_with_valid_token("agent-1")],
            FakeLock::new(false),
            denied_decision(4500),
            FakeCircuitBreaker::new(true),
            FakeTokenClient::succeeding("unused"),
        );

        let err = setup.provisioner.acquire().await.unwrap_err();
        match err {
            ProvisionError::RateLimited {
                agent_key,
                retry_after_ms,
            } => {
                assert_eq!(agent_key, "agent-1");
                assert_eq!(retry_after_ms, 4500);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(setup.lock.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_pool_returns_pool_exhausted() {
        let setup = build(
            vec![],
            FakeLock::new(false),
            allowed_decision(),
            FakeCircuitBreaker::new(true),
            FakeTokenClient::succeeding("unused"),
        );

        assert!(matches!(
            setup.provisioner.acquire().await.unwrap_err(),
            ProvisionError::PoolExhausted
        ));
        assert_eq!(setup.lock.acquired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lock_contention_is_reported_without_issuance() {
        let setup = build(
            vec![agent_with_expired_token("agent-1")],
            FakeLock::new(true),
            allowed_decision(),
            FakeCircuitBreaker::new(true),
            FakeTokenClient::succeeding("unused"),
        );

        assert!(matches!(
            setup.provisioner.acquire().await.unwrap_err(),
            ProvisionError::LockContended { .. }
        ));
        assert_eq!(setup.client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_open_breaker_short_circuits_issuance() {
        let setup = build(
            vec![agent_with_expired_token("agent-1")],
            FakeLock::new(false),
            allowed_decision(),
            FakeCircuitBreaker::new(false),
            FakeTokenClient::succeeding("unused"),
        );

        assert!(matches!(
            setup.provisioner.acquire().await.unwrap_err(),
            ProvisionError::CircuitOpen { .. }
        ));
        // 熔断打开时不发起任何外部调用
        assert_eq!(setup.client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(setup.lock.released.load(Ordering::SeqCst), 1);
    }
}
