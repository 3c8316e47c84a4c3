// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod tests {
    use crate::domain::models::user_agent::{UserAgent, UserAgentStatus};
    use crate::domain::repositories::user_agent_repository::UserAgentRepository;
    use crate::infrastructure::repositories::user_agent_repo_impl::UserAgentRepositoryImpl;
    use chrono::{Duration, Utc};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use std::sync::Arc;

    async fn setup_db() -> Arc<DatabaseConnection> {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect sqlite");
        Migrator::up(&db, None).await.expect("run migrations");
        Arc::new(db)
    }

    #[tokio::test]
    async fn test_acquire_prefers_least_recently_used() {
        let db = setup_db().await;
        let repo = UserAgentRepositoryImpl::new(db);

        let mut older = UserAgent::new("agent-older".to_string(), 3600);
        older.last_used_at = Some((Utc::now() - Duration::hours(2)).into());
        let mut newer = UserAgent::new("agent-newer".to_string(), 3600);
        newer.last_used_at = Some(Utc::now().into());

        repo.create(&older).await.unwrap();
        repo.create(&newer).await.unwrap();

        let acquired = repo.acquire_least_recently_used().await.unwrap().unwrap();
        assert_eq!(acquired.agent_key, "agent-older");
        // 选中即推到LRU队尾
        assert!(acquired.last_used_at.unwrap() > older.last_used_at.unwrap());
    }

    #[tokio::test]
    async fn test_acquire_prefers_never_used_agent() {
        let db = setup_db().await;
        let repo = UserAgentRepositoryImpl::new(db);

        let mut used = UserAgent::new("agent-used".to_string(), 3600);
        used.last_used_at = Some((Utc::now() - Duration::days(30)).into());
        let fresh = UserAgent::new("agent-fresh".to_string(), 3600);

        repo.create(&used).await.unwrap();
        repo.create(&fresh).await.unwrap();

        let acquired = repo.acquire_least_recently_used().await.unwrap().unwrap();
        assert_eq!(acquired.agent_key, "agent-fresh");
    }

    #[tokio::test]
    async fn test_acquire_rotates_through_entire_pool() {
        let db = setup_db().await;
        let repo = UserAgentRepositoryImpl::new(db);

        let mut used = UserAgent::new("agent-used".to_string(), 3600);
        used.last_used_at = Some((Utc::now() - Duration::hours(1)).into());
        let fresh = UserAgent::new("agent-fresh".to_string(), 3600);

        repo.create(&used).await.unwrap();
        repo.create(&fresh).await.unwrap();

        // 从未用过的身份先被选中并推到队尾，之后轮到已用过的
        let first = repo.acquire_least_recently_used().await.unwrap().unwrap();
        assert_eq!(first.agent_key, "agent-fresh");
        let second = repo.acquire_least_recently_used().await.unwrap().unwrap();
        assert_eq!(second.agent_key, "agent-used");
        let third = repo.acquire_least_recently_used().await.unwrap().unwrap();
        assert_eq!(third.agent_key, "agent-fresh");
    }

    #[tokio::test]
    async fn test_acquire_skips_inactive_agents() {
        let db = setup_db().await;
        let repo = UserAgentRepositoryImpl::new(db);

        let mut suspended = UserAgent::new("agent-suspended".to_string(), 3600);
        suspended.status = UserAgentStatus::Suspended;
        let mut blocked = UserAgent::new("agent-blocked".to_string(), 3600);
        blocked.status = UserAgentStatus::Blocked;

        repo.create(&suspended).await.unwrap();
        repo.create(&blocked).await.unwrap();

        assert!(repo.acquire_least_recently_used().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_token_persists_session() {
        let db = setup_db().await;
        let repo = UserAgentRepositoryImpl::new(db);

        let agent = UserAgent::new("agent-token".to_string(), 3600);
        repo.create(&agent).await.unwrap();

        // 市场返回的窗口短于建池时的默认值
        let issued_at = Utc::now();
        repo.save_token(agent.id, "session-abc", issued_at, 1800)
            .await
            .unwrap();

        let reloaded = repo.find_by_id(agent.id).await.unwrap().unwrap();
        assert_eq!(reloaded.session_token.as_deref(), Some("session-abc"));
        assert_eq!(reloaded.token_ttl_seconds, 1800);
        assert!(!reloaded.token_expired(issued_at + Duration::seconds(1799)));
        assert!(reloaded.token_expired(issued_at + Duration::seconds(1800)));
    }

    #[tokio::test]
    async fn test_record_usage_updates_last_used_at() {
        let db = setup_db().await;
        let repo = UserAgentRepositoryImpl::new(db);

        let agent = UserAgent::new("agent-usage".to_string(), 3600);
        repo.create(&agent).await.unwrap();

        let used_at = Utc::now();
        repo.record_usage(agent.id, used_at).await.unwrap();

        let reloaded = repo.find_by_id(agent.id).await.unwrap().unwrap();
        assert!(reloaded.last_used_at.is_some());
    }
}
