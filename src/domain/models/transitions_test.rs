#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::domain::models::crawl_task::{CrawlTask, CrawlTaskStatus, CrawlTaskType};
    use crate::domain::models::outbox_record::{OutboxRecord, OutboxStatus};
    use crate::domain::models::user_agent::UserAgent;

    fn new_task() -> CrawlTask {
        CrawlTask::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            CrawlTaskType::MiniShopList,
            "https://market.example.com/mini-shop".to_string(),
        )
    }

    fn new_record() -> OutboxRecord {
        OutboxRecord::new(
            Uuid::new_v4(),
            "task-7-v1".to_string(),
            serde_json::json!({"endpoint": "https://market.example.com/mini-shop"}),
        )
    }

    #[test]
    fn test_task_happy_path_transitions() {
        let task = new_task();
        assert_eq!(task.status, CrawlTaskStatus::Waiting);

        let task = task.publish().unwrap();
        assert_eq!(task.status, CrawlTaskStatus::Published);

        let task = task.start().unwrap();
        assert_eq!(task.status, CrawlTaskStatus::Running);

        let task = task.succeed().unwrap();
        assert_eq!(task.status, CrawlTaskStatus::Success);
    }

    #[test]
    fn test_task_retry_mints_fresh_idempotency_key() {
        let task = new_task();
        let first_key = task.idempotency_key.clone();

        let task = task.publish().unwrap().start().unwrap().fail().unwrap();
        let task = task.retry().unwrap();

        assert_eq!(task.status, CrawlTaskStatus::Retry);
        assert_eq!(task.retry_count, 1);
        assert_ne!(task.idempotency_key, first_key);

        // Retry代可以再次发布
        let task = task.publish().unwrap();
        assert_eq!(task.status, CrawlTaskStatus::Published);
    }

    #[test]
    fn test_task_illegal_transitions_rejected() {
        let task = new_task();
        assert!(new_task().start().is_err());
        assert!(new_task().succeed().is_err());
        assert!(task.publish().unwrap().succeed().is_err());

        let done = new_task()
            .publish()
            .unwrap()
            .start()
            .unwrap()
            .succeed()
            .unwrap();
        assert!(done.publish().is_err());
    }

    #[test]
    fn test_outbox_happy_path_and_sent_never_regresses() {
        let record = new_record();
        assert_eq!(record.status, OutboxStatus::Pending);

        let record = record.mark_processing().unwrap();
        assert!(record.processing_at.is_some());

        let record = record.mark_sent().unwrap();
        assert_eq!(record.status, OutboxStatus::Sent);
        assert!(record.processed_at.is_some());

        // Sent是终态，任何后续转换都被拒绝
        assert!(record.clone().mark_processing().is_err());
        assert!(record.clone().mark_failed("boom".to_string()).is_err());
        assert!(record.mark_sent().is_err());
    }

    #[test]
    fn test_outbox_failure_cycle_and_dead_state() {
        let mut record = new_record();

        for attempt in 1..=record.max_retries {
            record = record
                .mark_processing()
                .unwrap()
                .mark_failed(format!("publish error {}", attempt))
                .unwrap();
            assert_eq!(record.retry_count, attempt);
        }

        assert!(!record.can_retry());
        assert!(record.is_dead());
        assert_eq!(
            record.error_message.as_deref(),
            Some("publish error 3"),
        );
    }

    #[test]
    fn test_outbox_failed_is_retryable_below_ceiling() {
        let record = new_record()
            .mark_processing()
            .unwrap()
            .mark_failed("transient".to_string())
            .unwrap();

        assert!(record.can_retry());
        assert!(!record.is_dead());

        // 重试代重新进入Processing后可以成功
        let record = record.mark_processing().unwrap().mark_sent().unwrap();
        assert!(record.is_sent());
    }

    #[test]
    fn test_user_agent_token_expiry_window() {
        let now = Utc::now();
        let mut agent = UserAgent::new("ua-01".to_string(), 3600);

        // 无令牌视为过期
        assert!(agent.token_expired(now));

        agent.refresh_token("tok-abc".to_string(), now, 3600);
        assert!(!agent.token_expired(now + Duration::seconds(3599)));
        assert!(agent.token_expired(now + Duration::seconds(3600)));

        // 换发时缩短的有效期窗口立即生效
        agent.refresh_token("tok-def".to_string(), now, 1800);
        assert!(agent.token_expired(now + Duration::seconds(1800)));
    }

    #[test]
    fn test_user_agent_touch_updates_lru_order_key() {
        let now = Utc::now();
        let mut agent = UserAgent::new("ua-02".to_string(), 3600);
        assert!(agent.last_used_at.is_none());

        agent.touch(now);
        assert!(agent.last_used_at.is_some());
    }
}
