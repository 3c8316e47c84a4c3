// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod tests {
    use crate::domain::models::crawl_task::{CrawlTask, CrawlTaskType};
    use crate::domain::models::outbox_record::{OutboxRecord, OutboxStatus};
    use crate::domain::repositories::outbox_repository::OutboxRepository;
    use crate::infrastructure::repositories::outbox_repo_impl::OutboxRepositoryImpl;
    use chrono::{Duration, Utc};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn setup_db() -> Arc<DatabaseConnection> {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect sqlite");
        Migrator::up(&db, None).await.expect("run migrations");
        Arc::new(db)
    }

    fn sample_task() -> CrawlTask {
        CrawlTask::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            CrawlTaskType::MiniShopList,
            "https://example.com/minishop/list".to_string(),
        )
    }

    fn sample_record(task: &CrawlTask) -> OutboxRecord {
        OutboxRecord::new(
            task.id,
            task.idempotency_key.clone(),
            json!({"task_id": task.id, "endpoint": task.endpoint}),
        )
    }

    #[tokio::test]
    async fn test_create_with_task_persists_both() {
        let db = setup_db().await;
        let repo = OutboxRepositoryImpl::new(db);

        let task = sample_task();
        let record = sample_record(&task);

        repo.create_with_task(&task, &record).await.unwrap();

        let found = repo.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(found.task_id, task.id);
        assert_eq!(found.status, OutboxStatus::Pending);

        let by_key = repo
            .find_by_idempotency_key(&record.idempotency_key)
            .await
            .unwrap();
        assert!(by_key.is_some());
    }

    #[tokio::test]
    async fn test_claim_due_moves_pending_to_processing() {
        let db = setup_db().await;
        let repo = OutboxRepositoryImpl::new(db);

        let task = sample_task();
        let record = sample_record(&task);
        repo.create_with_task(&task, &record).await.unwrap();

        let claimed = repo.claim_due(10, Duration::minutes(5)).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].status, OutboxStatus::Processing);
        assert!(claimed[0].processing_at.is_some());

        // 再次领取不应返回刚转入Processing的记录
        let again = repo.claim_due(10, Duration::minutes(5)).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_claim_due_recovers_stale_processing() {
        let db = setup_db().await;
        let repo = OutboxRepositoryImpl::new(db);

        let task = sample_task();
        let record = sample_record(&task);
        repo.create_with_task(&task, &record).await.unwrap();

        let mut claimed = repo
            .claim_due(10, Duration::minutes(5))
            .await
            .unwrap()
            .remove(0);

        // 把processing_at回拨到卡滞阈值之前，模拟崩溃的实例
        claimed.processing_at = Some((Utc::now() - Duration::minutes(10)).into());
        repo.update(&claimed).await.unwrap();

        let recovered = repo.claim_due(10, Duration::minutes(5)).await.unwrap();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].id, record.id);
    }

    #[tokio::test]
    async fn test_claim_due_skips_dead_records() {
        let db = setup_db().await;
        let repo = OutboxRepositoryImpl::new(db);

        let task = sample_task();
        let mut record = sample_record(&task);
        record.status = OutboxStatus::Failed;
        record.retry_count = record.max_retries;
        repo.create_with_task(&task, &record).await.unwrap();

        let claimed = repo.claim_due(10, Duration::minutes(5)).await.unwrap();
        assert!(claimed.is_empty());
    }

    #[tokio::test]
    async fn test_claim_due_honors_backoff_schedule() {
        let db = setup_db().await;
        let repo = OutboxRepositoryImpl::new(db);

        let task = sample_task();
        let mut record = sample_record(&task);
        record.status = OutboxStatus::Failed;
        record.retry_count = 1;
        record.next_attempt_at = Some((Utc::now() + Duration::minutes(5)).into());
        repo.create_with_task(&task, &record).await.unwrap();

        // 未到退避时间
        let claimed = repo.claim_due(10, Duration::minutes(5)).await.unwrap();
        assert!(claimed.is_empty());

        // 到达退避时间后可领取
        record.next_attempt_at = Some((Utc::now() - Duration::seconds(1)).into());
        repo.update(&record).await.unwrap();
        let claimed = repo.claim_due(10, Duration::minutes(5)).await.unwrap();
        assert_eq!(claimed.len(), 1);
    }

    #[tokio::test]
    async fn test_claim_one_returns_none_for_sent_record() {
        let db = setup_db().await;
        let repo = OutboxRepositoryImpl::new(db);

        let task = sample_task();
        let record = sample_record(&task);
        repo.create_with_task(&task, &record).await.unwrap();

        let claimed = repo.claim_one(record.id).await.unwrap().unwrap();
        let sent = claimed.mark_sent().unwrap();
        repo.update(&sent).await.unwrap();

        assert!(repo.claim_one(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_persists_failure_state() {
        let db = setup_db().await;
        let repo = OutboxRepositoryImpl::new(db);

        let task = sample_task();
        let record = sample_record(&task);
        repo.create_with_task(&task, &record).await.unwrap();

        let claimed = repo.claim_one(record.id).await.unwrap().unwrap();
        let failed = claimed.mark_failed("queue unreachable".to_string()).unwrap();
        repo.update(&failed).await.unwrap();

        let reloaded = repo.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OutboxStatus::Failed);
        assert_eq!(reloaded.retry_count, 1);
        assert_eq!(
            reloaded.error_message.as_deref(),
            Some("queue unreachable")
        );
    }
}
