// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod tests {
    use async_trait::async_trait;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    use crate::application::usecases::create_crawl_task::{
        CreateCrawlTaskRequest, CreateCrawlTaskUseCase, CreateTaskError,
    };
    use crate::domain::models::crawl_task::{CrawlTaskStatus, CrawlTaskType};
    use crate::domain::models::outbox_record::{OutboxRecord, OutboxStatus};
    use crate::domain::repositories::crawl_task_repository::CrawlTaskRepository;
    use crate::domain::repositories::outbox_repository::OutboxRepository;
    use crate::infrastructure::repositories::crawl_task_repo_impl::CrawlTaskRepositoryImpl;
    use crate::infrastructure::repositories::outbox_repo_impl::OutboxRepositoryImpl;
    use crate::queue::message_publisher::{MessagePublisher, QueueError};
    use crate::queue::outbox_dispatcher::{DispatcherConfig, OutboxDispatcher};

    struct NoopPublisher;

    #[async_trait]
    impl MessagePublisher for NoopPublisher {
        async fn publish(&self, _record: &OutboxRecord) -> Result<(), QueueError> {
            Ok(())
        }
    }

    struct Setup {
        outbox: Arc<OutboxRepositoryImpl>,
        tasks: Arc<CrawlTaskRepositoryImpl>,
        usecase: CreateCrawlTaskUseCase,
    }

    async fn setup() -> Setup {
        let db: Arc<DatabaseConnection> = Arc::new(
            Database::connect("sqlite::memory:")
                .await
                .expect("connect sqlite"),
        );
        Migrator::up(db.as_ref(), None).await.expect("migrations");

        let outbox = Arc::new(OutboxRepositoryImpl::new(db.clone()));
        let tasks = Arc::new(CrawlTaskRepositoryImpl::new(db));

        let dispatcher = Arc::new(OutboxDispatcher::new(
            outbox.clone(),
            tasks.clone(),
            Arc::new(NoopPublisher),
            DispatcherConfig::default(),
        ));

        let usecase = CreateCrawlTaskUseCase::new(outbox.clone(), dispatcher);

        Setup {
            outbox,
            tasks,
            usecase,
        }
    }

    fn sample_request() -> CreateCrawlTaskRequest {
        CreateCrawlTaskRequest {
            scheduler_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            task_type: CrawlTaskType::MiniShopDetail,
            endpoint: "https://example.com/minishop/7".to_string(),
        }
    }

    #[tokio::test]
    async fn test_execute_persists_task_and_outbox_atomically() {
        let s = setup().await;

        let task = s.usecase.execute(sample_request()).await.unwrap();
        assert_eq!(task.idempotency_key, format!("{}-v1", task.id));

        let stored = s.tasks.find_by_id(task.id).await.unwrap().unwrap();
        assert!(matches!(
            stored.status,
            CrawlTaskStatus::Waiting | CrawlTaskStatus::Published
        ));

        let record = s
            .outbox
            .find_by_idempotency_key(&task.idempotency_key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.task_id, task.id);
    }

    #[tokio::test]
    async fn test_execute_eventually_delivers_via_event_path() {
        let s = setup().await;

        let task = s.usecase.execute(sample_request()).await.unwrap();

        // 提交后的发布在后台任务中进行，轮询等待其完成
        let mut delivered = false;
        for _ in 0..40 {
            let record = s
                .outbox
                .find_by_idempotency_key(&task.idempotency_key)
                .await
                .unwrap()
                .unwrap();
            if record.status == OutboxStatus::Sent {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(delivered, "outbox record was not delivered in time");

        let stored = s.tasks.find_by_id(task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CrawlTaskStatus::Published);
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_endpoint() {
        let s = setup().await;

        let mut request = sample_request();
        request.endpoint = "not a url".to_string();

        assert!(matches!(
            s.usecase.execute(request).await.unwrap_err(),
            CreateTaskError::Validation(_)
        ));
    }
}
