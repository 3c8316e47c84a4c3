// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crawlhub::application::usecases::create_crawl_task::CreateCrawlTaskUseCase;
use crawlhub::config::settings::Settings;
use crawlhub::domain::repositories::crawl_task_repository::CrawlTaskRepository;
use crawlhub::domain::services::rate_limiter::RateLimitPolicy;
use crawlhub::domain::services::user_agent_provisioner::UserAgentProvisioner;
use crawlhub::infrastructure::cache::redis_circuit_breaker::RedisCircuitBreaker;
use crawlhub::infrastructure::cache::redis_client::RedisClient;
use crawlhub::infrastructure::cache::redis_lock::RedisDistributedLock;
use crawlhub::infrastructure::cache::token_bucket::RedisTokenBucket;
use crawlhub::infrastructure::database::connection;
use crawlhub::infrastructure::observability::metrics;
use crawlhub::infrastructure::repositories::crawl_task_repo_impl::CrawlTaskRepositoryImpl;
use crawlhub::infrastructure::repositories::outbox_repo_impl::OutboxRepositoryImpl;
use crawlhub::infrastructure::repositories::user_agent_repo_impl::UserAgentRepositoryImpl;
use crawlhub::infrastructure::services::marketplace_token_client::MarketplaceTokenClient;
use crawlhub::infrastructure::services::user_agent_provisioner_impl::UserAgentProvisionerImpl;
use crawlhub::presentation::routes;
use crawlhub::queue::message_publisher::SqsMessagePublisher;
use crawlhub::queue::outbox_dispatcher::{DispatcherConfig, OutboxDispatcher};
use crawlhub::utils::telemetry;
use crawlhub::workers::outbox_worker::OutboxWorker;
use migration::{Migrator, MigratorTrait};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting crawlhub...");

    // Initialize Prometheus Metrics
    metrics::init_metrics();

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Redis-backed primitives
    let redis_client = RedisClient::new(&settings.redis.url).await?;
    info!("Redis client initialized");

    let lock = Arc::new(RedisDistributedLock::new(redis_client.clone()));
    let rate_limiter = Arc::new(RedisTokenBucket::new(redis_client.clone()));
    let circuit_breaker = Arc::new(RedisCircuitBreaker::new(
        redis_client.clone(),
        settings.circuit_breaker.failure_threshold,
        settings.circuit_breaker.cool_down_seconds,
    ));

    // 5. Initialize repositories
    let task_repo = Arc::new(CrawlTaskRepositoryImpl::new(db.clone()));
    let outbox_repo = Arc::new(OutboxRepositoryImpl::new(db.clone()));
    let user_agent_repo = Arc::new(UserAgentRepositoryImpl::new(db.clone()));

    // 6. Initialize queue publisher and outbox pipeline
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let sqs_client = aws_sdk_sqs::Client::new(&aws_config);
    let publisher = Arc::new(SqsMessagePublisher::new(
        sqs_client,
        settings.queue.url.clone(),
    ));

    let dispatcher = Arc::new(OutboxDispatcher::new(
        outbox_repo.clone(),
        task_repo.clone(),
        publisher,
        DispatcherConfig {
            batch_size: settings.outbox.batch_size,
            stale_after_seconds: settings.outbox.stale_after_seconds,
            backoff_base_seconds: settings.outbox.backoff_base_seconds,
        },
    ));

    // 7. Initialize user agent provisioning
    let token_client = Arc::new(MarketplaceTokenClient::new(
        settings.issuance.url.clone(),
        settings.issuance.timeout_seconds,
    )?);

    let policy = RateLimitPolicy {
        capacity: settings.rate_limiting.capacity,
        refill_rate: settings.refill_rate(),
    };

    let provisioner: Arc<dyn UserAgentProvisioner> = Arc::new(UserAgentProvisionerImpl::new(
        user_agent_repo,
        lock,
        rate_limiter,
        circuit_breaker,
        token_client,
        policy,
        settings.lock.ttl_ms,
    ));

    // 8. Start the outbox sweep worker
    let worker = OutboxWorker::new(dispatcher.clone(), settings.outbox.sweep_interval_seconds);
    worker.start();

    // 9. Start HTTP server
    let usecase = Arc::new(CreateCrawlTaskUseCase::new(
        outbox_repo.clone(),
        dispatcher.clone(),
    ));
    let tasks: Arc<dyn CrawlTaskRepository> = task_repo;

    let app = routes::app_router(usecase, tasks, dispatcher, provisioner);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
