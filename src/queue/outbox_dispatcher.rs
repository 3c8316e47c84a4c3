// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Duration, Utc};
use metrics::{counter, gauge};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::models::outbox_record::OutboxRecord;
use crate::domain::repositories::crawl_task_repository::{CrawlTaskRepository, RepositoryError};
use crate::domain::repositories::outbox_repository::OutboxRepository;
use crate::queue::message_publisher::MessagePublisher;

/// 发布管道配置
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// 每轮扫描领取的最大记录数
    pub batch_size: u64,
    /// Processing卡滞阈值（秒），超过视为崩溃残留
    pub stale_after_seconds: i64,
    /// 重试退避基数（秒）
    pub backoff_base_seconds: i64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            stale_after_seconds: 300,
            backoff_base_seconds: 30,
        }
    }
}

/// Outbox发布管道
///
/// 把已领取的Outbox记录送往工作队列并推进其状态机。
/// 发布调用发生在任何数据库事务之外；发布成功与失败
/// 分别以独立短事务落库。单条记录的失败被吸收，不会
/// 中断整批扫描。
pub struct OutboxDispatcher {
    /// Outbox仓库
    outbox: Arc<dyn OutboxRepository>,
    /// 任务仓库
    tasks: Arc<dyn CrawlTaskRepository>,
    /// 队列发布出口
    publisher: Arc<dyn MessagePublisher>,
    /// 管道配置
    config: DispatcherConfig,
}

impl OutboxDispatcher {
    /// 创建新的发布管道实例
    pub fn new(
        outbox: Arc<dyn OutboxRepository>,
        tasks: Arc<dyn CrawlTaskRepository>,
        publisher: Arc<dyn MessagePublisher>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            outbox,
            tasks,
            publisher,
            config,
        }
    }

    /// 处理单条记录（事件路径）
    ///
    /// 提交后立即尝试发布。记录已被其他实例领走或已发送
    /// 时静默返回，周期扫描会兜底。
    pub async fn process_one(&self, id: Uuid) -> Result<(), RepositoryError> {
        match self.outbox.claim_one(id).await? {
            Some(record) => self.deliver(record).await,
            None => {
                debug!(record_id = %id, "Outbox record not claimable, skipping");
                Ok(())
            }
        }
    }

    /// 扫描一轮到期记录（周期路径）
    ///
    /// 领取Pending、到期Failed与卡滞Processing的记录并
    /// 逐条发布。返回本轮处理的记录数。
    pub async fn sweep(&self) -> Result<usize, RepositoryError> {
        let claimed = self
            .outbox
            .claim_due(
                self.config.batch_size,
                Duration::seconds(self.config.stale_after_seconds),
            )
            .await?;

        let count = claimed.len();
        gauge!("outbox_sweep_batch_size").set(count as f64);

        for record in claimed {
            let record_id = record.id;
            if let Err(e) = self.deliver(record).await {
                // 单条落库失败不中断整批，该记录留给卡滞恢复
                error!(record_id = %record_id, error = %e, "Failed to persist outbox state");
            }
        }

        Ok(count)
    }

    /// 发布一条已领取的记录并落库结果
    async fn deliver(&self, record: OutboxRecord) -> Result<(), RepositoryError> {
        let record_id = record.id;
        let task_id = record.task_id;

        match self.publisher.publish(&record).await {
            Ok(()) => {
                // mark_sent在Processing上必然合法
                let sent = match record.mark_sent() {
                    Ok(sent) => sent,
                    Err(e) => {
                        error!(record_id = %record_id, error = %e, "Illegal outbox transition");
                        return Ok(());
                    }
                };
                self.outbox.update(&sent).await?;
                self.mark_task_published(task_id).await;
                counter!("outbox_published_total").increment(1);
                debug!(record_id = %record_id, "Outbox record delivered");
            }
            Err(e) => {
                let failed = match record.mark_failed(e.to_string()) {
                    Ok(failed) => failed,
                    Err(e) => {
                        error!(record_id = %record_id, error = %e, "Illegal outbox transition");
                        return Ok(());
                    }
                };

                let failed = self.schedule_retry(failed);
                self.outbox.update(&failed).await?;
                counter!("outbox_failed_total").increment(1);

                if failed.is_dead() {
                    counter!("outbox_dead_total").increment(1);
                    error!(
                        record_id = %record_id,
                        retry_count = failed.retry_count,
                        "Outbox record exhausted retries, needs manual intervention"
                    );
                } else {
                    warn!(
                        record_id = %record_id,
                        retry_count = failed.retry_count,
                        next_attempt_at = ?failed.next_attempt_at,
                        "Outbox publish failed, scheduled for retry"
                    );
                }
            }
        }

        Ok(())
    }

    /// 设定带抖动的指数退避时间
    fn schedule_retry(&self, mut record: OutboxRecord) -> OutboxRecord {
        if !record.can_retry() {
            record.next_attempt_at = None;
            return record;
        }

        let exponent = (record.retry_count - 1).clamp(0, 16) as u32;
        let base = self.config.backoff_base_seconds * 2i64.pow(exponent);
        // 抖动±20%，避免同批失败的记录同时醒来
        let jitter = rand::rng().random_range(-0.2..=0.2);
        let delay = (base as f64 * (1.0 + jitter)).max(1.0) as i64;

        record.next_attempt_at = Some((Utc::now() + Duration::seconds(delay)).into());
        record
    }

    /// 发送成功后推进任务状态
    ///
    /// 任务状态推进失败不回滚消息发送，按至少一次语义
    /// 容忍重复。
    async fn mark_task_published(&self, task_id: Uuid) {
        let task = match self.tasks.find_by_id(task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                warn!(task_id = %task_id, "Task missing for delivered outbox record");
                return;
            }
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Failed to load task after delivery");
                return;
            }
        };

        let status = task.status;
        match task.publish() {
            Ok(published) => {
                if let Err(e) = self.tasks.update_status(task_id, published.status).await {
                    warn!(task_id = %task_id, error = %e, "Failed to persist task status");
                }
            }
            Err(_) => {
                // 重复投递时任务可能已是Published之后的状态
                debug!(task_id = %task_id, status = %status, "Task already past publish");
            }
        }
    }
}
