// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_task::CrawlTask;
use crate::domain::models::outbox_record::OutboxRecord;
use crate::domain::repositories::crawl_task_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// Outbox仓库特质
///
/// 定义Outbox记录的数据访问接口。多实例并发扫描时，
/// 领取操作必须基于行级排他锁，保证一条记录只被一个
/// 实例推进。
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// 在同一个事务中创建任务及其Outbox记录
    ///
    /// 事务性Outbox模式的核心写入点：两者要么同时可见，
    /// 要么都不可见。
    async fn create_with_task(
        &self,
        task: &CrawlTask,
        record: &OutboxRecord,
    ) -> Result<OutboxRecord, RepositoryError>;

    /// 根据ID查找记录
    async fn find_by_id(&self, id: Uuid) -> Result<Option<OutboxRecord>, RepositoryError>;

    /// 根据幂等键查找记录
    async fn find_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<OutboxRecord>, RepositoryError>;

    /// 领取一批待发布记录
    ///
    /// 取Pending记录及Processing超过卡滞阈值的记录
    /// （崩溃恢复），行级锁加SKIP LOCKED并在同一事务中
    /// 转入Processing，避免多实例重复发布。
    /// 已到达重试上限的Failed记录不参与领取。
    async fn claim_due(
        &self,
        batch_size: u64,
        stale_after: chrono::Duration,
    ) -> Result<Vec<OutboxRecord>, RepositoryError>;

    /// 尝试领取指定记录（事件路径）
    ///
    /// 对单条记录做同样的行锁领取；记录已被其他实例
    /// 推进或已Sent时返回None。
    async fn claim_one(&self, id: Uuid) -> Result<Option<OutboxRecord>, RepositoryError>;

    /// 持久化发送结果状态
    ///
    /// 独立短事务，发布调用本身不在任何事务内进行。
    async fn update(&self, record: &OutboxRecord) -> Result<OutboxRecord, RepositoryError>;
}
