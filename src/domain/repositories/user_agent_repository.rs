// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::user_agent::UserAgent;
use crate::domain::repositories::crawl_task_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 用户代理仓库特质
///
/// 身份池的数据访问接口。LRU选择在仓库层完成，锁竞争
/// 由上游编排器另行检查。
#[async_trait]
pub trait UserAgentRepository: Send + Sync {
    /// 创建新身份
    async fn create(&self, agent: &UserAgent) -> Result<UserAgent, RepositoryError>;

    /// 根据ID重新加载权威状态
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAgent>, RepositoryError>;

    /// LRU方式取一个活跃身份
    ///
    /// 选取last_used_at最旧的Active身份，并在同一短事务中
    /// 更新last_used_at把它转到LRU队尾，避免并发调用者
    /// 全部选中同一个身份。池中无Active身份时返回None，
    /// 这是运维告警信号而非普通竞争。
    async fn acquire_least_recently_used(&self) -> Result<Option<UserAgent>, RepositoryError>;

    /// 持久化新签发的会话令牌及其有效期窗口
    ///
    /// 市场侧可能缩短窗口，以签发响应的ttl为准覆盖存量值。
    /// 独立短事务，必须在分布式锁释放之前提交。
    async fn save_token(
        &self,
        id: Uuid,
        token: &str,
        issued_at: DateTime<Utc>,
        ttl_seconds: i64,
    ) -> Result<(), RepositoryError>;

    /// 记录一次使用
    ///
    /// 独立短事务，成功消费配额后调用。
    async fn record_usage(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<(), RepositoryError>;
}
