// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 爬取任务实体
///
/// 表示一次针对第三方市场的爬取意图。任务由调度创建，
/// 通过Outbox管道发布到下游工作队列，状态只会沿转换表
/// 前进，任务本身从不删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 调度器ID，关联创建该任务的调度
    pub scheduler_id: Uuid,
    /// 卖家ID，任务爬取的目标卖家
    pub seller_id: Uuid,
    /// 任务类型，决定爬取的页面种类
    pub task_type: CrawlTaskType,
    /// 目标端点URL
    pub endpoint: String,
    /// 任务状态
    pub status: CrawlTaskStatus,
    /// 幂等键，每个发布尝试代唯一
    pub idempotency_key: String,
    /// 已重试次数
    pub retry_count: i32,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 爬取任务类型枚举
///
/// 与市场侧的页面种类一一对应。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrawlTaskType {
    /// 小店商品列表页
    #[default]
    MiniShopList,
    /// 小店商品明细页
    MiniShopDetail,
    /// 商品详情页
    ProductDetail,
}

impl fmt::Display for CrawlTaskType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrawlTaskType::MiniShopList => write!(f, "mini_shop_list"),
            CrawlTaskType::MiniShopDetail => write!(f, "mini_shop_detail"),
            CrawlTaskType::ProductDetail => write!(f, "product_detail"),
        }
    }
}

impl FromStr for CrawlTaskType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mini_shop_list" => Ok(CrawlTaskType::MiniShopList),
            "mini_shop_detail" => Ok(CrawlTaskType::MiniShopDetail),
            "product_detail" => Ok(CrawlTaskType::ProductDetail),
            _ => Err(()),
        }
    }
}

/// 爬取任务状态枚举
///
/// 状态转换遵循以下流程：
/// Waiting → Published → Running → Success/Failed，
/// Failed → Retry → Published（重试代）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrawlTaskStatus {
    /// 等待发布，任务已持久化但消息尚未送达队列
    #[default]
    Waiting,
    /// 已发布，队列消息已送达
    Published,
    /// 执行中，下游工作者已领取
    Running,
    /// 成功，终态
    Success,
    /// 失败，可进入重试代
    Failed,
    /// 重试中，等待重新发布
    Retry,
}

impl fmt::Display for CrawlTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrawlTaskStatus::Waiting => write!(f, "waiting"),
            CrawlTaskStatus::Published => write!(f, "published"),
            CrawlTaskStatus::Running => write!(f, "running"),
            CrawlTaskStatus::Success => write!(f, "success"),
            CrawlTaskStatus::Failed => write!(f, "failed"),
            CrawlTaskStatus::Retry => write!(f, "retry"),
        }
    }
}

impl FromStr for CrawlTaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(CrawlTaskStatus::Waiting),
            "published" => Ok(CrawlTaskStatus::Published),
            "running" => Ok(CrawlTaskStatus::Running),
            "success" => Ok(CrawlTaskStatus::Success),
            "failed" => Ok(CrawlTaskStatus::Failed),
            "retry" => Ok(CrawlTaskStatus::Retry),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
///
/// 表示领域层的状态转换和校验错误。
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidStateTransition(String, String),

    /// 校验错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl CrawlTask {
    /// 创建一个新的爬取任务
    ///
    /// 幂等键按 `{task_id}-v1` 生成，重试代会重铸新键。
    ///
    /// # 参数
    ///
    /// * `scheduler_id` - 调度器ID
    /// * `seller_id` - 卖家ID
    /// * `task_type` - 任务类型
    /// * `endpoint` - 目标端点URL
    ///
    /// # 返回值
    ///
    /// 返回处于Waiting状态的新任务
    pub fn new(
        scheduler_id: Uuid,
        seller_id: Uuid,
        task_type: CrawlTaskType,
        endpoint: String,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            scheduler_id,
            seller_id,
            task_type,
            endpoint,
            status: CrawlTaskStatus::Waiting,
            idempotency_key: format!("{}-v1", id),
            retry_count: 0,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    /// 标记任务已发布
    ///
    /// Waiting/Retry → Published
    pub fn publish(mut self) -> Result<Self, DomainError> {
        match self.status {
            CrawlTaskStatus::Waiting | CrawlTaskStatus::Retry => {
                self.status = CrawlTaskStatus::Published;
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(self.transition_error(CrawlTaskStatus::Published)),
        }
    }

    /// 标记任务开始执行
    ///
    /// Published → Running
    pub fn start(mut self) -> Result<Self, DomainError> {
        match self.status {
            CrawlTaskStatus::Published => {
                self.status = CrawlTaskStatus::Running;
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(self.transition_error(CrawlTaskStatus::Running)),
        }
    }

    /// 标记任务成功
    ///
    /// Running → Success
    pub fn succeed(mut self) -> Result<Self, DomainError> {
        match self.status {
            CrawlTaskStatus::Running => {
                self.status = CrawlTaskStatus::Success;
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(self.transition_error(CrawlTaskStatus::Success)),
        }
    }

    /// 标记任务失败
    ///
    /// Running → Failed
    pub fn fail(mut self) -> Result<Self, DomainError> {
        match self.status {
            CrawlTaskStatus::Running => {
                self.status = CrawlTaskStatus::Failed;
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(self.transition_error(CrawlTaskStatus::Failed)),
        }
    }

    /// 进入重试代
    ///
    /// Failed → Retry，重试计数加一并重铸幂等键，
    /// 保证每个发布尝试代的幂等键唯一。
    pub fn retry(mut self) -> Result<Self, DomainError> {
        match self.status {
            CrawlTaskStatus::Failed => {
                self.status = CrawlTaskStatus::Retry;
                self.retry_count += 1;
                self.idempotency_key = format!("{}-v{}", self.id, self.retry_count + 1);
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(self.transition_error(CrawlTaskStatus::Retry)),
        }
    }

    fn transition_error(&self, target: CrawlTaskStatus) -> DomainError {
        DomainError::InvalidStateTransition(self.status.to_string(), target.to_string())
    }
}
