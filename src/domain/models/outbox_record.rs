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

/// 默认最大重试次数
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Outbox记录实体
///
/// 事务性Outbox模式的核心：与所属聚合（爬取任务）在同一个
/// 本地事务中创建，随后由发布管道推进其发送状态机。
/// 状态转换：Pending → Processing → Sent（终态）或
/// Processing → Failed →（重试）→ Processing。
/// Sent状态不可回退。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxRecord {
    /// 记录唯一标识符
    pub id: Uuid,
    /// 所属任务ID
    pub task_id: Uuid,
    /// 幂等键，全局唯一
    pub idempotency_key: String,
    /// 序列化的消息负载
    pub payload: serde_json::Value,
    /// 发送状态
    pub status: OutboxStatus,
    /// 已重试次数
    pub retry_count: i32,
    /// 最大重试次数
    pub max_retries: i32,
    /// 最近一次发布失败的错误信息
    pub error_message: Option<String>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 进入Processing的时间，用于卡滞检测
    pub processing_at: Option<DateTime<FixedOffset>>,
    /// 发送完成时间
    pub processed_at: Option<DateTime<FixedOffset>>,
    /// 下次允许重试的时间
    pub next_attempt_at: Option<DateTime<FixedOffset>>,
}

/// Outbox状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    /// 待发布
    #[default]
    Pending,
    /// 发布中
    Processing,
    /// 已发送，终态
    Sent,
    /// 发布失败，未超限时可重试
    Failed,
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutboxStatus::Pending => write!(f, "pending"),
            OutboxStatus::Processing => write!(f, "processing"),
            OutboxStatus::Sent => write!(f, "sent"),
            OutboxStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for OutboxStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OutboxStatus::Pending),
            "processing" => Ok(OutboxStatus::Processing),
            "sent" => Ok(OutboxStatus::Sent),
            "failed" => Ok(OutboxStatus::Failed),
            _ => Err(()),
        }
    }
}

/// Outbox状态机错误
#[derive(Error, Debug)]
pub enum OutboxError {
    /// 非法状态转换
    #[error("Invalid outbox transition: {0} -> {1}")]
    InvalidTransition(OutboxStatus, OutboxStatus),
}

impl OutboxRecord {
    /// 创建一条新的Outbox记录
    ///
    /// 必须与所属任务在同一事务中持久化。
    ///
    /// # 参数
    ///
    /// * `task_id` - 所属任务ID
    /// * `idempotency_key` - 幂等键
    /// * `payload` - 消息负载
    pub fn new(task_id: Uuid, idempotency_key: String, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            idempotency_key,
            payload,
            status: OutboxStatus::Pending,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            error_message: None,
            created_at: Utc::now().into(),
            processing_at: None,
            processed_at: None,
            next_attempt_at: None,
        }
    }

    /// 进入Processing状态
    ///
    /// Pending/Failed → Processing
    pub fn mark_processing(mut self) -> Result<Self, OutboxError> {
        match self.status {
            OutboxStatus::Pending | OutboxStatus::Failed => {
                self.status = OutboxStatus::Processing;
                self.processing_at = Some(Utc::now().into());
                Ok(self)
            }
            _ => Err(OutboxError::InvalidTransition(
                self.status,
                OutboxStatus::Processing,
            )),
        }
    }

    /// 标记已发送
    ///
    /// Processing → Sent，终态
    pub fn mark_sent(mut self) -> Result<Self, OutboxError> {
        match self.status {
            OutboxStatus::Processing => {
                self.status = OutboxStatus::Sent;
                self.processed_at = Some(Utc::now().into());
                Ok(self)
            }
            _ => Err(OutboxError::InvalidTransition(
                self.status,
                OutboxStatus::Sent,
            )),
        }
    }

    /// 标记发布失败
    ///
    /// Processing → Failed，重试计数加一并记录错误信息。
    /// `next_attempt_at` 由管道设定退避时间。
    pub fn mark_failed(mut self, error: String) -> Result<Self, OutboxError> {
        match self.status {
            OutboxStatus::Processing => {
                self.status = OutboxStatus::Failed;
                self.retry_count += 1;
                self.error_message = Some(error);
                Ok(self)
            }
            _ => Err(OutboxError::InvalidTransition(
                self.status,
                OutboxStatus::Failed,
            )),
        }
    }

    /// 判断记录是否还可重试
    ///
    /// Failed状态且重试次数未达上限时可重试；达到上限的
    /// 记录是死记录，扫描不再处理。
    pub fn can_retry(&self) -> bool {
        self.status == OutboxStatus::Failed && self.retry_count < self.max_retries
    }

    /// 判断记录是否为死记录（重试耗尽）
    pub fn is_dead(&self) -> bool {
        self.status == OutboxStatus::Failed && self.retry_count >= self.max_retries
    }

    /// 判断记录是否已到终态成功
    pub fn is_sent(&self) -> bool {
        self.status == OutboxStatus::Sent
    }
}
