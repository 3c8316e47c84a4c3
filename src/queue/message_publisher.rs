// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::models::outbox_record::OutboxRecord;

/// 队列发布错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 队列侧拒绝或传输失败
    #[error("Queue publish failed: {0}")]
    Publish(String),

    /// 消息负载无法序列化
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 消息发布特质
///
/// Outbox管道的下游出口。发布语义为至少一次，消费方必须
/// 按幂等键去重；实现不做内部重试，失败由管道的退避
/// 调度接管。
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// 发布一条Outbox消息
    ///
    /// 幂等键随消息一同携带，供下游去重。
    async fn publish(&self, record: &OutboxRecord) -> Result<(), QueueError>;
}

#[async_trait]
impl<T: MessagePublisher + ?Sized> MessagePublisher for Arc<T> {
    async fn publish(&self, record: &OutboxRecord) -> Result<(), QueueError> {
        (**self).publish(record).await
    }
}

/// SQS消息发布实现
///
/// 把Outbox记录的负载发到工作队列，幂等键作为消息属性
/// 携带。
pub struct SqsMessagePublisher {
    /// SQS客户端
    client: aws_sdk_sqs::Client,
    /// 队列URL
    queue_url: String,
}

impl SqsMessagePublisher {
    /// 创建新的SQS发布实例
    ///
    /// # 参数
    ///
    /// * `client` - SQS客户端
    /// * `queue_url` - 队列URL
    pub fn new(client: aws_sdk_sqs::Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait]
impl MessagePublisher for SqsMessagePublisher {
    async fn publish(&self, record: &OutboxRecord) -> Result<(), QueueError> {
        let body = serde_json::to_string(&record.payload)?;

        let idempotency_attr = aws_sdk_sqs::types::MessageAttributeValue::builder()
            .data_type("String")
            .string_value(&record.idempotency_key)
            .build()
            .map_err(|e| QueueError::Publish(e.to_string()))?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .message_attributes("idempotency_key", idempotency_attr)
            .send()
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?;

        Ok(())
    }
}
