// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 令牌桶策略
///
/// 默认值编码市场公布的配额：每个身份10分钟80次请求。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// 桶容量（最大令牌数）
    pub capacity: u32,
    /// 每秒补充速率
    pub refill_rate: f64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            capacity: 80,
            refill_rate: 80.0 / 600.0,
        }
    }
}

/// 一次消费尝试的判定结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitDecision {
    /// 是否放行
    pub allowed: bool,
    /// 操作后桶内剩余令牌数
    pub current_tokens: f64,
    /// 拒绝时建议的重试等待时间（毫秒），放行时为0
    pub retry_after_ms: u64,
}

/// 限流器错误类型
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// Redis连接或命令错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// 脚本返回了不可解析的结果
    #[error("Invalid response from token bucket script")]
    InvalidScriptResponse,
}

/// 令牌桶限流器特质
///
/// 针对共享桶状态的原子检查扣减。读-算-写必须不可分割，
/// 分成多次往返会产生双花竞争。
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// 尝试消费令牌
    ///
    /// 单次原子操作：按流逝时间补充（封顶容量），余额足够
    /// 则扣减放行，否则拒绝且不做部分扣减，并给出
    /// `retry_after_ms = ceil((requested - refreshed) / rate * 1000)`。
    /// 首次出现的键按满容量减去本次请求初始化。
    ///
    /// # 参数
    ///
    /// * `bucket_key` - 桶键（身份字符串）
    /// * `tokens` - 请求的令牌数
    /// * `policy` - 容量与补充速率
    async fn try_consume(
        &self,
        bucket_key: &str,
        tokens: u32,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError>;
}
