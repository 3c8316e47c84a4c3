// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;

use crate::domain::services::rate_limiter::{
    RateLimitDecision, RateLimitError, RateLimitPolicy, RateLimiter,
};
use crate::infrastructure::cache::redis_client::RedisClient;

/// 桶键前缀
const BUCKET_KEY_PREFIX: &str = "crawlhub:rate:";

/// 桶键过期时间（秒），一段时间未触达的桶自动回收
const BUCKET_TTL_SECONDS: u64 = 3600;

/// 令牌桶脚本：补充、封顶、判定、扣减在服务端一次完成
///
/// KEYS[1]: 桶键
/// ARGV[1]: 请求令牌数
/// ARGV[2]: 当前时间（毫秒）
/// ARGV[3]: 每秒补充速率
/// ARGV[4]: 桶容量
/// ARGV[5]: 键TTL（秒）
///
/// 返回 {是否放行, 操作后余额(字符串), 建议重试毫秒数}
static TOKEN_BUCKET_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
        local key = KEYS[1]
        local requested = tonumber(ARGV[1])
        local now_ms = tonumber(ARGV[2])
        local rate = tonumber(ARGV[3])
        local capacity = tonumber(ARGV[4])
        local ttl = tonumber(ARGV[5])

        local tokens = tonumber(redis.call("HGET", key, "tokens"))
        local last_refill = tonumber(redis.call("HGET", key, "last_refill_ms"))

        if tokens == nil or last_refill == nil then
            tokens = capacity
            last_refill = now_ms
        end

        local elapsed_ms = now_ms - last_refill
        if elapsed_ms < 0 then
            elapsed_ms = 0
        end
        local refreshed = tokens + (elapsed_ms / 1000.0) * rate
        if refreshed > capacity then
            refreshed = capacity
        end

        local allowed = 0
        local retry_after_ms = 0
        if refreshed >= requested then
            allowed = 1
            refreshed = refreshed - requested
        else
            retry_after_ms = math.ceil((requested - refreshed) / rate * 1000)
        end

        redis.call("HSET", key,
            "tokens", tostring(refreshed),
            "last_refill_ms", tostring(now_ms))
        redis.call("EXPIRE", key, ttl)

        return {allowed, tostring(refreshed), retry_after_ms}
    "#,
    )
});

/// 基于Redis的令牌桶限流器实现
///
/// 桶状态存于Redis哈希（余额、上次补充时间戳），所有实例
/// 共享同一份状态。读-算-写整体封装为单个Lua脚本，消除
/// 多次往返带来的双花窗口。被拒绝的请求不做部分扣减，
/// 余额停留在补充后的值上。
#[derive(Clone)]
pub struct RedisTokenBucket {
    redis: RedisClient,
}

impl RedisTokenBucket {
    /// 创建新的令牌桶限流器实例
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    fn build_key(bucket_key: &str) -> String {
        format!("{}{}", BUCKET_KEY_PREFIX, bucket_key)
    }
}

#[async_trait]
impl RateLimiter for RedisTokenBucket {
    async fn try_consume(
        &self,
        bucket_key: &str,
        tokens: u32,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let mut conn = self.redis.get_connection().await?;
        let key = Self::build_key(bucket_key);
        let now_ms = Utc::now().timestamp_millis();

        let (allowed, current_tokens, retry_after_ms): (i64, String, i64) = TOKEN_BUCKET_SCRIPT
            .key(&key)
            .arg(tokens)
            .arg(now_ms)
            .arg(policy.refill_rate)
            .arg(policy.capacity)
            .arg(BUCKET_TTL_SECONDS)
            .invoke_async(&mut conn)
            .await?;

        let current_tokens: f64 = current_tokens
            .parse()
            .map_err(|_| RateLimitError::InvalidScriptResponse)?;

        Ok(RateLimitDecision {
            allowed: allowed == 1,
            current_tokens,
            retry_after_ms: retry_after_ms.max(0) as u64,
        })
    }
}
