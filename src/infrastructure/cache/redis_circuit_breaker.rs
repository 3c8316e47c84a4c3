// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;

use crate::domain::services::circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitStatus};
use crate::infrastructure::cache::redis_client::RedisClient;

/// 熔断器键前缀
const BREAKER_KEY_PREFIX: &str = "crawlhub:breaker:";

/// 熔断器状态键过期时间（秒）
const BREAKER_TTL_SECONDS: u64 = 3600;

/// 默认连续失败阈值
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// 默认冷却时间（秒）
pub const DEFAULT_COOL_DOWN_SECONDS: u64 = 600;

/// 放行判定脚本
///
/// Closed直接放行；Open在冷却期满时转HalfOpen并放行，否则
/// 拒绝；HalfOpen只放行单个在途探测。
///
/// KEYS[1]: 状态键
/// ARGV[1]: 当前时间（毫秒）
/// ARGV[2]: 冷却时间（毫秒）
/// ARGV[3]: 键TTL（秒）
static ALLOW_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
        local key = KEYS[1]
        local now_ms = tonumber(ARGV[1])
        local cool_down_ms = tonumber(ARGV[2])
        local ttl = tonumber(ARGV[3])

        local state = redis.call("HGET", key, "state")
        if state == false or state == "closed" then
            return 1
        end

        if state == "open" then
            local opened_at = tonumber(redis.call("HGET", key, "opened_at_ms")) or 0
            if now_ms - opened_at >= cool_down_ms then
                redis.call("HSET", key, "state", "half_open", "probe_in_flight", "1")
                redis.call("EXPIRE", key, ttl)
                return 1
            end
            return 0
        end

        -- half_open
        local probe = redis.call("HGET", key, "probe_in_flight")
        if probe == false or probe == "0" then
            redis.call("HSET", key, "probe_in_flight", "1")
            redis.call("EXPIRE", key, ttl)
            return 1
        end
        return 0
    "#,
    )
});

/// 成功记录脚本
///
/// HalfOpen探测成功即关闭；Closed下清零失败计数。
static RECORD_SUCCESS_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
        local key = KEYS[1]
        local ttl = tonumber(ARGV[1])

        redis.call("HSET", key,
            "state", "closed",
            "consecutive_failures", "0",
            "probe_in_flight", "0")
        redis.call("HDEL", key, "opened_at_ms")
        redis.call("EXPIRE", key, ttl)
        return 1
    "#,
    )
});

/// 失败记录脚本
///
/// HalfOpen探测失败立即重新打开；Closed下累计连续失败，
/// 达到阈值转Open并记录打开时刻。
static RECORD_FAILURE_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
        local key = KEYS[1]
        local now_ms = tonumber(ARGV[1])
        local threshold = tonumber(ARGV[2])
        local ttl = tonumber(ARGV[3])

        local state = redis.call("HGET", key, "state")
        if state == "half_open" then
            redis.call("HSET", key,
                "state", "open",
                "opened_at_ms", tostring(now_ms),
                "consecutive_failures", "0",
                "probe_in_flight", "0")
            redis.call("EXPIRE", key, ttl)
            return 1
        end

        local failures = redis.call("HINCRBY", key, "consecutive_failures", 1)
        if failures >= threshold then
            redis.call("HSET", key,
                "state", "open",
                "opened_at_ms", tostring(now_ms),
                "consecutive_failures", "0")
        end
        redis.call("EXPIRE", key, ttl)
        return failures
    "#,
    )
});

/// 基于Redis的熔断器实现
///
/// 每个身份一把熔断器，状态存于Redis哈希，跨实例共享：
/// 一个实例触发打开，所有实例对该身份快速失败。状态
/// 转换全部以Lua脚本原子执行。
#[derive(Clone)]
pub struct RedisCircuitBreaker {
    redis: RedisClient,
    /// 连续失败阈值
    failure_threshold: u32,
    /// 冷却时间（秒）
    cool_down_seconds: u64,
}

impl RedisCircuitBreaker {
    /// 创建新的熔断器实例
    pub fn new(redis: RedisClient, failure_threshold: u32, cool_down_seconds: u64) -> Self {
        Self {
            redis,
            failure_threshold,
            cool_down_seconds,
        }
    }

    fn build_key(key: &str) -> String {
        format!("{}{}", BREAKER_KEY_PREFIX, key)
    }
}

#[async_trait]
impl CircuitBreaker for RedisCircuitBreaker {
    async fn allow_request(&self, key: &str) -> Result<bool, CircuitBreakerError> {
        let mut conn = self.redis.get_connection().await?;
        let now_ms = Utc::now().timestamp_millis();

        let allowed: i64 = ALLOW_SCRIPT
            .key(Self::build_key(key))
            .arg(now_ms)
            .arg(self.cool_down_seconds * 1000)
            .arg(BREAKER_TTL_SECONDS)
            .invoke_async(&mut conn)
            .await?;

        Ok(allowed == 1)
    }

    async fn record_success(&self, key: &str) -> Result<(), CircuitBreakerError> {
        let mut conn = self.redis.get_connection().await?;

        let _: i64 = RECORD_SUCCESS_SCRIPT
            .key(Self::build_key(key))
            .arg(BREAKER_TTL_SECONDS)
            .invoke_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn record_failure(&self, key: &str) -> Result<(), CircuitBreakerError> {
        let mut conn = self.redis.get_connection().await?;
        let now_ms = Utc::now().timestamp_millis();

        let _: i64 = RECORD_FAILURE_SCRIPT
            .key(Self::build_key(key))
            .arg(now_ms)
            .arg(self.failure_threshold)
            .arg(BREAKER_TTL_SECONDS)
            .invoke_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn state(&self, key: &str) -> Result<CircuitStatus, CircuitBreakerError> {
        let mut conn = self.redis.get_connection().await?;

        let state: Option<String> = redis::cmd("HGET")
            .arg(Self::build_key(key))
            .arg("state")
            .query_async(&mut conn)
            .await?;

        Ok(match state.as_deref() {
            Some("open") => CircuitStatus::Open,
            Some("half_open") => CircuitStatus::HalfOpen,
            _ => CircuitStatus::Closed,
        })
    }
}
