// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、Redis、服务器、队列、限流、锁、熔断与
/// Outbox管道等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 工作队列配置
    pub queue: QueueSettings,
    /// 限流配置
    pub rate_limiting: RateLimitingSettings,
    /// 分布式锁配置
    pub lock: LockSettings,
    /// 熔断器配置
    pub circuit_breaker: CircuitBreakerSettings,
    /// 令牌签发配置
    pub issuance: IssuanceSettings,
    /// Outbox管道配置
    pub outbox: OutboxSettings,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Redis配置设置
#[derive(Debug, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 工作队列配置设置
#[derive(Debug, Deserialize)]
pub struct QueueSettings {
    /// SQS队列URL
    pub url: String,
}

/// 限流配置设置
///
/// 默认值编码市场公布的配额：每个身份10分钟80次请求。
#[derive(Debug, Deserialize)]
pub struct RateLimitingSettings {
    /// 桶容量（最大令牌数）
    pub capacity: u32,
    /// 补充窗口（秒）
    pub window_seconds: u64,
}

/// 分布式锁配置设置
#[derive(Debug, Deserialize)]
pub struct LockSettings {
    /// 身份锁TTL（毫秒），必须覆盖签发超时
    pub ttl_ms: u64,
}

/// 熔断器配置设置
#[derive(Debug, Deserialize)]
pub struct CircuitBreakerSettings {
    /// 连续失败阈值
    pub failure_threshold: u32,
    /// 冷却时间（秒）
    pub cool_down_seconds: u64,
}

/// 令牌签发配置设置
#[derive(Debug, Deserialize)]
pub struct IssuanceSettings {
    /// 市场签发端点URL
    pub url: String,
    /// 请求超时（秒）
    pub timeout_seconds: u64,
}

/// Outbox管道配置设置
#[derive(Debug, Deserialize)]
pub struct OutboxSettings {
    /// 每轮扫描领取的最大记录数
    pub batch_size: u64,
    /// 扫描间隔（秒）
    pub sweep_interval_seconds: u64,
    /// Processing卡滞阈值（秒）
    pub stale_after_seconds: i64,
    /// 重试退避基数（秒）
    pub backoff_base_seconds: i64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default rate limiting: 80 requests per 10 minutes per agent
            .set_default("rate_limiting.capacity", 80)?
            .set_default("rate_limiting.window_seconds", 600)?
            // Default lock TTL covers the issuance timeout
            .set_default("lock.ttl_ms", 30_000)?
            // Default circuit breaker settings
            .set_default("circuit_breaker.failure_threshold", 3)?
            .set_default("circuit_breaker.cool_down_seconds", 600)?
            // Default issuance settings
            .set_default("issuance.timeout_seconds", 10)?
            // Default outbox pipeline settings
            .set_default("outbox.batch_size", 50)?
            .set_default("outbox.sweep_interval_seconds", 30)?
            .set_default("outbox.stale_after_seconds", 300)?
            .set_default("outbox.backoff_base_seconds", 30)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CRAWLHUB").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 由配置推导限流策略的每秒补充速率
    pub fn refill_rate(&self) -> f64 {
        self.rate_limiting.capacity as f64 / self.rate_limiting.window_seconds as f64
    }
}
