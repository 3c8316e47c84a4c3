// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 熔断器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitStatus {
    /// 正常通行，失败计数
    Closed,
    /// 冷却期内快速失败
    Open,
    /// 放行单个探测请求
    HalfOpen,
}

impl fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CircuitStatus::Closed => write!(f, "closed"),
            CircuitStatus::Open => write!(f, "open"),
            CircuitStatus::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// 熔断器错误类型
#[derive(Error, Debug)]
pub enum CircuitBreakerError {
    /// Redis连接或命令错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// 熔断器特质
///
/// 按身份字符串分键的外部调用护栏。Closed放行并统计失败；
/// 连续失败达到阈值转Open，冷却期内快速失败；冷却期满转
/// HalfOpen放行单个探测，探测成功关闭、失败重新打开。
#[async_trait]
pub trait CircuitBreaker: Send + Sync {
    /// 判断是否允许本次外部调用
    async fn allow_request(&self, key: &str) -> Result<bool, CircuitBreakerError>;

    /// 记录一次成功（原子操作）
    ///
    /// HalfOpen → Closed，或Closed状态下重置失败计数。
    async fn record_success(&self, key: &str) -> Result<(), CircuitBreakerError>;

    /// 记录一次失败（原子操作）
    ///
    /// Closed下累计，达到阈值转Open；HalfOpen下直接重新Open。
    async fn record_failure(&self, key: &str) -> Result<(), CircuitBreakerError>;

    /// 查询当前状态（观测用）
    async fn state(&self, key: &str) -> Result<CircuitStatus, CircuitBreakerError>;
}
