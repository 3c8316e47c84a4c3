// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 锁令牌
///
/// 一次成功获取的凭证：锁键加持有者令牌。只在进程内
/// 传递，从不持久化，且恰好释放一次。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    /// 锁键
    pub key: String,
    /// 持有者令牌，释放时用于比较删除
    pub owner: String,
}

/// 分布式锁错误类型
///
/// 获取失败（已有存活持有者）不是错误，由`None`表达；
/// 这里只承载基础设施故障。
#[derive(Error, Debug)]
pub enum LockError {
    /// Redis连接或命令错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// 分布式锁特质
///
/// 针对命名资源的原子互斥原语，TTL限定，无心跳续期，
/// 调用方必须在TTL内完成临界区。
/// 不变量：同一键在任一时刻至多存在一个存活持有者。
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// 尝试获取锁
    ///
    /// 单次原子操作：仅当不存在未过期持有者时写入新的
    /// 持有者令牌和TTL。不做内部轮询重试。
    ///
    /// # 参数
    ///
    /// * `key` - 锁键
    /// * `ttl_ms` - 锁存活时间（毫秒）
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(LockToken))` - 获取成功
    /// * `Ok(None)` - 已有存活持有者，正常竞争信号
    /// * `Err(LockError)` - 基础设施故障
    async fn try_acquire(&self, key: &str, ttl_ms: u64) -> Result<Option<LockToken>, LockError>;

    /// 释放锁
    ///
    /// 原子比较删除：仅当存储的持有者等于调用方令牌时
    /// 删除，防止过期的持有者误删他人的锁。
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 本次调用删除了锁
    /// * `Ok(false)` - 锁已过期或被他人持有，未删除
    async fn release(&self, token: &LockToken) -> Result<bool, LockError>;
}
