// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::domain::services::distributed_lock::{DistributedLock, LockError, LockToken};
use crate::infrastructure::cache::redis_client::RedisClient;

/// 锁键前缀
const LOCK_KEY_PREFIX: &str = "crawlhub:lock:";

/// 比较删除脚本：仅当存储的持有者与调用方一致时删除
static RELEASE_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
        if redis.call("GET", KEYS[1]) == ARGV[1] then
            return redis.call("DEL", KEYS[1])
        else
            return 0
        end
    "#,
    )
});

/// 基于Redis的分布式锁实现
///
/// 获取走单条 SET NX PX：不存在存活持有者时写入新的持有者
/// 令牌并附带TTL，整个检查写入在服务端原子完成。释放走
/// 比较删除脚本。无心跳续期，TTL到期后锁自动让位。
#[derive(Clone)]
pub struct RedisDistributedLock {
    redis: RedisClient,
}

impl RedisDistributedLock {
    /// 创建新的分布式锁实例
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    fn build_key(key: &str) -> String {
        format!("{}{}", LOCK_KEY_PREFIX, key)
    }
}

#[async_trait]
impl DistributedLock for RedisDistributedLock {
    async fn try_acquire(&self, key: &str, ttl_ms: u64) -> Result<Option<LockToken>, LockError> {
        let mut conn = self.redis.get_connection().await?;
        let lock_key = Self::build_key(key);
        let owner = Uuid::new_v4().to_string();

        // SET key owner NX PX ttl：成功返回OK，已被持有返回nil
        let reply: Option<String> = redis::cmd("SET")
            .arg(&lock_key)
            .arg(&owner)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;

        Ok(reply.map(|_| LockToken {
            key: lock_key,
            owner,
        }))
    }

    async fn release(&self, token: &LockToken) -> Result<bool, LockError> {
        let mut conn = self.redis.get_connection().await?;

        let deleted: i64 = RELEASE_SCRIPT
            .key(&token.key)
            .arg(&token.owner)
            .invoke_async(&mut conn)
            .await?;

        Ok(deleted == 1)
    }
}
