// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 基于Redis的共享状态原语：客户端、分布式锁、令牌桶
/// 限流器与熔断器。正确性依赖的原子操作全部以Lua脚本
/// 在服务端执行。
pub mod redis_circuit_breaker;
pub mod redis_client;
pub mod redis_lock;
pub mod token_bucket;
