// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::queue::outbox_dispatcher::OutboxDispatcher;

/// Outbox扫描工作器
///
/// 周期性驱动发布管道的兜底扫描：事件触发漏掉的记录、
/// 到期的重试记录和崩溃残留的Processing记录都由这里
/// 捞回。即时性来自事件路径，这条路径只保证最终送达。
pub struct OutboxWorker {
    dispatcher: Arc<OutboxDispatcher>,
    interval: Duration,
}

impl OutboxWorker {
    /// 创建新的扫描工作器实例
    ///
    /// # 参数
    ///
    /// * `dispatcher` - 发布管道
    /// * `interval_seconds` - 扫描间隔（秒）
    pub fn new(dispatcher: Arc<OutboxDispatcher>, interval_seconds: u64) -> Self {
        Self {
            dispatcher,
            interval: Duration::from_secs(interval_seconds),
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!("Outbox sweep worker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            match self.dispatcher.sweep().await {
                Ok(count) => {
                    if count > 0 {
                        info!("Outbox sweep processed {} records", count);
                    } else {
                        debug!("Outbox sweep found nothing due");
                    }
                }
                Err(e) => {
                    error!("Outbox sweep failed: {}", e);
                }
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }
}
