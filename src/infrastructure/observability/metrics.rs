// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// 初始化指标系统
///
/// 配置并注册应用所需的各类监控指标
pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    builder
        .install()
        .expect("failed to install Prometheus recorder");

    // Outbox pipeline metrics
    describe_counter!(
        "outbox_published_total",
        "Total number of outbox records delivered to the queue"
    );
    describe_counter!(
        "outbox_failed_total",
        "Total number of failed outbox publish attempts"
    );
    describe_counter!(
        "outbox_dead_total",
        "Total number of outbox records that exhausted their retries"
    );
    describe_gauge!(
        "outbox_sweep_batch_size",
        "Number of records claimed by the last sweep"
    );

    // User agent provisioning metrics
    describe_counter!(
        "user_agent_pool_exhausted_total",
        "Total number of acquisitions that found no active agent"
    );
    describe_counter!(
        "user_agent_lock_contended_total",
        "Total number of acquisitions that lost the agent lock race"
    );
    describe_counter!(
        "user_agent_rate_limited_total",
        "Total number of acquisitions denied by the token bucket"
    );
    describe_counter!(
        "token_issuance_total",
        "Total number of session token issuance calls by outcome"
    );
    describe_counter!(
        "token_issuance_short_circuited_total",
        "Total number of issuance calls rejected by an open circuit breaker"
    );
}
