// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod tests {
    use crate::config::settings::Settings;

    #[test]
    fn test_settings_load_defaults_from_environment() {
        std::env::set_var("CRAWLHUB__DATABASE__URL", "sqlite::memory:");
        std::env::set_var("CRAWLHUB__REDIS__URL", "redis://127.0.0.1:6379");
        std::env::set_var(
            "CRAWLHUB__QUEUE__URL",
            "https://sqs.ap-northeast-2.amazonaws.com/123/crawl-tasks",
        );
        std::env::set_var("CRAWLHUB__ISSUANCE__URL", "https://market.example.com/tokens");

        let settings = Settings::new().expect("settings should load");

        assert_eq!(settings.database.url, "sqlite::memory:");
        assert_eq!(settings.server.port, 3000);

        // 市场配额默认值：每个身份10分钟80次
        assert_eq!(settings.rate_limiting.capacity, 80);
        assert_eq!(settings.rate_limiting.window_seconds, 600);
        let rate = settings.refill_rate();
        assert!((rate - 80.0 / 600.0).abs() < f64::EPSILON);

        assert_eq!(settings.lock.ttl_ms, 30_000);
        assert_eq!(settings.circuit_breaker.failure_threshold, 3);
        assert_eq!(settings.circuit_breaker.cool_down_seconds, 600);
        assert_eq!(settings.issuance.timeout_seconds, 10);
        assert_eq!(settings.outbox.batch_size, 50);

        std::env::remove_var("CRAWLHUB__DATABASE__URL");
        std::env::remove_var("CRAWLHUB__REDIS__URL");
        std::env::remove_var("CRAWLHUB__QUEUE__URL");
        std::env::remove_var("CRAWLHUB__ISSUANCE__URL");
    }
}
