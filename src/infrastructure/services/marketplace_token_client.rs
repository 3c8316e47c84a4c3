// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::services::session_token_client::{
    IssuedToken, SessionTokenClient, TokenClientError,
};

/// 签发请求体
#[derive(Debug, Serialize)]
struct IssueRequest<'a> {
    agent_key: &'a str,
}

/// 签发响应体
#[derive(Debug, Deserialize)]
struct IssueResponse {
    token: String,
    #[serde(default = "default_ttl")]
    ttl_seconds: i64,
}

fn default_ttl() -> i64 {
    3600
}

/// 市场会话令牌客户端实现
///
/// 对市场侧签发端点的单次HTTP调用，带请求级超时，不做
/// 内部重试。重试决策属于上游编排器和熔断器。
#[derive(Clone)]
pub struct MarketplaceTokenClient {
    /// HTTP客户端
    client: reqwest::Client,
    /// 签发端点URL
    issue_url: String,
}

impl MarketplaceTokenClient {
    /// 创建新的令牌客户端实例
    ///
    /// # 参数
    ///
    /// * `issue_url` - 签发端点URL
    /// * `timeout_seconds` - 请求超时（秒）
    pub fn new(issue_url: String, timeout_seconds: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { client, issue_url })
    }
}

#[async_trait]
impl SessionTokenClient for MarketplaceTokenClient {
    async fn issue(&self, agent_key: &str) -> Result<IssuedToken, TokenClientError> {
        let response = self
            .client
            .post(&self.issue_url)
            .json(&IssueRequest { agent_key })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenClientError::Rejected(status.as_u16()));
        }

        let body: IssueResponse = response
            .json()
            .await
            .map_err(|e| TokenClientError::MalformedResponse(e.to_string()))?;

        if body.token.is_empty() {
            return Err(TokenClientError::MalformedResponse(
                "empty token in response".to_string(),
            ));
        }

        Ok(IssuedToken {
            token: body.token,
            ttl_seconds: body.ttl_seconds,
        })
    }
}
