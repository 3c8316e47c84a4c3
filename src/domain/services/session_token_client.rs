// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 签发的会话令牌
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// 令牌值
    pub token: String,
    /// 有效期窗口（秒）
    pub ttl_seconds: i64,
}

/// 令牌签发客户端错误类型
#[derive(Error, Debug)]
pub enum TokenClientError {
    /// 市场侧返回了非成功状态码
    #[error("Token issuance rejected with status {0}")]
    Rejected(u16),

    /// 网络或传输层失败
    #[error("Token issuance transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 响应体不可解析
    #[error("Malformed issuance response: {0}")]
    MalformedResponse(String),
}

/// 会话令牌签发客户端特质
///
/// 外部市场的令牌签发调用。实现不做内部重试，失败映射为
/// 类型化错误，在调用方自己的超时内返回而不是挂起。
#[async_trait]
pub trait SessionTokenClient: Send + Sync {
    /// 为指定身份签发新的会话令牌
    ///
    /// # 参数
    ///
    /// * `agent_key` - 身份字符串
    async fn issue(&self, agent_key: &str) -> Result<IssuedToken, TokenClientError>;
}
