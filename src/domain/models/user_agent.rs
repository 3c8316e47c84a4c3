// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 用户代理（身份）实体
///
/// 表示池中的一个模拟客户端会话：身份字符串加会话令牌。
/// 每个身份受市场侧配额约束，令牌只允许在持有该身份的
/// 分布式锁期间变更。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAgent {
    /// 唯一标识符
    pub id: Uuid,
    /// 身份字符串，池内唯一，同时作为锁键与桶键
    pub agent_key: String,
    /// 当前会话令牌
    pub session_token: Option<String>,
    /// 令牌签发时间
    pub token_issued_at: Option<DateTime<FixedOffset>>,
    /// 令牌有效期（秒）
    pub token_ttl_seconds: i64,
    /// 身份状态
    pub status: UserAgentStatus,
    /// 最近使用时间，LRU选择依据
    pub last_used_at: Option<DateTime<FixedOffset>>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 用户代理状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserAgentStatus {
    /// 活跃，可被池选择
    #[default]
    Active,
    /// 暂停，临时不可用
    Suspended,
    /// 封禁，市场侧已拉黑
    Blocked,
}

impl fmt::Display for UserAgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UserAgentStatus::Active => write!(f, "active"),
            UserAgentStatus::Suspended => write!(f, "suspended"),
            UserAgentStatus::Blocked => write!(f, "blocked"),
        }
    }
}

impl FromStr for UserAgentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserAgentStatus::Active),
            "suspended" => Ok(UserAgentStatus::Suspended),
            "blocked" => Ok(UserAgentStatus::Blocked),
            _ => Err(()),
        }
    }
}

impl UserAgent {
    /// 创建一个新的活跃身份
    ///
    /// # 参数
    ///
    /// * `agent_key` - 身份字符串
    /// * `token_ttl_seconds` - 令牌有效期（秒）
    pub fn new(agent_key: String, token_ttl_seconds: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_key,
            session_token: None,
            token_issued_at: None,
            token_ttl_seconds,
            status: UserAgentStatus::Active,
            last_used_at: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    /// 判断令牌在给定时刻是否已过期或缺失
    ///
    /// # 参数
    ///
    /// * `now` - 评估时刻
    ///
    /// # 返回值
    ///
    /// 令牌缺失或超出有效期窗口时返回true
    pub fn token_expired(&self, now: DateTime<Utc>) -> bool {
        match (&self.session_token, self.token_issued_at) {
            (Some(_), Some(issued_at)) => {
                issued_at + Duration::seconds(self.token_ttl_seconds) <= now
            }
            _ => true,
        }
    }

    /// 记录新签发的会话令牌及其有效期窗口
    ///
    /// 调用方必须持有该身份的分布式锁。
    pub fn refresh_token(&mut self, token: String, issued_at: DateTime<Utc>, ttl_seconds: i64) {
        self.session_token = Some(token);
        self.token_issued_at = Some(issued_at.into());
        self.token_ttl_seconds = ttl_seconds;
        self.updated_at = Utc::now().into();
    }

    /// 记录一次使用
    pub fn touch(&mut self, used_at: DateTime<Utc>) {
        self.last_used_at = Some(used_at.into());
        self.updated_at = Utc::now().into();
    }

    /// 判断身份是否可被池选择
    pub fn is_active(&self) -> bool {
        self.status == UserAgentStatus::Active
    }
}
