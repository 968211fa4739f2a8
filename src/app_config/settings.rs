//! 应用配置：全部来自环境变量（可由 `.env` 提供）

use std::time::Duration;

use anyhow::{anyhow, Result};

use super::env::{env_opt, env_or_default, env_u64};

pub const DEFAULT_WS_URL: &str = "wss://ws.derivws.com/websockets/v3";
pub const DEFAULT_HF_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";

/// 连接管理器的配置
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// 不含 app_id 的基础地址
    pub ws_url: String,
    pub app_id: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// 心跳间隔，None 表示关闭心跳
    pub ping_interval: Option<Duration>,
}

impl SocketConfig {
    pub fn new(ws_url: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            app_id: app_id.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            ping_interval: Some(Duration::from_secs(30)),
        }
    }

    /// 拼接 `app_id` 后的完整地址；没有路径的地址补上 `/`，否则握手请求行不合法
    pub fn endpoint(&self) -> String {
        let (base, query) = match self.ws_url.split_once('?') {
            Some((base, query)) => (base, query),
            None => (self.ws_url.as_str(), ""),
        };
        let authority_start = base.find("://").map_or(0, |i| i + 3);
        let root = if base[authority_start..].contains('/') { "" } else { "/" };
        if query.is_empty() {
            format!("{}{}?app_id={}", base, root, self.app_id)
        } else {
            format!("{}{}?{}&app_id={}", base, root, query, self.app_id)
        }
    }
}

/// 轮询任务的配置
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub refresh_interval: Duration,
    pub profit_table_limit: u32,
    pub statement_limit: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(10),
            profit_table_limit: 50,
            statement_limit: 50,
        }
    }
}

/// 解释生成器（外部协作者）的配置
#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    pub api_token: Option<String>,
    pub model: String,
    pub cooldown: Duration,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub socket: SocketConfig,
    pub monitor: MonitorConfig,
    pub explainer: ExplainerConfig,
    pub api_token: Option<String>,
}

impl AppSettings {
    pub fn from_env() -> Result<Self> {
        let app_id = env_opt("DERIV_APP_ID").ok_or_else(|| anyhow!("未配置DERIV_APP_ID"))?;

        let ping_secs = env_u64("DERIV_PING_INTERVAL_SECS", 30);
        let socket = SocketConfig {
            ws_url: env_or_default("DERIV_WS_URL", DEFAULT_WS_URL),
            app_id,
            connect_timeout: Duration::from_secs(env_u64("DERIV_CONNECT_TIMEOUT_SECS", 10)),
            request_timeout: Duration::from_secs(env_u64("DERIV_REQUEST_TIMEOUT_SECS", 30)),
            ping_interval: (ping_secs > 0).then(|| Duration::from_secs(ping_secs)),
        };

        let monitor = MonitorConfig {
            refresh_interval: Duration::from_secs(env_u64("REFRESH_INTERVAL_SECS", 10).max(1)),
            profit_table_limit: env_u32("PROFIT_TABLE_LIMIT", 50),
            statement_limit: env_u32("STATEMENT_LIMIT", 50),
        };

        let explainer = ExplainerConfig {
            api_token: env_opt("HF_API_TOKEN"),
            model: env_or_default("HF_MODEL", DEFAULT_HF_MODEL),
            cooldown: Duration::from_secs(env_u64("EXPLAIN_COOLDOWN_SECS", 30)),
        };

        Ok(Self {
            socket,
            monitor,
            explainer,
            api_token: env_opt("DERIV_API_TOKEN"),
        })
    }
}

/// 超出 u32 范围的取值按默认值处理
fn env_u32(key: &str, default: u32) -> u32 {
    u32::try_from(env_u64(key, u64::from(default))).unwrap_or(default)
}
