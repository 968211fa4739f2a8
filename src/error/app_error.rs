use std::time::Duration;

use thiserror::Error;

use crate::socket::ConnectionState;

/// 传输层建立失败
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// 地址配置错误
    #[error("无效的WebSocket地址: {0}")]
    InvalidUrl(String),

    /// 网络/DNS/TLS 失败
    #[error("WebSocket连接失败: {0}")]
    Transport(String),

    #[error("WebSocket连接超时 ({0:?})")]
    Timeout(Duration),

    /// 只有 Disconnected 状态允许发起连接
    #[error("当前连接状态不允许连接: {0:?}")]
    InvalidState(ConnectionState),
}

/// 授权失败，对会话是致命的
#[derive(Error, Debug)]
pub enum AuthError {
    /// 上游返回了 error 字段
    #[error("授权被拒绝: [{code}] {message}")]
    Rejected { code: String, message: String },

    /// 响应里缺少身份字段
    #[error("授权响应格式错误: {0}")]
    MalformedResponse(String),

    /// 授权请求本身没有送达或没有得到响应
    #[error("授权请求失败: {0}")]
    Request(#[from] RequestError),
}

/// 单个请求/订阅的失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("连接已关闭")]
    ConnectionClosed,

    #[error("上游错误: [{code}] {message}")]
    Upstream { code: String, message: String },

    #[error("请求超时 ({0:?})")]
    Timeout(Duration),

    /// 授权完成之前只允许发送授权请求
    #[error("连接尚未授权")]
    NotAuthorized,

    #[error("请求编码失败: {0}")]
    Encode(String),
}

impl RequestError {
    /// 从上游的 `error` 对象构造错误，缺失字段按空字符串处理
    pub fn from_upstream(error: &serde_json::Value) -> Self {
        let code = error
            .get("code")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        RequestError::Upstream { code, message }
    }
}
