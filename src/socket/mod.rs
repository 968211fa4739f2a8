//! Deriv WebSocket 连接管理
//!
//! 一条物理连接，多个逻辑请求：请求通过 `req_id` 关联，订阅通过 [`Subscription`] 持有。

pub mod deriv_websocket_client;
pub(crate) mod router;
pub mod subscription;

pub use deriv_websocket_client::DerivWebsocketClient;
pub use subscription::{Subscription, SubscriptionEvent};

/// 连接状态机：Disconnected → Connecting → Connected → Authorized → Disconnected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    /// 传输已建立，尚未授权
    Connected,
    Authorized,
}
