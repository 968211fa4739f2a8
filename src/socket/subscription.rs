use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::RequestError;
use crate::socket::deriv_websocket_client::Command;

/// 订阅推送的单条事件：正常负载或上游错误
pub type SubscriptionEvent = Result<Value, RequestError>;

/// 长期订阅的句柄
///
/// 持有者通过 [`Subscription::recv`] 读取推送；[`Subscription::cancel`] 幂等，
/// 调用后立即停止投递，并且只向上游发送一次 `forget`。句柄被丢弃时自动取消。
pub struct Subscription {
    req_id: u64,
    events: mpsc::UnboundedReceiver<SubscriptionEvent>,
    commands: mpsc::UnboundedSender<Command>,
    cancelled: bool,
}

impl Subscription {
    pub(crate) fn new(
        req_id: u64,
        events: mpsc::UnboundedReceiver<SubscriptionEvent>,
        commands: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            req_id,
            events,
            commands,
            cancelled: false,
        }
    }

    pub fn req_id(&self) -> u64 {
        self.req_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// 等待下一条推送；取消后或连接断开后返回 None
    pub async fn recv(&mut self) -> Option<SubscriptionEvent> {
        if self.cancelled {
            return None;
        }
        self.events.recv().await
    }

    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;

        // 已进入通道但尚未读取的推送一并丢弃
        self.events.close();
        while self.events.try_recv().is_ok() {}

        // 连接已断开时发送失败，无需通知上游
        if self.commands.send(Command::Forget { req_id: self.req_id }).is_err() {
            debug!("连接已关闭，跳过 forget, req_id={}", self.req_id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
