use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::RequestError;
use crate::socket::SubscriptionEvent;

pub(crate) type Reply = oneshot::Sender<Result<Value, RequestError>>;

/// `req_id` 等待表，只由连接的事件循环持有
#[derive(Default)]
pub(crate) struct Router {
    pending: HashMap<u64, Reply>,
    subscriptions: HashMap<u64, mpsc::UnboundedSender<SubscriptionEvent>>,
}

impl Router {
    pub fn register_request(&mut self, req_id: u64, reply: Reply) {
        self.pending.insert(req_id, reply);
    }

    pub fn register_subscription(
        &mut self,
        req_id: u64,
        events: mpsc::UnboundedSender<SubscriptionEvent>,
    ) {
        self.subscriptions.insert(req_id, events);
    }

    /// 释放超时的一次性等待者
    pub fn release(&mut self, req_id: u64) -> bool {
        self.pending.remove(&req_id).is_some()
    }

    /// 移除订阅，返回该订阅此前是否存在
    pub fn forget(&mut self, req_id: u64) -> bool {
        self.subscriptions.remove(&req_id).is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// 按 `req_id` 分发一条入站消息，返回是否有等待者接收
    ///
    /// 没有 `req_id` 或 `req_id` 未登记的消息直接丢弃（重复/迟到的消息）。
    pub fn dispatch(&mut self, text: &str) -> bool {
        let message: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!("无法解析的入站消息: {}", e);
                return false;
            }
        };

        let Some(req_id) = message.get("req_id").and_then(Value::as_u64) else {
            debug!(
                "丢弃无 req_id 的消息, msg_type={:?}",
                message.get("msg_type")
            );
            return false;
        };

        if let Some(reply) = self.pending.remove(&req_id) {
            // 接收方可能已经超时放弃
            let _ = reply.send(into_result(message));
            return true;
        }

        if let Some(events) = self.subscriptions.get(&req_id) {
            // 句柄已取消时接收端关闭；条目保留到 Forget 指令到达，由它负责通知上游
            if events.send(into_result(message)).is_err() {
                debug!("订阅接收端已关闭, req_id={}", req_id);
                return false;
            }
            return true;
        }

        debug!("丢弃未登记 req_id={} 的消息", req_id);
        false
    }

    /// 连接关闭：所有一次性等待者以 ConnectionClosed 结束，订阅直接清空
    pub fn close_all(&mut self) {
        for (_, reply) in self.pending.drain() {
            let _ = reply.send(Err(RequestError::ConnectionClosed));
        }
        self.subscriptions.clear();
    }
}

fn into_result(message: Value) -> Result<Value, RequestError> {
    match message.get("error") {
        Some(error) if !error.is_null() => Err(RequestError::from_upstream(error)),
        _ => Ok(message),
    }
}
