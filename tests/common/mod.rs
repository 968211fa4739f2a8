//! 集成测试共用：进程内模拟 Deriv 上游

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use rust_risk_guard::app_config::SocketConfig;
use rust_risk_guard::trading::model::TradeRecord;

pub const GOOD_TOKEN: &str = "good-token";

/// 根据收到的请求生成回包，返回空表示不回复
pub type Responder = Arc<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

enum Control {
    Push(Value),
    Close,
}

pub struct MockServer {
    pub url: String,
    frames: mpsc::UnboundedReceiver<Value>,
    control: mpsc::UnboundedSender<Control>,
}

impl MockServer {
    /// 依次处理连接；上一条连接关闭后才接受下一条
    pub async fn start(responder: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (control, mut control_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            'accept: loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let Ok(ws_stream) = accept_async(stream).await else {
                    continue;
                };
                let (mut write, mut read) = ws_stream.split();

                loop {
                    tokio::select! {
                        message = read.next() => match message {
                            Some(Ok(Message::Text(text))) => {
                                let request: Value = serde_json::from_str(&text).unwrap();
                                let _ = frames_tx.send(request.clone());
                                for reply in responder(&request) {
                                    if reply == close_marker() {
                                        let _ = write.close().await;
                                        continue 'accept;
                                    }
                                    if write.send(Message::Text(reply.to_string())).await.is_err() {
                                        continue 'accept;
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => continue 'accept,
                            Some(Ok(_)) => {}
                        },
                        control = control_rx.recv() => match control {
                            Some(Control::Push(value)) => {
                                if write.send(Message::Text(value.to_string())).await.is_err() {
                                    continue 'accept;
                                }
                            }
                            Some(Control::Close) => {
                                let _ = write.close().await;
                                continue 'accept;
                            }
                            None => return,
                        },
                    }
                }
            }
        });

        Self {
            url: format!("ws://{}/", addr),
            frames,
            control,
        }
    }

    pub fn socket_config(&self) -> SocketConfig {
        let mut config = SocketConfig::new(self.url.clone(), "1089");
        config.ping_interval = None;
        config.request_timeout = Duration::from_secs(5);
        config
    }

    /// 下一条客户端发来的消息
    pub async fn next_frame(&mut self) -> Value {
        timeout(Duration::from_secs(5), self.frames.recv())
            .await
            .expect("no frame within 5s")
            .expect("mock server stopped")
    }

    /// 跳过其他消息，直到出现包含 `key` 的消息
    pub async fn next_frame_with(&mut self, key: &str) -> Value {
        loop {
            let frame = self.next_frame().await;
            if frame.get(key).is_some() {
                return frame;
            }
        }
    }

    /// 已收到但尚未读取的消息
    pub fn drain_frames(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.frames.try_recv() {
            frames.push(frame);
        }
        frames
    }

    pub fn push(&self, message: Value) {
        let _ = self.control.send(Control::Push(message));
    }

    pub fn close(&self) {
        let _ = self.control.send(Control::Close);
    }
}

/// 回包列表中出现该值时，模拟上游立即关闭连接
pub fn close_marker() -> Value {
    json!({"mock": "close"})
}

pub fn deriv_responder() -> Responder {
    Arc::new(deriv_reply)
}

/// 行为接近真实上游的回包
pub fn deriv_reply(request: &Value) -> Vec<Value> {
    let req_id = request.get("req_id").cloned().unwrap_or(Value::Null);

    if let Some(token) = request.get("authorize") {
        if token == GOOD_TOKEN {
            return vec![json!({
                "msg_type": "authorize",
                "req_id": req_id,
                "echo_req": {"authorize": "<not shown>"},
                "authorize": {
                    "loginid": "CR900000",
                    "currency": "USD",
                    "balance": 250,
                    "email": "trader@example.com",
                    "country": "id"
                }
            })];
        }
        return vec![json!({
            "msg_type": "authorize",
            "req_id": req_id,
            "error": {"code": "InvalidToken", "message": "The token is invalid."}
        })];
    }

    if request.get("balance").is_some() {
        let mut reply = json!({
            "msg_type": "balance",
            "req_id": req_id,
            "balance": {"balance": 250.0, "currency": "USD", "loginid": "CR900000"}
        });
        if request.get("subscribe").is_some() {
            reply["subscription"] = json!({"id": "b5f1c7a2"});
        }
        return vec![reply];
    }

    if request.get("portfolio").is_some() {
        return vec![json!({
            "msg_type": "portfolio",
            "req_id": req_id,
            "portfolio": {"contracts": [
                {
                    "contract_id": 9001, "symbol": "R_50", "contract_type": "CALL",
                    "buy_price": 10, "payout": 19.5, "currency": "USD",
                    "date_start": 1700000500, "expiry_time": 1700000800,
                    "longcode": "Win payout if Volatility 50 Index is strictly higher than entry spot."
                },
                {
                    "contract_id": 9002, "symbol": "frxEURUSD", "contract_type": "PUT",
                    "buy_price": 5, "payout": 9.5, "currency": "USD"
                }
            ]}
        })];
    }

    if request.get("profit_table").is_some() {
        return vec![json!({
            "msg_type": "profit_table",
            "req_id": req_id,
            "profit_table": {"count": 7, "transactions": [
                {"transaction_id": 14, "contract_id": 104, "buy_price": 80, "sell_price": 150,
                 "purchase_time": 1700000400, "sell_time": 1700000460,
                 "shortcode": "CALL_R_100_150_1700000400_1700000460_S0P_0"},
                {"transaction_id": 13, "contract_id": 103, "buy_price": "40.00", "sell_price": 0,
                 "purchase_time": 1700000300, "sell_time": 1700000360,
                 "shortcode": "PUT_R_100_76.8_1700000300_1700000360_S0P_0"},
                {"transaction_id": 13, "contract_id": 103, "buy_price": "40.00", "sell_price": 0,
                 "purchase_time": 1700000300, "sell_time": 1700000360,
                 "shortcode": "PUT_R_100_76.8_1700000300_1700000360_S0P_0"},
                {"transaction_id": 12, "contract_id": 102, "buy_price": 20, "sell_price": 0,
                 "purchase_time": 1700000200, "sell_time": 1700000260,
                 "shortcode": "CALL_1HZ100V_38.4_1700000200_1700000260_S0P_0"},
                {"transaction_id": 20, "contract_id": 200, "buy_price": 500, "sell_price": 0,
                 "purchase_time": 1700000150, "sell_time": 1700000210,
                 "underlying_symbol": "frxEURUSD",
                 "shortcode": "CALL_FRXEURUSD_950_1700000150_1700000210_S0P_0"},
                {"transaction_id": 11, "contract_id": 101, "buy_price": 15, "sell_price": 25,
                 "purchase_time": 1700000100, "sell_time": 1700000160,
                 "shortcode": "CALL_R_10_28.5_1700000100_1700000160_S0P_0"},
                {"transaction_id": 10, "contract_id": 100, "buy_price": 10, "sell_price": 12,
                 "purchase_time": 1700000000, "sell_time": 1700000060,
                 "shortcode": "MULTUP_XYZ_10_1700000000"}
            ]}
        })];
    }

    if request.get("statement").is_some() {
        return vec![json!({
            "msg_type": "statement",
            "req_id": req_id,
            "statement": {"count": 2, "transactions": [
                {"transaction_id": 501, "contract_id": 104, "action_type": "buy", "amount": -80,
                 "balance_after": 170, "app_id": 16929, "transaction_time": 1700000400,
                 "shortcode": "CALL_R_100_150_1700000400_1700000460_S0P_0",
                 "longcode": "Bought by Martingale bot: Win payout if Volatility 100 Index rises."},
                {"transaction_id": 502, "contract_id": 105, "action_type": "buy", "amount": -5,
                 "balance_after": 165, "app_id": 1089, "transaction_time": 1700000450,
                 "shortcode": "CALL_R_50_9.5_1700000450_1700000510_S0P_0",
                 "longcode": "grid strategy placed manually"}
            ]}
        })];
    }

    // forget 与 ping 的回执不带本客户端关心的内容
    if let Some(id) = request.get("forget") {
        return vec![json!({"msg_type": "forget", "req_id": req_id, "forget": 1, "echo_req": {"forget": id}})];
    }
    Vec::new()
}

/// 最新在前的测试交易
pub fn trade(id: u64, stake: f64, profit: f64, purchase_time: i64) -> TradeRecord {
    TradeRecord {
        id,
        contract_id: id + 1000,
        symbol: "R_75".to_string(),
        contract_type: "CALL".to_string(),
        stake,
        sell_price: stake + profit,
        profit,
        purchase_time,
        close_time: purchase_time + 60_000,
        raw_shortcode: String::new(),
        raw_longcode: String::new(),
    }
}

/// 按盈亏序列生成交易，每笔间隔一小时
pub fn trades_with_profits(profits: &[f64]) -> Vec<TradeRecord> {
    profits
        .iter()
        .enumerate()
        .map(|(i, profit)| trade(i as u64 + 1, 10.0, *profit, 1_700_000_000_000 - i as i64 * 3_600_000))
        .collect()
}
