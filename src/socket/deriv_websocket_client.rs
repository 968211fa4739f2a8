use std::future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::{interval_at, timeout, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::app_config::SocketConfig;
use crate::error::{AuthError, ConnectionError, RequestError};
use crate::socket::router::{Reply, Router};
use crate::socket::{ConnectionState, Subscription, SubscriptionEvent};
use crate::trading::model::Identity;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;

/// 发往事件循环的指令
pub(crate) enum Command {
    Request {
        req_id: u64,
        frame: String,
        reply: Reply,
    },
    Subscribe {
        req_id: u64,
        frame: String,
        events: mpsc::UnboundedSender<SubscriptionEvent>,
    },
    /// 请求超时后释放一次性等待者
    Release { req_id: u64 },
    /// 取消订阅
    Forget { req_id: u64 },
    Disconnect { done: oneshot::Sender<()> },
}

/// 连接状态与连接代数
///
/// 每次 connect 代数加一；事件循环只能改写自己那一代连接的状态。
struct Link {
    state: ConnectionState,
    generation: u64,
}

/// Deriv WebSocket 连接管理器
///
/// 等待表只属于连接建立时启动的事件循环任务，调用方通过指令通道与之交互，
/// 因此不需要对等待表加锁。
pub struct DerivWebsocketClient {
    config: SocketConfig,
    link: Arc<RwLock<Link>>,
    next_req_id: AtomicU64,
    commands: RwLock<Option<mpsc::UnboundedSender<Command>>>,
}

impl DerivWebsocketClient {
    pub fn new(config: SocketConfig) -> Self {
        Self {
            config,
            link: Arc::new(RwLock::new(Link {
                state: ConnectionState::Disconnected,
                generation: 0,
            })),
            next_req_id: AtomicU64::new(0),
            commands: RwLock::new(None),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        self.link.read().await.state
    }

    /// 建立传输连接，成功后处于 Connected（未授权）状态
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        let generation = {
            let mut link = self.link.write().await;
            if link.state != ConnectionState::Disconnected {
                return Err(ConnectionError::InvalidState(link.state));
            }
            link.state = ConnectionState::Connecting;
            link.generation += 1;
            link.generation
        };

        let endpoint = self.config.endpoint();
        info!("📡 连接 Deriv WebSocket: {}", endpoint);

        let ws_stream =
            match timeout(self.config.connect_timeout, connect_async(endpoint.as_str())).await {
                Ok(Ok((ws_stream, _))) => ws_stream,
                Ok(Err(e)) => {
                    self.abandon(generation).await;
                    error!("❌ WebSocket连接失败: {}", e);
                    return Err(match e {
                        WsError::Url(url_err) => ConnectionError::InvalidUrl(url_err.to_string()),
                        other => ConnectionError::Transport(other.to_string()),
                    });
                }
                Err(_) => {
                    self.abandon(generation).await;
                    error!("❌ WebSocket连接超时: {:?}", self.config.connect_timeout);
                    return Err(ConnectionError::Timeout(self.config.connect_timeout));
                }
            };

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        {
            // 握手期间被 disconnect 或已开始新的连接，放弃这条传输
            let mut link = self.link.write().await;
            if link.generation != generation || link.state != ConnectionState::Connecting {
                warn!("连接建立期间状态已变化: {:?}", link.state);
                return Err(ConnectionError::InvalidState(link.state));
            }
            *self.commands.write().await = Some(commands_tx);
            link.state = ConnectionState::Connected;
        }

        let event_loop = EventLoop {
            commands: commands_rx,
            generation,
            link: Arc::clone(&self.link),
            ping_interval: self.config.ping_interval,
            router: Router::default(),
        };
        tokio::spawn(event_loop.run(ws_stream));

        info!("✅ Connected to Deriv WebSocket");
        Ok(())
    }

    /// 发送授权请求，这是未授权状态下唯一允许的请求
    pub async fn authorize(&self, token: &str) -> Result<Identity, AuthError> {
        info!("🔑 Authorizing with token...");
        let generation = self.link.read().await.generation;
        let response = self
            .send(json!({ "authorize": token }), true)
            .await
            .map_err(|e| match e {
                RequestError::Upstream { code, message } => AuthError::Rejected { code, message },
                other => AuthError::Request(other),
            })?;

        let identity = response
            .get("authorize")
            .and_then(Identity::from_authorize)
            .ok_or_else(|| {
                AuthError::MalformedResponse("响应中缺少 authorize.loginid".to_string())
            })?;

        // 回包之后连接可能已被关闭，只允许同一连接上的 Connected → Authorized
        if !self
            .transition(
                generation,
                &[ConnectionState::Connected, ConnectionState::Authorized],
                ConnectionState::Authorized,
            )
            .await
        {
            warn!("授权完成时连接已关闭: {}", identity.loginid);
            return Err(AuthError::Request(RequestError::ConnectionClosed));
        }
        info!("✅ Authorized: {}", identity.loginid);
        Ok(identity)
    }

    /// 一次性请求：分配 `req_id`，等待同 id 的响应
    pub async fn request(&self, payload: Value) -> Result<Value, RequestError> {
        self.send(payload, false).await
    }

    /// 长期订阅：同一 `req_id` 的后续消息全部投递给返回的句柄
    pub async fn subscribe(&self, mut payload: Value) -> Result<Subscription, RequestError> {
        self.ensure_ready(false).await?;
        let commands = self.command_sender().await?;

        if let Some(object) = payload.as_object_mut() {
            object.entry("subscribe").or_insert(json!(1));
        }
        let req_id = self.next_req_id();
        let frame = encode_frame(payload, req_id)?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        commands
            .send(Command::Subscribe {
                req_id,
                frame,
                events: events_tx,
            })
            .map_err(|_| RequestError::ConnectionClosed)?;

        Ok(Subscription::new(req_id, events_rx, commands))
    }

    /// 关闭连接：挂起的请求以 ConnectionClosed 结束，订阅直接清空，不通知上游
    pub async fn disconnect(&self) {
        let commands = self.commands.write().await.take();
        if let Some(commands) = commands {
            let (done_tx, done_rx) = oneshot::channel();
            if commands.send(Command::Disconnect { done: done_tx }).is_ok() {
                let _ = done_rx.await;
            }
            info!("🔌 Disconnected from Deriv");
        }
        self.link.write().await.state = ConnectionState::Disconnected;
    }

    async fn send(&self, payload: Value, privileged: bool) -> Result<Value, RequestError> {
        self.ensure_ready(privileged).await?;
        let commands = self.command_sender().await?;

        let req_id = self.next_req_id();
        let frame = encode_frame(payload, req_id)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        commands
            .send(Command::Request {
                req_id,
                frame,
                reply: reply_tx,
            })
            .map_err(|_| RequestError::ConnectionClosed)?;

        match timeout(self.config.request_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            // 事件循环已退出
            Ok(Err(_)) => Err(RequestError::ConnectionClosed),
            Err(_) => {
                let _ = commands.send(Command::Release { req_id });
                warn!("请求超时, req_id={}", req_id);
                Err(RequestError::Timeout(self.config.request_timeout))
            }
        }
    }

    async fn ensure_ready(&self, privileged: bool) -> Result<(), RequestError> {
        match self.state().await {
            ConnectionState::Authorized => Ok(()),
            ConnectionState::Connected if privileged => Ok(()),
            ConnectionState::Connected => Err(RequestError::NotAuthorized),
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                Err(RequestError::ConnectionClosed)
            }
        }
    }

    async fn command_sender(&self) -> Result<mpsc::UnboundedSender<Command>, RequestError> {
        self.commands
            .read()
            .await
            .clone()
            .ok_or(RequestError::ConnectionClosed)
    }

    fn next_req_id(&self) -> u64 {
        self.next_req_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 建立失败，回到 Disconnected
    async fn abandon(&self, generation: u64) {
        self.transition(
            generation,
            &[ConnectionState::Connecting],
            ConnectionState::Disconnected,
        )
        .await;
    }

    /// 仅当仍是同一代连接且当前状态在 `from` 中时切换，返回是否切换
    async fn transition(
        &self,
        generation: u64,
        from: &[ConnectionState],
        to: ConnectionState,
    ) -> bool {
        let mut link = self.link.write().await;
        if link.generation != generation || !from.contains(&link.state) {
            return false;
        }
        link.state = to;
        true
    }
}

/// 把 `req_id` 合并进请求体；请求体必须是 JSON 对象
pub fn encode_frame(payload: Value, req_id: u64) -> Result<String, RequestError> {
    let Value::Object(mut object) = payload else {
        return Err(RequestError::Encode("请求体必须是JSON对象".to_string()));
    };
    object.insert("req_id".to_string(), json!(req_id));
    serde_json::to_string(&object).map_err(|e| RequestError::Encode(e.to_string()))
}

struct EventLoop {
    commands: mpsc::UnboundedReceiver<Command>,
    generation: u64,
    link: Arc<RwLock<Link>>,
    ping_interval: Option<Duration>,
    router: Router,
}

impl EventLoop {
    async fn run(mut self, ws_stream: WsStream) {
        let (mut write, mut read) = ws_stream.split();
        let mut heartbeat = self.ping_interval.map(|period| {
            let mut heartbeat = interval_at(Instant::now() + period, period);
            heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
            heartbeat
        });

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Disconnect { done }) => {
                        self.router.close_all();
                        let _ = done.send(());
                        let _ = write.close().await;
                        break;
                    }
                    Some(command) => {
                        if let Err(e) = self.handle_command(command, &mut write).await {
                            error!("WebSocket发送失败: {}", e);
                            break;
                        }
                    }
                    // 客户端已被丢弃
                    None => {
                        let _ = write.close().await;
                        break;
                    }
                },
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        debug!("📥 Received: {}", text);
                        self.router.dispatch(&text);
                    }
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => {
                            self.router.dispatch(&text);
                        }
                        Err(e) => warn!("丢弃非UTF-8二进制消息: {}", e),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        warn!("🔌 WebSocket closed by upstream: {:?}", frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("WebSocket读取错误: {}", e);
                        break;
                    }
                    None => {
                        warn!("🔌 WebSocket stream ended");
                        break;
                    }
                },
                _ = next_heartbeat(&mut heartbeat) => {
                    // ping 不带 req_id，回包按路由规则丢弃
                    if let Err(e) = write.send(Message::Text(json!({ "ping": 1 }).to_string())).await {
                        error!("心跳发送失败: {}", e);
                        break;
                    }
                }
            }
        }

        self.router.close_all();
        let mut link = self.link.write().await;
        if link.generation == self.generation {
            link.state = ConnectionState::Disconnected;
        }
        debug!("事件循环退出, generation={}", self.generation);
    }

    async fn handle_command(&mut self, command: Command, write: &mut WsWriter) -> Result<(), WsError> {
        match command {
            Command::Request {
                req_id,
                frame,
                reply,
            } => {
                self.router.register_request(req_id, reply);
                debug!("📤 Sending: {}", redact(&frame));
                write.send(Message::Text(frame)).await
            }
            Command::Subscribe {
                req_id,
                frame,
                events,
            } => {
                self.router.register_subscription(req_id, events);
                debug!("📤 Subscribing: {}", frame);
                write.send(Message::Text(frame)).await
            }
            Command::Release { req_id } => {
                self.router.release(req_id);
                Ok(())
            }
            Command::Forget { req_id } => {
                if !self.router.forget(req_id) {
                    return Ok(());
                }
                debug!("📤 Forget subscription req_id={}", req_id);
                write
                    .send(Message::Text(json!({ "forget": req_id }).to_string()))
                    .await
            }
            Command::Disconnect { done } => {
                let _ = done.send(());
                Ok(())
            }
        }
    }
}

async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(heartbeat) => {
            heartbeat.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

/// 日志中隐藏授权令牌
fn redact(frame: &str) -> String {
    match serde_json::from_str::<Value>(frame) {
        Ok(Value::Object(mut object)) if object.contains_key("authorize") => {
            object.insert("authorize".to_string(), json!("***"));
            Value::Object(object).to_string()
        }
        _ => frame.to_string(),
    }
}
