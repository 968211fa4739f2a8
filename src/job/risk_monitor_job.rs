//! 风险监控任务
//!
//! 固定间隔拉取四类账户数据，规范化后交给风险引擎，并通过 watch 通道发布快照。
//! 余额订阅的推送在两个周期之间直接更新最新快照的余额。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::app_config::MonitorConfig;
use crate::error::RequestError;
use crate::risk::{RiskEngine, RiskReport};
use crate::socket::{Subscription, SubscriptionEvent};
use crate::time_util;
use crate::trading::deriv::AccountFeed;
use crate::trading::model::{BalanceSnapshot, BotLedgerEntry, Identity, Position, TradeRecord};
use crate::trading::normalizer;
use crate::trading::services::TradeStats;

/// 每个周期拉取的数据类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    Balance,
    Positions,
    Trades,
    BotActivity,
}

impl DataCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::Balance => "balance",
            DataCategory::Positions => "positions",
            DataCategory::Trades => "trades",
            DataCategory::BotActivity => "bot_activity",
        }
    }
}

/// 对外发布的一次完整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub report: RiskReport,
    pub trades: Vec<TradeRecord>,
    pub positions: Vec<Position>,
    pub bot_activity: Vec<BotLedgerEntry>,
    pub balance: BalanceSnapshot,
    pub identity: Option<Identity>,
    pub stats: TradeStats,
    /// 本周期拉取失败、沿用上一周期数据的类别
    pub degraded: Vec<DataCategory>,
    pub cycle: u64,
    pub generated_at: i64,
}

impl RiskSnapshot {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

pub struct RiskMonitorJob<F: AccountFeed> {
    feed: Arc<F>,
    engine: RiskEngine,
    config: MonitorConfig,
    identity: Option<Identity>,
    publisher: watch::Sender<Option<RiskSnapshot>>,
    balance_subscription: Option<Subscription>,
    cycle: u64,
}

impl<F: AccountFeed> RiskMonitorJob<F> {
    pub fn new(feed: Arc<F>, engine: RiskEngine, config: MonitorConfig) -> Self {
        let (publisher, _) = watch::channel(None);
        Self {
            feed,
            engine,
            config,
            identity: None,
            publisher,
            balance_subscription: None,
            cycle: 0,
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// 订阅快照更新
    pub fn subscribe(&self) -> watch::Receiver<Option<RiskSnapshot>> {
        self.publisher.subscribe()
    }

    pub fn latest(&self) -> Option<RiskSnapshot> {
        self.publisher.borrow().clone()
    }

    pub fn has_balance_stream(&self) -> bool {
        self.balance_subscription.is_some()
    }

    /// 执行一个周期：四类请求并发发出，全部结束后再规范化与分析
    pub async fn run_cycle(&mut self) -> RiskSnapshot {
        let limits = (self.config.profit_table_limit, self.config.statement_limit);
        let (balance, positions, trades, bot_activity) = tokio::join!(
            self.feed.get_balance(),
            self.feed.get_open_positions(),
            self.feed.get_trade_history(limits.0),
            self.feed.get_bot_activity(limits.1),
        );

        let previous = self.publisher.borrow().clone();
        let mut degraded = Vec::new();

        let fallback_balance = previous
            .as_ref()
            .map(|p| p.balance.clone())
            .or_else(|| {
                self.identity.as_ref().map(|i| BalanceSnapshot {
                    amount: i.balance,
                    currency: i.currency.clone(),
                })
            });
        let balance = settle(DataCategory::Balance, balance, fallback_balance, &mut degraded);
        let positions = settle(
            DataCategory::Positions,
            positions,
            previous.as_ref().map(|p| p.positions.clone()),
            &mut degraded,
        );
        let trades = settle(
            DataCategory::Trades,
            trades,
            previous.as_ref().map(|p| p.trades.clone()),
            &mut degraded,
        );
        let bot_activity = settle(
            DataCategory::BotActivity,
            bot_activity,
            previous.as_ref().map(|p| p.bot_activity.clone()),
            &mut degraded,
        );

        let report = self
            .engine
            .analyze(&trades, &positions, &bot_activity, balance.amount);
        self.cycle += 1;

        let snapshot = RiskSnapshot {
            stats: TradeStats::from_trades(&trades),
            report,
            trades,
            positions,
            bot_activity,
            balance,
            identity: self.identity.clone(),
            degraded,
            cycle: self.cycle,
            generated_at: time_util::now_millis(),
        };

        info!(
            "📊 风险周期 #{} 完成: score={}, level={:?}, findings={}, trades={}, positions={}, degraded={:?}",
            snapshot.cycle,
            snapshot.report.score,
            snapshot.report.level,
            snapshot.report.findings.len(),
            snapshot.trades.len(),
            snapshot.positions.len(),
            snapshot.degraded
        );
        self.publisher.send_replace(Some(snapshot.clone()));
        snapshot
    }

    /// 建立余额推送订阅；已存在时不重复订阅，返回 false
    pub async fn start_balance_stream(&mut self) -> Result<bool, RequestError> {
        if self.balance_subscription.is_some() {
            debug!("余额订阅已存在，忽略重复订阅");
            return Ok(false);
        }
        let subscription = self.feed.subscribe_balance().await?;
        info!("💰 余额订阅已建立, req_id={}", subscription.req_id());
        self.balance_subscription = Some(subscription);
        Ok(true)
    }

    /// 用推送的余额覆盖最新快照，返回是否更新
    pub fn apply_balance_push(&self, event: &Value) -> bool {
        if !event.get("balance").is_some_and(Value::is_object) {
            debug!("忽略不含余额的推送");
            return false;
        }
        let balance = normalizer::normalize_balance(event);
        let updated = self.publisher.send_if_modified(|snapshot| match snapshot {
            Some(snapshot) => {
                snapshot.balance = balance.clone();
                true
            }
            None => false,
        });
        if updated {
            debug!("余额推送: {} {}", balance.amount, balance.currency);
        }
        updated
    }

    /// 运行到收到关闭信号为止；第一个周期立即执行
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("收到关闭信号，停止风险监控");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                push = next_push(&mut self.balance_subscription) => match push {
                    Some(Ok(event)) => {
                        self.apply_balance_push(&event);
                    }
                    Some(Err(e)) => warn!("余额推送错误: {}", e),
                    None => {
                        warn!("余额订阅已结束");
                        self.balance_subscription = None;
                    }
                },
            }
        }

        self.stop();
    }

    /// 取消余额订阅
    pub fn stop(&mut self) {
        if let Some(mut subscription) = self.balance_subscription.take() {
            subscription.cancel();
            info!("余额订阅已取消, req_id={}", subscription.req_id());
        }
    }
}

/// 失败的类别沿用上一周期的值（没有则为空值），并记为降级
fn settle<T: Default>(
    category: DataCategory,
    outcome: Result<T, RequestError>,
    previous: Option<T>,
    degraded: &mut Vec<DataCategory>,
) -> T {
    match outcome {
        Ok(value) => value,
        Err(e) => {
            match e {
                RequestError::ConnectionClosed => {
                    error!("拉取 {} 失败: {}", category.as_str(), e)
                }
                _ => warn!("拉取 {} 失败，沿用上一周期数据: {}", category.as_str(), e),
            }
            degraded.push(category);
            previous.unwrap_or_default()
        }
    }
}

async fn next_push(subscription: &mut Option<Subscription>) -> Option<SubscriptionEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}
