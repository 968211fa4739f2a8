use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::RequestError;
use crate::socket::{DerivWebsocketClient, Subscription};
use crate::trading::model::{BalanceSnapshot, BotLedgerEntry, Position, TradeRecord};
use crate::trading::normalizer;

/// 账户数据来源：四类轮询数据加余额推送
#[async_trait]
pub trait AccountFeed: Send + Sync {
    async fn get_balance(&self) -> Result<BalanceSnapshot, RequestError>;
    async fn get_open_positions(&self) -> Result<Vec<Position>, RequestError>;
    async fn get_trade_history(&self, limit: u32) -> Result<Vec<TradeRecord>, RequestError>;
    async fn get_bot_activity(&self, limit: u32) -> Result<Vec<BotLedgerEntry>, RequestError>;
    async fn subscribe_balance(&self) -> Result<Subscription, RequestError>;
}

/// 基于 [`DerivWebsocketClient`] 的分类请求
pub struct DerivApi {
    client: Arc<DerivWebsocketClient>,
}

impl DerivApi {
    pub fn new(client: Arc<DerivWebsocketClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<DerivWebsocketClient> {
        &self.client
    }
}

#[async_trait]
impl AccountFeed for DerivApi {
    async fn get_balance(&self) -> Result<BalanceSnapshot, RequestError> {
        let response = self.client.request(json!({ "balance": 1 })).await?;
        Ok(normalizer::normalize_balance(&response))
    }

    async fn get_open_positions(&self) -> Result<Vec<Position>, RequestError> {
        let response = self.client.request(json!({ "portfolio": 1 })).await?;
        let positions = normalizer::normalize_positions(&response);
        debug!("open positions: {}", positions.len());
        Ok(positions)
    }

    async fn get_trade_history(&self, limit: u32) -> Result<Vec<TradeRecord>, RequestError> {
        let response = self
            .client
            .request(json!({
                "profit_table": 1,
                "description": 1,
                "limit": limit,
                "sort": "DESC"
            }))
            .await?;
        let trades = normalizer::normalize_trades(&response);
        debug!("trade history: {}", trades.len());
        Ok(trades)
    }

    async fn get_bot_activity(&self, limit: u32) -> Result<Vec<BotLedgerEntry>, RequestError> {
        let response = self
            .client
            .request(json!({
                "statement": 1,
                "description": 1,
                "limit": limit
            }))
            .await?;
        let entries = normalizer::normalize_bot_activity(&response);
        debug!("bot ledger entries: {}", entries.len());
        Ok(entries)
    }

    async fn subscribe_balance(&self) -> Result<Subscription, RequestError> {
        self.client
            .subscribe(json!({ "balance": 1, "subscribe": 1 }))
            .await
    }
}
