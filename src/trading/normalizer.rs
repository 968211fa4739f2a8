//! 上游原始负载 → 规范化领域数据
//!
//! 纯函数、无状态、不会失败：缺失的分类返回空集合，无法解析的元素跳过并记录 warn。

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::trading::deriv::dto::{
    BalanceDto, PortfolioContractDto, ProfitTableTransactionDto, StatementTransactionDto,
};
use crate::trading::deriv::symbols::{extract_symbol, is_bot_app, is_synthetic};
use crate::trading::model::{BalanceSnapshot, BotLedgerEntry, Position, TradeRecord};

/// 上游时间为秒
fn secs_to_millis(secs: i64) -> i64 {
    secs.saturating_mul(1000)
}

/// 按上游 id 去重；id 缺失时为 0，这类记录无法判重，全部保留
fn first_seen(seen: &mut HashSet<u64>, id: u64) -> bool {
    id == 0 || seen.insert(id)
}

fn items<'a, T: Deserialize<'a>>(response: &'a Value, pointer: &str) -> Vec<T> {
    let Some(array) = response.pointer(pointer).and_then(Value::as_array) else {
        return Vec::new();
    };
    array
        .iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(dto) => Some(dto),
            Err(e) => {
                warn!("跳过无法解析的元素 {}: {}", pointer, e);
                None
            }
        })
        .collect()
}

/// 余额：轮询响应与订阅推送结构相同
pub fn normalize_balance(response: &Value) -> BalanceSnapshot {
    let dto = response
        .get("balance")
        .and_then(|b| BalanceDto::deserialize(b).ok())
        .unwrap_or_default();
    BalanceSnapshot {
        amount: dto.balance,
        currency: dto.currency,
    }
}

/// 未平仓合约：只保留白名单品种，按合约 id 去重
pub fn normalize_positions(response: &Value) -> Vec<Position> {
    let mut seen = HashSet::new();
    items::<PortfolioContractDto>(response, "/portfolio/contracts")
        .into_iter()
        .filter(|c| is_synthetic(&c.symbol))
        .filter(|c| first_seen(&mut seen, c.contract_id))
        .map(|c| Position {
            id: c.contract_id,
            symbol: c.symbol.trim().to_uppercase(),
            contract_type: c.contract_type,
            stake: c.buy_price,
            current_profit: c.profit,
            payout: c.payout,
            currency: c.currency,
            opened_at: secs_to_millis(c.date_start),
            expires_at: secs_to_millis(c.expiry_time),
            longcode: c.longcode,
        })
        .collect()
}

/// 已平仓交易
///
/// 带品种字段的交易按白名单过滤；没有品种字段时从 shortcode 提取，提取不到记为 `UNKNOWN`
/// 但仍保留。按交易 id 去重，结果按买入时间倒序（最新在前）。
pub fn normalize_trades(response: &Value) -> Vec<TradeRecord> {
    let mut seen = HashSet::new();
    let mut trades: Vec<TradeRecord> = items::<ProfitTableTransactionDto>(
        response,
        "/profit_table/transactions",
    )
    .into_iter()
    .filter_map(|t| {
        let symbol = match t.underlying_symbol.as_deref() {
            Some(symbol) if is_synthetic(symbol) => symbol.trim().to_uppercase(),
            Some(_) => return None,
            None => extract_symbol(&t.shortcode).to_string(),
        };
        if !first_seen(&mut seen, t.transaction_id) {
            return None;
        }
        Some(TradeRecord {
            id: t.transaction_id,
            contract_id: t.contract_id,
            symbol,
            contract_type: t.contract_type,
            stake: t.buy_price,
            sell_price: t.sell_price,
            profit: t.sell_price - t.buy_price,
            purchase_time: secs_to_millis(t.purchase_time),
            close_time: secs_to_millis(t.sell_time),
            raw_shortcode: t.shortcode,
            raw_longcode: t.longcode,
        })
    })
    .collect();

    // 稳定排序，同一时间的交易保持上游顺序
    trades.sort_by(|a, b| b.purchase_time.cmp(&a.purchase_time));
    trades
}

/// 账单流水：只保留自动化平台产生的条目
pub fn normalize_bot_activity(response: &Value) -> Vec<BotLedgerEntry> {
    let mut seen = HashSet::new();
    items::<StatementTransactionDto>(response, "/statement/transactions")
        .into_iter()
        .filter(|t| is_bot_app(t.app_id))
        .filter(|t| first_seen(&mut seen, t.transaction_id))
        .map(|t| BotLedgerEntry {
            id: t.transaction_id,
            symbol: extract_symbol(&t.shortcode).to_string(),
            action_type: t.action_type,
            amount: t.amount,
            balance_after: t.balance_after,
            contract_id: t.contract_id,
            description: t.longcode,
            shortcode: t.shortcode,
            transaction_time: secs_to_millis(t.transaction_time),
            app_id: t.app_id,
        })
        .collect()
}
