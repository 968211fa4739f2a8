use serde::{Deserialize, Serialize};

use crate::trading::model::TradeRecord;

/// 已平仓交易的汇总统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    /// 胜率（百分比）
    pub win_rate: f64,
    pub total_profit: f64,
}

impl TradeStats {
    pub fn from_trades(trades: &[TradeRecord]) -> Self {
        let total = trades.len();
        let wins = trades.iter().filter(|t| t.is_win()).count();
        let losses = trades.iter().filter(|t| t.is_loss()).count();
        let win_rate = if total == 0 {
            0.0
        } else {
            wins as f64 * 100.0 / total as f64
        };
        Self {
            total,
            wins,
            losses,
            win_rate,
            total_profit: trades.iter().map(|t| t.profit).sum(),
        }
    }
}
