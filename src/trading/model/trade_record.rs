use serde::{Deserialize, Serialize};

/// 已平仓交易（来自 profit_table）
///
/// `profit = sell_price - buy_price`；时间均为毫秒时间戳。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: u64,
    pub contract_id: u64,
    pub symbol: String,
    pub contract_type: String,
    /// 买入价格
    pub stake: f64,
    pub sell_price: f64,
    pub profit: f64,
    pub purchase_time: i64,
    pub close_time: i64,
    pub raw_shortcode: String,
    pub raw_longcode: String,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.profit > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.profit < 0.0
    }
}
