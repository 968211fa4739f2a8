use serde::{Deserialize, Serialize};

/// 未平仓合约（来自 portfolio），每次拉取整体替换
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: u64,
    pub symbol: String,
    pub contract_type: String,
    pub stake: f64,
    pub current_profit: f64,
    pub payout: f64,
    pub currency: String,
    pub opened_at: i64,
    pub expires_at: i64,
    pub longcode: String,
}
