use serde::{Deserialize, Serialize};

/// 自动化平台（DBot）产生的账单流水
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotLedgerEntry {
    pub id: u64,
    pub action_type: String,
    pub amount: f64,
    pub balance_after: f64,
    pub contract_id: u64,
    pub symbol: String,
    /// 策略描述（longcode）
    pub description: String,
    pub shortcode: String,
    pub transaction_time: i64,
    pub app_id: u64,
}
