use serde::{Deserialize, Serialize};

/// 账户余额快照，轮询与推送都会更新，后写入者生效
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub amount: f64,
    pub currency: String,
}
