//! Deriv 上游负载的强类型结构
//!
//! 字段缺失、为 null 或类型不符时一律退化为默认值（数值为 0，字符串为空），不会报错。

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_to_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = lenient_string(deserializer)?;
    Ok(Some(value).filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub loginid: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceDto {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: String,
}

/// portfolio.contracts[]
#[derive(Debug, Default, Deserialize)]
pub struct PortfolioContractDto {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub contract_id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contract_type: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub buy_price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub profit: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub payout: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub date_start: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub expiry_time: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub longcode: String,
}

/// profit_table.transactions[]
#[derive(Debug, Default, Deserialize)]
pub struct ProfitTableTransactionDto {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub transaction_id: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub contract_id: u64,
    /// 较新的接口版本才会返回
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub underlying_symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contract_type: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub buy_price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sell_price: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub purchase_time: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub sell_time: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub longcode: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub shortcode: String,
}

/// statement.transactions[]
#[derive(Debug, Default, Deserialize)]
pub struct StatementTransactionDto {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub transaction_id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub action_type: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance_after: f64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub contract_id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub longcode: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub shortcode: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub transaction_time: i64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub app_id: u64,
}

impl AuthorizeDto {
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}
