use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::trading::deriv::dto::AuthorizeDto;

/// 授权成功后的账户身份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub loginid: String,
    pub currency: String,
    pub balance: f64,
    pub email: String,
    pub country: String,
}

impl Identity {
    /// 从 `authorize` 负载构造；缺少 loginid 视为格式错误
    pub fn from_authorize(authorize: &Value) -> Option<Self> {
        if !authorize.is_object() {
            return None;
        }
        let dto = AuthorizeDto::from_value(authorize)?;
        if dto.loginid.is_empty() {
            return None;
        }
        Some(Self {
            loginid: dto.loginid,
            currency: dto.currency,
            balance: dto.balance,
            email: dto.email,
            country: dto.country.unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}
