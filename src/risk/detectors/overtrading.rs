//! 过度交易检测

use crate::risk::thresholds::RiskThresholds;
use crate::risk::types::{RiskEvidence, RiskFinding, RiskKind, Severity};
use crate::trading::model::TradeRecord;

/// 统计 `now_ms` 之前窗口内买入的交易
pub fn detect(
    trades: &[TradeRecord],
    now_ms: i64,
    thresholds: &RiskThresholds,
) -> Option<RiskFinding> {
    if trades.is_empty() {
        return None;
    }

    let window_start = now_ms - thresholds.overtrading_window_ms;
    let count = trades
        .iter()
        .filter(|t| t.purchase_time >= window_start)
        .count();
    if count < thresholds.overtrading_count {
        return None;
    }

    let window_secs = (thresholds.overtrading_window_ms / 1000).max(0) as u64;
    let minutes = window_secs / 60;
    Some(RiskFinding {
        kind: RiskKind::Overtrading,
        severity: Severity::Medium,
        evidence: RiskEvidence::Overtrading { count, window_secs },
        message: format!(
            "{} trades in {} minutes - Possible emotional or revenge trading",
            count, minutes
        ),
        explanation_seed: "Trading too frequently often indicates emotional decisions rather than strategic thinking.".to_string(),
        recommendation: "Take a break. Set a minimum time between trades (at least 5-10 minutes).".to_string(),
    })
}
