//! 仓位大小检测

use crate::risk::thresholds::RiskThresholds;
use crate::risk::types::{RiskEvidence, RiskFinding, RiskKind, Severity};
use crate::trading::model::TradeRecord;

/// 最近几笔的平均下注额占余额的百分比
pub fn detect(
    trades: &[TradeRecord],
    balance: f64,
    thresholds: &RiskThresholds,
) -> Option<RiskFinding> {
    if trades.is_empty() || !balance.is_finite() || balance <= 0.0 {
        return None;
    }

    let recent = &trades[..trades.len().min(thresholds.sizing_lookback)];
    let avg_stake = recent.iter().map(|t| t.stake).sum::<f64>() / recent.len() as f64;
    let stake_percentage = avg_stake * 100.0 / balance;
    if stake_percentage <= thresholds.sizing_medium_pct {
        return None;
    }

    let severity = if stake_percentage > thresholds.sizing_high_pct {
        Severity::High
    } else {
        Severity::Medium
    };
    let suggested_max_stake = balance * thresholds.sizing_suggested_fraction;

    Some(RiskFinding {
        kind: RiskKind::PositionSizing,
        severity,
        evidence: RiskEvidence::PositionSizing {
            stake_percentage,
            avg_stake,
            suggested_max_stake,
        },
        message: format!(
            "Average stake is {:.1}% of account balance - Too high",
            stake_percentage
        ),
        explanation_seed: "Risk management experts recommend never risking more than 1-2% per trade.".to_string(),
        recommendation: format!(
            "Reduce your stake to ${:.2} or less per trade.",
            suggested_max_stake
        ),
    })
}
