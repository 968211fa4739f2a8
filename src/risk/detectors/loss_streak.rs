//! 连续亏损检测

use crate::risk::thresholds::RiskThresholds;
use crate::risk::types::{RiskEvidence, RiskFinding, RiskKind, Severity};
use crate::trading::model::TradeRecord;

/// 只统计从最新一笔开始的连续亏损，遇到第一笔非亏损即停止
pub fn detect(trades: &[TradeRecord], thresholds: &RiskThresholds) -> Option<RiskFinding> {
    if trades.len() < thresholds.min_trades {
        return None;
    }

    let losing: Vec<&TradeRecord> = trades.iter().take_while(|t| t.is_loss()).collect();
    let streak = losing.len();
    if streak < thresholds.loss_streak_min {
        return None;
    }

    let total_loss: f64 = losing.iter().map(|t| t.profit.abs()).sum();
    let severity = if streak >= thresholds.loss_streak_high {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(RiskFinding {
        kind: RiskKind::LossStreak,
        severity,
        evidence: RiskEvidence::LossStreak { streak, total_loss },
        message: format!(
            "{} consecutive losses totaling ${:.2}",
            streak, total_loss
        ),
        explanation_seed: "Losing streaks are normal, but continuing to trade during one often makes it worse.".to_string(),
        recommendation: "Stop trading for at least 1 hour. Review your strategy before continuing.".to_string(),
    })
}
