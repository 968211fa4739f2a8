//! 风险分析引擎
//!
//! 纯函数：每个周期用规范化后的数据从头计算报告，不保留任何跨周期状态。

use tracing::debug;

use crate::risk::detectors::{bot_risk, loss_streak, martingale, overtrading, position_sizing};
use crate::risk::thresholds::RiskThresholds;
use crate::risk::types::{
    ExposureSummary, RiskFinding, RiskKind, RiskLevel, RiskReport, Severity,
};
use crate::time_util;
use crate::trading::model::{BotLedgerEntry, Position, TradeRecord};

#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    thresholds: RiskThresholds,
}

impl RiskEngine {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// 以当前时间为过度交易窗口的终点
    pub fn analyze(
        &self,
        trades: &[TradeRecord],
        positions: &[Position],
        bot_ledger: &[BotLedgerEntry],
        balance: f64,
    ) -> RiskReport {
        self.analyze_at(trades, positions, bot_ledger, balance, time_util::now_millis())
    }

    /// `trades` 需为最新在前
    pub fn analyze_at(
        &self,
        trades: &[TradeRecord],
        positions: &[Position],
        bot_ledger: &[BotLedgerEntry],
        balance: f64,
        now_ms: i64,
    ) -> RiskReport {
        let t = &self.thresholds;
        let findings: Vec<RiskFinding> = [
            martingale::detect(trades, t),
            overtrading::detect(trades, now_ms, t),
            loss_streak::detect(trades, t),
            bot_risk::detect(bot_ledger),
            position_sizing::detect(trades, balance, t),
        ]
        .into_iter()
        .flatten()
        .collect();

        let score = self.score(&findings);
        let level = self.level(score);
        debug!(
            "风险分析完成: trades={}, findings={}, score={}",
            trades.len(),
            findings.len(),
            score
        );

        RiskReport {
            score,
            level,
            findings,
            exposure: exposure(positions),
        }
    }

    /// 从 100 起按发现扣分，结果截断到 [0, 100]
    pub fn score(&self, findings: &[RiskFinding]) -> u8 {
        let score = findings
            .iter()
            .fold(100i32, |score, f| score - self.penalty(f));
        score.clamp(0, 100) as u8
    }

    pub fn level(&self, score: u8) -> RiskLevel {
        if score >= self.thresholds.medium_risk_score {
            RiskLevel::Low
        } else if score >= self.thresholds.high_risk_score {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    fn penalty(&self, finding: &RiskFinding) -> i32 {
        let p = &self.thresholds.penalties;
        match (finding.kind, finding.severity) {
            (RiskKind::Martingale, _) => p.martingale,
            (RiskKind::Overtrading, _) => p.overtrading,
            (RiskKind::LossStreak, Severity::High) => p.loss_streak_high,
            (RiskKind::LossStreak, Severity::Medium) => p.loss_streak_medium,
            (RiskKind::BotRisk, _) => p.bot_risk,
            (RiskKind::PositionSizing, Severity::High) => p.position_sizing_high,
            (RiskKind::PositionSizing, Severity::Medium) => p.position_sizing_medium,
        }
    }
}

fn exposure(positions: &[Position]) -> ExposureSummary {
    ExposureSummary {
        open_positions: positions.len(),
        total_stake: positions.iter().map(|p| p.stake).sum(),
        unrealized_profit: positions.iter().map(|p| p.current_profit).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::detectors::fixtures::{ledger_entry, trade, trades_with_profits};

    const NOW: i64 = 1_800_000_000_000;

    #[test]
    fn test_clean_history_scores_full() {
        let trades = trades_with_profits(&[1.0, -1.0, 2.0]);
        let report = RiskEngine::default().analyze_at(&trades, &[], &[], 10_000.0, NOW);
        assert_eq!(report.score, 100);
        assert_eq!(report.level, RiskLevel::Low);
        assert_eq!(report.level.color(), "green");
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_penalties_add_and_clamp() {
        // 马丁格尔 + 连亏(高) + 机器人 + 仓位(高) = 40 + 25 + 30 + 25
        let trades = vec![
            trade(6, 400.0, -400.0, 6_000),
            trade(5, 200.0, -200.0, 5_000),
            trade(4, 100.0, -100.0, 4_000),
            trade(3, 50.0, -50.0, 3_000),
            trade(2, 25.0, -25.0, 2_000),
        ];
        let ledger = vec![ledger_entry(1, "martingale", "")];
        let report = RiskEngine::default().analyze_at(&trades, &[], &ledger, 1_000.0, NOW);
        assert_eq!(report.findings.len(), 4);
        assert_eq!(report.score, 0);
        assert_eq!(report.level, RiskLevel::High);
        assert_eq!(report.level.color(), "red");
    }

    #[test]
    fn test_findings_keep_detector_order() {
        let trades: Vec<TradeRecord> = (0..5)
            .map(|i| trade(i + 1, 10.0, -1.0, NOW - i as i64 * 1_000))
            .collect();
        let report = RiskEngine::default().analyze_at(&trades, &[], &[], 10_000.0, NOW);
        let kinds: Vec<RiskKind> = report.findings.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![RiskKind::Overtrading, RiskKind::LossStreak]);
        // 100 - 20 - 25
        assert_eq!(report.score, 55);
        assert_eq!(report.level, RiskLevel::Medium);
        assert_eq!(report.most_severe().unwrap().kind, RiskKind::LossStreak);
    }

    #[test]
    fn test_level_boundaries() {
        let engine = RiskEngine::default();
        assert_eq!(engine.level(70), RiskLevel::Low);
        assert_eq!(engine.level(69), RiskLevel::Medium);
        assert_eq!(engine.level(40), RiskLevel::Medium);
        assert_eq!(engine.level(39), RiskLevel::High);
    }

    #[test]
    fn test_exposure_summary() {
        let position = Position {
            id: 1,
            symbol: "R_100".to_string(),
            contract_type: "CALL".to_string(),
            stake: 10.0,
            current_profit: -2.5,
            payout: 19.5,
            currency: "USD".to_string(),
            opened_at: 0,
            expires_at: 0,
            longcode: String::new(),
        };
        let positions = vec![position.clone(), Position { id: 2, stake: 5.0, current_profit: 1.0, ..position }];
        let report = RiskEngine::default().analyze_at(&[], &positions, &[], 100.0, NOW);
        assert_eq!(report.exposure.open_positions, 2);
        assert_eq!(report.exposure.total_stake, 15.0);
        assert_eq!(report.exposure.unrealized_profit, -1.5);
    }
}
