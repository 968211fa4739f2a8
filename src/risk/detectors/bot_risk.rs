//! 自动化策略（DBot）风险检测

use crate::risk::types::{RiskEvidence, RiskFinding, RiskKind, Severity};
use crate::trading::model::BotLedgerEntry;

struct BotPattern {
    keyword: &'static str,
    name: &'static str,
    severity: Severity,
    /// 包含关键字但属于其他策略族的写法
    excludes: &'static [&'static str],
}

/// 按顺序匹配，第一个命中的关键字生效
const RISKY_PATTERNS: [BotPattern; 4] = [
    BotPattern {
        keyword: "martingale",
        name: "Martingale",
        severity: Severity::High,
        excludes: &["anti-martingale"],
    },
    BotPattern {
        keyword: "d'alembert",
        name: "D'Alembert",
        severity: Severity::High,
        excludes: &[],
    },
    BotPattern {
        keyword: "anti-martingale",
        name: "Anti-Martingale",
        severity: Severity::Medium,
        excludes: &[],
    },
    BotPattern {
        keyword: "grid",
        name: "Grid Trading",
        severity: Severity::Medium,
        excludes: &[],
    },
];

impl BotPattern {
    fn matches(&self, text: &str) -> bool {
        let mut text = text.to_lowercase();
        for exclude in self.excludes {
            text = text.replace(exclude, " ");
        }
        text.contains(self.keyword)
    }

    fn matches_entry(&self, entry: &BotLedgerEntry) -> bool {
        self.matches(&entry.description) || self.matches(&entry.shortcode)
    }
}

pub fn detect(bot_ledger: &[BotLedgerEntry]) -> Option<RiskFinding> {
    if bot_ledger.is_empty() {
        return None;
    }

    let pattern = RISKY_PATTERNS
        .iter()
        .find(|p| bot_ledger.iter().any(|entry| p.matches_entry(entry)))?;

    Some(RiskFinding {
        kind: RiskKind::BotRisk,
        severity: pattern.severity,
        evidence: RiskEvidence::BotRisk {
            bot_type: format!("{} DBot", pattern.name),
            keyword: pattern.keyword.to_string(),
            transaction_count: bot_ledger.len(),
        },
        message: format!(
            "Automated {} strategy detected - High account risk",
            pattern.name
        ),
        explanation_seed: format!(
            "{} strategies automatically increase stakes after losses. This can drain your account in minutes during volatility.",
            pattern.name
        ),
        recommendation: "Stop the bot immediately. Use fixed-stake strategies or manual trading with strict limits.".to_string(),
    })
}
