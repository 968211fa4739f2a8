use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    Martingale,
    Overtrading,
    LossStreak,
    BotRisk,
    PositionSizing,
}

impl RiskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskKind::Martingale => "martingale",
            RiskKind::Overtrading => "overtrading",
            RiskKind::LossStreak => "loss_streak",
            RiskKind::BotRisk => "bot_risk",
            RiskKind::PositionSizing => "position_sizing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
}

/// 综合风险等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// 展示层使用的颜色
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "green",
            RiskLevel::Medium => "yellow",
            RiskLevel::High => "red",
        }
    }
}

/// 一次加注实例：亏损后下一笔的下注额
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MartingaleInstance {
    pub previous_stake: f64,
    pub current_stake: f64,
    /// 加注幅度（百分比）
    pub increase_pct: f64,
}

/// 各类风险的证据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RiskEvidence {
    Martingale {
        count: usize,
        instances: Vec<MartingaleInstance>,
    },
    Overtrading {
        count: usize,
        window_secs: u64,
    },
    LossStreak {
        streak: usize,
        total_loss: f64,
    },
    BotRisk {
        bot_type: String,
        keyword: String,
        transaction_count: usize,
    },
    PositionSizing {
        stake_percentage: f64,
        avg_stake: f64,
        suggested_max_stake: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub kind: RiskKind,
    pub severity: Severity,
    pub evidence: RiskEvidence,
    pub message: String,
    /// 给解释生成器的静态说明，也是其失败时的兜底文本
    pub explanation_seed: String,
    pub recommendation: String,
}

/// 未平仓合约的敞口汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureSummary {
    pub open_positions: usize,
    pub total_stake: f64,
    pub unrealized_profit: f64,
}

/// 每个周期从头计算的风险报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// 0..=100，越低风险越高
    pub score: u8,
    pub level: RiskLevel,
    pub findings: Vec<RiskFinding>,
    pub exposure: ExposureSummary,
}

impl RiskReport {
    pub fn finding(&self, kind: RiskKind) -> Option<&RiskFinding> {
        self.findings.iter().find(|f| f.kind == kind)
    }

    /// 最严重的一条（同级时取先检测到的）
    pub fn most_severe(&self) -> Option<&RiskFinding> {
        self.findings
            .iter()
            .fold(None, |best: Option<&RiskFinding>, f| match best {
                Some(b) if b.severity >= f.severity => Some(b),
                _ => Some(f),
            })
    }
}
