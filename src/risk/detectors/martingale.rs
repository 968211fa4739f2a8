//! 马丁格尔（亏损后加注）检测

use crate::risk::thresholds::RiskThresholds;
use crate::risk::types::{MartingaleInstance, RiskEvidence, RiskFinding, RiskKind, Severity};
use crate::trading::model::TradeRecord;

/// 检测亏损后的加注
///
/// 在最近 `martingale_lookback` 笔中按时间顺序比较相邻两笔：较早一笔亏损，
/// 且较晚一笔下注额不低于较早一笔的 `martingale_multiplier` 倍即记一次。
/// 方向固定为“先亏损、后加注”；反过来的“加注后亏损”不计入。
pub fn detect(trades: &[TradeRecord], thresholds: &RiskThresholds) -> Option<RiskFinding> {
    if trades.len() < thresholds.min_trades {
        return None;
    }

    let recent = &trades[..trades.len().min(thresholds.martingale_lookback)];
    // 最新在前：windows 的第一个元素是较晚的一笔
    let instances: Vec<MartingaleInstance> = recent
        .windows(2)
        .filter_map(|pair| {
            let (later, earlier) = (&pair[0], &pair[1]);
            let escalated = earlier.profit < 0.0
                && earlier.stake > 0.0
                && later.stake >= earlier.stake * thresholds.martingale_multiplier;
            escalated.then(|| MartingaleInstance {
                previous_stake: earlier.stake,
                current_stake: later.stake,
                increase_pct: (later.stake / earlier.stake - 1.0) * 100.0,
            })
        })
        .collect();

    if instances.len() < thresholds.martingale_occurrences {
        return None;
    }

    let count = instances.len();
    Some(RiskFinding {
        kind: RiskKind::Martingale,
        severity: Severity::High,
        evidence: RiskEvidence::Martingale { count, instances },
        message: format!(
            "Stake doubling detected after {} losses - Classic Martingale pattern",
            count
        ),
        explanation_seed: "You increased your stake after losing. This is extremely risky and can wipe your account quickly.".to_string(),
        recommendation: "Use fixed stakes or stop trading after 2-3 consecutive losses.".to_string(),
    })
}
