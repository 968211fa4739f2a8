//! 检测阈值与扣分

/// 风险检测阈值
#[derive(Debug, Clone)]
pub struct RiskThresholds {
    /// 亏损后加注倍数
    pub martingale_multiplier: f64,
    pub martingale_occurrences: usize,
    /// 马丁格尔检测只看最近 N 笔
    pub martingale_lookback: usize,
    pub overtrading_count: usize,
    pub overtrading_window_ms: i64,
    pub loss_streak_min: usize,
    pub loss_streak_high: usize,
    /// 少于该笔数时不做马丁格尔与连亏检测
    pub min_trades: usize,
    pub sizing_lookback: usize,
    /// 单笔平均下注占余额的百分比
    pub sizing_medium_pct: f64,
    pub sizing_high_pct: f64,
    /// 建议的单笔最大风险占比
    pub sizing_suggested_fraction: f64,
    /// 低于该分数为高风险
    pub high_risk_score: u8,
    /// 低于该分数为中风险
    pub medium_risk_score: u8,
    pub penalties: Penalties,
}

/// 各类风险的扣分
#[derive(Debug, Clone)]
pub struct Penalties {
    pub martingale: i32,
    pub overtrading: i32,
    pub loss_streak_high: i32,
    pub loss_streak_medium: i32,
    pub bot_risk: i32,
    pub position_sizing_high: i32,
    pub position_sizing_medium: i32,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            martingale: 40,
            overtrading: 20,
            loss_streak_high: 25,
            loss_streak_medium: 15,
            bot_risk: 30,
            position_sizing_high: 25,
            position_sizing_medium: 15,
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            martingale_multiplier: 1.8,
            martingale_occurrences: 2,
            martingale_lookback: 10,
            overtrading_count: 5,
            overtrading_window_ms: 5 * 60 * 1000,
            loss_streak_min: 3,
            loss_streak_high: 5,
            min_trades: 3,
            sizing_lookback: 5,
            sizing_medium_pct: 5.0,
            sizing_high_pct: 10.0,
            sizing_suggested_fraction: 0.02,
            high_risk_score: 40,
            medium_risk_score: 70,
            penalties: Penalties::default(),
        }
    }
}
