//! 风险检测器
//!
//! 每个检测器都是纯函数：输入最新在前的交易序列，输出零或一条发现。

pub mod bot_risk;
pub mod loss_streak;
pub mod martingale;
pub mod overtrading;
pub mod position_sizing;
