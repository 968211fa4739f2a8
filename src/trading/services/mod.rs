pub mod cooldown;
pub mod explainer;
pub mod explanation_service;
pub mod trade_stats;

pub use cooldown::Cooldown;
pub use explainer::{
    summarize, Explanation, ExplanationSource, HuggingFaceExplainer, RiskExplainer, RiskSummary,
    StaticExplainer, SummaryLevel,
};
pub use explanation_service::ExplanationService;
pub use trade_stats::TradeStats;
