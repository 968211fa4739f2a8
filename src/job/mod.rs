pub mod risk_monitor_job;

pub use risk_monitor_job::{DataCategory, RiskMonitorJob, RiskSnapshot};
