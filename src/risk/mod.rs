pub mod detectors;
pub mod engine;
pub mod thresholds;
pub mod types;

pub use engine::RiskEngine;
pub use thresholds::{Penalties, RiskThresholds};
pub use types::{
    ExposureSummary, MartingaleInstance, RiskEvidence, RiskFinding, RiskKind, RiskLevel,
    RiskReport, Severity,
};
