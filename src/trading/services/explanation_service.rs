//! 风险解释服务：限频 + 失败回退

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::app_config::ExplainerConfig;
use crate::risk::RiskFinding;
use crate::trading::model::TradeRecord;
use crate::trading::services::cooldown::Cooldown;
use crate::trading::services::explainer::{
    Explanation, HuggingFaceExplainer, RiskExplainer, StaticExplainer,
};

/// 传给解释生成器的最近交易笔数
const CONTEXT_TRADES: usize = 5;

pub struct ExplanationService {
    explainer: Arc<dyn RiskExplainer>,
    cooldown: Mutex<Cooldown>,
}

impl ExplanationService {
    pub fn new(explainer: Arc<dyn RiskExplainer>, cooldown: Cooldown) -> Self {
        Self {
            explainer,
            cooldown: Mutex::new(cooldown),
        }
    }

    /// 配置了 token 时使用外部服务，否则使用内置文案
    pub fn from_config(config: &ExplainerConfig) -> anyhow::Result<Self> {
        let explainer: Arc<dyn RiskExplainer> = match &config.api_token {
            Some(token) => Arc::new(HuggingFaceExplainer::new(token.clone(), config.model.clone())?),
            None => Arc::new(StaticExplainer),
        };
        Ok(Self::new(explainer, Cooldown::new(None, config.cooldown)))
    }

    pub fn explainer_name(&self) -> &str {
        self.explainer.name()
    }

    /// 不会失败：冷却中或生成失败时返回发现自带的文案
    pub async fn explain(&self, finding: &RiskFinding, trades: &[TradeRecord]) -> Explanation {
        let acquired = self.cooldown.lock().await.try_acquire(Instant::now());
        if !acquired {
            debug!("解释生成冷却中, kind={}", finding.kind.as_str());
            return Explanation::fallback(finding);
        }

        let recent = &trades[..trades.len().min(CONTEXT_TRADES)];
        match self.explainer.explain(finding, recent).await {
            Ok(explanation) => explanation,
            Err(e) => {
                warn!(
                    "风险解释生成失败, 使用静态文案: explainer={}, error={:#}",
                    self.explainer.name(),
                    e
                );
                Explanation::fallback(finding)
            }
        }
    }
}
