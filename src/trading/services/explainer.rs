//! 风险解释生成
//!
//! 外部文本生成服务只是可选协作者：调用失败时由 [`ExplanationService`](super::ExplanationService)
//! 回退到发现本身的静态文案。

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::risk::{RiskFinding, RiskKind, Severity};
use crate::trading::model::TradeRecord;

pub const HF_CHAT_COMPLETIONS_URL: &str = "https://router.huggingface.co/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a friendly, experienced trading risk coach. Explain trading risks in simple, conversational language. Be empathetic but direct. Give specific, actionable advice.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationSource {
    /// 文本生成服务
    Generated,
    /// 内置文案
    Canned,
    /// 发现本身的 message / recommendation
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub explanation: String,
    pub advice: String,
    pub source: ExplanationSource,
}

impl Explanation {
    pub fn fallback(finding: &RiskFinding) -> Self {
        Self {
            explanation: finding.message.clone(),
            advice: finding.recommendation.clone(),
            source: ExplanationSource::Fallback,
        }
    }
}

/// 风险解释接口
#[async_trait]
pub trait RiskExplainer: Send + Sync {
    fn name(&self) -> &str;

    /// `recent_trades` 为最新在前的一小段交易
    async fn explain(
        &self,
        finding: &RiskFinding,
        recent_trades: &[TradeRecord],
    ) -> anyhow::Result<Explanation>;
}

/// 不依赖外部服务的内置文案
#[derive(Debug, Clone, Default)]
pub struct StaticExplainer;

impl StaticExplainer {
    pub fn canned(kind: RiskKind) -> Explanation {
        let (explanation, advice) = match kind {
            RiskKind::Martingale => (
                "Hey, I noticed you're doubling your stakes after losses. This is called Martingale strategy, and it's one of the riskiest approaches in trading. Even professional traders avoid this because a small losing streak can wipe out your entire account in minutes. The math works against you - you risk huge amounts to win small profits.",
                "Switch to fixed stakes immediately. If you lose 2-3 trades in a row, stop trading and take a break. Never try to 'win back' losses by increasing your risk.",
            ),
            RiskKind::Overtrading => (
                "You're trading very frequently - I'm seeing 5+ trades in just 5 minutes. This pattern usually indicates emotional or impulsive decisions rather than careful analysis. When we trade too fast, we stop thinking strategically and start reacting emotionally, especially after losses.",
                "Set a rule: minimum 5-10 minutes between trades. Use that time to analyze the market properly and confirm your strategy. Quality over quantity always wins in trading.",
            ),
            RiskKind::LossStreak => (
                "You've had several losses in a row, which is completely normal in trading. However, continuing to trade during a losing streak often makes things worse. Our emotions take over, and we start making desperate decisions to 'get back to even.'",
                "Take a 1-hour break right now. When you come back, review what went wrong with fresh eyes. Consider reducing your stake size by 50% for the next few trades until you rebuild confidence.",
            ),
            RiskKind::BotRisk => (
                "Your DBot is using an automated Martingale or aggressive doubling strategy. While automation sounds good, these bots can drain your account faster than manual trading because they execute trades without hesitation. They don't feel fear when things go wrong - they just keep doubling.",
                "Stop the bot immediately. If you want to use automation, switch to a fixed-stake strategy where the bot never increases position size. Better yet, trade manually with strict rules until you're consistently profitable.",
            ),
            RiskKind::PositionSizing => (
                "Your position sizes are too large relative to your account balance. You're risking more than 5% per trade, which is way above the 1-2% that professional traders recommend. This means a few bad trades could seriously damage your account.",
                "Calculate 1-2% of your account balance and use that as your maximum stake. If your balance is $1000, never risk more than $10-20 per trade. It feels small, but it's how you survive long enough to become profitable.",
            ),
        };
        Explanation {
            explanation: explanation.to_string(),
            advice: advice.to_string(),
            source: ExplanationSource::Canned,
        }
    }
}

#[async_trait]
impl RiskExplainer for StaticExplainer {
    fn name(&self) -> &str {
        "static"
    }

    async fn explain(
        &self,
        finding: &RiskFinding,
        _recent_trades: &[TradeRecord],
    ) -> anyhow::Result<Explanation> {
        Ok(Self::canned(finding.kind))
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// 基于 chat-completion 接口的解释生成
pub struct HuggingFaceExplainer {
    client: reqwest::Client,
    api_token: String,
    model: String,
    endpoint: String,
}

impl HuggingFaceExplainer {
    pub fn new(api_token: impl Into<String>, model: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("构建 HTTP 客户端失败")?;
        Ok(Self {
            client,
            api_token: api_token.into(),
            model: model.into(),
            endpoint: HF_CHAT_COMPLETIONS_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_prompt(finding: &RiskFinding, recent_trades: &[TradeRecord]) -> String {
        let trades = recent_trades
            .iter()
            .take(5)
            .enumerate()
            .map(|(i, t)| {
                format!(
                    "{}. {} - Stake: ${} - P/L: ${:.2}",
                    i + 1,
                    t.symbol,
                    t.stake,
                    t.profit
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let severity = match finding.severity {
            Severity::High => "high",
            Severity::Medium => "medium",
        };

        format!(
            "A trader has the following risk pattern detected:\n\nRisk Type: {}\nSeverity: {}\nPattern: {}\n\nRecent trades:\n{}\n\nExplain this risk in 2-3 friendly sentences, then give specific advice on what they should do differently. Be conversational and supportive.",
            finding.kind.as_str(),
            severity,
            finding.message,
            trades
        )
    }
}

#[async_trait]
impl RiskExplainer for HuggingFaceExplainer {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn explain(
        &self,
        finding: &RiskFinding,
        recent_trades: &[TradeRecord],
    ) -> anyhow::Result<Explanation> {
        let prompt = Self::build_prompt(finding, recent_trades);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: 300,
            temperature: 0.7,
        };

        info!(
            "🤖 请求风险解释: kind={}, model={}",
            finding.kind.as_str(),
            self.model
        );
        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .context("风险解释请求失败")?
            .error_for_status()
            .context("风险解释服务返回错误状态")?
            .json()
            .await
            .context("风险解释响应无法解析")?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow!("风险解释响应没有内容"))?;

        Ok(Explanation {
            explanation: text,
            advice: finding.recommendation.clone(),
            source: ExplanationSource::Generated,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLevel {
    Safe,
    Warning,
    Danger,
}

/// 全部发现的总体评价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub summary: String,
    pub level: SummaryLevel,
}

pub fn summarize(findings: &[RiskFinding]) -> RiskSummary {
    if findings.is_empty() {
        return RiskSummary {
            summary: "Great job! Your trading looks disciplined and well-managed. Keep following your strategy and maintaining consistent position sizes.".to_string(),
            level: SummaryLevel::Safe,
        };
    }

    let high = findings
        .iter()
        .filter(|f| f.severity == Severity::High)
        .count();
    if high > 0 {
        return RiskSummary {
            summary: format!(
                "⚠️ URGENT: You have {} high-risk pattern(s) detected. Your account is in danger. These patterns typically lead to rapid account depletion. Stop trading immediately and review the warnings below.",
                high
            ),
            level: SummaryLevel::Danger,
        };
    }

    RiskSummary {
        summary: format!(
            "⚡ You have {} risk warning(s). While not immediately dangerous, these patterns reduce your chances of long-term success. Address them before they become habits.",
            findings.len()
        ),
        level: SummaryLevel::Warning,
    }
}
