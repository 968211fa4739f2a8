use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use crate::app_config::AppSettings;
use crate::job::{RiskMonitorJob, RiskSnapshot};
use crate::risk::RiskEngine;
use crate::socket::DerivWebsocketClient;
use crate::time_util;
use crate::trading::deriv::DerivApi;
use crate::trading::services::{summarize, ExplanationService};

/// 命令行对运行方式的覆盖
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// 只执行一个周期后退出
    pub once: bool,
}

/// 应用入口总编排：连接/授权/监控/信号/优雅关闭
pub async fn run(settings: AppSettings, options: RunOptions) -> anyhow::Result<()> {
    let token = settings
        .api_token
        .clone()
        .ok_or_else(|| anyhow!("未配置 DERIV_API_TOKEN，也没有通过 --token 传入"))?;

    let client = Arc::new(DerivWebsocketClient::new(settings.socket.clone()));
    client.connect().await.context("连接 Deriv 失败")?;

    // 授权失败直接返回，不使用同一凭证重试
    let identity = match client.authorize(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            client.disconnect().await;
            return Err(anyhow!("授权失败: {}", e));
        }
    };
    info!(
        "✅ 授权成功: loginid={}, currency={}, balance={}",
        identity.loginid, identity.currency, identity.balance
    );

    let explainer = Arc::new(ExplanationService::from_config(&settings.explainer)?);
    info!("风险解释使用: {}", explainer.explainer_name());

    let feed = Arc::new(DerivApi::new(client.clone()));
    let mut job = RiskMonitorJob::new(feed, RiskEngine::default(), settings.monitor.clone())
        .with_identity(identity);
    if let Err(e) = job.start_balance_stream().await {
        warn!("余额订阅失败，仅依赖轮询: {}", e);
    }

    if options.once {
        let snapshot = job.run_cycle().await;
        report_snapshot(&snapshot, &explainer).await;
        job.stop();
        client.disconnect().await;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let reporter = tokio::spawn(watch_reports(job.subscribe(), explainer));
    let monitor = tokio::spawn(async move {
        job.run(shutdown_rx).await;
    });

    let signal_name = setup_shutdown_signals().await?;
    info!("接收到 {} 信号，开始优雅关闭...", signal_name);

    let _ = shutdown_tx.send(());
    if let Err(e) = monitor.await {
        error!("风险监控任务异常退出: {}", e);
    }
    reporter.abort();
    client.disconnect().await;

    info!("应用已优雅退出");
    Ok(())
}

/// 每次发布新快照时输出报告
async fn watch_reports(
    mut updates: watch::Receiver<Option<RiskSnapshot>>,
    explainer: Arc<ExplanationService>,
) {
    let mut last_cycle = 0;
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        let Some(snapshot) = snapshot else {
            continue;
        };
        // 余额推送只更新余额，不重复输出报告
        if snapshot.cycle == last_cycle {
            continue;
        }
        last_cycle = snapshot.cycle;
        report_snapshot(&snapshot, &explainer).await;
    }
}

async fn report_snapshot(snapshot: &RiskSnapshot, explainer: &ExplanationService) {
    let report = &snapshot.report;
    let generated_at = time_util::mill_time_to_datetime(snapshot.generated_at)
        .unwrap_or_else(|_| snapshot.generated_at.to_string());
    info!(
        "🛡️ [{}] 风险评分 {} ({:?}/{}), 余额 {} {}, 胜率 {:.1}% ({} 笔), 持仓 {} 个",
        generated_at,
        report.score,
        report.level,
        report.level.color(),
        snapshot.balance.amount,
        snapshot.balance.currency,
        snapshot.stats.win_rate,
        snapshot.stats.total,
        report.exposure.open_positions
    );
    if snapshot.is_degraded() {
        warn!("⚠️ 本周期数据不完整: {:?}", snapshot.degraded);
    }
    for finding in &report.findings {
        info!("  - [{:?}] {}", finding.severity, finding.message);
    }
    info!("{}", summarize(&report.findings).summary);

    if let Some(finding) = report.most_severe() {
        let explanation = explainer.explain(finding, &snapshot.trades).await;
        info!("💡 {}", explanation.explanation);
        info!("👉 {}", explanation.advice);
    }
}

/// 设置多种退出信号处理
async fn setup_shutdown_signals() -> anyhow::Result<&'static str> {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to register SIGTERM handler")?;
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .context("Failed to register SIGINT handler")?;

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        Ok(name)
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .context("Failed to listen for ctrl-c")?;
        Ok("CTRL+C")
    }
}
