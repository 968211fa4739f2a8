use std::time::Duration;

use clap::Parser;
use dotenv::dotenv;
use tracing::error;

use rust_risk_guard::app::bootstrap::{self, RunOptions};
use rust_risk_guard::app_config::log::setup_logging;
use rust_risk_guard::app_config::AppSettings;

/// Deriv 账户实时风险监控
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// API token，覆盖 DERIV_API_TOKEN
    #[arg(long)]
    token: Option<String>,

    /// 刷新间隔（秒），覆盖 REFRESH_INTERVAL_SECS
    #[arg(short, long)]
    interval: Option<u64>,

    /// 只执行一个分析周期
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // 设置日志
    setup_logging()?;

    let mut settings = AppSettings::from_env()?;
    if let Some(token) = args.token {
        settings.api_token = Some(token);
    }
    if let Some(secs) = args.interval {
        settings.monitor.refresh_interval = Duration::from_secs(secs.max(1));
    }

    let options = RunOptions { once: args.once };
    if let Err(e) = bootstrap::run(settings, options).await {
        error!("❌ 运行失败: {:#}", e);
        return Err(e);
    }
    Ok(())
}
