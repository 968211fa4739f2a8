mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::timeout;

use common::{deriv_responder, MockServer, GOOD_TOKEN};
use rust_risk_guard::app_config::MonitorConfig;
use rust_risk_guard::job::{DataCategory, RiskMonitorJob};
use rust_risk_guard::risk::{RiskEngine, RiskKind, RiskLevel, Severity};
use rust_risk_guard::socket::DerivWebsocketClient;
use rust_risk_guard::trading::deriv::symbols::UNKNOWN_SYMBOL;
use rust_risk_guard::trading::deriv::{AccountFeed, DerivApi};

#[tokio::test]
async fn test_deriv_api_fetchers_normalize() {
    let mut server = MockServer::start(deriv_responder()).await;
    let client = Arc::new(DerivWebsocketClient::new(server.socket_config()));
    client.connect().await.unwrap();
    client.authorize(GOOD_TOKEN).await.unwrap();
    let api = DerivApi::new(client.clone());

    let balance = api.get_balance().await.unwrap();
    assert_eq!(balance.amount, 250.0);

    let positions = api.get_open_positions().await.unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].symbol, "R_50");

    let trades = api.get_trade_history(25).await.unwrap();
    let ids: Vec<u64> = trades.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![14, 13, 12, 11, 10]);
    assert_eq!(trades[2].symbol, "1HZ100V");
    assert_eq!(trades[3].symbol, "R_10");
    assert_eq!(trades[4].symbol, UNKNOWN_SYMBOL);

    let bot = api.get_bot_activity(25).await.unwrap();
    assert_eq!(bot.len(), 1);
    assert_eq!(bot[0].app_id, 16929);

    server.next_frame_with("authorize").await;
    server.next_frame_with("balance").await;
    server.next_frame_with("portfolio").await;
    let profit_table = server.next_frame_with("profit_table").await;
    assert_eq!(profit_table["limit"], json!(25));
    assert_eq!(profit_table["sort"], json!("DESC"));
    assert_eq!(profit_table["description"], json!(1));
    let statement = server.next_frame_with("statement").await;
    assert_eq!(statement["limit"], json!(25));

    client.disconnect().await;
    assert!(api.get_balance().await.is_err());
}

#[tokio::test]
async fn test_monitor_end_to_end() {
    let mut server = MockServer::start(deriv_responder()).await;
    let client = Arc::new(DerivWebsocketClient::new(server.socket_config()));
    client.connect().await.unwrap();
    let identity = client.authorize(GOOD_TOKEN).await.unwrap();

    let config = MonitorConfig {
        refresh_interval: Duration::from_secs(3600),
        ..MonitorConfig::default()
    };
    let mut job = RiskMonitorJob::new(
        Arc::new(DerivApi::new(client.clone())),
        RiskEngine::default(),
        config,
    )
    .with_identity(identity);

    let snapshot = job.run_cycle().await;
    assert!(snapshot.degraded.is_empty());
    assert_eq!(snapshot.trades.len(), 5);
    assert_eq!(snapshot.positions.len(), 1);
    assert_eq!(snapshot.bot_activity.len(), 1);
    assert_eq!(snapshot.identity.as_ref().unwrap().loginid, "CR900000");

    // 马丁格尔 40 + 仓位(13.2%) 25 + 机器人 30
    let report = &snapshot.report;
    let kinds: Vec<RiskKind> = report.findings.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![RiskKind::Martingale, RiskKind::BotRisk, RiskKind::PositionSizing]
    );
    assert_eq!(report.finding(RiskKind::PositionSizing).unwrap().severity, Severity::High);
    assert_eq!(report.score, 5);
    assert_eq!(report.level, RiskLevel::High);
    assert_eq!(report.exposure.open_positions, 1);
    assert_eq!(report.exposure.total_stake, 10.0);
    assert_eq!(snapshot.stats.wins, 3);
    assert_eq!(snapshot.stats.losses, 2);

    // 余额订阅 + 推送
    assert!(job.start_balance_stream().await.unwrap());
    assert!(!job.start_balance_stream().await.unwrap());
    let subscribe = server.next_frame_with("subscribe").await;
    let sub_id = subscribe["req_id"].clone();

    let mut updates = job.subscribe();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let monitor = tokio::spawn(async move {
        job.run(shutdown_rx).await;
        job
    });

    let _ = timeout(Duration::from_secs(5), updates.wait_for(|s| {
        s.as_ref().is_some_and(|s| s.cycle == 2)
    }))
    .await
    .unwrap()
    .unwrap();

    server.push(json!({
        "msg_type": "balance",
        "req_id": sub_id,
        "balance": {"balance": 175.25, "currency": "USD"},
        "subscription": {"id": "b5f1c7a2"}
    }));
    let _ = timeout(Duration::from_secs(5), updates.wait_for(|s| {
        s.as_ref().map(|s| s.balance.amount) == Some(175.25)
    }))
    .await
    .unwrap()
    .unwrap();

    shutdown_tx.send(()).unwrap();
    let job = monitor.await.unwrap();
    assert!(!job.has_balance_stream());
    assert_eq!(server.next_frame_with("forget").await["forget"], sub_id);

    client.disconnect().await;
}

#[tokio::test]
async fn test_monitor_degrades_after_disconnect() {
    let server = MockServer::start(deriv_responder()).await;
    let client = Arc::new(DerivWebsocketClient::new(server.socket_config()));
    client.connect().await.unwrap();
    client.authorize(GOOD_TOKEN).await.unwrap();

    let mut job = RiskMonitorJob::new(
        Arc::new(DerivApi::new(client.clone())),
        RiskEngine::default(),
        MonitorConfig::default(),
    );
    let first = job.run_cycle().await;
    client.disconnect().await;

    let second = job.run_cycle().await;
    assert_eq!(
        second.degraded,
        vec![
            DataCategory::Balance,
            DataCategory::Positions,
            DataCategory::Trades,
            DataCategory::BotActivity
        ]
    );
    assert_eq!(second.trades, first.trades);
    assert_eq!(second.balance, first.balance);
    assert_eq!(second.report.score, first.report.score);
}
