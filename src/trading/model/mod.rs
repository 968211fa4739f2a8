//! 规范化后的领域数据

pub mod balance;
pub mod bot_ledger;
pub mod identity;
pub mod position;
pub mod trade_record;

pub use balance::BalanceSnapshot;
pub use bot_ledger::BotLedgerEntry;
pub use identity::Identity;
pub use position::Position;
pub use trade_record::TradeRecord;
