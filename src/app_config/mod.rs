pub mod env;
pub mod log;
pub mod settings;

pub use settings::{AppSettings, ExplainerConfig, MonitorConfig, SocketConfig};
