pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;

pub use chain::{ChainApi, RpcClient};
pub use config::AppConfig;
pub use error::{ApiError, ConfigError, MonitorError, RpcError};
pub use models::{Balance, Operation, SignedBlock, Transaction};
pub use monitor::{
    balance_event_channel, block_event_channel, BalanceChangeDetector, BalanceEvent, BlockEvent,
    BlockPoller, TrackedAddresses,
};
