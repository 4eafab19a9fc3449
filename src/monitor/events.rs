use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::models::{Balance, Transaction};

/// Default buffer size for event channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// One newly fetched block, projected for the subscriber.
///
/// These arrive strictly ordered and gap-free: the poller increments its
/// cursor by one per successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockEvent {
    pub height: u64,
    /// Block production time, unix seconds.
    pub time: i64,
    pub transactions: Vec<Transaction>,
}

/// Fresh balances for the tracked accounts implicated by one block.
///
/// Detector tasks race to publish, so these carry no ordering guarantee
/// relative to each other or to `BlockEvent`s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceEvent {
    pub balances: Vec<Balance>,
}

pub type BlockEventSender = mpsc::Sender<BlockEvent>;
pub type BlockEventReceiver = mpsc::Receiver<BlockEvent>;

pub type BalanceEventSender = mpsc::Sender<BalanceEvent>;
pub type BalanceEventReceiver = mpsc::Receiver<BalanceEvent>;

/// Create the block-arrival channel.
pub fn block_event_channel() -> (BlockEventSender, BlockEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create the balance-change channel.
pub fn balance_event_channel() -> (BalanceEventSender, BalanceEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
