pub mod detector;
pub mod events;
pub mod poller;
pub mod registry;

pub use detector::BalanceChangeDetector;
pub use events::{
    balance_event_channel, block_event_channel, BalanceEvent, BalanceEventReceiver,
    BalanceEventSender, BlockEvent, BlockEventReceiver, BlockEventSender,
};
pub use poller::BlockPoller;
pub use registry::TrackedAddresses;
