use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::sleep;

use crate::chain::ChainApi;
use crate::error::MonitorError;
use crate::monitor::detector::BalanceChangeDetector;
use crate::monitor::events::{BalanceEventSender, BlockEvent, BlockEventSender};
use crate::monitor::registry::TrackedAddresses;

/// Advances through block heights one at a time, without gaps or reordering,
/// publishing one `BlockEvent` per block and firing one detector task per
/// block.
///
/// Failure semantics: a config fetch failure at startup is fatal and `run`
/// returns it. Every error after that (head query, block fetch) is logged
/// and retried after one block interval with the cursor unchanged — no
/// backoff, no retry budget, the loop never gives up on a transient error.
pub struct BlockPoller {
    chain: Arc<dyn ChainApi>,
    registry: Arc<TrackedAddresses>,
    shutdown: Arc<AtomicBool>,
}

impl BlockPoller {
    pub fn new(chain: Arc<dyn ChainApi>, registry: Arc<TrackedAddresses>) -> Self {
        Self {
            chain,
            registry,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle the subscriber raises to stop the loop.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Run the polling loop until shutdown is observed or the subscriber
    /// drops its receiver.
    ///
    /// The senders move in here; dropping them on return is what closes both
    /// event streams, and it happens exactly once. The shutdown flag is
    /// checked only at the point a fetched block is about to be published,
    /// never mid-sleep, so worst-case shutdown latency is one full interval.
    pub async fn run(
        &self,
        start_height: u64,
        block_tx: BlockEventSender,
        balance_tx: BalanceEventSender,
    ) -> Result<(), MonitorError> {
        let config = self
            .chain
            .get_config()
            .await
            .map_err(MonitorError::Startup)?;
        let interval = Duration::from_secs(config.block_interval);

        info!(
            "starting block poller at height {} with {}s interval",
            start_height, config.block_interval
        );

        let detector = Arc::new(BalanceChangeDetector::new(Arc::clone(&self.chain)));
        let mut cursor = start_height;

        loop {
            let head = match self.chain.get_dynamic_global_properties().await {
                Ok(props) => props.head_block_number,
                Err(e) => {
                    warn!("get global properties: {}", e);
                    sleep(interval).await;
                    continue;
                }
            };

            if head > cursor {
                // Behind the chain: fetch and keep going without sleeping.
                let block = match self.chain.get_block(cursor + 1).await {
                    Ok(block) => block,
                    Err(e) => {
                        warn!("get block {}: {}", cursor + 1, e);
                        sleep(interval).await;
                        continue;
                    }
                };

                if self.shutdown.load(Ordering::Relaxed) {
                    info!("shutdown signal observed, stopping block poller");
                    return Ok(());
                }

                let event = BlockEvent {
                    height: block.height,
                    time: block.unix_time(),
                    transactions: block.transactions.clone(),
                };
                if block_tx.send(event).await.is_err() {
                    info!("block event receiver dropped, stopping block poller");
                    return Ok(());
                }

                debug!(
                    "published block {} with {} transaction(s)",
                    block.height,
                    block.transactions.len()
                );

                // Fire and forget: this block's detection races later blocks,
                // so balance events carry no ordering guarantee.
                let detector = Arc::clone(&detector);
                let tracked = self.registry.snapshot();
                let balance_tx = balance_tx.clone();
                let shutdown = Arc::clone(&self.shutdown);
                tokio::spawn(async move {
                    detector
                        .process_block(&block, &tracked, &balance_tx, &shutdown)
                        .await;
                });

                cursor += 1;
            } else {
                sleep(interval).await;
            }
        }
    }
}
