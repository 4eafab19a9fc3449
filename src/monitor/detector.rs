use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};

use crate::chain::ChainApi;
use crate::models::SignedBlock;
use crate::monitor::events::{BalanceEvent, BalanceEventSender};

/// Decides, for one already-fetched block, whether any tracked account's
/// balance may have moved, and if so fetches and publishes fresh balances.
///
/// Each invocation is independent; the poller fires one task per block
/// without waiting, so published balance events carry no ordering guarantee.
pub struct BalanceChangeDetector {
    chain: Arc<dyn ChainApi>,
}

impl BalanceChangeDetector {
    pub fn new(chain: Arc<dyn ChainApi>) -> Self {
        Self { chain }
    }

    /// Participants of every balance-affecting operation in the block,
    /// duplicates allowed at this stage.
    fn collect_participants(block: &SignedBlock) -> Vec<&str> {
        let mut participants = Vec::new();
        for tx in &block.transactions {
            for op in &tx.operations {
                if let Some((from, to)) = op.participants() {
                    participants.push(from);
                    participants.push(to);
                }
            }
        }
        participants
    }

    /// Deduplicate candidates while intersecting with the tracked set,
    /// preserving first-seen order. Untracked counterparties never survive.
    fn filter_tracked(candidates: Vec<&str>, tracked: &HashSet<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut watched = Vec::new();
        for addr in candidates {
            if seen.insert(addr) && tracked.contains(addr) {
                watched.push(addr.to_string());
            }
        }
        watched
    }

    /// Run the detection pass for one block.
    ///
    /// A failed balance query drops this block's notification permanently;
    /// it is logged and never retried.
    pub async fn process_block(
        &self,
        block: &SignedBlock,
        tracked: &HashSet<String>,
        balance_tx: &BalanceEventSender,
        shutdown: &AtomicBool,
    ) {
        let watched = Self::filter_tracked(Self::collect_participants(block), tracked);
        if watched.is_empty() {
            return;
        }

        debug!(
            "block {}: {} tracked account(s) implicated, fetching balances",
            block.height,
            watched.len()
        );

        let balances = match self.chain.get_accounts(&watched).await {
            Ok(balances) => balances,
            Err(e) => {
                // Notification for this block is lost for good.
                warn!("get balances for block {}: {}", block.height, e);
                return;
            }
        };

        if shutdown.load(Ordering::Relaxed) {
            debug!("shutdown set, dropping balance event for block {}", block.height);
            return;
        }

        if balance_tx.send(BalanceEvent { balances }).await.is_err() {
            debug!("balance event receiver dropped, block {}", block.height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::events::balance_event_channel;
    use crate::monitor::test_util::{transfer_block, MockChain};

    fn tracked(addrs: &[&str]) -> HashSet<String> {
        addrs.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_collect_participants_skips_inert_operations() {
        let mut block = transfer_block(105, &[("alice", "bob")]);
        block.transactions[0].operations.push(crate::models::Operation::Other {
            kind: "vote".to_string(),
            body: serde_json::json!({"voter": "carol"}),
        });

        let participants = BalanceChangeDetector::collect_participants(&block);
        assert_eq!(participants, vec!["alice", "bob"]);
    }

    #[test]
    fn test_filter_tracked_is_exact_intersection() {
        let candidates = vec!["alice", "bob", "alice", "carol", "bob"];
        let watched =
            BalanceChangeDetector::filter_tracked(candidates, &tracked(&["alice", "carol", "dave"]));
        assert_eq!(watched, vec!["alice", "carol"]);
    }

    #[tokio::test]
    async fn test_tracked_sender_produces_event_for_it_alone() {
        let chain = Arc::new(MockChain::new(3, 104));
        chain.put_balance("alice", "10.000 GOLOS");
        chain.put_balance("bob", "5.000 GOLOS");

        let detector = BalanceChangeDetector::new(chain.clone());
        let (balance_tx, mut balance_rx) = balance_event_channel();
        let shutdown = AtomicBool::new(false);

        let block = transfer_block(105, &[("alice", "bob")]);
        detector
            .process_block(&block, &tracked(&["alice"]), &balance_tx, &shutdown)
            .await;

        let event = balance_rx.try_recv().unwrap();
        assert_eq!(event.balances.len(), 1);
        assert_eq!(event.balances[0].name, "alice");

        // bob is an untracked counterparty: never part of the balance query
        let queries = chain.recorded_queries();
        assert_eq!(queries, vec![vec!["alice".to_string()]]);
    }

    #[tokio::test]
    async fn test_untracked_transfer_produces_no_event_and_no_query() {
        let chain = Arc::new(MockChain::new(3, 105));
        let detector = BalanceChangeDetector::new(chain.clone());
        let (balance_tx, mut balance_rx) = balance_event_channel();
        let shutdown = AtomicBool::new(false);

        let block = transfer_block(106, &[("alice", "bob")]);
        detector
            .process_block(&block, &tracked(&["carol"]), &balance_tx, &shutdown)
            .await;

        assert!(balance_rx.try_recv().is_err());
        assert!(chain.recorded_queries().is_empty());
    }

    #[tokio::test]
    async fn test_failed_balance_query_drops_the_event() {
        let chain = Arc::new(MockChain::new(3, 104));
        chain.put_balance("alice", "10.000 GOLOS");
        chain.fail_get_accounts(true);

        let detector = BalanceChangeDetector::new(chain.clone());
        let (balance_tx, mut balance_rx) = balance_event_channel();
        let shutdown = AtomicBool::new(false);

        let block = transfer_block(105, &[("alice", "bob")]);
        detector
            .process_block(&block, &tracked(&["alice"]), &balance_tx, &shutdown)
            .await;

        // dropped for good, even though the failure later clears
        chain.fail_get_accounts(false);
        assert!(balance_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_shutdown_suppresses_the_send() {
        let chain = Arc::new(MockChain::new(3, 104));
        chain.put_balance("alice", "10.000 GOLOS");

        let detector = BalanceChangeDetector::new(chain.clone());
        let (balance_tx, mut balance_rx) = balance_event_channel();
        let shutdown = AtomicBool::new(true);

        let block = transfer_block(105, &[("alice", "bob")]);
        detector
            .process_block(&block, &tracked(&["alice"]), &balance_tx, &shutdown)
            .await;

        assert!(balance_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_vesting_and_savings_transfers_are_balance_affecting() {
        let chain = Arc::new(MockChain::new(3, 104));
        chain.put_balance("alice", "10.000 GOLOS");

        let mut block = transfer_block(105, &[]);
        block.transactions[0].operations.push(
            serde_json::from_value(serde_json::json!([
                "transfer_to_vesting",
                {"from": "alice", "to": "", "amount": "10.000 GOLOS"}
            ]))
            .unwrap(),
        );

        let detector = BalanceChangeDetector::new(chain.clone());
        let (balance_tx, mut balance_rx) = balance_event_channel();
        let shutdown = AtomicBool::new(false);

        detector
            .process_block(&block, &tracked(&["alice"]), &balance_tx, &shutdown)
            .await;

        let event = balance_rx.try_recv().unwrap();
        assert_eq!(event.balances[0].name, "alice");
    }
}
