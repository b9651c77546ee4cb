#[cfg(test)]
mod tests {
    use crate::bindings::governor::ProposalCreated;
    use crate::chain::ChainReader;
    use crate::monitor::*;
    use crate::notifier::Dispatcher;
    use crate::state::StateStore;
    use crate::subscribers::{Subscriber, SubscriberRegistry};
    use crate::telegram::{MessageGateway, SendError};
    use alloy::{
        primitives::{Address, B256, Bytes, LogData, U256},
        rpc::types::Log,
        sol_types::SolEvent,
    };
    use anyhow::Error;
    use std::sync::{Arc, Mutex};
    use tokio::sync::RwLock;
    use tokio_util::sync::CancellationToken;

    struct ChainMock {
        height: Result<u64, String>,
        logs: Vec<Log>,
        requested_ranges: Arc<Mutex<Vec<(u64, u64)>>>,
    }

    impl ChainMock {
        fn at_height(height: u64) -> Self {
            Self {
                height: Ok(height),
                logs: Vec::new(),
                requested_ranges: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn unavailable() -> Self {
            Self {
                height: Err("connection refused".to_string()),
                logs: Vec::new(),
                requested_ranges: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl ChainReader for ChainMock {
        async fn block_number(&self) -> Result<u64, Error> {
            match &self.height {
                Ok(height) => Ok(*height),
                Err(e) => Err(anyhow::anyhow!(e.clone())),
            }
        }

        async fn proposal_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>, Error> {
            self.requested_ranges
                .lock()
                .expect("lock")
                .push((from_block, to_block));
            Ok(self
                .logs
                .iter()
                .filter(|log| {
                    log.block_number
                        .is_some_and(|block| (from_block..=to_block).contains(&block))
                })
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct GatewayMock {
        sent: Arc<Mutex<Vec<(i64, String)>>>,
    }

    impl MessageGateway for GatewayMock {
        async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
            self.sent
                .lock()
                .expect("lock")
                .push((chat_id, text.to_string()));
            Ok(())
        }
    }

    fn temp_store(name: &str) -> Arc<StateStore> {
        let dir = std::env::temp_dir().join(format!(
            "governance-notifier-monitor-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create temp state dir");
        Arc::new(StateStore::new(&dir))
    }

    fn single_subscriber_registry() -> Arc<RwLock<SubscriberRegistry>> {
        let mut registry = SubscriberRegistry::default();
        registry.insert(Subscriber {
            chat_id: 7,
            username: Some("alice".to_string()),
            first_name: None,
            subscribed_at: "2026-08-29T12:00:00Z".to_string(),
        });
        Arc::new(RwLock::new(registry))
    }

    fn monitor_with(
        chain: ChainMock,
        store: Arc<StateStore>,
        checkpoint: u64,
    ) -> (
        ProposalMonitor<ChainMock, GatewayMock>,
        Arc<std::sync::atomic::AtomicU64>,
        Arc<Mutex<Vec<(i64, String)>>>,
    ) {
        let gateway = GatewayMock::default();
        let sent = gateway.sent.clone();
        let dispatcher = Dispatcher::new(
            Arc::new(gateway),
            single_subscriber_registry(),
            store.clone(),
        );
        let last_processed_block = Arc::new(std::sync::atomic::AtomicU64::new(checkpoint));
        let monitor = ProposalMonitor::new(
            chain,
            dispatcher,
            store,
            last_processed_block.clone(),
            "0x2222222222222222222222222222222222222222".to_string(),
            std::time::Duration::from_secs(300),
            CancellationToken::new(),
        );
        (monitor, last_processed_block, sent)
    }

    fn proposal_log_at(block: u64, proposal_id: u64) -> Log {
        let event = ProposalCreated {
            proposalId: U256::from(proposal_id),
            proposer: Address::repeat_byte(0x11),
            targets: vec![],
            values: vec![],
            signatures: vec![],
            calldatas: vec![],
            startBlock: U256::from(block + 10),
            endBlock: U256::from(block + 100),
            description: "A proposal".to_string(),
            proposalType: 0,
        };
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x22),
                data: event.encode_log_data(),
            },
            block_number: Some(block),
            transaction_hash: Some(B256::repeat_byte(0x44)),
            ..Default::default()
        }
    }

    fn garbage_log_at(block: u64) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x22),
                data: LogData::new_unchecked(
                    vec![ProposalCreated::SIGNATURE_HASH, B256::ZERO, B256::ZERO],
                    Bytes::from(vec![0u8; 5]),
                ),
            },
            block_number: Some(block),
            ..Default::default()
        }
    }

    #[test]
    fn first_cycle_looks_back_499_blocks() {
        assert_eq!(next_range(0, 1000), Some((501, 1000)));
    }

    #[test]
    fn resumes_right_after_the_checkpoint() {
        assert_eq!(next_range(500, 1000), Some((501, 1000)));
    }

    #[test]
    fn caught_up_chain_yields_no_range() {
        assert_eq!(next_range(1000, 1000), None);
        assert_eq!(next_range(1001, 1000), None);
    }

    #[test]
    fn low_first_height_does_not_underflow() {
        assert_eq!(next_range(0, 10), Some((0, 10)));
    }

    #[tokio::test]
    async fn first_cycle_queries_the_lookback_window_and_checkpoints() {
        let chain = ChainMock::at_height(1000);
        let ranges = chain.requested_ranges.clone();
        let store = temp_store("first-cycle");
        let (monitor, last_processed_block, _) = monitor_with(chain, store.clone(), 0);

        monitor.check_for_new_proposals().await;

        assert_eq!(*ranges.lock().expect("lock"), vec![(501, 1000)]);
        assert_eq!(
            last_processed_block.load(std::sync::atomic::Ordering::Relaxed),
            1000
        );
        assert_eq!(store.load_checkpoint(), 1000);
    }

    #[tokio::test]
    async fn caught_up_cycle_fetches_nothing_and_keeps_the_checkpoint() {
        let chain = ChainMock::at_height(1000);
        let ranges = chain.requested_ranges.clone();
        let store = temp_store("caught-up");
        store.save_checkpoint(1000).expect("seed checkpoint");
        let (monitor, last_processed_block, _) = monitor_with(chain, store.clone(), 1000);

        monitor.check_for_new_proposals().await;

        assert!(ranges.lock().expect("lock").is_empty());
        assert_eq!(
            last_processed_block.load(std::sync::atomic::Ordering::Relaxed),
            1000
        );
        assert_eq!(store.load_checkpoint(), 1000);
    }

    #[tokio::test]
    async fn unavailable_chain_aborts_the_cycle() {
        let chain = ChainMock::unavailable();
        let ranges = chain.requested_ranges.clone();
        let store = temp_store("chain-down");
        let (monitor, last_processed_block, _) = monitor_with(chain, store.clone(), 500);

        monitor.check_for_new_proposals().await;

        assert!(ranges.lock().expect("lock").is_empty());
        assert_eq!(
            last_processed_block.load(std::sync::atomic::Ordering::Relaxed),
            500
        );
        assert_eq!(store.load_checkpoint(), 0);
    }

    #[tokio::test]
    async fn long_ranges_are_scanned_in_windows() {
        let chain = ChainMock::at_height(1300);
        let ranges = chain.requested_ranges.clone();
        let store = temp_store("chunked");
        let (monitor, last_processed_block, _) = monitor_with(chain, store.clone(), 100);

        monitor.check_for_new_proposals().await;

        assert_eq!(
            *ranges.lock().expect("lock"),
            vec![(101, 600), (601, 1100), (1101, 1300)]
        );
        assert_eq!(
            last_processed_block.load(std::sync::atomic::Ordering::Relaxed),
            1300
        );
        assert_eq!(store.load_checkpoint(), 1300);
    }

    #[tokio::test]
    async fn decodable_proposals_are_dispatched_and_bad_logs_skipped() {
        let mut chain = ChainMock::at_height(1000);
        chain.logs = vec![
            garbage_log_at(940),
            proposal_log_at(950, 42),
            proposal_log_at(960, 43),
        ];
        let store = temp_store("dispatching");
        let (monitor, _, sent) = monitor_with(chain, store.clone(), 900);

        monitor.check_for_new_proposals().await;

        let sent = sent.lock().expect("lock");
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, 7);
        assert!(sent[0].1.contains("**Proposal ID:** 42"));
        assert!(sent[0].1.contains("📦 **Block:** 950"));
        assert!(sent[1].1.contains("**Proposal ID:** 43"));
        assert_eq!(store.load_checkpoint(), 1000);
    }
}
