mod tests;

use crate::{
    chain::ChainReader, formatter, notifier::Dispatcher, proposal, state::StateStore,
    telegram::MessageGateway,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// How far back the very first cycle looks when no checkpoint exists yet.
const INITIAL_LOOKBACK_BLOCKS: u64 = 499;
/// Upper bound on the span of a single getLogs query; longer ranges are
/// scanned in windows of this size with the checkpoint persisted in between.
const MAX_BLOCKS_PER_QUERY: u64 = 500;

/// Periodically scans the chain for new proposals and fans out
/// notifications. One cycle runs to completion before the next is scheduled,
/// so cycles never overlap.
pub struct ProposalMonitor<C: ChainReader, G: MessageGateway> {
    chain: C,
    dispatcher: Dispatcher<G>,
    store: Arc<StateStore>,
    last_processed_block: Arc<AtomicU64>,
    contract: String,
    poll_interval: Duration,
    cancel_token: CancellationToken,
}

impl<C: ChainReader, G: MessageGateway> ProposalMonitor<C, G> {
    pub fn new(
        chain: C,
        dispatcher: Dispatcher<G>,
        store: Arc<StateStore>,
        last_processed_block: Arc<AtomicU64>,
        contract: String,
        poll_interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            chain,
            dispatcher,
            store,
            last_processed_block,
            contract,
            poll_interval,
            cancel_token,
        }
    }

    pub async fn run(self) {
        info!(
            "⏰ Checking for new proposals every {}s",
            self.poll_interval.as_secs()
        );
        loop {
            self.check_for_new_proposals().await;
            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = self.cancel_token.cancelled() => {
                    info!("Shutdown signal received, exiting proposal monitor...");
                    return;
                }
            }
        }
    }

    /// One polling cycle. Any chain failure aborts the cycle with the
    /// checkpoint untouched; the next timer tick retries from there.
    pub async fn check_for_new_proposals(&self) {
        let current_block = match self.chain.block_number().await {
            Ok(block) => block,
            Err(e) => {
                error!("Failed to get current block: {e}");
                return;
            }
        };

        let checkpoint = self.last_processed_block.load(Ordering::Relaxed);
        let Some((from_block, to_block)) = next_range(checkpoint, current_block) else {
            debug!("No new blocks to check, current block: {current_block}");
            return;
        };
        info!("🔍 Checking blocks {from_block} to {to_block} for new proposals...");

        let mut window_start = from_block;
        while window_start <= to_block {
            let window_end = to_block.min(window_start + (MAX_BLOCKS_PER_QUERY - 1));
            if let Err(e) = self.process_window(window_start, window_end).await {
                error!("Failed to scan blocks {window_start} to {window_end}: {e}");
                return;
            }
            self.advance_checkpoint(window_end);
            window_start = window_end + 1;
        }
    }

    async fn process_window(&self, from_block: u64, to_block: u64) -> Result<(), anyhow::Error> {
        let logs = self.chain.proposal_logs(from_block, to_block).await?;
        if !logs.is_empty() {
            info!("📊 Found {} proposal events", logs.len());
        }

        for log in &logs {
            // Undecodable logs are skipped inside decode_proposal.
            let Some(proposal) = proposal::decode_proposal(log) else {
                continue;
            };
            let message = formatter::format_proposal_message(
                &proposal,
                log.block_number.unwrap_or(to_block),
                &self.contract,
            );
            self.dispatcher.notify(&message).await;
            info!("✅ Processed proposal {}", proposal.proposal_id);
        }
        Ok(())
    }

    /// Persists the checkpoint; the in-memory value advances only after a
    /// successful write so a failed write leads to a rescan, not a gap.
    fn advance_checkpoint(&self, block: u64) {
        match self.store.save_checkpoint(block) {
            Ok(()) => self.last_processed_block.store(block, Ordering::Relaxed),
            Err(e) => error!("Failed to save checkpoint {block}: {e}"),
        }
    }
}

/// Block range for the next cycle: pick up right after the checkpoint, or
/// look back a fixed window on the very first run. None when there is
/// nothing new.
pub(crate) fn next_range(checkpoint: u64, current_block: u64) -> Option<(u64, u64)> {
    let from_block = if checkpoint == 0 {
        current_block.saturating_sub(INITIAL_LOOKBACK_BLOCKS)
    } else {
        checkpoint + 1
    };
    if from_block > current_block {
        return None;
    }
    Some((from_block, current_block))
}
