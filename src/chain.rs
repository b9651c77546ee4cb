use crate::bindings::governor::ProposalCreated;
use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{Filter, Log},
    sol_types::SolEvent,
};
use anyhow::Error;
use std::future::Future;
use tokio::time::{Duration, timeout};

const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only view of the chain needed by the proposal monitor.
pub trait ChainReader {
    fn block_number(&self) -> impl Future<Output = Result<u64, Error>> + Send;
    /// Returns ProposalCreated logs for the inclusive range
    /// `[from_block, to_block]`.
    fn proposal_logs(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> impl Future<Output = Result<Vec<Log>, Error>> + Send;
}

pub struct ScrollChainReader {
    provider: DynProvider,
    contract: Address,
}

impl ScrollChainReader {
    pub fn new(rpc_url: &str, contract: Address) -> Result<Self, Error> {
        let provider = ProviderBuilder::new().connect_http(rpc_url.parse()?).erased();
        Ok(Self { provider, contract })
    }
}

impl ChainReader for ScrollChainReader {
    async fn block_number(&self) -> Result<u64, Error> {
        let block = timeout(RPC_TIMEOUT, self.provider.get_block_number())
            .await
            .map_err(|_| anyhow::anyhow!("get_block_number timed out"))??;
        Ok(block)
    }

    async fn proposal_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>, Error> {
        let filter = Filter::new()
            .address(self.contract)
            .event_signature(ProposalCreated::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);
        let logs = timeout(RPC_TIMEOUT, self.provider.get_logs(&filter))
            .await
            .map_err(|_| anyhow::anyhow!("get_logs timed out"))??;
        Ok(logs)
    }
}
