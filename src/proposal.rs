use crate::bindings::governor::ProposalCreated;
use alloy::rpc::types::Log;
use tracing::warn;

/// A decoded governance proposal. Numeric fields are kept as decimal strings
/// so values exceeding u64 survive intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub proposal_id: String,
    pub proposer: String,
    pub targets: Vec<String>,
    pub values: Vec<String>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<String>,
    pub start_block: String,
    pub end_block: String,
    pub description: String,
    pub proposal_type: u8,
    pub tx_hash: String,
}

/// Decodes a raw log against the ProposalCreated schema. Returns None on any
/// decode failure so one bad log never aborts the batch.
pub fn decode_proposal(log: &Log) -> Option<Proposal> {
    let decoded = match log.log_decode::<ProposalCreated>() {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("Skipping undecodable proposal log: {e}");
            return None;
        }
    };
    let event = &decoded.inner.data;

    Some(Proposal {
        proposal_id: event.proposalId.to_string(),
        proposer: event.proposer.to_string(),
        targets: event.targets.iter().map(|t| t.to_string()).collect(),
        values: event.values.iter().map(|v| v.to_string()).collect(),
        signatures: event.signatures.clone(),
        calldatas: event.calldatas.iter().map(|c| c.to_string()).collect(),
        start_block: event.startBlock.to_string(),
        end_block: event.endBlock.to_string(),
        description: event.description.clone(),
        proposal_type: event.proposalType,
        tx_hash: log.transaction_hash.unwrap_or_default().to_string(),
    })
}
