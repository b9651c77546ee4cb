use crate::proposal::Proposal;

const PROPOSAL_URL: &str = "https://gov.scroll.io/proposals";
const EXPLORER_TX_URL: &str = "https://scrollscan.com/tx";

const MAX_DESCRIPTION_CHARS: usize = 500;
const TRUNCATION_MARKER: &str = "...";

/// Average block interval on Scroll mainnet, in seconds.
const AVERAGE_BLOCK_TIME_SECS: i64 = 3;
/// Timestamp of the Scroll mainnet genesis block.
const GENESIS_BLOCK_TIMESTAMP: i64 = 1_696_917_600;

/// Renders the Telegram notification for a proposal emitted at `block_number`
/// on the monitored `contract`. Pure; no chain or clock access.
pub fn format_proposal_message(proposal: &Proposal, block_number: u64, contract: &str) -> String {
    format!(
        "🏛️ **NEW SCROLL GOVERNANCE PROPOSAL**\n\n\
        📋 **Proposal ID:** {proposal_id}\n\
        👤 **Proposer:** `{proposer}`\n\
        📦 **Block:** {block_number}\n\n\
        🗳️ **Voting Period:**\n\
        - Start Block: {start_block} (~{start_date})\n\
        - End Block: {end_block} (~{end_date})\n\n\
        📝 **Description:**\n\
        ```Markdown\n\
        {description}\n\
        ```\n\
        **[full proposal]({proposal_url}/{proposal_id})\n\n\
        🔗 **Contract:** `{contract}`\n\
        📊 **Proposal Type:** {proposal_type}\n\n\
        [View on Scroll Explorer]({explorer_url}/{tx_hash})",
        proposal_id = proposal.proposal_id,
        proposer = proposal.proposer,
        start_block = proposal.start_block,
        start_date = block_number_to_date(&proposal.start_block),
        end_block = proposal.end_block,
        end_date = block_number_to_date(&proposal.end_block),
        description = truncate_description(&proposal.description),
        proposal_url = PROPOSAL_URL,
        proposal_type = proposal.proposal_type,
        explorer_url = EXPLORER_TX_URL,
        tx_hash = proposal.tx_hash,
    )
}

/// Caps the description at 500 characters, appending a marker when cut.
fn truncate_description(description: &str) -> String {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        let mut truncated: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    } else {
        description.to_string()
    }
}

/// Estimates the UTC time a block height will be reached:
/// `genesis_timestamp + block * average_block_time`. An approximation, not a
/// ledger lookup.
fn block_number_to_date(block_number: &str) -> String {
    block_number
        .parse::<i64>()
        .ok()
        .and_then(|block| block.checked_mul(AVERAGE_BLOCK_TIME_SECS))
        .and_then(|offset| offset.checked_add(GENESIS_BLOCK_TIMESTAMP))
        .and_then(|timestamp| chrono::DateTime::from_timestamp(timestamp, 0))
        .map(|date| date.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
