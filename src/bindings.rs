use alloy::sol;

pub mod governor {
    use super::*;

    sol!(
        /// Emitted by the Scroll governor when a new proposal is created.
        /// The four call sequences are index-aligned: targets[i] receives
        /// values[i] via signatures[i]/calldatas[i].
        event ProposalCreated(
            uint256 indexed proposalId,
            address indexed proposer,
            address[] targets,
            uint256[] values,
            string[] signatures,
            bytes[] calldatas,
            uint256 startBlock,
            uint256 endBlock,
            string description,
            uint8 proposalType
        );
    );
}
