use alloy::primitives::Address;
use anyhow::Error;
use std::{path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_RPC_URL: &str = "https://rpc.scroll.io";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub rpc_url: String,
    pub governance_contract: Address,
    pub poll_interval_minutes: u64,
    pub state_dir: PathBuf,
}

impl Config {
    pub fn new() -> Result<Self, Error> {
        // Load environment variables from .env file
        dotenvy::dotenv().ok();

        let bot_token = std::env::var("BOT_TOKEN")
            .map_err(|_| anyhow::anyhow!("BOT_TOKEN env var not found"))?;

        let governance_contract = std::env::var("GOVERNANCE_CONTRACT")
            .map_err(|_| anyhow::anyhow!("GOVERNANCE_CONTRACT env var not found"))?;

        let governance_contract = Address::from_str(governance_contract.as_str())
            .map_err(|_| anyhow::anyhow!("GOVERNANCE_CONTRACT must be a hex address"))?;

        let rpc_url =
            std::env::var("SCROLL_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());

        let poll_interval_minutes = std::env::var("PROPOSAL_INTERVAL_CHECK_MINUTES")
            .unwrap_or("5".to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("PROPOSAL_INTERVAL_CHECK_MINUTES must be a number"))
            .and_then(|val| {
                if val == 0 {
                    return Err(anyhow::anyhow!(
                        "PROPOSAL_INTERVAL_CHECK_MINUTES must be a positive number"
                    ));
                }
                Ok(val)
            })?;

        let state_dir = PathBuf::from(std::env::var("STATE_DIR").unwrap_or(".".to_string()));

        tracing::info!(
            "Startup config:\nrpc_url: {}\ngovernance_contract: {}\npoll_interval_minutes: {}\nstate_dir: {}",
            rpc_url,
            governance_contract,
            poll_interval_minutes,
            state_dir.display()
        );

        Ok(Config {
            bot_token,
            rpc_url,
            governance_contract,
            poll_interval_minutes,
            state_dir,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes * 60)
    }
}
