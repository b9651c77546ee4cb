use crate::subscribers::{Subscriber, SubscriberRegistry};
use anyhow::Error;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

const LAST_BLOCK_FILE: &str = "last_block.txt";
const SUBSCRIBERS_FILE: &str = "subscribers.json";

/// Flat-file persistence for the poller checkpoint and the subscriber
/// registry. Loads degrade to defaults on any failure; writes go through a
/// temp file and a rename so a crash mid-write never corrupts prior state.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn load_checkpoint(&self) -> u64 {
        let path = self.dir.join(LAST_BLOCK_FILE);
        match fs::read_to_string(&path) {
            Ok(contents) => match contents.trim().parse::<u64>() {
                Ok(block) => block,
                Err(_) => {
                    warn!("Ignoring corrupt checkpoint file: {}", path.display());
                    0
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => {
                warn!("Failed to read checkpoint file: {e}");
                0
            }
        }
    }

    pub fn save_checkpoint(&self, block: u64) -> Result<(), Error> {
        self.write_atomic(LAST_BLOCK_FILE, &block.to_string())
    }

    pub fn load_subscribers(&self) -> SubscriberRegistry {
        let path = self.dir.join(SUBSCRIBERS_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read subscribers file: {e}");
                }
                return SubscriberRegistry::default();
            }
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring corrupt subscribers file {}: {e}", path.display());
                return SubscriberRegistry::default();
            }
        };

        let mut registry = SubscriberRegistry::default();
        for entry in entries {
            match serde_json::from_value::<Subscriber>(entry) {
                Ok(subscriber) => {
                    registry.insert(subscriber);
                }
                Err(e) => warn!("Skipping malformed subscriber entry: {e}"),
            }
        }
        info!("📋 Loaded {} subscribers", registry.len());
        registry
    }

    pub fn save_subscribers(&self, registry: &SubscriberRegistry) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(registry.subscribers())?;
        self.write_atomic(SUBSCRIBERS_FILE, &json)?;
        info!("📋 Saved {} subscribers", registry.len());
        Ok(())
    }

    fn write_atomic(&self, name: &str, contents: &str) -> Result<(), Error> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
