//! Machine identity.
//!
//! Every entry and file written to the server carries the id of the machine
//! that produced it. The id is generated once (`<hostname>-<8 hex chars>`),
//! persisted to `machine.json`, and never rotated.

use crate::auth::write_private;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Identity of this physical machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineIdentity {
    pub machine_id: String,
    pub alias: String,
}

/// On-disk shape, tolerant of missing fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMachine {
    machine_id: Option<String>,
    alias: Option<String>,
}

/// Reads and writes `machine.json`.
#[derive(Debug, Clone)]
pub struct MachineStore {
    path: PathBuf,
}

impl MachineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored identity, creating and persisting one if absent.
    ///
    /// Two processes racing on first run may both write; the last writer wins.
    pub fn load_or_create(&self) -> Result<MachineIdentity> {
        let stored = self.read()?;
        let hostname = local_hostname();

        match stored.machine_id.filter(|id| !id.trim().is_empty()) {
            Some(machine_id) => Ok(MachineIdentity {
                machine_id,
                alias: stored.alias.unwrap_or(hostname),
            }),
            None => {
                let identity = MachineIdentity {
                    machine_id: generate_machine_id(&hostname),
                    alias: stored.alias.unwrap_or(hostname),
                };
                self.write(&identity)?;
                info!("Created machine identity {}", identity.machine_id);
                Ok(identity)
            }
        }
    }

    /// Change the human label, keeping the id.
    pub fn set_alias(&self, alias: &str) -> Result<MachineIdentity> {
        let mut identity = self.load_or_create()?;
        identity.alias = alias.trim().to_string();
        self.write(&identity)?;
        Ok(identity)
    }

    fn read(&self) -> Result<StoredMachine> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoredMachine::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(stored) => Ok(stored),
            Err(e) => {
                warn!("Ignoring unreadable machine file {:?}: {}", self.path, e);
                Ok(StoredMachine::default())
            }
        }
    }

    fn write(&self, identity: &MachineIdentity) -> Result<()> {
        let json = serde_json::to_string_pretty(identity)?;
        write_private(&self.path, json.as_bytes())
    }
}

/// Generate `<hostname>-<4 random bytes as hex>`.
pub fn generate_machine_id(hostname: &str) -> String {
    let suffix: [u8; 4] = rand::random();
    format!("{}-{}", hostname, hex::encode(suffix))
}

/// Local hostname, or "unknown" if it cannot be read.
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
