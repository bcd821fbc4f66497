//! Local state directory: `ledger.json` plus content blobs under `blobs/`.

use crate::error::{CliError, CliResult};
use sault_collab::directory::DirectoryContentStore;
use sault_collab::memory::{InMemoryLedger, LedgerSnapshot};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const LEDGER_FILE: &str = "ledger.json";
const BLOBS_DIR: &str = "blobs";

pub struct LocalState {
    pub ledger: Arc<InMemoryLedger>,
    pub store: Arc<DirectoryContentStore>,
    ledger_path: PathBuf,
}

impl LocalState {
    /// Open `root`, creating it on first use.
    pub fn open(root: &Path) -> CliResult<Self> {
        std::fs::create_dir_all(root.join(BLOBS_DIR))?;
        let ledger_path = root.join(LEDGER_FILE);

        let ledger = if ledger_path.exists() {
            let raw = std::fs::read_to_string(&ledger_path)?;
            let snapshot: LedgerSnapshot =
                serde_json::from_str(&raw).map_err(|e| Self::invalid(&ledger_path, e))?;
            InMemoryLedger::from_snapshot(snapshot).map_err(|e| Self::invalid(&ledger_path, e))?
        } else {
            InMemoryLedger::new()
        };

        debug!(root = %root.display(), "Opened state directory");
        Ok(Self {
            ledger: Arc::new(ledger),
            store: Arc::new(DirectoryContentStore::new(root.join(BLOBS_DIR))),
            ledger_path,
        })
    }

    /// Persist the ledger, replacing the previous file in one rename.
    pub fn save(&self) -> CliResult<()> {
        let snapshot = self.ledger.snapshot()?;
        let json = serde_json::to_string_pretty(&snapshot)?;
        let staging = self.ledger_path.with_extension("json.tmp");
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, &self.ledger_path)?;
        debug!(documents = snapshot.documents.len(), "Saved ledger");
        Ok(())
    }

    fn invalid(path: &Path, reason: impl std::fmt::Display) -> CliError {
        CliError::State {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
