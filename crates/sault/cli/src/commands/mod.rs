//! Command implementations

pub mod context;
pub mod document;
pub mod views;

use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;
use crate::state::LocalState;
use sault_collab::Ledger;
use sault_runtime::{DocumentRegistry, SaultConfig, SigningCoordinator};
use sault_types::Identity;
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs: local state, configuration and the acting identity.
pub struct Session {
    pub state: LocalState,
    pub config: SaultConfig,
    pub format: OutputFormat,
    identity: Option<Identity>,
}

impl Session {
    pub fn open(
        root: &Path,
        config: SaultConfig,
        identity: Option<&str>,
        format: OutputFormat,
    ) -> CliResult<Self> {
        let identity = match identity {
            Some(raw) => Some(
                Identity::parse(raw).ok_or_else(|| CliError::InvalidIdentity(raw.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            state: LocalState::open(root)?,
            config,
            format,
            identity,
        })
    }

    pub fn identity(&self) -> CliResult<&Identity> {
        self.identity
            .as_ref()
            .ok_or_else(|| CliError::Usage("this command needs --as <IDENTITY>".to_string()))
    }

    /// Registry loaded for the acting identity.
    pub async fn registry(&self) -> CliResult<Arc<DocumentRegistry>> {
        let registry = Arc::new(DocumentRegistry::new(
            self.ledger(),
            self.identity()?.clone(),
            self.config.registry.clone(),
        ));
        registry.init().await?;
        Ok(registry)
    }

    pub async fn coordinator(&self) -> CliResult<SigningCoordinator> {
        let registry = self.registry().await?;
        Ok(SigningCoordinator::new(
            self.ledger(),
            registry,
            self.config.links.clone(),
        ))
    }

    fn ledger(&self) -> Arc<dyn Ledger> {
        self.state.ledger.clone()
    }
}

/// Parse a user-supplied identity list, rejecting blanks.
pub fn parse_identities(raw: &[String]) -> CliResult<Vec<Identity>> {
    raw.iter()
        .map(|r| Identity::parse(r).ok_or_else(|| CliError::InvalidIdentity(r.clone())))
        .collect()
}
