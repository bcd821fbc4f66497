//! Sault runtime - multi-party document signing coordination
//!
//! - **DocumentRegistry**: copy-on-write projection of the ledger state visible
//!   to one identity, refreshed on demand
//! - **SigningCoordinator**: create/sign commands and the derived views
//!   (created-by, pending-for, shared-with, signed-by, signing links)
//! - **ContextAggregator**: per-document summaries joined with signing status
//!   into one deterministic text context
//! - **DocumentAssistant**: question answering on top of the aggregated context
//!
//! Every component is an explicit instance wired with `Arc`ed collaborators;
//! there is no global state.

#![deny(unsafe_code)]

pub mod aggregator;
pub mod assistant;
pub mod config;
pub mod coordinator;
mod error;
pub mod registry;
pub mod telemetry;

pub use aggregator::{
    render_context, sniff_mime, ContextAggregator, ContextEntry, ContextScope, CONTEXT_DELIMITER,
};
pub use assistant::{compose_prompt, AssistantReply, DocumentAssistant};
pub use config::{AggregatorConfig, LinkConfig, RegistryConfig, SaultConfig};
pub use coordinator::{SharedStats, SigningCoordinator};
pub use error::{ErrorClass, SaultError, SaultResult};
pub use registry::{DocumentRegistry, Freshness, RefreshOutcome, RegistrySnapshot};
