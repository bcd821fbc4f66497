//! Context command: render the aggregated document context

use super::Session;
use crate::error::CliResult;
use crate::output::{print_json, print_warning, OutputFormat};
use clap::ValueEnum;
use sault_collab::memory::{ExcerptSummarizer, KeywordClassifier};
use sault_runtime::{AggregatorConfig, ContextAggregator, ContextScope};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ScopeArg {
    /// Documents you created
    Owned,
    /// Documents you created or must sign
    Visible,
}

impl From<ScopeArg> for ContextScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Owned => ContextScope::Owned,
            ScopeArg::Visible => ContextScope::Visible,
        }
    }
}

pub async fn render(session: &Session, scope: Option<ScopeArg>) -> CliResult<()> {
    let identity = session.identity()?;
    let registry = session.registry().await?;

    let mut config: AggregatorConfig = session.config.aggregator.clone();
    if let Some(scope) = scope {
        config.scope = scope.into();
    }

    let aggregator = ContextAggregator::new(
        registry,
        session.state.store.clone(),
        Arc::new(ExcerptSummarizer::default()),
        Some(Arc::new(KeywordClassifier::default())),
        config,
    );
    let entries = aggregator.entries(identity).await;
    let context = sault_runtime::render_context(&entries);

    match session.format {
        OutputFormat::Json => print_json(&json!({
            "identity": identity,
            "documents": entries.len(),
            "context": context,
        })),
        OutputFormat::Table => {
            if entries.is_empty() {
                print_warning("No documents in scope");
            } else {
                println!("{}", context);
            }
            Ok(())
        }
    }
}
