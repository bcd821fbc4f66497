//! Listing commands over the acting identity's registry

use super::Session;
use crate::error::CliResult;
use crate::output::{print_json, print_list, DocumentRow, OutputFormat};

#[derive(Debug, Clone, Copy)]
pub enum View {
    Created,
    Pending,
    Shared,
    Signed,
}

pub async fn list(session: &Session, view: View) -> CliResult<()> {
    let identity = session.identity()?;
    let coordinator = session.coordinator().await?;

    let documents = match view {
        View::Created => coordinator.documents_created_by(identity),
        View::Pending => coordinator.documents_pending_for(identity),
        View::Shared => coordinator.documents_shared_with(identity),
        View::Signed => coordinator.documents_signed_by(identity),
    };

    let rows: Vec<DocumentRow> = documents.iter().map(DocumentRow::from).collect();
    print_list(&rows, session.format)
}

pub async fn stats(session: &Session) -> CliResult<()> {
    let identity = session.identity()?;
    let coordinator = session.coordinator().await?;
    let stats = coordinator.shared_stats(identity);

    match session.format {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Table => {
            println!("Shared with {}: {}", identity, stats.total());
            println!("  Completed: {}", stats.completed);
            println!("  Pending:   {}", stats.pending);
            Ok(())
        }
    }
}
