//! Document commands: upload, create, sign, show, link

use super::{parse_identities, Session};
use crate::error::{CliError, CliResult};
use crate::output::{print_json, print_success, print_warning, OutputFormat};
use chrono::Utc;
use sault_collab::{CollabError, ContentStore};
use sault_runtime::sniff_mime;
use sault_types::{ContentRef, Document, DocumentId};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub async fn upload(session: &Session, file: &Path) -> CliResult<()> {
    let content_ref = store_file(session, file).await?;
    match session.format {
        OutputFormat::Json => print_json(&json!({ "content_ref": content_ref })),
        OutputFormat::Table => {
            print_success(&format!("Uploaded {}", file.display()));
            println!("{}", content_ref);
            Ok(())
        }
    }
}

async fn store_file(session: &Session, file: &Path) -> CliResult<ContentRef> {
    let bytes = tokio::fs::read(file).await?;
    let mime = sniff_mime(&bytes);
    let size = bytes.len();
    let content_ref = session.state.store.put(bytes).await?;
    tracing::info!(content_ref = %content_ref, size, mime, "Uploaded document");
    Ok(content_ref)
}

pub async fn create(
    session: &Session,
    content: Option<String>,
    file: Option<PathBuf>,
    signers: &[String],
) -> CliResult<()> {
    let creator = session.identity()?.clone();
    let signers = parse_identities(signers)?;

    let content_ref = match (content, file) {
        (_, Some(file)) => store_file(session, &file).await?,
        (Some(raw), None) => {
            let content_ref = ContentRef::new(raw.trim());
            match session.state.store.get(&content_ref).await {
                Ok(_) => {}
                Err(CollabError::NotFound(_)) => {
                    print_warning(&format!("{} is not in the local content store", content_ref))
                }
                Err(e) => return Err(e.into()),
            }
            content_ref
        }
        (None, None) => {
            return Err(CliError::Usage(
                "either --content or --file is required".to_string(),
            ))
        }
    };

    let coordinator = session.coordinator().await?;
    let id = coordinator.create(&creator, &content_ref, signers).await?;
    session.state.save()?;

    let link = coordinator.signing_link(id);
    match session.format {
        OutputFormat::Json => print_json(&json!({ "id": id, "signing_link": link })),
        OutputFormat::Table => {
            print_success(&format!("Created document {}", id));
            println!("Signing link: {}", link);
            Ok(())
        }
    }
}

pub async fn sign(session: &Session, id: DocumentId) -> CliResult<()> {
    let actor = session.identity()?.clone();
    let coordinator = session.coordinator().await?;

    match coordinator.sign(id, &actor, Utc::now()).await {
        Ok(document) => {
            session.state.save()?;
            match session.format {
                OutputFormat::Json => print_json(&DocumentDetail::new(
                    &document,
                    &coordinator.signing_link(id),
                    &coordinator.content_url(&document),
                )),
                OutputFormat::Table => {
                    print_success(&format!(
                        "{} signed document {} ({} {})",
                        actor,
                        id,
                        document.progress(),
                        document.state().label()
                    ));
                    Ok(())
                }
            }
        }
        Err(err) if err.is_benign() => {
            print_warning(&err.to_string());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Serialize)]
struct DocumentDetail {
    #[serde(flatten)]
    document: Document,
    status: &'static str,
    progress: String,
    signing_link: String,
    content_url: String,
}

impl DocumentDetail {
    fn new(document: &Document, signing_link: &str, content_url: &str) -> Self {
        Self {
            document: document.clone(),
            status: document.state().label(),
            progress: document.progress().to_string(),
            signing_link: signing_link.to_string(),
            content_url: content_url.to_string(),
        }
    }
}

#[derive(Tabled)]
struct SignerRow {
    signer: String,
    signed_at: String,
}

pub async fn show(session: &Session, id: DocumentId) -> CliResult<()> {
    let coordinator = session.coordinator().await?;
    let document = coordinator.document(id)?;
    let link = coordinator.signing_link(id);
    let content_url = coordinator.content_url(&document);

    if let OutputFormat::Json = session.format {
        return print_json(&DocumentDetail::new(&document, &link, &content_url));
    }

    println!("Document {}", document.id);
    println!("  Creator:  {}", document.creator);
    println!("  Status:   {} ({})", document.state().label(), document.progress());
    println!("  Content:  {}", content_url);
    println!("  Link:     {}", link);

    let rows: Vec<SignerRow> = document
        .signers
        .iter()
        .map(|signer| SignerRow {
            signer: signer.to_string(),
            signed_at: document
                .signature_of(signer)
                .map(|s| s.signed_at.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

pub async fn link(session: &Session, id: DocumentId) -> CliResult<()> {
    let coordinator = session.coordinator().await?;
    coordinator.document(id)?;
    let link = coordinator.signing_link(id);
    match session.format {
        OutputFormat::Json => print_json(&json!({ "id": id, "signing_link": link })),
        OutputFormat::Table => {
            println!("{}", link);
            Ok(())
        }
    }
}
