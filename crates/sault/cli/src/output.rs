//! Output formatting

use crate::error::CliResult;
use clap::ValueEnum;
use colored::Colorize;
use sault_types::Document;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Table row for document listings
#[derive(Debug, Serialize, Tabled)]
pub struct DocumentRow {
    id: u64,
    creator: String,
    signers: String,
    progress: String,
    status: String,
    content: String,
}

impl From<&Document> for DocumentRow {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.value(),
            creator: doc.creator.to_string(),
            signers: doc
                .signers
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            progress: doc.progress().to_string(),
            status: doc.state().label().to_string(),
            content: short_ref(doc.content_ref.as_str()),
        }
    }
}

fn short_ref(content_ref: &str) -> String {
    if content_ref.chars().count() > 12 {
        format!("{}…", content_ref.chars().take(12).collect::<String>())
    } else {
        content_ref.to_string()
    }
}

pub fn print_list<T: Tabled + Serialize>(rows: &[T], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No documents".dimmed());
            } else {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
            Ok(())
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "!".yellow(), message);
}
