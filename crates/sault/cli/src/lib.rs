//! Sault CLI - operate the signing engine over a local state directory
//!
//! This CLI lets operators and developers:
//! - Upload documents to the content store
//! - Create signing requests and sign them as any identity
//! - Inspect created, pending, shared and signed views and statistics
//! - Render the document context the assistant answers from

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

mod commands;
mod error;
mod output;
mod state;

use commands::{context, document, views, Session};
pub use error::{CliError, CliResult};
use output::OutputFormat;
use sault_runtime::SaultConfig;
use sault_types::DocumentId;

/// Sault CLI application
#[derive(Parser)]
#[command(name = "sault")]
#[command(about = "Sault - multi-party document signing", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SAULT_CONFIG")]
    config: Option<PathBuf>,

    /// State directory holding ledger.json and blobs/
    #[arg(short, long, env = "SAULT_STATE", default_value = ".sault")]
    state: PathBuf,

    /// Identity to act as
    #[arg(short = 'u', long = "as", env = "SAULT_IDENTITY", value_name = "IDENTITY")]
    identity: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Store a file in the content store and print its reference
    Upload {
        /// File to upload
        file: PathBuf,
    },

    /// Create a signing request
    Create {
        /// Content reference of an uploaded document
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,

        /// Upload this file and use its reference
        #[arg(long)]
        file: Option<PathBuf>,

        /// Required signers (repeat or comma-separate)
        #[arg(short = 'S', long = "signer", value_delimiter = ',', required = true)]
        signers: Vec<String>,
    },

    /// Sign a document
    Sign {
        /// Document ID
        id: DocumentId,
    },

    /// Show document details
    Show {
        /// Document ID
        id: DocumentId,
    },

    /// Documents you created
    Created,

    /// Documents waiting on your signature
    Pending,

    /// Documents others created that list you as a signer
    Shared,

    /// Documents you have signed
    Signed,

    /// Completed vs pending counts for documents shared with you
    Stats,

    /// Print the signing link for a document
    Link {
        /// Document ID
        id: DocumentId,
    },

    /// Render the document context used for question answering
    Context {
        /// Which documents to include
        #[arg(long)]
        scope: Option<context::ScopeArg>,
    },

    /// Show configuration
    Config,
}

/// Run using the current process arguments.
pub async fn run() -> CliResult<()> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    if let Err(e) = sault_runtime::telemetry::init_tracing(cli.verbose, cli.log_json) {
        output::print_warning(&format!("Logging not initialized: {}", e));
    }

    let config = SaultConfig::load(cli.config.as_deref())?;

    if matches!(cli.command, Commands::Config) {
        return output::print_json(&config);
    }

    let session = Session::open(&cli.state, config, cli.identity.as_deref(), cli.output)?;

    match cli.command {
        Commands::Upload { file } => document::upload(&session, &file).await,
        Commands::Create {
            content,
            file,
            signers,
        } => document::create(&session, content, file, &signers).await,
        Commands::Sign { id } => document::sign(&session, id).await,
        Commands::Show { id } => document::show(&session, id).await,
        Commands::Link { id } => document::link(&session, id).await,
        Commands::Created => views::list(&session, views::View::Created).await,
        Commands::Pending => views::list(&session, views::View::Pending).await,
        Commands::Shared => views::list(&session, views::View::Shared).await,
        Commands::Signed => views::list(&session, views::View::Signed).await,
        Commands::Stats => views::stats(&session).await,
        Commands::Context { scope } => context::render(&session, scope).await,
        Commands::Config => Ok(()),
    }
}
