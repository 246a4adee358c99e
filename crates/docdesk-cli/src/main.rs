//! docdesk: command-line client for the document service.
//!
//! Set DOCDESK_API_URL (or API_URL) and optionally DOCDESK_API_PREFIX.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use docdesk_api_client::{ApiClient, DocumentStore, UploadFile};
use docdesk_cli::{
    document_row, init_tracing, is_accepted_upload, job_line, run_uploads, settle_viewer,
};
use docdesk_core::{ClientConfig, DocumentId, ErrorMetadata};
use docdesk_session::viewer::ViewerPhase;
use docdesk_session::{Desk, JobStatus, TempFileObjectUrls};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "docdesk", about = "Upload, browse and chat with documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List documents known to the service
    List {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Upload one or more files, showing progress per file
    Upload {
        /// Paths of the files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show a document: text is printed, binary files are written to a
    /// temporary file until you press Enter
    View {
        /// Document id
        id: String,
    },
    /// Delete a document
    Delete {
        /// Document id
        id: String,
    },
    /// Ask a question grounded on selected documents
    Chat {
        /// The question
        prompt: String,
        /// Document id to include as context (repeatable, order kept)
        #[arg(long = "doc", value_name = "ID")]
        docs: Vec<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Invalid client configuration")?;
    let client = ApiClient::from_config(&config).context(
        "Failed to create API client. Check DOCDESK_API_URL (or API_URL)",
    )?;
    let urls = Arc::new(TempFileObjectUrls::new().context("Failed to create preview directory")?);
    let store: Arc<dyn DocumentStore> = Arc::new(client.clone());
    let mut desk = Desk::from_config(&config, store, urls);

    match cli.command {
        Commands::List { format } => {
            let documents = desk.refresh().await.map_err(report)?;
            match format {
                OutputFormat::Json => print_json(documents.as_ref())?,
                OutputFormat::Table => {
                    for document in documents.iter() {
                        println!("{}", document_row(document, false));
                    }
                    println!("{} document(s)", documents.len());
                }
            }
        }
        Commands::Upload { files } => {
            let mut accepted = Vec::with_capacity(files.len());
            for path in &files {
                let file = UploadFile::from_path(path).await?;
                if !is_accepted_upload(&file.filename) {
                    tracing::warn!(
                        filename = %file.filename,
                        "File type is not one of the usual upload types; the service may reject it"
                    );
                }
                accepted.push(file);
            }

            let ids = desk.upload(accepted);
            let jobs = run_uploads(&mut desk, &ids, |job| println!("{}", job_line(job))).await;

            let failed = jobs
                .iter()
                .filter(|job| job.status() == JobStatus::Error)
                .count();
            if failed > 0 {
                bail!("{} of {} upload(s) failed", failed, jobs.len());
            }
        }
        Commands::View { id } => {
            let id = DocumentId::from(id);
            desk.refresh().await.map_err(report)?;
            desk.open(&id)?;

            let phase = settle_viewer(&mut desk).await;
            let session = desk
                .viewer()
                .session()
                .context("Viewer closed while loading")?;

            match phase {
                ViewerPhase::ReadyText => println!("{}", session.text().unwrap_or_default()),
                ViewerPhase::ReadyBinary => {
                    println!(
                        "{} ({:?}, {})",
                        session.object_url().unwrap_or_default(),
                        session.renderer(),
                        session.content_type().unwrap_or_default()
                    );
                    println!("Press Enter to close the preview.");
                    let mut line = String::new();
                    BufReader::new(tokio::io::stdin())
                        .read_line(&mut line)
                        .await
                        .context("Failed to read from stdin")?;
                }
                ViewerPhase::Error => bail!(
                    "{}",
                    session.error().unwrap_or("Error loading document content")
                ),
                ViewerPhase::Idle | ViewerPhase::Loading => {}
            }
            desk.close_viewer();
        }
        Commands::Delete { id } => {
            let id = DocumentId::from(id);
            desk.refresh().await.map_err(report)?;
            let confirmation = desk.delete(&id).await?;
            print_json(&serde_json::json!({
                "success": true,
                "message": confirmation
                    .message
                    .unwrap_or_else(|| format!("Document {} deleted", id)),
                "deleted_chunks": confirmation.deleted_chunks,
            }))?;
        }
        Commands::Chat { prompt, docs } => {
            if !docs.is_empty() {
                desk.refresh().await.map_err(report)?;
                for doc in docs {
                    let id = DocumentId::from(doc);
                    if !desk.selection().is_selected(&id) {
                        desk.toggle_selection(&id)?;
                    }
                }
            }

            let response = client
                .send_chat(&prompt, &desk.chat_document_ids())
                .await
                .map_err(report)?;
            println!("{}", response.answer);
        }
    }

    Ok(())
}

/// Turn a store failure into its user-facing message, keeping the detail in
/// the log.
fn report(err: docdesk_core::StoreError) -> anyhow::Error {
    tracing::debug!(error = %err, code = err.error_code(), "Store operation failed");
    anyhow::anyhow!("{}", err.client_message())
}
