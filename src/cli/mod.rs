// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CLI for exercising the knowledge base: ingest, activate, search, status
//!
//! Retrieval-side operations only. The AI operations (ask, summary, ...)
//! need a real generation provider wired in by the embedding application;
//! this binary installs a placeholder that reports generation as
//! unconfigured.

use crate::config::KbConfig;
use crate::embeddings::HashingEmbedder;
use crate::errors::KbError;
use crate::generation::GenerationProvider;
use crate::rag::DocumentQaService;
use crate::storage::Chunk;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Document knowledge base CLI
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Document knowledge base: ingest, activate and search documents", long_about = None)]
pub struct Cli {
    /// Optional TOML config file (env vars still take precedence)
    #[arg(long, env = "DOCQA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a local text file as a new document and activate it
    Ingest {
        /// Path to a plain-text file
        file: PathBuf,

        /// Document id; generated when omitted
        #[arg(long)]
        id: Option<String>,
    },

    /// Load a previously ingested document's context into memory
    Activate {
        /// Document id to activate
        id: String,
    },

    /// Retrieval-only search over the active document
    Search {
        /// Query text
        query: String,

        /// Number of chunks to return
        #[arg(long, default_value_t = 4)]
        k: usize,
    },

    /// Show the currently active document
    Status,
}

/// Placeholder generation backend for the CLI
///
/// The CLI only exposes retrieval-side commands; if generation is ever
/// reached it fails loudly instead of fabricating output.
struct UnconfiguredGenerator;

#[async_trait]
impl GenerationProvider for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str, _context: &str) -> Result<String, KbError> {
        Err(KbError::Generation(
            "no generation provider configured for the CLI".to_string(),
        ))
    }
}

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => KbConfig::from_file(path)?,
        None => KbConfig::from_env(),
    };

    let embedder = Arc::new(HashingEmbedder::new(config.embedding.clone())?);
    let service = DocumentQaService::new(&config, embedder, Arc::new(UnconfiguredGenerator));

    match cli.command {
        Commands::Ingest { file, id } => ingest(&service, &file, id).await,
        Commands::Activate { id } => {
            service.load_context(&id).await?;
            println!("Document context for {} loaded.", id);
            Ok(())
        }
        Commands::Search { query, k } => search(&service, &query, k).await,
        Commands::Status => {
            match service.active_document_id().await {
                Some(id) => println!("Active document: {}", id),
                None => println!("No document is active."),
            }
            Ok(())
        }
    }
}

async fn ingest(service: &DocumentQaService, file: &PathBuf, id: Option<String>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| anyhow!("failed to read {}: {}", file.display(), e))?;

    // Splitting proper is the caller's job; paragraphs are good enough for
    // plain-text ingestion from a terminal.
    let chunks = split_paragraphs(&text, file);
    if chunks.is_empty() {
        return Err(anyhow!("{} contains no text to ingest", file.display()));
    }

    let document_id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let chunk_count = chunks.len();

    info!(document_id = %document_id, chunk_count, "Ingesting document");
    service.upload(&document_id, chunks).await?;

    println!(
        "Ingested {} as document {} ({} chunks). It is now active.",
        file.display(),
        document_id,
        chunk_count
    );
    Ok(())
}

async fn search(service: &DocumentQaService, query: &str, k: usize) -> Result<()> {
    let cancel = CancellationToken::new();
    let hits = service.search(query, k, &cancel).await?;

    if hits.is_empty() {
        println!("No chunks matched.");
        return Ok(());
    }
    for hit in hits {
        println!("[chunk {:>3}  score {:.4}] {}", hit.sequence_index, hit.score, hit.text);
    }
    Ok(())
}

fn split_paragraphs(text: &str, source: &PathBuf) -> Vec<Chunk> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(i, paragraph)| {
            Chunk::new(
                paragraph,
                json!({
                    "source": source.display().to_string(),
                    "paragraph": i,
                }),
            )
        })
        .collect()
}
