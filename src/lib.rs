// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod context;
pub mod embeddings;
pub mod errors;
pub mod generation;
pub mod rag;
pub mod storage;
pub mod vector;

// Re-export the types the surrounding application works with
pub use config::KbConfig;
pub use context::{ActiveDocument, DocumentContextManager};
pub use embeddings::{EmbeddingConfig, EmbeddingProvider, HashingEmbedder};
pub use errors::KbError;
pub use generation::GenerationProvider;
pub use rag::{DocumentOps, DocumentQaService, QaPair, RagQueryService, RetrievedChunk};
pub use storage::{Chunk, ChunkSet, ChunkStore, DocumentLayout, DocumentManifest};
pub use vector::{IndexStore, ScoredChunk, VectorIndex};
