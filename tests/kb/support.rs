// Shared fixtures and mock providers for knowledge-base tests

use async_trait::async_trait;
use document_qa_core::{
    Chunk, DocumentContextManager, DocumentQaService, EmbeddingConfig, EmbeddingProvider,
    GenerationProvider, HashingEmbedder, KbConfig, KbError,
};
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// The standard test embedder: modest dimension, token-overlap sensitive
pub fn test_embedder() -> Arc<HashingEmbedder> {
    test_embedder_with_dimension(256)
}

pub fn test_embedder_with_dimension(dimension: usize) -> Arc<HashingEmbedder> {
    Arc::new(
        HashingEmbedder::new(EmbeddingConfig {
            dimension,
            normalize: true,
            lowercase: true,
        })
        .unwrap(),
    )
}

/// Embedding provider that always fails, for build-failure scenarios
pub struct FailingEmbedder {
    pub dimension: usize,
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, KbError> {
        Err(KbError::Embedding("simulated provider outage".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn fingerprint(&self) -> String {
        "failing-embedder".to_string()
    }
}

/// One recorded generation call
#[derive(Debug, Clone)]
pub struct GenerationCall {
    pub prompt: String,
    pub context: String,
}

/// What the scripted generator should do when called
#[derive(Debug, Clone)]
pub enum GeneratorBehavior {
    /// Return this text
    Reply(String),
    /// Echo the context back wrapped in a marker, for asserting what
    /// context was assembled
    EchoContext,
    /// Fail with `Generation`
    Fail(String),
    /// Never complete (for timeout/cancellation tests)
    Hang,
}

/// Hand-rolled mock generation provider that records every call
pub struct ScriptedGenerator {
    behavior: GeneratorBehavior,
    calls: Mutex<Vec<GenerationCall>>,
}

impl ScriptedGenerator {
    pub fn new(behavior: GeneratorBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(GeneratorBehavior::Reply(text.to_string()))
    }

    pub fn calls(&self) -> Vec<GenerationCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    async fn generate(&self, prompt: &str, context: &str) -> Result<String, KbError> {
        self.calls.lock().unwrap().push(GenerationCall {
            prompt: prompt.to_string(),
            context: context.to_string(),
        });

        match &self.behavior {
            GeneratorBehavior::Reply(text) => Ok(text.clone()),
            GeneratorBehavior::EchoContext => Ok(format!("ANSWER[{}]", context)),
            GeneratorBehavior::Fail(reason) => Err(KbError::Generation(reason.clone())),
            GeneratorBehavior::Hang => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                unreachable!("hanging generator should be cancelled or timed out")
            }
        }
    }
}

/// The three-chunk document from the retrieval scenario
pub fn scenario_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new("alpha intro", json!({"page": 1})),
        Chunk::new("beta detail", json!({"page": 2})),
        Chunk::new("gamma conclusion", json!({"page": 3})),
    ]
}

pub fn test_config(data_dir: &Path) -> KbConfig {
    let mut config = KbConfig::default();
    config.data_dir = data_dir.to_path_buf();
    config.embedding.dimension = 256;
    config
}

pub fn manager(data_dir: &Path) -> DocumentContextManager {
    DocumentContextManager::new(data_dir, test_embedder())
}

pub fn service(data_dir: &Path, generator: Arc<dyn GenerationProvider>) -> DocumentQaService {
    DocumentQaService::new(&test_config(data_dir), test_embedder(), generator)
}
