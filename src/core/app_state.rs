use std::env;
use std::sync::Arc;

use crate::core::config::RagConfig;
use crate::embed::cache::EmbeddingCache;
use crate::embed::function::EmbeddingFunction;
use crate::index::adapter::VectorIndex;

#[derive(Clone)]
pub struct AppState {
    pub http_client: reqwest::Client,
    pub tool_registry: Arc<crate::core::tools_registry::ToolRegistry>,
    // Concurrency control for external calls (URL fetches during ingestion).
    pub outbound_limit: Arc<tokio::sync::Semaphore>,
    // Lazily-loaded embedding model, shared across ingestion and retrieval.
    pub embedder: Arc<EmbeddingFunction>,
    // Two-tier (memory + disk) embedding cache.
    pub cache: Arc<EmbeddingCache>,
    // Vector index. `None` only during the brief window between process start
    // and the async open completing; every tool handler expects `Some`.
    pub index: Option<Arc<VectorIndex>>,
    /// File-based config loaded from `cortex-rag.json` (env-var fallback for all fields).
    pub rag_config: Arc<RagConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("index_ready", &self.index.is_some())
            .finish()
    }
}

impl AppState {
    pub fn new(http_client: reqwest::Client) -> Self {
        let outbound_limit = env::var("OUTBOUND_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(32);

        let tool_registry = Arc::new(crate::core::tools_registry::ToolRegistry::load());
        let rag_config = Arc::new(crate::core::config::load_rag_config());

        let embedder = Arc::new(EmbeddingFunction::new(rag_config.resolve_embedding_model()));
        let cache = Arc::new(EmbeddingCache::new(
            rag_config.resolve_embedding_cache_dir(),
            rag_config.resolve_max_cache_entries(),
        ));

        Self {
            http_client,
            tool_registry,
            outbound_limit: Arc::new(tokio::sync::Semaphore::new(outbound_limit)),
            embedder,
            cache,
            index: None,
            rag_config,
        }
    }

    pub fn with_index(mut self, index: Arc<VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }
}
