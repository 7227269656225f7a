use thiserror::Error;

/// Error taxonomy for the ingestion and retrieval engine.
///
/// Internally components use `anyhow::Result` for plumbing; this enum is the
/// typed surface at the seams that need to branch on error kind (cache
/// demotion, tool-boundary formatting).
#[derive(Debug, Error)]
pub enum RagError {
    #[error("input is empty after normalization")]
    EmptyInput,

    #[error("failed to fetch '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no partitioner strategy could extract text from '{source_ref}'")]
    Partition { source_ref: String },

    #[error("document '{source_ref}' produced no non-trivial chunk")]
    EmptyDocument { source_ref: String },

    #[error("vector index operation failed: {0}")]
    Index(#[source] anyhow::Error),

    #[error("embedding cache operation failed: {0}")]
    Cache(#[source] anyhow::Error),

    #[error("input contained non-UTF-8 bytes where text was required")]
    Normalization,
}

impl RagError {
    /// Short machine-readable tag used as the tool-boundary error marker.
    pub fn marker(&self) -> &'static str {
        match self {
            RagError::EmptyInput => "EMPTY_INPUT",
            RagError::Fetch { .. } => "FETCH_ERROR",
            RagError::Partition { .. } => "PARTITION_ERROR",
            RagError::EmptyDocument { .. } => "EMPTY_DOCUMENT",
            RagError::Index(_) => "INDEX_ERROR",
            RagError::Cache(_) => "CACHE_ERROR",
            RagError::Normalization => "NORMALIZATION_ERROR",
        }
    }
}

/// Format any error as a tool-boundary string. Every `mcp::handlers::*` entry
/// point funnels its error path through this so no exception ever escapes
/// across the tool boundary (§6/§7).
pub fn format_tool_error(err: &anyhow::Error) -> String {
    if let Some(rag_err) = err.downcast_ref::<RagError>() {
        format!("[{}] {}", rag_err.marker(), rag_err)
    } else {
        format!("[ERROR] {}", err)
    }
}
