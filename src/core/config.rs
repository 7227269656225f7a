use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// RagConfig — file-based config loader (cortex-rag.json) with env-var fallback
// ---------------------------------------------------------------------------

/// Synthesizer sub-config (mirrors the `synthesizer` key in cortex-rag.json).
///
/// Models the external LLM used by `retrieval::answer` as a swappable boundary
/// — the engine never calls out to an LLM without going through here.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct SynthesizerConfig {
    /// LLM endpoint — e.g. `https://api.openai.com/v1` or `http://localhost:11434/v1` (Ollama).
    pub llm_base_url: Option<String>,
    /// API key. Never logged. Leave blank for key-less local endpoints.
    pub llm_api_key: Option<String>,
    /// Model name — e.g. `gpt-4o-mini`, `llama3`, `mistral`.
    pub llm_model: Option<String>,
    /// Max output tokens the synthesizer may generate per answer.
    pub max_tokens: Option<u32>,
}

impl SynthesizerConfig {
    /// API key: JSON field → `OPENAI_API_KEY` env var → `None`.
    ///
    /// An explicit empty string in the config file means "no key required"
    /// (Ollama / LM Studio) and is returned as `Some("")`. `None` only when
    /// the field is absent from config AND `OPENAI_API_KEY` is unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(k) = &self.llm_api_key {
            return Some(k.trim().to_string());
        }
        std::env::var("OPENAI_API_KEY").ok().filter(|v| !v.trim().is_empty())
    }

    /// LLM base URL: JSON field → `OPENAI_BASE_URL` env var → `https://api.openai.com/v1`.
    pub fn resolve_base_url(&self) -> String {
        if let Some(u) = &self.llm_base_url {
            if !u.trim().is_empty() {
                return u.clone();
            }
        }
        std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
    }

    /// Model name: JSON field → `RAG_SYNTHESIS_LLM_MODEL` env var → `gpt-4o-mini`.
    pub fn resolve_model(&self) -> String {
        if let Some(m) = &self.llm_model {
            if !m.trim().is_empty() {
                return m.clone();
            }
        }
        std::env::var("RAG_SYNTHESIS_LLM_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }

    /// Max output tokens: JSON field → `RAG_SYNTHESIS_MAX_TOKENS` env var → 1024.
    pub fn resolve_max_tokens(&self) -> u32 {
        if let Some(n) = self.max_tokens {
            return n;
        }
        std::env::var("RAG_SYNTHESIS_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1024)
    }
}

/// Top-level config loaded from `cortex-rag.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct RagConfig {
    pub data_dir: Option<String>,
    pub vector_store_dir: Option<String>,
    pub embedding_cache_dir: Option<String>,
    pub embedding_model: Option<String>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub max_cache_entries: Option<u64>,
    #[serde(default)]
    pub synthesizer: SynthesizerConfig,
}

impl RagConfig {
    /// Root data directory: JSON field → `DATA_DIR` env var → `~/.cortex-rag/data`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(d) = &self.data_dir {
            if !d.trim().is_empty() {
                return PathBuf::from(d);
            }
        }
        if let Ok(v) = std::env::var("DATA_DIR") {
            if !v.trim().is_empty() {
                return PathBuf::from(v);
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cortex-rag")
            .join("data")
    }

    /// Vector store directory: JSON field → `VECTOR_STORE_DIR` env var → `<data_dir>/lancedb`.
    pub fn resolve_vector_store_dir(&self) -> PathBuf {
        if let Some(d) = &self.vector_store_dir {
            if !d.trim().is_empty() {
                return PathBuf::from(d);
            }
        }
        if let Ok(v) = std::env::var("VECTOR_STORE_DIR") {
            if !v.trim().is_empty() {
                return PathBuf::from(v);
            }
        }
        self.resolve_data_dir().join("lancedb")
    }

    /// Embedding disk-cache directory: JSON field → `EMBEDDING_CACHE_DIR` env var
    /// → `<data_dir>/embedding_cache`.
    pub fn resolve_embedding_cache_dir(&self) -> PathBuf {
        if let Some(d) = &self.embedding_cache_dir {
            if !d.trim().is_empty() {
                return PathBuf::from(d);
            }
        }
        if let Ok(v) = std::env::var("EMBEDDING_CACHE_DIR") {
            if !v.trim().is_empty() {
                return PathBuf::from(v);
            }
        }
        self.resolve_data_dir().join("embedding_cache")
    }

    /// Embedding model id: JSON field → `EMBEDDING_MODEL` env var → `minishlab/potion-base-8M`.
    pub fn resolve_embedding_model(&self) -> String {
        if let Some(m) = &self.embedding_model {
            if !m.trim().is_empty() {
                return m.clone();
            }
        }
        std::env::var("EMBEDDING_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "minishlab/potion-base-8M".to_string())
    }

    /// Target chunk size in characters: JSON field → `CHUNK_SIZE` env var → 1000.
    pub fn resolve_chunk_size(&self) -> usize {
        if let Some(n) = self.chunk_size {
            return n;
        }
        std::env::var("CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000)
    }

    /// Chunk overlap in characters: JSON field → `CHUNK_OVERLAP` env var → 200.
    pub fn resolve_chunk_overlap(&self) -> usize {
        if let Some(n) = self.chunk_overlap {
            return n;
        }
        std::env::var("CHUNK_OVERLAP")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(200)
    }

    /// Max entries held in the in-memory embedding cache tier: JSON field →
    /// `MAX_CACHE_SIZE` env var → 10000.
    pub fn resolve_max_cache_entries(&self) -> u64 {
        if let Some(n) = self.max_cache_entries {
            return n;
        }
        std::env::var("MAX_CACHE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000)
    }
}

/// Load `cortex-rag.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `CORTEX_RAG_CONFIG` env var path
/// 2. `./cortex-rag.json`  (process cwd)
/// 3. `../cortex-rag.json` (one level up)
///
/// Missing file → `RagConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `RagConfig::default()`.
pub fn load_rag_config() -> RagConfig {
    let candidates: Vec<PathBuf> = {
        let mut v = vec![
            PathBuf::from("cortex-rag.json"),
            PathBuf::from("../cortex-rag.json"),
        ];
        if let Ok(env_path) = std::env::var("CORTEX_RAG_CONFIG") {
            v.insert(0, PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RagConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("cortex-rag.json loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(
                        "cortex-rag.json parse error at {}: {} — using defaults",
                        path.display(),
                        e
                    );
                    return RagConfig::default();
                }
            },
            Err(_) => continue,
        }
    }

    RagConfig::default()
}

// ---------------------------------------------------------------------------

pub const ENV_EMBEDDING_MODEL: &str = "EMBEDDING_MODEL";

/// Sanity-check that a caller-provided path override actually exists, used when
/// validating a user-supplied document path before attempting to partition it.
pub fn existing_path(p: &str) -> Option<PathBuf> {
    let path = Path::new(p);
    if path.exists() {
        Some(path.to_path_buf())
    } else {
        None
    }
}
