use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use crate::core::app_state::AppState;
use crate::core::model::{Chunk, FlatMetadata, Record};
use crate::core::RagError;
use crate::embed::cache::EmbeddingCacheKey;
use crate::ingest::chunk::create_semantic_chunks;
use crate::ingest::metadata::flatten_metadata;
use crate::ingest::normalize::normalize_text;
use crate::ingest::partition::{partition, RawInput};

const ENHANCED_EXTENSIONS: &[&str] = &[
    ".pdf", ".docx", ".doc", ".pptx", ".ppt", ".xlsx", ".xls", ".txt", ".html", ".htm", ".csv",
    ".json", ".xml", ".rtf", ".odt", ".odp", ".ods", ".md", ".yaml", ".yml",
];

/// Summary of one completed ingestion call, handed back to the MCP tool
/// handler for rendering into `McpCallResponse`.
#[derive(Debug, Clone)]
pub struct LearnOutcome {
    pub source: String,
    pub chunk_count: usize,
    pub processing_method: String,
    pub chunking_method: String,
}

async fn embed_and_store(
    state: &AppState,
    chunks: &[Chunk],
    base_metadata: &serde_json::Map<String, serde_json::Value>,
) -> Result<()> {
    let index = state
        .index
        .as_ref()
        .ok_or_else(|| RagError::Index(anyhow::anyhow!("vector index not initialized")))?;
    let model_id = state.embedder.model_id().to_string();

    let mut records = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let normalized = normalize_text(&chunk.text);
        let key = EmbeddingCacheKey::new(&normalized, &model_id);
        let vector = if let Some(cached) = state.cache.get(&key) {
            cached
        } else {
            let vector = state
                .embedder
                .embed(&normalized)
                .await
                .context("failed to embed chunk")?;
            state.cache.put(&key, vector.clone()).ok();
            vector
        };

        let mut chunk_meta = base_metadata.clone();
        chunk_meta.insert("chunk_index".to_string(), json!(chunk.chunk_index));
        chunk_meta.insert("total_chunks".to_string(), json!(chunk.total_chunks));
        chunk_meta.insert(
            "avg_chunk_size".to_string(),
            json!(chunk.text.len() as f64),
        );
        chunk_meta.insert(
            "structural_info".to_string(),
            json!({
                "total_elements": chunk.structural_info.total_elements,
                "titles_count": chunk.structural_info.titles_count,
                "tables_count": chunk.structural_info.tables_count,
                "lists_count": chunk.structural_info.lists_count,
                "narrative_blocks": chunk.structural_info.narrative_blocks,
                "other_elements": chunk.structural_info.other_elements,
                "total_text_length": chunk.structural_info.total_text_length,
                "avg_element_length": chunk.structural_info.avg_element_length,
            }),
        );

        let flat: FlatMetadata = flatten_metadata(&chunk_meta);

        records.push(Record {
            id: Uuid::new_v4().to_string(),
            text: chunk.text.clone(),
            vector,
            metadata: flat,
        });
    }

    index.add(records).await.map_err(RagError::Index)?;
    Ok(())
}

/// Reject whitespace-only normalized text before any chunk is built.
fn require_non_empty(normalized: &str) -> Result<()> {
    if normalized.trim().is_empty() {
        return Err(RagError::EmptyInput.into());
    }
    Ok(())
}

/// A document whose post-chunking content is empty, or whose only chunk is
/// whitespace, is not a usable knowledge base entry.
fn require_non_empty_chunks(chunks: &[Chunk], source_ref: &str) -> Result<()> {
    let has_content = chunks.iter().any(|c| !c.text.trim().is_empty());
    if chunks.is_empty() || !has_content {
        return Err(RagError::EmptyDocument {
            source_ref: source_ref.to_string(),
        }
        .into());
    }
    Ok(())
}

pub async fn learn_text(state: &AppState, text: &str, source_name: &str) -> Result<LearnOutcome> {
    let normalized = normalize_text(text);
    require_non_empty(&normalized)?;

    let raw = RawInput::PlainText(normalized);
    let elements = partition(source_name, &raw)?;
    let chunk_size = state.rag_config.resolve_chunk_size();
    let overlap = state.rag_config.resolve_chunk_overlap();
    let chunks = create_semantic_chunks(&elements, source_name, chunk_size, overlap);
    require_non_empty_chunks(&chunks, source_name)?;

    let mut base_metadata = serde_json::Map::new();
    base_metadata.insert("source".to_string(), json!(source_name));
    base_metadata.insert("input_type".to_string(), json!("manual_text"));
    base_metadata.insert("processed_date".to_string(), json!(Utc::now().to_rfc3339()));
    base_metadata.insert("processing_method".to_string(), json!("manual_input"));
    base_metadata.insert("chunking_method".to_string(), json!("standard"));

    embed_and_store(state, &chunks, &base_metadata).await?;

    Ok(LearnOutcome {
        source: source_name.to_string(),
        chunk_count: chunks.len(),
        processing_method: "manual_input".to_string(),
        chunking_method: "standard".to_string(),
    })
}

pub async fn learn_document(
    state: &AppState,
    bytes: Vec<u8>,
    file_name: &str,
) -> Result<LearnOutcome> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    let raw = RawInput::File {
        bytes,
        extension: extension.clone(),
    };
    let elements = partition(file_name, &raw)?;
    let chunk_size = state.rag_config.resolve_chunk_size();
    let overlap = state.rag_config.resolve_chunk_overlap();
    let chunks = create_semantic_chunks(&elements, file_name, chunk_size, overlap);
    require_non_empty_chunks(&chunks, file_name)?;

    let processing_method = "unstructured_enhanced".to_string();
    let chunking_method = if elements.len() > 1 { "semantic" } else { "standard" };

    persist_processed_copy(state, file_name, &processing_method, &chunks);

    let mut base_metadata = serde_json::Map::new();
    base_metadata.insert("source".to_string(), json!(file_name));
    base_metadata.insert("file_path".to_string(), json!(file_name));
    base_metadata.insert("file_type".to_string(), json!(extension));
    base_metadata.insert("processed_date".to_string(), json!(Utc::now().to_rfc3339()));
    base_metadata.insert("processing_method".to_string(), json!(processing_method));
    base_metadata.insert("chunking_method".to_string(), json!(chunking_method));

    embed_and_store(state, &chunks, &base_metadata).await?;

    Ok(LearnOutcome {
        source: file_name.to_string(),
        chunk_count: chunks.len(),
        processing_method,
        chunking_method: chunking_method.to_string(),
    })
}

fn persist_processed_copy(
    state: &AppState,
    name: &str,
    processing_method: &str,
    chunks: &[Chunk],
) {
    let documents_dir = state.rag_config.resolve_data_dir().join("documents");
    if let Err(e) = std::fs::create_dir_all(&documents_dir) {
        tracing::warn!("could not create documents dir {}: {}", documents_dir.display(), e);
        return;
    }
    let safe_name = name.replace(['/', '\\'], "_");
    let path = documents_dir.join(format!("{}_{}.md", safe_name, processing_method));
    let rendered = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    if let Err(e) = std::fs::write(&path, rendered) {
        tracing::warn!("could not save processed copy to {}: {}", path.display(), e);
    }
}

pub async fn learn_from_url(state: &AppState, url_str: &str) -> Result<LearnOutcome> {
    let url = Url::parse(url_str).map_err(|e| RagError::Fetch {
        url: url_str.to_string(),
        source: anyhow::anyhow!(e),
    })?;

    let extension = std::path::Path::new(url.path())
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    let _permit = state.outbound_limit.acquire().await.ok();

    if ENHANCED_EXTENSIONS.contains(&extension.as_str()) {
        let response = state
            .http_client
            .get(url.clone())
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| RagError::Fetch {
                url: url_str.to_string(),
                source: anyhow::anyhow!(e),
            })?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RagError::Fetch {
                url: url_str.to_string(),
                source: anyhow::anyhow!(e),
            })?
            .to_vec();

        let domain = url.host_str().unwrap_or("unknown").replace('.', "_");
        let file_name = format!("{}_{}", domain, url.path().replace('/', "_"));

        let raw = RawInput::File {
            bytes,
            extension: extension.clone(),
        };
        let elements = partition(url_str, &raw)?;
        let chunk_size = state.rag_config.resolve_chunk_size();
        let overlap = state.rag_config.resolve_chunk_overlap();
        let chunks = create_semantic_chunks(&elements, url_str, chunk_size, overlap);
        require_non_empty_chunks(&chunks, url_str)?;

        let processing_method = "unstructured_enhanced".to_string();
        let chunking_method = if elements.len() > 1 { "semantic" } else { "standard" };
        persist_processed_copy(state, &file_name, &processing_method, &chunks);

        let mut base_metadata = serde_json::Map::new();
        base_metadata.insert("source".to_string(), json!(url_str));
        base_metadata.insert("domain".to_string(), json!(url.host_str().unwrap_or("")));
        base_metadata.insert("file_type".to_string(), json!(extension));
        base_metadata.insert("input_type".to_string(), json!("url_download"));
        base_metadata.insert("processed_date".to_string(), json!(Utc::now().to_rfc3339()));
        base_metadata.insert("processing_method".to_string(), json!(processing_method));
        base_metadata.insert("chunking_method".to_string(), json!(chunking_method));

        embed_and_store(state, &chunks, &base_metadata).await?;

        Ok(LearnOutcome {
            source: url_str.to_string(),
            chunk_count: chunks.len(),
            processing_method,
            chunking_method: chunking_method.to_string(),
        })
    } else {
        let response = state
            .http_client
            .get(url.clone())
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| RagError::Fetch {
                url: url_str.to_string(),
                source: anyhow::anyhow!(e),
            })?;
        let html = response.text().await.map_err(|e| RagError::Fetch {
            url: url_str.to_string(),
            source: anyhow::anyhow!(e),
        })?;

        let raw = RawInput::Html { html, url: url.clone() };
        let elements = partition(url_str, &raw)?;
        let chunk_size = state.rag_config.resolve_chunk_size();
        let overlap = state.rag_config.resolve_chunk_overlap();
        let chunks = create_semantic_chunks(&elements, url_str, chunk_size, overlap);
        require_non_empty_chunks(&chunks, url_str)?;

        let mut base_metadata = serde_json::Map::new();
        base_metadata.insert("source".to_string(), json!(url_str));
        base_metadata.insert("domain".to_string(), json!(url.host_str().unwrap_or("")));
        base_metadata.insert("input_type".to_string(), json!("url_web"));
        base_metadata.insert("processed_date".to_string(), json!(Utc::now().to_rfc3339()));
        base_metadata.insert("processing_method".to_string(), json!("manual_input"));
        base_metadata.insert("chunking_method".to_string(), json!("standard"));

        embed_and_store(state, &chunks, &base_metadata).await?;

        Ok(LearnOutcome {
            source: url_str.to_string(),
            chunk_count: chunks.len(),
            processing_method: "manual_input".to_string(),
            chunking_method: "standard".to_string(),
        })
    }
}
