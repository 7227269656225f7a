use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;

use crate::core::app_state::AppState;
use crate::core::config::SynthesizerConfig;
use crate::core::model::ScoredRecord;
use crate::core::RagError;
use crate::index::filter::FilterPredicate;

const DEFAULT_K: usize = 5;
const DEFAULT_SCORE_THRESHOLD: f32 = 0.1;

/// Confidence band attached to an answer based on the number of distinct
/// sources it draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Limited,
}

impl Confidence {
    fn from_source_count(n: usize) -> Self {
        match n {
            0..=1 => Confidence::Limited,
            2 => Confidence::Medium,
            _ => Confidence::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Limited => "limited",
        }
    }
}

/// One line of the attribution block: everything a caller needs to judge
/// where a piece of the answer came from.
#[derive(Debug, Clone)]
pub struct Attribution {
    pub source: String,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub processing_method: Option<String>,
    pub chunking_method: Option<String>,
    pub titles_count: Option<i64>,
    pub tables_count: Option<i64>,
    pub lists_count: Option<i64>,
}

/// The final shape handed back to the MCP tool handler.
#[derive(Debug, Clone)]
pub struct Answer {
    pub body: String,
    pub attributions: Vec<Attribution>,
    pub confidence: Option<Confidence>,
    pub no_information: bool,
    pub applied_filters: Vec<String>,
}

/// Boundary to the external text generator. The engine never calls out to
/// an LLM except through here, so retrieval stays unit-testable without a
/// live model.
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(&self, query: &str, context: &[ScoredRecord]) -> Result<String>;
}

/// OpenAI-compatible chat-completions implementation, configured the way
/// the teacher configures its own LLM boundary: base URL / API key / model
/// resolved through the config-file-then-env-var chain.
pub struct OpenAiCompatibleSynthesizer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl OpenAiCompatibleSynthesizer {
    pub fn from_config(client: reqwest::Client, config: &SynthesizerConfig) -> Self {
        Self {
            client,
            base_url: config.resolve_base_url(),
            api_key: config.resolve_api_key(),
            model: config.resolve_model(),
            max_tokens: config.resolve_max_tokens(),
        }
    }
}

#[async_trait]
impl AnswerSynthesizer for OpenAiCompatibleSynthesizer {
    async fn synthesize(&self, query: &str, context: &[ScoredRecord]) -> Result<String> {
        let context_block = context
            .iter()
            .enumerate()
            .map(|(i, r)| format!("[{}] {}", i + 1, r.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Answer the question using only the context below. If the context doesn't \
             contain the answer, say so.\n\nContext:\n{}\n\nQuestion: {}",
            context_block, query
        );

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "messages": [{"role": "user", "content": prompt}],
            }));
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                request = request.bearer_auth(key);
            }
        }

        let response = request
            .send()
            .await
            .context("synthesizer request failed")?
            .error_for_status()
            .context("synthesizer returned an error status")?;
        let body: serde_json::Value = response.json().await.context("invalid synthesizer response body")?;
        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(text)
    }
}

fn no_information_answer(applied_filters: &[String]) -> Answer {
    let filter_note = if applied_filters.is_empty() {
        "No filters were applied.".to_string()
    } else {
        format!("Applied filters: {}.", applied_filters.join(", "))
    };
    Answer {
        body: format!(
            "The knowledge base has no relevant information for this query. {} \
             Try broadening or removing filters, or ingest more material with learn_text, \
             learn_document, or learn_from_url.",
            filter_note
        ),
        attributions: vec![],
        confidence: None,
        no_information: true,
        applied_filters: applied_filters.to_vec(),
    }
}

fn render_applied_filters(
    file_type: Option<&str>,
    processing_method: Option<&str>,
    min_tables: Option<i64>,
    min_titles: Option<i64>,
) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(v) = file_type {
        out.push(format!("file_type={}", v));
    }
    if let Some(v) = processing_method {
        out.push(format!("processing_method={}", v));
    }
    if let Some(v) = min_tables {
        out.push(format!("min_tables={}", v));
    }
    if let Some(v) = min_titles {
        out.push(format!("min_titles={}", v));
    }
    out
}

fn build_attribution(record: &ScoredRecord) -> Attribution {
    let get_str = |k: &str| record.metadata.get(k).map(|v| v.to_string());
    let get_int = |k: &str| record.metadata.get(k).and_then(|v| v.as_f64()).map(|f| f as i64);
    Attribution {
        source: get_str("source").unwrap_or_else(|| "unknown".to_string()),
        file_path: get_str("file_path"),
        file_type: get_str("file_type"),
        processing_method: get_str("processing_method"),
        chunking_method: get_str("chunking_method"),
        titles_count: get_int("structural_info_titles_count"),
        tables_count: get_int("structural_info_tables_count"),
        lists_count: get_int("structural_info_lists_count"),
    }
}

/// Run a metadata-filtered similarity search and assemble an attributed
/// answer, applying the hallucination guard unconditionally (no answer body
/// survives an empty post-threshold retrieval set, even if the synthesizer
/// already produced one).
pub async fn ask(
    state: &AppState,
    synthesizer: &dyn AnswerSynthesizer,
    query: &str,
    file_type: Option<&str>,
    processing_method: Option<&str>,
    min_tables: Option<i64>,
    min_titles: Option<i64>,
) -> Result<Answer> {
    let index = state
        .index
        .as_ref()
        .ok_or_else(|| RagError::Index(anyhow::anyhow!("vector index not initialized")))?;

    let mut filter = FilterPredicate::new();
    if let Some(v) = file_type {
        filter = filter.eq("file_type", crate::core::model::MetadataValue::Str(v.to_string()));
    }
    if let Some(v) = processing_method {
        filter = filter.eq(
            "processing_method",
            crate::core::model::MetadataValue::Str(v.to_string()),
        );
    }
    if let Some(v) = min_tables {
        filter = filter.gte(
            "structural_info_tables_count",
            crate::core::model::MetadataValue::Int(v),
        );
    }
    if let Some(v) = min_titles {
        filter = filter.gte(
            "structural_info_titles_count",
            crate::core::model::MetadataValue::Int(v),
        );
    }

    let applied_filters = render_applied_filters(file_type, processing_method, min_tables, min_titles);

    let normalized_query = crate::ingest::normalize::normalize_text(query);
    let query_vector = state
        .embedder
        .embed(&normalized_query)
        .await
        .context("failed to embed query")?;

    let results = index.search(&query_vector, DEFAULT_K, &filter).await.map_err(RagError::Index)?;
    let results: Vec<ScoredRecord> = results
        .into_iter()
        .filter(|r| r.score >= DEFAULT_SCORE_THRESHOLD)
        .collect();

    if results.is_empty() {
        return Ok(no_information_answer(&applied_filters));
    }

    let body = synthesizer
        .synthesize(&normalized_query, &results)
        .await
        .unwrap_or_default();

    // Hallucination guard: an empty retrieval set (already handled above) or
    // a synthesizer that somehow returned nothing both collapse to the
    // canonical no-information response.
    if body.trim().is_empty() {
        return Ok(no_information_answer(&applied_filters));
    }

    let distinct_sources: HashSet<String> = results
        .iter()
        .filter_map(|r| r.metadata.get("source").map(|v| v.to_string()))
        .collect();
    let confidence = Confidence::from_source_count(distinct_sources.len());

    let attributions = results.iter().map(build_attribution).collect();

    Ok(Answer {
        body,
        attributions,
        confidence: Some(confidence),
        no_information: false,
        applied_filters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FlatMetadata, MetadataValue};

    fn record(source: &str, score: f32) -> ScoredRecord {
        let mut metadata = FlatMetadata::new();
        metadata.insert("source".to_string(), MetadataValue::Str(source.to_string()));
        ScoredRecord {
            text: "some retrieved text".to_string(),
            metadata,
            score,
        }
    }

    #[test]
    fn confidence_bands_match_source_counts() {
        assert_eq!(Confidence::from_source_count(0), Confidence::Limited);
        assert_eq!(Confidence::from_source_count(1), Confidence::Limited);
        assert_eq!(Confidence::from_source_count(2), Confidence::Medium);
        assert_eq!(Confidence::from_source_count(3), Confidence::High);
        assert_eq!(Confidence::from_source_count(10), Confidence::High);
    }

    #[test]
    fn no_information_answer_lists_filters() {
        let answer = no_information_answer(&["file_type=.pdf".to_string()]);
        assert!(answer.no_information);
        assert!(answer.body.contains("file_type=.pdf"));
        assert!(answer.confidence.is_none());
    }

    #[test]
    fn attribution_pulls_known_fields() {
        let r = record("notes", 0.9);
        let attribution = build_attribution(&r);
        assert_eq!(attribution.source, "notes");
    }
}
