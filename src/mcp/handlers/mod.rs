pub mod ask;
pub mod ask_filtered;
pub mod clear_cache;
pub mod learn_document;
pub mod learn_from_url;
pub mod learn_text;
pub mod optimize_index;
pub mod reindex;
pub mod stats_cache;
pub mod stats_index;
pub mod stats_knowledge_base;

use axum::response::Json;

use crate::core::format_tool_error;
use crate::mcp::http::{McpCallResponse, McpContent};
use crate::pipeline::LearnOutcome;
use crate::retrieval::Answer;

/// Every handler's happy path funnels through here: one text block, `is_error: false`.
pub(crate) fn success(text: String) -> Json<McpCallResponse> {
    Json(McpCallResponse {
        content: vec![McpContent {
            content_type: "text".to_string(),
            text,
        }],
        is_error: false,
    })
}

/// Every handler's failure path funnels through here: the tool boundary never
/// raises, it returns a string carrying the error marker (§7).
pub(crate) fn tool_error(err: &anyhow::Error) -> Json<McpCallResponse> {
    Json(McpCallResponse {
        content: vec![McpContent {
            content_type: "text".to_string(),
            text: format_tool_error(err),
        }],
        is_error: true,
    })
}

pub(crate) fn render_learn_outcome(outcome: &LearnOutcome) -> String {
    format!(
        "Learned '{}' — {} chunk(s) stored via '{}' processing ({} chunking).",
        outcome.source, outcome.chunk_count, outcome.processing_method, outcome.chunking_method
    )
}

pub(crate) fn render_answer(answer: &Answer) -> String {
    if answer.no_information {
        return answer.body.clone();
    }

    let mut out = String::new();
    out.push_str(&answer.body);
    out.push_str("\n\n");

    if let Some(confidence) = answer.confidence {
        out.push_str(&format!("Confidence: {}\n", confidence.as_str()));
    }
    if !answer.applied_filters.is_empty() {
        out.push_str(&format!("Applied filters: {}\n", answer.applied_filters.join(", ")));
    }

    out.push_str("Sources:\n");
    for (i, a) in answer.attributions.iter().enumerate() {
        out.push_str(&format!(
            "  [{}] {} (file_type={}, processing_method={}, chunking_method={}, titles={}, tables={}, lists={})\n",
            i + 1,
            a.source,
            a.file_type.as_deref().unwrap_or("unknown"),
            a.processing_method.as_deref().unwrap_or("unknown"),
            a.chunking_method.as_deref().unwrap_or("unknown"),
            a.titles_count.unwrap_or(0),
            a.tables_count.unwrap_or(0),
            a.lists_count.unwrap_or(0),
        ));
    }

    out.trim_end().to_string()
}
