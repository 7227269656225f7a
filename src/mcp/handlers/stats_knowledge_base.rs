use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::RagError;
use crate::mcp::handlers::{success, tool_error};
use crate::mcp::http::{ErrorResponse, McpCallResponse};
use crate::AppState;

pub async fn handle(
    state: Arc<AppState>,
    _args: &Value,
) -> Result<Json<McpCallResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(index) = state.index.as_ref() else {
        return Ok(tool_error(
            &RagError::Index(anyhow::anyhow!("vector index not initialized")).into(),
        ));
    };

    let records = match index.scan_all().await {
        Ok(r) => r,
        Err(e) => return Ok(tool_error(&RagError::Index(e).into())),
    };

    if records.is_empty() {
        return Ok(success("The knowledge base is empty. Ingest material with learn_text, learn_document, or learn_from_url.".to_string()));
    }

    let mut by_file_type: HashMap<String, usize> = HashMap::new();
    let mut by_processing_method: HashMap<String, usize> = HashMap::new();
    let mut total_titles = 0i64;
    let mut total_tables = 0i64;
    let mut total_lists = 0i64;
    let mut total_elements = 0i64;

    for record in &records {
        let file_type = record
            .metadata
            .get("file_type")
            .map(|v| v.to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        *by_file_type.entry(file_type).or_insert(0) += 1;

        let processing_method = record
            .metadata
            .get("processing_method")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        *by_processing_method.entry(processing_method).or_insert(0) += 1;

        total_titles += record
            .metadata
            .get("structural_info_titles_count")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as i64;
        total_tables += record
            .metadata
            .get("structural_info_tables_count")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as i64;
        total_lists += record
            .metadata
            .get("structural_info_lists_count")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as i64;
        total_elements += record
            .metadata
            .get("structural_info_total_elements")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as i64;
    }

    let n = records.len() as f64;
    let mut out = format!("Knowledge base: {} chunk(s).\n\n", records.len());

    out.push_str("By file type:\n");
    let mut file_types: Vec<_> = by_file_type.into_iter().collect();
    file_types.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (file_type, count) in file_types {
        out.push_str(&format!("  {}: {}\n", file_type, count));
    }

    out.push_str("\nBy processing method:\n");
    let mut methods: Vec<_> = by_processing_method.into_iter().collect();
    methods.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (method, count) in methods {
        out.push_str(&format!("  {}: {}\n", method, count));
    }

    out.push_str(&format!(
        "\nStructural averages per chunk: {:.2} elements, {:.2} titles, {:.2} tables, {:.2} lists.",
        total_elements as f64 / n,
        total_titles as f64 / n,
        total_tables as f64 / n,
        total_lists as f64 / n,
    ));

    Ok(success(out))
}
