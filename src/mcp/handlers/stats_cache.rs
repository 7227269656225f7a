use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;
use std::sync::Arc;

use crate::mcp::handlers::success;
use crate::mcp::http::{ErrorResponse, McpCallResponse};
use crate::AppState;

pub async fn handle(
    state: Arc<AppState>,
    _args: &Value,
) -> Result<Json<McpCallResponse>, (StatusCode, Json<ErrorResponse>)> {
    let stats = state.cache.stats();
    Ok(success(format!(
        "Embedding cache: {}/{} entr(y/ies) in memory, {} on disk. \
         Requests: {} (memory hits: {}, disk hits: {}, misses: {}, hit rate: {:.1}%).",
        stats.memory_cache_size,
        stats.max_memory_size,
        stats.disk_entries,
        stats.total_requests,
        stats.memory_hits,
        stats.disk_hits,
        stats.misses,
        stats.hit_rate_pct,
    )))
}
