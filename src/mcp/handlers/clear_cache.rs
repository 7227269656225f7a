use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;
use std::sync::Arc;

use crate::core::RagError;
use crate::mcp::handlers::{success, tool_error};
use crate::mcp::http::{ErrorResponse, McpCallResponse};
use crate::AppState;

pub async fn handle(
    state: Arc<AppState>,
    _args: &Value,
) -> Result<Json<McpCallResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.cache.clear() {
        Ok(removed) => Ok(success(format!("Cleared {} cached embedding(s).", removed))),
        Err(e) => Ok(tool_error(&RagError::Cache(e).into())),
    }
}
