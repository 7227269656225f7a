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
    let Some(index) = state.index.as_ref() else {
        return Ok(tool_error(
            &RagError::Index(anyhow::anyhow!("vector index not initialized")).into(),
        ));
    };

    match index.optimize().await {
        Ok(()) => Ok(success("Vector index optimized.".to_string())),
        Err(e) => Ok(tool_error(&RagError::Index(e).into())),
    }
}
