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
    args: &Value,
) -> Result<Json<McpCallResponse>, (StatusCode, Json<ErrorResponse>)> {
    let profile = args.get("profile").and_then(|v| v.as_str()).unwrap_or("auto");
    if !["small", "medium", "large", "auto"].contains(&profile) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid profile: {}", profile),
            }),
        ));
    }

    let Some(index) = state.index.as_ref() else {
        return Ok(tool_error(
            &RagError::Index(anyhow::anyhow!("vector index not initialized")).into(),
        ));
    };

    // LanceDB's `create_index` auto-selects its own parameters; the requested
    // profile is informational only and does not change the backend call.
    match index.optimize().await {
        Ok(()) => Ok(success(format!(
            "Reindexed (profile '{}'); backend auto-selected index parameters.",
            profile
        ))),
        Err(e) => Ok(tool_error(&RagError::Index(e).into())),
    }
}
