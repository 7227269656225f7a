use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;
use std::sync::Arc;

use crate::mcp::handlers::{render_learn_outcome, success, tool_error};
use crate::mcp::http::{ErrorResponse, McpCallResponse};
use crate::pipeline;
use crate::AppState;

pub async fn handle(
    state: Arc<AppState>,
    args: &Value,
) -> Result<Json<McpCallResponse>, (StatusCode, Json<ErrorResponse>)> {
    let text = args.get("text").and_then(|v| v.as_str()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing required field: text".to_string(),
            }),
        )
    })?;
    let source_name = args
        .get("source_name")
        .and_then(|v| v.as_str())
        .unwrap_or("manual_input");

    match pipeline::learn_text(&state, text, source_name).await {
        Ok(outcome) => Ok(success(render_learn_outcome(&outcome))),
        Err(e) => Ok(tool_error(&e)),
    }
}
