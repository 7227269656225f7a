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
    let url = args.get("url").and_then(|v| v.as_str()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing required field: url".to_string(),
            }),
        )
    })?;

    match pipeline::learn_from_url(&state, url).await {
        Ok(outcome) => Ok(success(render_learn_outcome(&outcome))),
        Err(e) => Ok(tool_error(&e)),
    }
}
