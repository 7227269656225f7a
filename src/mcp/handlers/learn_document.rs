use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;
use std::sync::Arc;

use crate::core::RagError;
use crate::mcp::handlers::{render_learn_outcome, success, tool_error};
use crate::mcp::http::{ErrorResponse, McpCallResponse};
use crate::pipeline;
use crate::AppState;

pub async fn handle(
    state: Arc<AppState>,
    args: &Value,
) -> Result<Json<McpCallResponse>, (StatusCode, Json<ErrorResponse>)> {
    let file_path = args.get("file_path").and_then(|v| v.as_str()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing required field: file_path".to_string(),
            }),
        )
    })?;

    let bytes = match tokio::fs::read(file_path).await {
        Ok(b) => b,
        Err(e) => {
            return Ok(tool_error(
                &RagError::Fetch {
                    url: file_path.to_string(),
                    source: anyhow::anyhow!(e),
                }
                .into(),
            ));
        }
    };

    match pipeline::learn_document(&state, bytes, file_path).await {
        Ok(outcome) => Ok(success(render_learn_outcome(&outcome))),
        Err(e) => Ok(tool_error(&e)),
    }
}
