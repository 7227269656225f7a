use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;
use std::sync::Arc;

use crate::mcp::handlers::{render_answer, success, tool_error};
use crate::mcp::http::{ErrorResponse, McpCallResponse};
use crate::retrieval::{ask, OpenAiCompatibleSynthesizer};
use crate::AppState;

pub async fn handle(
    state: Arc<AppState>,
    args: &Value,
) -> Result<Json<McpCallResponse>, (StatusCode, Json<ErrorResponse>)> {
    let query = args.get("query").and_then(|v| v.as_str()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing required field: query".to_string(),
            }),
        )
    })?;

    let synthesizer =
        OpenAiCompatibleSynthesizer::from_config(state.http_client.clone(), &state.rag_config.synthesizer);

    match ask(&state, &synthesizer, query, None, None, None, None).await {
        Ok(answer) => Ok(success(render_answer(&answer))),
        Err(e) => Ok(tool_error(&e)),
    }
}
