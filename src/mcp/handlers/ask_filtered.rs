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
    let file_type = args.get("file_type").and_then(|v| v.as_str());
    let processing_method = args.get("processing_method").and_then(|v| v.as_str());
    let min_tables = args.get("min_tables").and_then(|v| v.as_i64());
    let min_titles = args.get("min_titles").and_then(|v| v.as_i64());

    let synthesizer =
        OpenAiCompatibleSynthesizer::from_config(state.http_client.clone(), &state.rag_config.synthesizer);

    match ask(
        &state,
        &synthesizer,
        query,
        file_type,
        processing_method,
        min_tables,
        min_titles,
    )
    .await
    {
        Ok(answer) => Ok(success(render_answer(&answer))),
        Err(e) => Ok(tool_error(&e)),
    }
}
