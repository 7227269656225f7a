use super::handlers;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    pub title: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct McpToolsResponse {
    pub tools: Vec<McpTool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct McpCallRequest {
    pub name: String,
    pub arguments: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct McpCallResponse {
    pub content: Vec<McpContent>,
    pub is_error: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct McpContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

pub fn list_tools_for_state(state: &AppState) -> McpToolsResponse {
    let tools = state
        .tool_registry
        .public_specs()
        .into_iter()
        .map(|spec| McpTool {
            name: spec.public_name,
            title: spec.public_title,
            description: spec.public_description,
            input_schema: spec.public_input_schema,
            icons: spec.icons,
        })
        .collect();

    McpToolsResponse { tools }
}

pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<McpToolsResponse> {
    Json(list_tools_for_state(state.as_ref()))
}

pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Json(request): Json<McpCallRequest>,
) -> Result<Json<McpCallResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!(
        "MCP tool call: {} with args: {:?}",
        request.name, request.arguments
    );

    let internal_name = state
        .tool_registry
        .resolve_incoming_tool_name(&request.name)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Unknown tool: {}", request.name),
                }),
            )
        })?;

    let internal_args = state
        .tool_registry
        .map_public_arguments_to_internal(&internal_name, request.arguments);

    match internal_name.as_str() {
        "learn_text" => handlers::learn_text::handle(state, &internal_args).await,
        "learn_document" => handlers::learn_document::handle(state, &internal_args).await,
        "learn_from_url" => handlers::learn_from_url::handle(state, &internal_args).await,
        "ask" => handlers::ask::handle(state, &internal_args).await,
        "ask_filtered" => handlers::ask_filtered::handle(state, &internal_args).await,
        "stats_knowledge_base" => handlers::stats_knowledge_base::handle(state, &internal_args).await,
        "stats_cache" => handlers::stats_cache::handle(state, &internal_args).await,
        "clear_cache" => handlers::clear_cache::handle(state, &internal_args).await,
        "stats_index" => handlers::stats_index::handle(state, &internal_args).await,
        "optimize_index" => handlers::optimize_index::handle(state, &internal_args).await,
        "reindex" => handlers::reindex::handle(state, &internal_args).await,
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unknown tool: {}", request.name),
            }),
        )),
    }
}
