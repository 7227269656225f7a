pub mod handlers;
pub mod http;
pub mod stdio;
pub mod tooling;

pub use http::{
    call_tool, list_tools, ErrorResponse, McpCallRequest, McpCallResponse, McpContent, McpTool,
    McpToolsResponse,
};
