pub mod app_state;
pub mod config;
pub mod error;
pub mod model;
pub mod tools_registry;

pub use app_state::AppState;
pub use error::{format_tool_error, RagError};
