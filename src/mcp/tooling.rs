use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ToolCatalogEntry {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub icons: Vec<&'static str>,
}

pub fn tool_catalog() -> Vec<ToolCatalogEntry> {
    vec![
        ToolCatalogEntry {
            name: "learn_text",
            title: "Learn From Text",
            description: "Ingest raw text into the knowledge base: normalize, chunk, embed, and store it for later retrieval.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string"},
                    "source_name": {"type": "string", "default": "manual_input"}
                },
                "required": ["text"]
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "learn_document",
            title: "Learn From Document",
            description: "Ingest a document from disk, partitioning it by file type before chunking and embedding.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string"}
                },
                "required": ["file_path"]
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "learn_from_url",
            title: "Learn From URL",
            description: "Fetch a URL (downloadable file or web page) and ingest its content into the knowledge base.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string"}
                },
                "required": ["url"]
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "ask",
            title: "Ask Knowledge Base",
            description: "Run a retrieval-augmented query against the knowledge base and return an attributed, grounded answer.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"}
                },
                "required": ["query"]
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "ask_filtered",
            title: "Ask Knowledge Base (Filtered)",
            description: "Run a retrieval-augmented query scoped by metadata filters (file type, processing method, structural minimums).",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "file_type": {"type": "string"},
                    "processing_method": {"type": "string"},
                    "min_tables": {"type": "integer", "minimum": 0},
                    "min_titles": {"type": "integer", "minimum": 0}
                },
                "required": ["query"]
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "stats_knowledge_base",
            title: "Knowledge Base Stats",
            description: "Report aggregate ingestion counts per file type and processing method, plus structural averages.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "stats_cache",
            title: "Embedding Cache Stats",
            description: "Report embedding cache occupancy across both the memory and disk tiers.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "clear_cache",
            title: "Clear Embedding Cache",
            description: "Drop every cached embedding, memory and disk alike.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "stats_index",
            title: "Vector Index Stats",
            description: "Report vector index size, backend collection name, and embedding dimension.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "optimize_index",
            title: "Optimize Vector Index",
            description: "Trigger backend-specific vector index compaction; may be a no-op depending on the backend.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            icons: vec![],
        },
        ToolCatalogEntry {
            name: "reindex",
            title: "Reindex",
            description: "Rebuild vector index metadata at a given size profile; may be a no-op depending on the backend.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "profile": {
                        "type": "string",
                        "enum": ["small", "medium", "large", "auto"],
                        "default": "auto"
                    }
                }
            }),
            icons: vec![],
        },
    ]
}

pub fn schema_to_object_map(schema: &Value) -> Arc<Map<String, Value>> {
    match schema {
        Value::Object(map) => Arc::new(map.clone()),
        _ => Arc::new(Map::new()),
    }
}
