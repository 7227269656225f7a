use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structural tag of a document fragment produced by the element partitioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Title,
    NarrativeText,
    ListItem,
    Table,
    Other,
}

/// One structurally meaningful fragment of a document, in reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    pub text: String,
    pub order_index: u64,
    #[serde(default)]
    pub raw_metadata: serde_json::Map<String, serde_json::Value>,
    /// Pre-rendered HTML for `Table` elements, when the partitioner captured one.
    /// C3 strips tags from this and prefixes with the table marker (§4.3).
    #[serde(default)]
    pub table_html: Option<String>,
}

impl Element {
    pub fn new(kind: ElementKind, text: impl Into<String>, order_index: u64) -> Self {
        Self {
            kind,
            text: text.into(),
            order_index,
            raw_metadata: serde_json::Map::new(),
            table_html: None,
        }
    }
}

/// Per-kind element counts tracked alongside a chunk or a whole document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StructuralInfo {
    pub total_elements: u64,
    pub titles_count: u64,
    pub tables_count: u64,
    pub lists_count: u64,
    pub narrative_blocks: u64,
    pub other_elements: u64,
    pub total_text_length: u64,
    pub avg_element_length: f64,
}

impl StructuralInfo {
    pub fn record(&mut self, kind: ElementKind, text_len: usize) {
        self.total_elements += 1;
        self.total_text_length += text_len as u64;
        match kind {
            ElementKind::Title => self.titles_count += 1,
            ElementKind::Table => self.tables_count += 1,
            ElementKind::ListItem => self.lists_count += 1,
            ElementKind::NarrativeText => self.narrative_blocks += 1,
            ElementKind::Other => self.other_elements += 1,
        }
        self.avg_element_length = if self.total_elements == 0 {
            0.0
        } else {
            self.total_text_length as f64 / self.total_elements as f64
        };
    }
}

/// A bounded-size, reading-order-preserving concatenation of elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_ref: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub structural_info: StructuralInfo,
}

/// Scalar metadata value accepted by the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl MetadataValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Int(i) => Some(*i as f64),
            MetadataValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn render_sql(&self) -> String {
        match self {
            MetadataValue::Str(s) => format!("'{}'", s.replace('\'', "''")),
            MetadataValue::Int(i) => i.to_string(),
            MetadataValue::Float(f) => f.to_string(),
            MetadataValue::Bool(b) => b.to_string(),
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Str(s) => write!(f, "{}", s),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A flat (non-nested) metadata map, the only shape C7 will persist.
pub type FlatMetadata = BTreeMap<String, MetadataValue>;

/// A persisted (text, vector, metadata) triple.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: FlatMetadata,
}

/// A single result returned by a similarity search, paired with its score.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub text: String,
    pub metadata: FlatMetadata,
    pub score: f32,
}
