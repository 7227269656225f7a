use crate::core::model::MetadataValue;

/// Comparison a single filter term applies to one metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
}

/// One `field <op> value` condition.
#[derive(Debug, Clone)]
pub struct FilterTerm {
    pub field: String,
    pub op: FilterOp,
    pub value: MetadataValue,
}

/// A conjunction of filter terms, rendered as a LanceDB `.only_if(...)`
/// predicate string. Where the original filters combined conditions as a
/// ChromaDB `$and`/`$gte` JSON document, this renders the same semantics as
/// a SQL-ish boolean expression — the shape LanceDB's filter pushdown
/// expects.
#[derive(Debug, Clone, Default)]
pub struct FilterPredicate {
    terms: Vec<FilterTerm>,
}

impl FilterPredicate {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn eq(mut self, field: impl Into<String>, value: MetadataValue) -> Self {
        self.terms.push(FilterTerm {
            field: field.into(),
            op: FilterOp::Eq,
            value,
        });
        self
    }

    pub fn gte(mut self, field: impl Into<String>, value: MetadataValue) -> Self {
        self.terms.push(FilterTerm {
            field: field.into(),
            op: FilterOp::Gte,
            value,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render as a LanceDB filter expression, or `None` when there are no
    /// terms (callers should skip `.only_if(...)` entirely in that case).
    pub fn render(&self) -> Option<String> {
        if self.terms.is_empty() {
            return None;
        }
        Some(
            self.terms
                .iter()
                .map(|t| {
                    let op = match t.op {
                        FilterOp::Eq => "=",
                        FilterOp::Gte => ">=",
                    };
                    format!("{} {} {}", t.field, op, t.value.render_sql())
                })
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }
}

/// Build the recognized metadata filter out of the named, commonly-filtered
/// fields. Mirrors the corresponding Python constructor's field set:
/// `file_type`, `processing_method`, and the two structural-count minimums.
pub fn simple_metadata_filter(
    file_type: Option<&str>,
    processing_method: Option<&str>,
    min_tables: Option<i64>,
    min_titles: Option<i64>,
) -> FilterPredicate {
    let mut predicate = FilterPredicate::new();
    if let Some(v) = file_type {
        predicate = predicate.eq("file_type", MetadataValue::Str(v.to_string()));
    }
    if let Some(v) = processing_method {
        predicate = predicate.eq("processing_method", MetadataValue::Str(v.to_string()));
    }
    if let Some(v) = min_tables {
        predicate = predicate.gte("structural_info_tables_count", MetadataValue::Int(v));
    }
    if let Some(v) = min_titles {
        predicate = predicate.gte("structural_info_titles_count", MetadataValue::Int(v));
    }
    predicate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_renders_none() {
        assert!(FilterPredicate::new().render().is_none());
    }

    #[test]
    fn single_term_renders_without_conjunction() {
        let predicate = simple_metadata_filter(Some(".pdf"), None, None, None);
        assert_eq!(predicate.render().unwrap(), "file_type = '.pdf'");
    }

    #[test]
    fn multiple_terms_join_with_and() {
        let predicate = simple_metadata_filter(Some(".pdf"), None, Some(2), None);
        let rendered = predicate.render().unwrap();
        assert!(rendered.contains("file_type = '.pdf'"));
        assert!(rendered.contains("structural_info_tables_count >= 2"));
        assert!(rendered.contains(" AND "));
    }

    #[test]
    fn string_values_are_quoted_and_escaped() {
        let predicate = FilterPredicate::new().eq("source", MetadataValue::Str("o'brien.pdf".to_string()));
        assert_eq!(predicate.render().unwrap(), "source = 'o''brien.pdf'");
    }
}
