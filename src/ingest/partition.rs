use anyhow::Result;
use scraper::{Html, Selector};
use std::io::Cursor;
use url::Url;

use crate::core::model::{Element, ElementKind};

/// One element extraction strategy in the partitioning cascade. Each strategy
/// either produces a non-empty element list or hands off to the next one —
/// mirrors the corresponding Python loader's try/fallback chain, but as a
/// trait cascade instead of nested try/except.
pub trait PartitionStrategy {
    fn name(&self) -> &'static str;
    fn try_partition(&self, source_ref: &str, raw: &RawInput) -> Result<Vec<Element>>;
}

/// Input handed to the partitioner: either file bytes with a declared
/// extension, or fetched HTML with its originating URL.
pub enum RawInput {
    File { bytes: Vec<u8>, extension: String },
    Html { html: String, url: Url },
    PlainText(String),
}

/// Run every strategy in order, returning the first non-empty result.
pub fn partition(source_ref: &str, raw: &RawInput) -> Result<Vec<Element>> {
    let strategies: Vec<Box<dyn PartitionStrategy>> = match raw {
        RawInput::PlainText(_) => vec![Box::new(PlainTextStrategy)],
        RawInput::Html { .. } => vec![
            Box::new(ReadabilityStrategy),
            Box::new(RawHtmlTextStrategy),
        ],
        RawInput::File { extension, .. } => match extension.as_str() {
            ".md" | ".txt" => vec![Box::new(PlainFileStrategy)],
            ".html" | ".htm" => vec![Box::new(ReadabilityStrategy), Box::new(RawHtmlTextStrategy)],
            _ => vec![Box::new(PlainFileStrategy)],
        },
    };

    for strategy in &strategies {
        match strategy.try_partition(source_ref, raw) {
            Ok(elements) if !elements.is_empty() => {
                tracing::debug!(
                    "partition strategy '{}' succeeded for '{}' ({} elements)",
                    strategy.name(),
                    source_ref,
                    elements.len()
                );
                return Ok(elements);
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(
                    "partition strategy '{}' failed for '{}': {}",
                    strategy.name(),
                    source_ref,
                    e
                );
                continue;
            }
        }
    }

    Err(crate::core::RagError::Partition {
        source_ref: source_ref.to_string(),
    }
    .into())
}

/// Splits plain text/markdown on blank lines into narrative-text elements,
/// promoting short all-caps or markdown-heading lines to titles.
struct PlainTextStrategy;
struct PlainFileStrategy;

impl PartitionStrategy for PlainTextStrategy {
    fn name(&self) -> &'static str {
        "plain_text"
    }

    fn try_partition(&self, _source_ref: &str, raw: &RawInput) -> Result<Vec<Element>> {
        let RawInput::PlainText(text) = raw else {
            return Ok(vec![]);
        };
        Ok(split_into_elements(text))
    }
}

impl PartitionStrategy for PlainFileStrategy {
    fn name(&self) -> &'static str {
        "plain_file"
    }

    fn try_partition(&self, _source_ref: &str, raw: &RawInput) -> Result<Vec<Element>> {
        let RawInput::File { bytes, .. } = raw else {
            return Ok(vec![]);
        };
        let text = String::from_utf8(bytes.clone())
            .map_err(|_| crate::core::RagError::Normalization)?;
        Ok(split_into_elements(&text))
    }
}

fn split_into_elements(text: &str) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut idx = 0u64;
    for block in text.split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        let kind = classify_block(block);
        elements.push(Element::new(kind, block, idx));
        idx += 1;
    }
    elements
}

fn classify_block(block: &str) -> ElementKind {
    let first_line = block.lines().next().unwrap_or(block);
    if first_line.starts_with('#') {
        return ElementKind::Title;
    }
    if first_line.len() < 80
        && !first_line.ends_with('.')
        && first_line.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase())
        && first_line.chars().any(|c| c.is_alphabetic())
    {
        return ElementKind::Title;
    }
    if block.lines().all(|l| {
        let l = l.trim_start();
        l.starts_with("- ") || l.starts_with("* ") || l.starts_with(char::is_numeric)
    }) {
        return ElementKind::ListItem;
    }
    ElementKind::NarrativeText
}

/// Extract the main article via Mozilla Readability, then flatten the
/// resulting HTML into structural elements via a lightweight DOM walk.
struct ReadabilityStrategy;

impl PartitionStrategy for ReadabilityStrategy {
    fn name(&self) -> &'static str {
        "readability"
    }

    fn try_partition(&self, _source_ref: &str, raw: &RawInput) -> Result<Vec<Element>> {
        let (html, url) = match raw {
            RawInput::Html { html, url } => (html.clone(), url.clone()),
            RawInput::File { bytes, extension } if extension == ".html" || extension == ".htm" => {
                let html = String::from_utf8(bytes.clone())
                    .map_err(|_| crate::core::RagError::Normalization)?;
                (html, Url::parse("https://local.invalid/document").unwrap())
            }
            _ => return Ok(vec![]),
        };

        let mut cursor = Cursor::new(html.as_bytes());
        let product = readability::extractor::extract(&mut cursor, &url)
            .map_err(|e| anyhow::anyhow!("readability extraction failed: {}", e))?;

        Ok(html_to_elements(&product.content))
    }
}

/// Last-resort HTML path: strip tags with a DOM walk and keep whatever text
/// nodes remain, even if Readability rejected the document as non-article.
struct RawHtmlTextStrategy;

impl PartitionStrategy for RawHtmlTextStrategy {
    fn name(&self) -> &'static str {
        "raw_html_text"
    }

    fn try_partition(&self, _source_ref: &str, raw: &RawInput) -> Result<Vec<Element>> {
        let html = match raw {
            RawInput::Html { html, .. } => html.clone(),
            RawInput::File { bytes, .. } => String::from_utf8(bytes.clone())
                .map_err(|_| crate::core::RagError::Normalization)?,
            _ => return Ok(vec![]),
        };
        Ok(html_to_elements(&html))
    }
}

/// Walks the document once, in document order, special-casing `<table>`
/// nodes inline instead of lifting all tables to the front and separately
/// markdown-rendering the whole document — the latter both reorders tables
/// ahead of surrounding prose and double-renders table content, since
/// `html2md` converts `<table>` into markdown table syntax `classify_block`
/// then misclassifies as prose.
fn html_to_elements(html: &str) -> Vec<Element> {
    let document = Html::parse_document(html);
    let mut elements = Vec::new();
    let mut idx = 0u64;

    let Ok(block_sel) = Selector::parse("h1, h2, h3, h4, h5, h6, p, li, table, blockquote, pre")
    else {
        return elements;
    };

    for node in document.select(&block_sel) {
        let tag = node.value().name();

        // A table's own cells may contain <p>/<li> that also match the
        // selector; skip anything nested under a table we've already
        // captured as a single Table element.
        if tag != "table"
            && node
                .ancestors()
                .any(|a| a.value().as_element().map(|e| e.name()) == Some("table"))
        {
            continue;
        }

        if tag == "table" {
            let mut el = Element::new(ElementKind::Table, "", idx);
            el.table_html = Some(node.html());
            elements.push(el);
            idx += 1;
            continue;
        }

        let rendered = html2md::parse_html(&node.html());
        let text = rendered.trim();
        if text.is_empty() {
            continue;
        }

        let kind = match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementKind::Title,
            "li" => ElementKind::ListItem,
            _ => ElementKind::NarrativeText,
        };

        elements.push(Element::new(kind, text, idx));
        idx += 1;
    }

    elements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_splits_on_blank_lines() {
        let raw = RawInput::PlainText("TITLE\n\nSome narrative text here.".to_string());
        let elements = partition("unit-test", &raw).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].kind, ElementKind::Title);
        assert_eq!(elements[1].kind, ElementKind::NarrativeText);
    }

    #[test]
    fn list_block_detected() {
        let raw = RawInput::PlainText("- item one\n- item two".to_string());
        let elements = partition("unit-test", &raw).unwrap();
        assert_eq!(elements[0].kind, ElementKind::ListItem);
    }

    #[test]
    fn empty_plain_text_fails_every_strategy() {
        let raw = RawInput::PlainText("   \n\n  ".to_string());
        assert!(partition("unit-test", &raw).is_err());
    }

    #[test]
    fn html_elements_preserve_document_order_around_a_table() {
        let html = "<html><body>\
            <h1>Report</h1>\
            <p>Intro paragraph.</p>\
            <table><tr><td>A</td><td>B</td></tr></table>\
            <p>Closing paragraph.</p>\
            </body></html>";
        let elements = html_to_elements(html);

        let kinds: Vec<ElementKind> = elements.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Title,
                ElementKind::NarrativeText,
                ElementKind::Table,
                ElementKind::NarrativeText,
            ]
        );
        // The table's own cell text must not also surface as a separate
        // narrative-text element.
        assert!(!elements.iter().any(|e| e.kind == ElementKind::NarrativeText
            && (e.text.contains('A') && e.text.contains('B') && e.text.len() < 10)));
    }
}
