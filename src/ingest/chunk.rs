use crate::core::model::{Chunk, Element, ElementKind, StructuralInfo};

/// Render a table element as text, preferring the captured HTML over the
/// opaque `Element.text` field. Non-HTML tables get their normalized text
/// returned verbatim; HTML tables get tags stripped and whitespace
/// collapsed, then are prefixed with the literal marker used throughout the
/// corpus this behavior is grounded on.
pub fn convert_table_to_text(element: &Element) -> String {
    if let Some(html) = &element.table_html {
        let stripped = strip_tags(html);
        let collapsed = collapse_whitespace(&stripped);
        let normalized = crate::ingest::normalize::normalize_text(&collapsed);
        format!("Tabla: {}", normalized)
    } else {
        crate::ingest::normalize::normalize_text(&element.text)
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render one element's text the way it should appear inside a chunk:
/// titles get a markdown heading, list items a bullet, tables their
/// dedicated rendering, everything else passes through after normalization.
fn render_element(element: &Element) -> String {
    let normalized = crate::ingest::normalize::normalize_text(element.text.trim());
    match element.kind {
        ElementKind::Title => format!("## {}", normalized),
        ElementKind::ListItem => format!("\u{2022} {}", normalized),
        ElementKind::Table => convert_table_to_text(element),
        ElementKind::NarrativeText | ElementKind::Other => normalized,
    }
}

/// Greedily accumulate elements into chunks bounded by `max_chunk_size`
/// characters, carrying backward-walked whole-element overlap into the next
/// chunk so context isn't lost at a boundary.
pub fn create_semantic_chunks(
    elements: &[Element],
    source_ref: &str,
    max_chunk_size: usize,
    overlap: usize,
) -> Vec<Chunk> {
    // Each piece carries its rendered text alongside the kind/size it was
    // recorded under, so overlap carried into the next chunk can be
    // replayed into that chunk's own `StructuralInfo` instead of staying
    // attributed only to the chunk it was first rendered for.
    let mut raw_chunks: Vec<(Vec<(String, ElementKind, usize)>, StructuralInfo)> = Vec::new();
    let mut current: Vec<(String, ElementKind, usize)> = Vec::new();
    let mut current_struct = StructuralInfo::default();
    let mut current_size = 0usize;

    for element in elements {
        let rendered = render_element(element);
        let element_size = rendered.len();

        if current_size + element_size > max_chunk_size && !current.is_empty() {
            raw_chunks.push((current.clone(), current_struct));

            let mut overlap_elements = Vec::new();
            let mut overlap_size = 0usize;
            for piece in current.iter().rev() {
                if overlap_size + piece.0.len() <= overlap {
                    overlap_size += piece.0.len();
                    overlap_elements.insert(0, piece.clone());
                } else {
                    break;
                }
            }
            current_struct = StructuralInfo::default();
            for (_, kind, size) in &overlap_elements {
                current_struct.record(*kind, *size);
            }
            current = overlap_elements;
            current.push((rendered, element.kind, element_size));
            current_size = overlap_size + element_size;
        } else {
            current.push((rendered, element.kind, element_size));
            current_size += element_size;
        }
        current_struct.record(element.kind, element_size);
    }

    if !current.is_empty() {
        raw_chunks.push((current, current_struct));
    }

    let total_chunks = raw_chunks.len();
    raw_chunks
        .into_iter()
        .enumerate()
        .filter_map(|(i, (pieces, structural_info))| {
            let text = pieces
                .iter()
                .map(|(s, _, _)| s.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            if text.trim().is_empty() {
                return None;
            }
            Some(Chunk {
                text,
                source_ref: source_ref.to_string(),
                chunk_index: i,
                total_chunks,
                structural_info,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(kind: ElementKind, text: &str, idx: u64) -> Element {
        Element::new(kind, text, idx)
    }

    #[test]
    fn single_small_document_is_one_chunk() {
        let elements = vec![
            el(ElementKind::Title, "Intro", 0),
            el(ElementKind::NarrativeText, "A short paragraph.", 1),
        ];
        let chunks = create_semantic_chunks(&elements, "doc", 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].total_chunks, 1);
    }

    #[test]
    fn oversized_document_splits_with_overlap() {
        let long_text = "x".repeat(600);
        let elements = vec![
            el(ElementKind::NarrativeText, &long_text, 0),
            el(ElementKind::NarrativeText, &long_text, 1),
            el(ElementKind::NarrativeText, &long_text, 2),
        ];
        let chunks = create_semantic_chunks(&elements, "doc", 1000, 200);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.total_chunks == chunks.len()));
    }

    #[test]
    fn table_marker_preserved() {
        let mut table = el(ElementKind::Table, "", 0);
        table.table_html = Some("<table><tr><td>A</td><td>B</td></tr></table>".to_string());
        let rendered = convert_table_to_text(&table);
        assert!(rendered.starts_with("Tabla: "));
        assert!(rendered.contains('A') && rendered.contains('B'));
    }

    #[test]
    fn empty_element_list_yields_no_chunks() {
        let chunks = create_semantic_chunks(&[], "doc", 1000, 200);
        assert!(chunks.is_empty());
    }

    #[test]
    fn overlap_carried_elements_are_recounted_in_structural_info() {
        let elements: Vec<Element> = (0..20)
            .map(|i| el(ElementKind::NarrativeText, &"x".repeat(100), i))
            .collect();
        let chunks = create_semantic_chunks(&elements, "doc", 450, 150);
        assert!(chunks.len() >= 2);
        // Chunk 1 is e0..e3 (4 whole elements); chunk 2 carries e3 via
        // overlap plus e4..e6, so its narrative_blocks count must include
        // the carried-over element too, not just the ones newly pushed.
        assert_eq!(chunks[0].structural_info.narrative_blocks, 4);
        assert_eq!(chunks[1].structural_info.narrative_blocks, 4);
    }
}
