use cortex_rag::core::tools_registry::ToolRegistry;

const EXPECTED_TOOLS: &[&str] = &[
    "learn_text",
    "learn_document",
    "learn_from_url",
    "ask",
    "ask_filtered",
    "stats_knowledge_base",
    "stats_cache",
    "clear_cache",
    "stats_index",
    "optimize_index",
    "reindex",
];

#[test]
fn all_eleven_tools_are_registered_with_stable_public_names() {
    let registry = ToolRegistry::load();
    let specs = registry.public_specs();

    assert_eq!(specs.len(), EXPECTED_TOOLS.len());

    let names: std::collections::HashSet<_> =
        specs.iter().map(|s| s.public_name.as_str()).collect();
    for expected in EXPECTED_TOOLS {
        assert!(names.contains(expected), "missing tool: {expected}");
    }
}

#[test]
fn public_names_round_trip_to_internal_names() {
    let registry = ToolRegistry::load();

    for name in EXPECTED_TOOLS {
        let internal = registry
            .resolve_incoming_tool_name(name)
            .unwrap_or_else(|| panic!("{name} did not resolve to an internal tool name"));
        assert_eq!(
            registry.public_tool_name_for_internal(&internal),
            Some(*name)
        );
    }
}

#[test]
fn unknown_tool_name_does_not_resolve() {
    let registry = ToolRegistry::load();
    assert!(registry.resolve_incoming_tool_name("not_a_real_tool").is_none());
}

#[test]
fn every_schema_declares_its_required_arguments() {
    let registry = ToolRegistry::load();
    let required_by_tool = [
        ("learn_text", "text"),
        ("learn_document", "file_path"),
        ("learn_from_url", "url"),
        ("ask", "query"),
        ("ask_filtered", "query"),
    ];

    for (tool, required_field) in required_by_tool {
        let internal = registry.resolve_incoming_tool_name(tool).unwrap();
        let spec = registry
            .public_specs()
            .into_iter()
            .find(|s| s.public_name == registry.public_tool_name_for_internal(&internal).unwrap())
            .expect("tool spec present");

        let required = spec.public_input_schema["required"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        assert!(
            required.iter().any(|v| v == required_field),
            "{tool} schema should require {required_field}"
        );
    }
}
