//! Interpretation of the model's reply.
//!
//! [`parse_response`] never fails. A reply that is not JSON, or has no
//! `variants` array, degrades to the identity fallback: every node keeps its
//! own text as all three options. A partial reply keeps what the model sent
//! and appends identity entries for the nodes it left out. A `null` entry
//! in `variants` voids the whole reply.
//!
//! Entries are not deduplicated. If the model returns two entries for the
//! same `nodeId`, both reach the caller.

use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{GenerationResults, TextNode, VariantResult};

/// Options per node requested from the model.
pub const VARIANTS_PER_NODE: usize = 3;

/// Identity rewrite: the node's own text as original and as every option.
pub fn identity_variant(node: &TextNode) -> VariantResult {
    VariantResult {
        node_id: node.id.clone(),
        original: node.characters.clone(),
        options: vec![node.characters.clone(); VARIANTS_PER_NODE],
    }
}

/// One identity entry per node, in input order.
pub fn fallback_results(nodes: &[TextNode]) -> GenerationResults {
    GenerationResults {
        variants: nodes.iter().map(identity_variant).collect(),
    }
}

/// Turn raw reply text into results covering every input node.
pub fn parse_response(raw: &str, nodes: &[TextNode]) -> GenerationResults {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("reply is not valid JSON, using fallback: {e}");
            return fallback_results(nodes);
        }
    };

    let Some(entries) = parsed.get("variants").and_then(Value::as_array) else {
        warn!("reply has no variants array, using fallback");
        return fallback_results(nodes);
    };
    if entries.iter().any(Value::is_null) {
        warn!("reply has a null variant entry, using fallback");
        return fallback_results(nodes);
    }

    let mut results = GenerationResults {
        variants: entries.iter().map(|e| entry_to_variant(e, nodes)).collect(),
    };

    let missing: Vec<&TextNode> = nodes
        .iter()
        .filter(|node| !results.covers(&node.id))
        .collect();
    if !missing.is_empty() {
        debug!(
            "reply covered {}/{} nodes, filling {} with original text",
            nodes.len() - missing.len(),
            nodes.len(),
            missing.len()
        );
    }
    results
        .variants
        .extend(missing.into_iter().map(identity_variant));

    results
}

fn entry_to_variant(entry: &Value, nodes: &[TextNode]) -> VariantResult {
    let node_id = match entry.get("nodeId") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let original = nodes
        .iter()
        .find(|n| n.id == node_id)
        .map(|n| n.characters.clone())
        .unwrap_or_default();

    let options = entry
        .get("options")
        .and_then(Value::as_array)
        .map(|opts| opts.iter().filter_map(option_text).collect())
        .unwrap_or_default();

    VariantResult {
        node_id,
        original,
        options,
    }
}

fn option_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello() -> TextNode {
        TextNode::new("1", "Hello")
    }

    fn world() -> TextNode {
        TextNode::new("2", "World")
    }

    fn ids(results: &GenerationResults) -> Vec<&str> {
        results.variants.iter().map(|v| v.node_id.as_str()).collect()
    }

    #[test]
    fn invalid_json_falls_back_to_identity() {
        let results = parse_response("not json", &[hello()]);
        assert_eq!(
            results,
            GenerationResults {
                variants: vec![VariantResult {
                    node_id: "1".into(),
                    original: "Hello".into(),
                    options: vec!["Hello".into(), "Hello".into(), "Hello".into()],
                }],
            }
        );
    }

    #[test]
    fn partial_reply_is_reconciled() {
        let raw = r#"{"variants":[{"nodeId":"1","options":["A","B","C"]}]}"#;
        let results = parse_response(raw, &[hello(), world()]);

        assert_eq!(results.variants.len(), 2);
        let first = &results.variants[0];
        assert_eq!(first.node_id, "1");
        assert_eq!(first.original, "Hello");
        assert_eq!(first.options, vec!["A", "B", "C"]);

        let second = &results.variants[1];
        assert_eq!(second.node_id, "2");
        assert_eq!(second.original, "World");
        assert_eq!(second.options, vec!["World", "World", "World"]);
    }

    #[test]
    fn empty_variants_equals_fallback() {
        let nodes = [hello()];
        assert_eq!(
            parse_response(r#"{"variants":[]}"#, &nodes),
            fallback_results(&nodes)
        );
    }

    #[test]
    fn wrong_shapes_fall_back() {
        let nodes = [hello(), world()];
        for raw in [
            "",
            "null",
            "42",
            "[]",
            r#"{"variants":"nope"}"#,
            r#"{"variants":{"nodeId":"1"}}"#,
            r#"{"other":[]}"#,
        ] {
            assert_eq!(parse_response(raw, &nodes), fallback_results(&nodes), "{raw}");
        }
    }

    #[test]
    fn original_comes_from_request_not_reply() {
        let raw = r#"{"variants":[{"nodeId":"1","original":"Forged","options":["A","B","C"]}]}"#;
        let results = parse_response(raw, &[hello()]);
        assert_eq!(results.variants[0].original, "Hello");
    }

    #[test]
    fn unknown_ids_are_kept_with_empty_original() {
        let raw = r#"{"variants":[{"nodeId":"ghost","options":["X","Y","Z"]}]}"#;
        let results = parse_response(raw, &[hello()]);
        assert_eq!(ids(&results), vec!["ghost", "1"]);
        assert_eq!(results.variants[0].original, "");
        assert_eq!(results.variants[1], identity_variant(&hello()));
    }

    #[test]
    fn missing_options_become_empty() {
        let raw = r#"{"variants":[{"nodeId":"1"}]}"#;
        let results = parse_response(raw, &[hello()]);
        assert_eq!(results.variants.len(), 1);
        assert!(results.variants[0].options.is_empty());
    }

    #[test]
    fn option_count_is_not_enforced() {
        let raw = r#"{"variants":[{"nodeId":"1","options":["A","B","C","D",7,null]}]}"#;
        let results = parse_response(raw, &[hello()]);
        assert_eq!(results.variants[0].options, vec!["A", "B", "C", "D", "7"]);
    }

    #[test]
    fn numeric_node_id_matches_string_id() {
        let raw = r#"{"variants":[{"nodeId":1,"options":["A","B","C"]}]}"#;
        let results = parse_response(raw, &[hello()]);
        assert_eq!(results.variants.len(), 1);
        assert_eq!(results.variants[0].original, "Hello");
    }

    #[test]
    fn null_entry_voids_reply() {
        let nodes = [hello(), world()];
        let raw = r#"{"variants":[null,{"nodeId":"1","options":["A","B","C"]}]}"#;
        assert_eq!(parse_response(raw, &nodes), fallback_results(&nodes));
    }

    #[test]
    fn scalar_entries_become_empty_results() {
        let raw = r#"{"variants":[7,{"nodeId":"1","options":["A","B","C"]}]}"#;
        let results = parse_response(raw, &[hello()]);
        assert_eq!(ids(&results), vec!["", "1"]);
        assert!(results.variants[0].options.is_empty());
        assert_eq!(results.variants[1].options, vec!["A", "B", "C"]);
    }

    // Duplicate entries from the model are passed through unmerged.
    #[test]
    fn duplicate_entries_are_preserved() {
        let raw = r#"{"variants":[
            {"nodeId":"1","options":["A","B","C"]},
            {"nodeId":"1","options":["D","E","F"]}
        ]}"#;
        let results = parse_response(raw, &[hello(), world()]);
        assert_eq!(ids(&results), vec!["1", "1", "2"]);
        assert_eq!(results.variants[1].options, vec!["D", "E", "F"]);
    }

    #[test]
    fn output_covers_every_input_id() {
        let nodes = [hello(), world(), TextNode::new("3", "{count} items")];
        for raw in [
            "garbage",
            r#"{"variants":[]}"#,
            r#"{"variants":[{"nodeId":"2","options":["a","b","c"]}]}"#,
            r#"{"variants":[{"nodeId":"9"},{"nodeId":"3","options":[]}]}"#,
        ] {
            let results = parse_response(raw, &nodes);
            for node in &nodes {
                assert!(results.covers(&node.id), "{raw} missing {}", node.id);
            }
        }
    }

    #[test]
    fn fallback_preserves_input_order() {
        let nodes = [world(), hello()];
        assert_eq!(ids(&fallback_results(&nodes)), vec!["2", "1"]);
    }
}
