//! Plain-text diagram rendering of a compiled graph's topology.
//!
//! Unlike [`super::petgraph_compat::to_dot`] (feature-gated, Graphviz-specific),
//! this renderer has no dependency and is always available — it exists purely
//! so a caller can eyeball a graph's shape (nodes, static edges, conditional
//! branch points, fan-out groups) without pulling in a rendering toolchain.
//! Format is advisory: structural presence is what callers should rely on,
//! not the exact text layout.

use std::fmt::Write;

use rustc_hash::FxHashMap;

use super::edges::ConditionalEdge;
use crate::types::NodeKind;

fn label(node: &NodeKind) -> String {
    match node {
        NodeKind::Start => "START".to_string(),
        NodeKind::End => "FINISH".to_string(),
        NodeKind::Custom(name) => name.clone(),
    }
}

/// Renders a graph's static and conditional edges as an indented text tree.
///
/// Nodes with more than one static destination are rendered as a fan-out
/// group; conditional edges are listed separately since their destinations
/// are only known at route time.
pub(super) fn to_text_diagram(
    edges: &FxHashMap<NodeKind, Vec<NodeKind>>,
    conditional_edges: &[ConditionalEdge],
) -> String {
    let mut out = String::new();
    writeln!(out, "graph {{").unwrap();

    let mut sources: Vec<&NodeKind> = edges.keys().collect();
    sources.sort_by_key(|n| label(n));

    for from in sources {
        let destinations = &edges[from];
        match destinations.as_slice() {
            [] => {}
            [single] => {
                writeln!(out, "  {} -> {}", label(from), label(single)).unwrap();
            }
            many => {
                let mut names: Vec<String> = many.iter().map(label).collect();
                names.sort();
                writeln!(out, "  {} -> fan_out({})", label(from), names.join(", ")).unwrap();
            }
        }
    }

    if !conditional_edges.is_empty() {
        writeln!(out, "  -- conditional --").unwrap();
        for (i, edge) in conditional_edges.iter().enumerate() {
            writeln!(
                out,
                "  {} -> conditional#{} (destinations resolved at route time)",
                label(edge.from()),
                i
            )
            .unwrap();
        }
    }

    writeln!(out, "}}").unwrap();
    out
}
