//! Structural pass
//!
//! Each root of the structure forest is checked against the whole message. A node
//! checks its own cardinality and that of its direct children against the current
//! view, then splits the view into one chunk per occurrence of each child and
//! recurses into the chunks.

use super::context::{Context, Outcome, Scope};
use crate::message::{Segment, count_code};
use crate::types::{NodeId, StructureForest};

pub(crate) fn check_structure(forest: &StructureForest, context: &mut Context) {
    for &root in forest.roots() {
        let node = forest.node(root);
        tracing::info!("Validating {} in structure", node);

        let mut scope = context.scope();
        let errors_before = scope.log().error_count();
        descend(forest, root, &mut scope);
        if scope.log().error_count() == errors_before {
            scope.log().push(Outcome::structure_ok(node));
        }
    }
}

fn descend(forest: &StructureForest, id: NodeId, scope: &mut Scope<'_>) {
    check_cardinality(forest, id, scope);

    let children = forest.children(id);
    for &child in children {
        check_cardinality(forest, child, scope);
    }

    if !forest.node(id).cardinality.allows_presence() {
        return;
    }

    let view = scope.view();
    let mut remaining = view.get(1..).unwrap_or_default();
    for (idx, &child) in children.iter().enumerate() {
        let next = children.get(idx + 1).map(|&n| forest.node(n).code());
        let child_node = forest.node(child);
        let (chunks, rest) = partition(remaining, child_node.code(), next);
        remaining = rest;

        if !child_node.cardinality.allows_presence() {
            continue;
        }
        for chunk in chunks {
            let mut child_scope = scope.derive(chunk);
            descend(forest, child, &mut child_scope);
        }
    }
}

fn check_cardinality(forest: &StructureForest, id: NodeId, scope: &mut Scope<'_>) {
    let node = forest.node(id);
    let count = count_code(scope.view(), node.code());
    if let Err(kind) = node.cardinality.check(count) {
        scope.log().push(Outcome::structure_error(node, kind, count));
    }
}

/// Splits `segments` into the chunks owned by occurrences of `target`.
///
/// Segments before the first `target` are skipped. Every `target` opens a new chunk;
/// a `next` segment after a chunk has been opened ends the scan. Returns the chunks and
/// what is left for the following sibling: the suffix starting at the boundary, nothing
/// when the input ran out, or the whole input when `target` never occurred.
pub(crate) fn partition<'a>(
    segments: &'a [Segment],
    target: &str,
    next: Option<&str>,
) -> (Vec<&'a [Segment]>, &'a [Segment]) {
    let mut chunks = Vec::new();
    let mut open: Option<usize> = None;

    for (idx, segment) in segments.iter().enumerate() {
        if segment.code() == target {
            if let Some(start) = open {
                chunks.push(&segments[start..idx]);
            }
            open = Some(idx);
        } else if next == Some(segment.code()) {
            if let Some(start) = open {
                chunks.push(&segments[start..idx]);
                return (chunks, &segments[idx..]);
            }
        }
    }

    match open {
        Some(start) => {
            chunks.push(&segments[start..]);
            (chunks, &segments[segments.len()..])
        }
        None => (chunks, segments),
    }
}
