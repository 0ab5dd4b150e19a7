//! Segment structure forest
//!
//! Structure rules describe which segments may appear and how they nest. Nodes live
//! in an arena owned by [`StructureForest`] and refer to each other by [`NodeId`], so
//! parent links never own their targets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::selector::SegmentSelector;

/// Allowed occurrence range of a segment within its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cardinality {
    /// `0`: the segment must not appear.
    #[serde(rename = "0")]
    Absent,
    /// `1`: exactly one occurrence.
    #[default]
    #[serde(rename = "1")]
    ExactlyOne,
    /// `0..1`
    #[serde(rename = "0..1")]
    AtMostOne,
    /// `1..n`
    #[serde(rename = "1..n")]
    AtLeastOne,
    /// `0..n`
    #[serde(rename = "0..n")]
    Any,
}

impl Cardinality {
    /// Compares an occurrence count against the allowed range.
    pub fn check(&self, count: usize) -> std::result::Result<(), ViolationKind> {
        match (self, count) {
            (Cardinality::Absent, 0) => Ok(()),
            (Cardinality::Absent, _) => Err(ViolationKind::Unexpected),
            (Cardinality::ExactlyOne | Cardinality::AtLeastOne, 0) => Err(ViolationKind::Missing),
            (Cardinality::ExactlyOne | Cardinality::AtMostOne, n) if n > 1 => {
                Err(ViolationKind::TooMany)
            }
            _ => Ok(()),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Cardinality::Absent => "0",
            Cardinality::ExactlyOne => "1",
            Cardinality::AtMostOne => "0..1",
            Cardinality::AtLeastOne => "1..n",
            Cardinality::Any => "0..n",
        }
    }

    /// Whether the segment may occur at all.
    pub fn allows_presence(&self) -> bool {
        !matches!(self, Cardinality::Absent)
    }
}

impl FromStr for Cardinality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "0" => Ok(Cardinality::Absent),
            "1" => Ok(Cardinality::ExactlyOne),
            "0..1" => Ok(Cardinality::AtMostOne),
            "1..n" => Ok(Cardinality::AtLeastOne),
            "0..n" => Ok(Cardinality::Any),
            other => Err(format!("unknown cardinality '{other}'")),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Why a cardinality check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    Missing,
    TooMany,
    Unexpected,
}

impl ViolationKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ViolationKind::Missing => "missing",
            ViolationKind::TooMany => "too-many",
            ViolationKind::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Handle of a node inside a [`StructureForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureNode {
    pub selector: SegmentSelector,
    pub cardinality: Cardinality,
    /// Indentation depth of the declaring line.
    pub level: usize,
    pub line: Option<usize>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl StructureNode {
    pub fn code(&self) -> &str {
        self.selector.code()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Display for StructureNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.selector, self.cardinality)
    }
}

/// Arena of structure nodes plus the ordered list of roots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureForest {
    nodes: Vec<StructureNode>,
    roots: Vec<NodeId>,
}

impl StructureForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a segment at indentation `level`.
    ///
    /// The parent is found by walking up from the most recently declared node until a
    /// node with a smaller level is reached; without one the new node becomes a root.
    pub fn declare(
        &mut self,
        selector: SegmentSelector,
        level: usize,
        cardinality: Cardinality,
        line: Option<usize>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());

        let mut candidate = self.nodes.len().checked_sub(1).map(NodeId);
        while let Some(current) = candidate {
            let node = &self.nodes[current.0];
            if node.level < level {
                break;
            }
            candidate = node.parent;
        }

        self.nodes.push(StructureNode {
            selector,
            cardinality,
            level,
            line,
            parent: candidate,
            children: Vec::new(),
        });

        match candidate {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Appends every node of `other`, keeping its roots as additional roots.
    pub fn splice(&mut self, other: StructureForest) {
        let offset = self.nodes.len();
        let shift = |id: NodeId| NodeId(id.0 + offset);

        self.nodes.extend(other.nodes.into_iter().map(|mut node| {
            node.parent = node.parent.map(shift);
            node.children = node.children.into_iter().map(shift).collect();
            node
        }));
        self.roots.extend(other.roots.into_iter().map(shift));
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &StructureNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id.0].parent, move |p| self.nodes[p.0].parent)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Renders the forest as indented structure rules.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            self.outline_node(*root, 0, &mut out);
        }
        out
    }

    fn outline_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        out.push_str(&"  ".repeat(depth));
        out.push_str(&node.to_string());
        out.push('\n');
        for child in &node.children {
            self.outline_node(*child, depth + 1, out);
        }
    }
}
