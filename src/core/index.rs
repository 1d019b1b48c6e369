//! Flat, immutable index of fully-qualified state paths.
//!
//! The index is an arena: nodes live in a `Vec` and refer to their
//! children by [`NodeId`]. It is built once by
//! [`build_index`](crate::builder::build_index) and never mutated
//! afterwards, so any number of readers may share it.

use super::matcher::Matcher;
use crate::effects::Action;
use std::collections::HashMap;
use std::fmt;

/// Synthetic entry state of every machine.
pub const START: &str = "START";

/// Synthetic absorbing state of every machine.
pub const END: &str = "END";

/// Position of a node inside its [`Index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// One state of a compiled machine.
#[derive(Clone)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) accepts: Option<Matcher>,
    pub(crate) action: Option<Action>,
    pub(crate) deferred: bool,
    pub(crate) children: Vec<NodeId>,
    pub(crate) next: Option<String>,
    pub(crate) on_error: Option<String>,
}

impl Node {
    pub(crate) fn synthetic(name: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: name.to_string(),
            accepts: None,
            action: None,
            deferred: false,
            children: Vec::new(),
            next: None,
            on_error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dot-joined path from the synthetic root.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn accepts(&self) -> Option<&Matcher> {
        self.accepts.as_ref()
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Declared with `deferred` or `effect`; entering it needs a runtime.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Children in declared (precedence) order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn on_error(&self) -> Option<&str> {
        self.on_error.as_deref()
    }

    /// A node with neither `next` nor children ends the machine on its
    /// next input.
    pub fn is_terminal(&self) -> bool {
        self.next.is_none() && self.children.is_empty()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("full_name", &self.full_name)
            .field("accepts", &self.accepts)
            .field("deferred", &self.deferred)
            .field("children", &self.children)
            .field("next", &self.next)
            .field("on_error", &self.on_error)
            .finish_non_exhaustive()
    }
}

/// A reference from one node to a path that is not in the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingReference {
    pub from: String,
    pub target: String,
}

/// Mapping from full name to node, including `START` and `END`.
#[derive(Clone, Debug)]
pub struct Index {
    nodes: Vec<Node>,
    by_path: HashMap<String, NodeId>,
}

impl Index {
    pub(crate) const START_ID: NodeId = NodeId(0);
    pub(crate) const END_ID: NodeId = NodeId(1);

    /// An index holding only the two synthetic states.
    pub(crate) fn empty() -> Self {
        let mut index = Self {
            nodes: Vec::new(),
            by_path: HashMap::new(),
        };
        index.insert(Node::synthetic(START));
        index.insert(Node::synthetic(END));
        index
    }

    /// Append a node. The caller is responsible for path uniqueness; a
    /// later node with the same path shadows the earlier one.
    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.by_path.insert(node.full_name.clone(), id);
        self.nodes.push(node);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn start(&self) -> &Node {
        self.node(Self::START_ID)
    }

    pub fn end(&self) -> &Node {
        self.node(Self::END_ID)
    }

    /// Look up a node by id.
    ///
    /// Ids are only produced by this index, so they always resolve.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn get(&self, path: &str) -> Option<&Node> {
        self.lookup(path).map(|id| self.node(id))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Number of entries, the two synthetic states included.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// All full names in depth-first declaration order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.full_name.as_str())
    }

    /// Every `next` or `on_error` target that does not resolve.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        self.nodes
            .iter()
            .flat_map(|node| {
                [node.next.as_deref(), node.on_error.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(move |target| !self.contains(target))
                    .map(move |target| DanglingReference {
                        from: node.full_name.clone(),
                        target: target.to_string(),
                    })
            })
            .collect()
    }
}
