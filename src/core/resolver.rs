//! Successor resolution: which node does an input lead to?

use super::index::{Index, Node, NodeId};
use super::input::Input;

/// Outcome of resolving an input against a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Successor {
    /// Move to this node and run its action.
    Node(NodeId),

    /// `next` names a path that is not in the index.
    Dangling(String),

    /// The node declares no successors; the machine ends.
    Terminal,

    /// Children exist but none accepts the input.
    NoMatch,
}

/// Resolve the successor of `node` for `input`.
///
/// An explicit `next` wins over children. Otherwise children are tried in
/// declared order and the first one whose matcher accepts the input (or
/// that has no matcher) is chosen; later siblings are never evaluated.
pub fn resolve(index: &Index, node: &Node, input: &Input) -> Successor {
    if let Some(next) = node.next() {
        return match index.lookup(next) {
            Some(id) => Successor::Node(id),
            None => Successor::Dangling(next.to_string()),
        };
    }

    if node.children().is_empty() {
        return Successor::Terminal;
    }

    node.children()
        .iter()
        .copied()
        .find(|&child| {
            index
                .node(child)
                .accepts()
                .is_none_or(|matcher| matcher.accepts(input))
        })
        .map_or(Successor::NoMatch, Successor::Node)
}
