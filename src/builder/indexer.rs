//! Compile a state description into an [`Index`].
//!
//! Validation uses Stillwater's `Validation` so that every defect in a
//! description is reported at once instead of one per build attempt.

use super::error::{BuildError, DescriptionError};
use super::node::NodeSpec;
use crate::config::EngineConfig;
use crate::core::{Index, Node, NodeId, END, START};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<DescriptionError>>;

fn require(ok: bool, error: impl FnOnce() -> DescriptionError) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

/// Build the index for a description.
///
/// Nodes are walked depth-first; each gets `full_name = parent.name`,
/// with top-level nodes unprefixed. `START` and `END` are always present
/// and `START`'s children are the top-level nodes.
///
/// # Example
///
/// ```rust
/// use treefsm::builder::{build_index, NodeSpec};
/// use treefsm::config::EngineConfig;
///
/// let description = vec![NodeSpec::new("A")
///     .noop()
///     .child(NodeSpec::new("B").noop())];
/// let index = build_index(&description, &EngineConfig::default()).unwrap();
///
/// assert!(index.contains("A.B"));
/// assert_eq!(index.len(), 4);
/// ```
pub fn build_index(description: &[NodeSpec], config: &EngineConfig) -> Result<Index, BuildError> {
    let mut index = Index::empty();
    let mut checks = Vec::new();

    let top_level: Vec<NodeId> = description
        .iter()
        .map(|spec| insert(&mut index, spec, None, &mut checks))
        .collect();
    index.node_mut(Index::START_ID).children = top_level;

    if config.strict_references {
        checks.extend(index.dangling_references().into_iter().map(|dangling| {
            Validation::fail(DescriptionError::DanglingReference {
                from: dangling.from,
                target: dangling.target,
            })
        }));
    }

    match Validation::all_vec(checks) {
        Validation::Success(_) => Ok(index),
        Validation::Failure(errors) => Err(BuildError::new(errors.iter().cloned().collect())),
    }
}

fn insert(
    index: &mut Index,
    spec: &NodeSpec,
    parent: Option<&str>,
    checks: &mut Vec<Check>,
) -> NodeId {
    let full_name = match parent {
        Some(parent) => format!("{parent}.{}", spec.name),
        None => spec.name.clone(),
    };

    checks.push(check_name(index, spec, parent, &full_name));
    checks.push(require(spec.action.is_some(), || {
        DescriptionError::MissingAction {
            path: full_name.clone(),
        }
    }));

    let id = index.insert(Node {
        name: spec.name.clone(),
        full_name: full_name.clone(),
        accepts: spec.accepts.clone(),
        action: spec.action.clone(),
        deferred: spec.deferred,
        children: Vec::new(),
        next: spec.next.clone(),
        on_error: spec.on_error.clone(),
    });

    let children = spec
        .children
        .iter()
        .map(|child| insert(index, child, Some(&full_name), checks))
        .collect();
    index.node_mut(id).children = children;

    id
}

fn check_name(index: &Index, spec: &NodeSpec, parent: Option<&str>, full_name: &str) -> Check {
    if spec.name.is_empty() {
        return Validation::fail(DescriptionError::EmptyName {
            parent: parent.unwrap_or(START).to_string(),
        });
    }
    if spec.name.contains('.') {
        return Validation::fail(DescriptionError::InvalidName {
            name: spec.name.clone(),
        });
    }
    if parent.is_none() && (spec.name == START || spec.name == END) {
        return Validation::fail(DescriptionError::ReservedName {
            name: spec.name.clone(),
        });
    }
    require(!index.contains(full_name), || {
        DescriptionError::DuplicatePath {
            path: full_name.to_string(),
        }
    })
}
