//! Builder API for describing state trees and compiling them.
//!
//! Descriptions are written with the fluent [`NodeSpec`] API and compiled
//! by [`build_index`] into the immutable [`Index`](crate::core::Index)
//! that the engine runs against.

pub mod error;
pub mod indexer;
pub mod node;

pub use error::{BuildError, DescriptionError};
pub use indexer::build_index;
pub use node::NodeSpec;
