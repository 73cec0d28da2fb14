//! Error taxonomy for the graph runtime.
//!
//! Lifecycle-contract violations and invalid graph data are fatal and
//! propagate unwrapped to the driver. Missing optional bindings are not
//! errors; the affected node degrades to a no-op.

use thiserror::Error;

use crate::spec::NodeIndex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0:?}: shutdown called on a node that is not initialized")]
    NotInitialized(NodeIndex),

    #[error("node {0:?}: still reports initialized during teardown")]
    StillInitialized(NodeIndex),

    #[error("no node or asset registered at index {0:?}")]
    MissingNode(NodeIndex),

    #[error("node {0:?} is already being evaluated (circular reference)")]
    CircularReference(NodeIndex),

    #[error("node {index:?} is not a {expected} node")]
    KindMismatch {
        index: NodeIndex,
        expected: &'static str,
    },

    #[error("state {state} declares a transition with no target state")]
    MissingTransitionTarget { state: usize },

    #[error("transition {0:?} evaluated before being started")]
    TransitionNotStarted(NodeIndex),

    #[error("no control parameter named {0:?} in this graph")]
    UnknownParameter(String),

    #[error("state index {0} is out of range for this state machine")]
    InvalidStateIndex(usize),

    #[error("graph definition is invalid: {0}")]
    InvalidDefinition(String),

    #[error("graph definition parse error: {0}")]
    Parse(String),
}
