//! GraphError: unified error type for graph-reconcile public APIs
//!
//! Builder, container, renumbering, gather and validation routines all report
//! through this one enum so callers can tell recoverable lookups apart from
//! fatal structural bugs and verification failures.

use std::fmt;
use std::ops::Range;
use std::time::Duration;
use thiserror::Error;

/// A single value that differs between the distributed and reference vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMismatch {
    /// Canonical (external) key, rendered with `Debug`.
    pub key: String,
    pub left: f64,
    pub right: f64,
    /// `|left - right|`; NaN when exactly one side is NaN.
    pub difference: f64,
}

impl fmt::Display for ValueMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key {}: {} vs {} (diff {})",
            self.key, self.left, self.right, self.difference
        )
    }
}

/// One structural or numeric disagreement between two adjacency structures.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMismatch {
    VertexCount { left: usize, right: usize },
    /// Same vertex count but different locally held major ranges.
    MajorRange { left: Range<usize>, right: Range<usize> },
    EdgeCount { left: usize, right: usize },
    WeightPresence { left: bool, right: bool },
    Degree { vertex: usize, left: usize, right: usize },
    /// Sorted neighbor lists differ at position `slot`.
    Neighbor { vertex: usize, slot: usize, left: String, right: String },
    Weight {
        vertex: usize,
        neighbor: String,
        left: f64,
        right: f64,
        difference: f64,
    },
}

impl fmt::Display for GraphMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphMismatch::VertexCount { left, right } => {
                write!(f, "vertex count {left} vs {right}")
            }
            GraphMismatch::MajorRange { left, right } => {
                write!(f, "major range {left:?} vs {right:?}")
            }
            GraphMismatch::EdgeCount { left, right } => write!(f, "edge count {left} vs {right}"),
            GraphMismatch::WeightPresence { left, right } => {
                write!(f, "weights present {left} vs {right}")
            }
            GraphMismatch::Degree {
                vertex,
                left,
                right,
            } => write!(f, "vertex {vertex}: degree {left} vs {right}"),
            GraphMismatch::Neighbor {
                vertex,
                slot,
                left,
                right,
            } => write!(f, "vertex {vertex}: neighbor #{slot} {left} vs {right}"),
            GraphMismatch::Weight {
                vertex,
                neighbor,
                left,
                right,
                difference,
            } => write!(
                f,
                "vertex {vertex} -> {neighbor}: weight {left} vs {right} (diff {difference})"
            ),
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unified error type for graph-reconcile operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// Malformed edge list, map or parameter (negative id, length mismatch, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Offsets/indices contract broken. Indicates a builder bug, never recovered.
    #[error("Structural invariant violated: {0}")]
    StructuralInvariantViolation(String),
    /// Internal id outside the range covered by a renumbering map.
    #[error("Internal vertex {id} outside renumbering range [{first}, {end})")]
    IndexOutOfRange { id: String, first: String, end: String },
    /// External id with no internal counterpart in this scope.
    #[error("External vertex {0} has no internal id in this scope")]
    UnknownVertex(String),
    /// Distributed and reference key sets disagree.
    #[error(
        "Key sets differ: missing in left {missing_in_left:?}, missing in right {missing_in_right:?}, duplicated {duplicated:?}"
    )]
    KeySetMismatch {
        missing_in_left: Vec<String>,
        missing_in_right: Vec<String>,
        duplicated: Vec<String>,
    },
    /// Values outside the configured tolerance.
    #[error("{} value(s) outside tolerance: {}", .0.len(), join(.0))]
    ToleranceExceeded(Vec<ValueMismatch>),
    /// Adjacency structures disagree.
    #[error("{} graph mismatch(es): {}", .0.len(), join(.0))]
    GraphMismatch(Vec<GraphMismatch>),
    /// Communication with a peer failed or delivered a malformed payload.
    #[error("Communication error with rank {peer}: {reason}")]
    CommError { peer: usize, reason: String },
    /// A bounded collective did not hear from `peer` in time.
    #[error("Collective timed out after {waited:?} waiting for rank {peer}")]
    CollectiveTimeout { peer: usize, waited: Duration },
    /// Harness configuration could not be parsed or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraphError {
    /// True for lookup failures a caller may skip (e.g. a vertex owned elsewhere).
    pub fn is_recoverable_lookup(&self) -> bool {
        matches!(
            self,
            GraphError::IndexOutOfRange { .. } | GraphError::UnknownVertex(_)
        )
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Config(e.to_string())
    }
}
