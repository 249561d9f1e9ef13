//! Compressed (CSR/CSC) adjacency built from an unordered edge list.
//!
//! Two-pass counting sort, O(V + E) with no comparisons:
//! 1. count the major endpoint of every edge,
//! 2. prefix-sum the counts into `offsets`,
//! 3. scatter each minor endpoint (and weight) into the next free slot of its
//!    major's bucket.
//!
//! The order inside a bucket follows input order and is **not** part of the
//! contract; compare buckets with [`crate::algs::equivalence`].

use serde::{Deserialize, Serialize};

use crate::graph::bounds::{EdgeLike, VertexLike, WeightLike, from_index, to_index};
use crate::graph::edge_list::EdgeList;
use crate::graph_error::GraphError;

/// Which endpoint selects the bucket.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Buckets hold out-neighbors (CSR).
    #[default]
    SourceMajor,
    /// Buckets hold in-neighbors (CSC, "store transposed").
    DestinationMajor,
}

impl Orientation {
    /// Split an edge into `(major, minor)`.
    #[inline]
    pub fn major_minor<V>(self, src: V, dst: V) -> (V, V) {
        match self {
            Orientation::SourceMajor => (src, dst),
            Orientation::DestinationMajor => (dst, src),
        }
    }

    /// Inverse of [`Orientation::major_minor`].
    #[inline]
    pub fn src_dst<V>(self, major: V, minor: V) -> (V, V) {
        self.major_minor(major, minor)
    }

    pub fn flipped(self) -> Self {
        match self {
            Orientation::SourceMajor => Orientation::DestinationMajor,
            Orientation::DestinationMajor => Orientation::SourceMajor,
        }
    }
}

/// Raw compressed adjacency arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct Compressed<V, E, W> {
    /// Bucket start positions, length `number_of_vertices + 1`.
    pub offsets: Vec<E>,
    /// Minor endpoints, bucketed by major.
    pub indices: Vec<V>,
    /// Weights parallel to `indices`.
    pub weights: Option<Vec<W>>,
}

fn vertex_index<V: VertexLike>(v: V, n: usize) -> Result<usize, GraphError> {
    match to_index(v) {
        Some(i) if i < n => Ok(i),
        Some(i) => Err(GraphError::InvalidInput(format!(
            "vertex id {i} out of range for {n} vertices"
        ))),
        None => Err(GraphError::InvalidInput(format!(
            "vertex id {v:?} is negative or too wide"
        ))),
    }
}

/// Every bucket's cursor must have advanced to the start of the next bucket.
#[cfg_attr(
    not(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants")),
    allow(dead_code)
)]
fn fill_complete(cursor: &[usize], ends: &[usize]) -> Result<(), GraphError> {
    match cursor.iter().zip(ends).position(|(c, e)| c != e) {
        None => Ok(()),
        Some(v) => Err(GraphError::StructuralInvariantViolation(format!(
            "bucket {v} filled to {} but ends at {}",
            cursor[v], ends[v]
        ))),
    }
}

/// Build the compressed adjacency of `edges` under `orientation`.
///
/// When `number_of_vertices` is `None` it is inferred as the largest id over
/// both endpoints plus one. Fails with `InvalidInput` on negative or
/// out-of-range ids, or if the edge count does not fit `E`.
pub fn build_compressed<V, E, W>(
    edges: &EdgeList<V, W>,
    orientation: Orientation,
    number_of_vertices: Option<V>,
) -> Result<Compressed<V, E, W>, GraphError>
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    let n_v = match number_of_vertices {
        Some(n) => n,
        None => edges.infer_vertex_count()?,
    };
    let n = to_index(n_v).ok_or_else(|| {
        GraphError::InvalidInput(format!("number of vertices {n_v:?} is negative"))
    })?;
    let m = edges.len();
    if from_index::<E>(m).is_none() {
        return Err(GraphError::InvalidInput(format!(
            "{m} edges overflow the edge offset type"
        )));
    }

    // 1) degree counts
    let mut counts = vec![0usize; n + 1];
    for (&s, &d) in edges.srcs().iter().zip(edges.dsts()) {
        let (major, minor) = orientation.major_minor(s, d);
        vertex_index(minor, n)?;
        counts[vertex_index(major, n)? + 1] += 1;
    }

    // 2) prefix sum
    for i in 0..n {
        counts[i + 1] += counts[i];
    }

    // 3) scatter fill
    let mut indices = vec![V::zero(); m];
    let mut weights = edges.weights().map(|_| vec![W::zero(); m]);
    let mut cursor = counts[..n].to_vec();
    for (k, (&s, &d)) in edges.srcs().iter().zip(edges.dsts()).enumerate() {
        let (major, minor) = orientation.major_minor(s, d);
        let slot = &mut cursor[vertex_index(major, n)?];
        indices[*slot] = minor;
        if let (Some(out), Some(src)) = (weights.as_mut(), edges.weights()) {
            out[*slot] = src[k];
        }
        *slot += 1;
    }
    crate::debug_invariants!(fill_complete(&cursor, &counts[1..]), "compressed adjacency fill");

    let offsets = counts
        .into_iter()
        .map(|c| {
            from_index::<E>(c).ok_or_else(|| {
                GraphError::InvalidInput(format!("offset {c} overflows the edge offset type"))
            })
        })
        .collect::<Result<Vec<E>, _>>()?;

    log::debug!(
        "built {:?} adjacency: {} vertices, {} edges, weighted={}",
        orientation,
        n,
        m,
        weights.is_some()
    );

    Ok(Compressed {
        offsets,
        indices,
        weights,
    })
}
