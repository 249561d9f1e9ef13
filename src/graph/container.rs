//! Immutable graph container over a compressed adjacency.
//!
//! A [`Graph`] owns offsets/indices/weights plus metadata and hands out a
//! read-only [`GraphView`]. Construction validates the structural contract;
//! nothing mutates a graph afterwards.
//!
//! A graph may cover only a contiguous range of major vertices (one
//! partition's share, see [`crate::algs::partition`]); minor endpoints always
//! use the global id space `[0, number_of_vertices)`.
//!
//! Trust boundary: declared `is_symmetric` / `is_multigraph` flags are taken
//! at face value unless the caller asks for `expensive_check`.

use std::ops::Range;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::graph::bounds::{EdgeLike, VertexLike, WeightLike, from_index, to_index};
use crate::graph::compressed::{Compressed, Orientation, build_compressed};
use crate::graph::edge_list::EdgeList;
use crate::graph_error::GraphError;

/// Declared graph properties.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct GraphProperties {
    /// Every edge has a reverse edge.
    pub is_symmetric: bool,
    /// Parallel edges are allowed.
    pub is_multigraph: bool,
}

/// Construction-time metadata.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GraphMeta<V> {
    /// Global vertex count; inferred from the edge list when `None`.
    pub number_of_vertices: Option<V>,
    pub properties: GraphProperties,
}

impl<V> Default for GraphMeta<V> {
    fn default() -> Self {
        Self {
            number_of_vertices: None,
            properties: GraphProperties::default(),
        }
    }
}

/// Compressed graph plus metadata. Immutable once built.
#[derive(Clone, Debug)]
pub struct Graph<V, E, W> {
    csr: Compressed<V, E, W>,
    number_of_vertices: usize,
    major_range: Range<usize>,
    properties: GraphProperties,
    orientation: Orientation,
}

/// Offsets are checked to be non-negative at construction.
#[inline]
fn off<E: EdgeLike>(e: E) -> usize {
    to_index(e).unwrap_or_default()
}

impl<V, E, W> Graph<V, E, W>
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    /// Build a whole-graph container from an edge list.
    pub fn from_edge_list(
        edges: &EdgeList<V, W>,
        meta: GraphMeta<V>,
        orientation: Orientation,
        expensive_check: bool,
    ) -> Result<Self, GraphError> {
        let n_v = match meta.number_of_vertices {
            Some(n) => n,
            None => edges.infer_vertex_count()?,
        };
        let csr = build_compressed(edges, orientation, Some(n_v))?;
        let n = to_index(n_v).ok_or_else(|| {
            GraphError::InvalidInput(format!("number of vertices {n_v:?} is negative"))
        })?;
        let graph = Self::from_parts(csr, n, 0..n, meta.properties, orientation)?;
        if expensive_check {
            graph.check_declared_properties()?;
        }
        Ok(graph)
    }

    /// Build a container for the majors in `major_range` only.
    ///
    /// Every edge's major endpoint must fall inside `major_range`; minors may be
    /// any id below `number_of_vertices`.
    pub fn local_from_edge_list(
        edges: &EdgeList<V, W>,
        number_of_vertices: usize,
        major_range: Range<usize>,
        properties: GraphProperties,
        orientation: Orientation,
    ) -> Result<Self, GraphError> {
        if major_range.start > major_range.end || major_range.end > number_of_vertices {
            return Err(GraphError::InvalidInput(format!(
                "major range {major_range:?} not within [0, {number_of_vertices})"
            )));
        }
        let first = major_range.start;
        // Majors shifted into the local range, minors kept global.
        let mut as_major =
            EdgeList::new(Vec::new(), Vec::new(), edges.weights().map(|_| Vec::new()))?;
        for (s, d, w) in edges.iter() {
            let (major, minor) = orientation.major_minor(s, d);
            let m = to_index(major)
                .filter(|m| major_range.contains(m))
                .ok_or_else(|| {
                    GraphError::InvalidInput(format!(
                        "major vertex {major:?} outside local range {major_range:?}"
                    ))
                })?;
            let local_major: V = from_index(m - first).ok_or_else(|| {
                GraphError::InvalidInput(format!("local vertex {} overflows", m - first))
            })?;
            match to_index(minor) {
                Some(i) if i < number_of_vertices => {}
                _ => {
                    return Err(GraphError::InvalidInput(format!(
                        "minor vertex {minor:?} out of range for {number_of_vertices} vertices"
                    )));
                }
            }
            as_major.push(local_major, minor, w)?;
        }
        let csr = build_local(&as_major, major_range.len())?;
        Self::from_parts(csr, number_of_vertices, major_range, properties, orientation)
    }

    /// Wrap pre-built arrays, validating the structural contract.
    pub fn from_parts(
        csr: Compressed<V, E, W>,
        number_of_vertices: usize,
        major_range: Range<usize>,
        properties: GraphProperties,
        orientation: Orientation,
    ) -> Result<Self, GraphError> {
        let graph = Self {
            csr,
            number_of_vertices,
            major_range,
            properties,
            orientation,
        };
        graph.validate_invariants()?;
        Ok(graph)
    }

    pub fn view(&self) -> GraphView<'_, V, E, W> {
        GraphView {
            offsets: &self.csr.offsets,
            indices: &self.csr.indices,
            weights: self.csr.weights.as_deref(),
            number_of_vertices: self.number_of_vertices,
            major_first: self.major_range.start,
            properties: self.properties,
            orientation: self.orientation,
        }
    }

    /// Consume the container and return its arrays.
    pub fn into_parts(self) -> Compressed<V, E, W> {
        self.csr
    }

    /// Verify the declared symmetry / multigraph flags against the edges.
    fn check_declared_properties(&self) -> Result<(), GraphError> {
        let view = self.view();
        if self.properties.is_symmetric {
            if !view.covers_all_majors() {
                log::debug!("skipping symmetry check on a partial graph");
            } else if !verify_symmetry(view) {
                return Err(GraphError::InvalidInput(
                    "graph declared symmetric but a reverse edge is missing".into(),
                ));
            }
        }
        if !self.properties.is_multigraph {
            if let Some((s, d)) = first_duplicate_edge(view) {
                return Err(GraphError::InvalidInput(format!(
                    "duplicate edge ({s:?}, {d:?}) in a graph not declared multigraph"
                )));
            }
        }
        Ok(())
    }
}

/// Build `(local major, global minor)` pairs source-major.
///
/// The builder range-checks both endpoints against one count, so build over
/// the wider of the two id spaces and drop the trailing (empty) buckets.
fn build_local<V, E, W>(
    as_major: &EdgeList<V, W>,
    local_count: usize,
) -> Result<Compressed<V, E, W>, GraphError>
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    let local_v: V = from_index(local_count).ok_or_else(|| {
        GraphError::InvalidInput(format!("{local_count} local vertices overflow the id type"))
    })?;
    let wide = as_major.infer_vertex_count()?.max(local_v);
    let mut csr = build_compressed::<V, E, W>(as_major, Orientation::SourceMajor, Some(wide))?;
    csr.offsets.truncate(local_count + 1);
    Ok(csr)
}

impl<V, E, W> DebugInvariants for Graph<V, E, W>
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    fn validate_invariants(&self) -> Result<(), GraphError> {
        let broken = |msg: String| Err(GraphError::StructuralInvariantViolation(msg));
        let local = self.major_range.len();
        let offsets = &self.csr.offsets;
        if offsets.len() != local + 1 {
            return broken(format!(
                "offsets has length {}, expected {}",
                offsets.len(),
                local + 1
            ));
        }
        let mut prev = 0usize;
        for (i, &o) in offsets.iter().enumerate() {
            let Some(o) = to_index(o) else {
                return broken(format!("offset {i} is negative"));
            };
            if i == 0 && o != 0 {
                return broken(format!("offsets[0] = {o}, expected 0"));
            }
            if o < prev {
                return broken(format!("offsets decrease at {i}: {prev} -> {o}"));
            }
            prev = o;
        }
        if prev != self.csr.indices.len() {
            return broken(format!(
                "offsets end at {prev} but there are {} indices",
                self.csr.indices.len()
            ));
        }
        if let Some(w) = &self.csr.weights {
            if w.len() != self.csr.indices.len() {
                return broken(format!(
                    "{} weights for {} indices",
                    w.len(),
                    self.csr.indices.len()
                ));
            }
        }
        if self.major_range.end > self.number_of_vertices {
            return broken(format!(
                "major range {:?} exceeds {} vertices",
                self.major_range, self.number_of_vertices
            ));
        }
        for &v in &self.csr.indices {
            match to_index(v) {
                Some(i) if i < self.number_of_vertices => {}
                _ => return broken(format!("index {v:?} out of range")),
            }
        }
        Ok(())
    }
}

/// Read-only accessor over a [`Graph`].
#[derive(Copy, Clone, Debug)]
pub struct GraphView<'a, V, E, W> {
    offsets: &'a [E],
    indices: &'a [V],
    weights: Option<&'a [W]>,
    number_of_vertices: usize,
    major_first: usize,
    properties: GraphProperties,
    orientation: Orientation,
}

impl<'a, V, E, W> GraphView<'a, V, E, W>
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    /// Global vertex count.
    #[inline]
    pub fn number_of_vertices(&self) -> usize {
        self.number_of_vertices
    }

    /// Edges stored in this container.
    #[inline]
    pub fn number_of_edges(&self) -> usize {
        self.indices.len()
    }

    /// Majors covered by this container, in global ids.
    #[inline]
    pub fn major_range(&self) -> Range<usize> {
        self.major_first..self.major_first + self.local_vertex_count()
    }

    #[inline]
    pub fn local_vertex_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    #[inline]
    pub fn covers_all_majors(&self) -> bool {
        self.major_first == 0 && self.local_vertex_count() == self.number_of_vertices
    }

    pub fn properties(&self) -> GraphProperties {
        self.properties
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn offsets(&self) -> &'a [E] {
        self.offsets
    }

    pub fn indices(&self) -> &'a [V] {
        self.indices
    }

    pub fn weights(&self) -> Option<&'a [W]> {
        self.weights
    }

    #[inline]
    fn bounds(&self, local: usize) -> Range<usize> {
        off(self.offsets[local])..off(self.offsets[local + 1])
    }

    /// Neighbor slice of the `local`-th major (0-based within this container).
    #[inline]
    pub fn neighbors(&self, local: usize) -> &'a [V] {
        &self.indices[self.bounds(local)]
    }

    /// Weight slice parallel to [`GraphView::neighbors`].
    #[inline]
    pub fn neighbor_weights(&self, local: usize) -> Option<&'a [W]> {
        let r = self.bounds(local);
        self.weights.map(|w| &w[r])
    }

    #[inline]
    pub fn degree(&self, local: usize) -> usize {
        self.bounds(local).len()
    }

    /// Walk every stored edge as global `(src, dst, weight?)`.
    pub fn edges(self) -> impl Iterator<Item = (V, V, Option<W>)> + 'a {
        let view = self;
        (0..view.local_vertex_count()).flat_map(move |local| {
            let major: V = from_index(view.major_first + local).unwrap_or_else(V::zero);
            view.bounds(local).map(move |k| {
                let (s, d) = view.orientation.src_dst(major, view.indices[k]);
                (s, d, view.weights.map(|w| w[k]))
            })
        })
    }

    /// Reconstruct an edge list (global ids) by walking the buckets.
    pub fn to_edge_list(&self) -> Result<EdgeList<V, W>, GraphError> {
        let mut out = EdgeList::new(
            Vec::with_capacity(self.number_of_edges()),
            Vec::with_capacity(self.number_of_edges()),
            self.weights.map(|w| Vec::with_capacity(w.len())),
        )?;
        for (s, d, w) in self.edges() {
            out.push(s, d, w)?;
        }
        Ok(out)
    }
}

/// True when every `(u, v)` has a matching `(v, u)` with equal multiplicity.
///
/// Only meaningful on a graph covering all majors.
pub fn verify_symmetry<V, E, W>(view: GraphView<'_, V, E, W>) -> bool
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    let mut count: HashMap<(V, V), isize> = HashMap::with_capacity(view.number_of_edges());
    for (s, d, _) in view.edges() {
        if s == d {
            continue;
        }
        *count.entry((s, d)).or_default() += 1;
        *count.entry((d, s)).or_default() -= 1;
    }
    count.values().all(|&c| c == 0)
}

fn first_duplicate_edge<V, E, W>(view: GraphView<'_, V, E, W>) -> Option<(V, V)>
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    let mut seen: HashMap<(V, V), ()> = HashMap::with_capacity(view.number_of_edges());
    view.edges()
        .find(|&(s, d, _)| seen.insert((s, d), ()).is_some())
        .map(|(s, d, _)| (s, d))
}
