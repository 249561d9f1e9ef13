//! Contiguous vertex partitions, per-rank local graphs and their reassembly.
//!
//! Each rank owns a contiguous range of internal major ids and every edge
//! whose major endpoint falls inside it. The coordinator can rebuild the
//! single-partition graph from the gathered local edge lists and maps.

use std::ops::Range;

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::gather::{GatherPolicy, gatherv};
use crate::algs::renumber::{RenumberMap, renumber_edges_with};
use crate::graph::bounds::{EdgeLike, VertexLike, WeightLike, from_index, to_index};
use crate::graph::compressed::Orientation;
use crate::graph::container::{Graph, GraphMeta, GraphProperties, GraphView};
use crate::graph::edge_list::EdgeList;
use crate::graph_error::GraphError;

/// Base tag for [`assemble_reference_graph`]; uses `tag .. tag + 8`.
pub const ASSEMBLE_TAG: CommTag = CommTag::new(0x6C70);

/// Split of `[0, n)` into contiguous per-rank ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexPartition {
    offsets: Vec<usize>,
}

impl VertexPartition {
    /// `parts` ranges whose sizes differ by at most one.
    pub fn even(number_of_vertices: usize, parts: usize) -> Result<Self, GraphError> {
        if parts == 0 {
            return Err(GraphError::InvalidInput("zero partitions requested".into()));
        }
        let (base, extra) = (number_of_vertices / parts, number_of_vertices % parts);
        let mut offsets = Vec::with_capacity(parts + 1);
        offsets.push(0);
        for p in 0..parts {
            let size = base + usize::from(p < extra);
            offsets.push(offsets[p] + size);
        }
        Ok(Self { offsets })
    }

    /// Partition from explicit boundaries `[0, b1, .., n]`.
    pub fn from_offsets(offsets: Vec<usize>) -> Result<Self, GraphError> {
        if offsets.len() < 2 || offsets[0] != 0 || offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(GraphError::InvalidInput(format!(
                "partition offsets {offsets:?} must start at 0 and be non-decreasing"
            )));
        }
        Ok(Self { offsets })
    }

    pub fn parts(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn number_of_vertices(&self) -> usize {
        self.offsets.last().copied().unwrap_or_default()
    }

    pub fn range(&self, rank: usize) -> Result<Range<usize>, GraphError> {
        if rank >= self.parts() {
            return Err(GraphError::InvalidInput(format!(
                "rank {rank} out of range for {} partitions",
                self.parts()
            )));
        }
        Ok(self.offsets[rank]..self.offsets[rank + 1])
    }

    /// Rank owning internal vertex `v`.
    pub fn owner_of(&self, v: usize) -> Result<usize, GraphError> {
        if v >= self.number_of_vertices() {
            return Err(GraphError::IndexOutOfRange {
                id: v.to_string(),
                first: "0".into(),
                end: self.number_of_vertices().to_string(),
            });
        }
        // First boundary strictly above v, minus one; empty ranges are skipped.
        Ok(self.offsets.partition_point(|&o| o <= v) - 1)
    }
}

/// Distribute internal edges to the ranks owning their major endpoint.
pub fn split_edges_by_major<V, W>(
    edges: &EdgeList<V, W>,
    partition: &VertexPartition,
    orientation: Orientation,
) -> Result<Vec<EdgeList<V, W>>, GraphError>
where
    V: VertexLike,
    W: WeightLike,
{
    let empty = || EdgeList::new(Vec::new(), Vec::new(), edges.weights().map(|_| Vec::new()));
    let mut out = (0..partition.parts()).map(|_| empty()).collect::<Result<Vec<_>, _>>()?;
    for (s, d, w) in edges.iter() {
        let (major, _) = orientation.major_minor(s, d);
        let m = to_index(major)
            .ok_or_else(|| GraphError::InvalidInput(format!("vertex {major:?} is negative")))?;
        out[partition.owner_of(m)?].push(s, d, w)?;
    }
    Ok(out)
}

/// One rank's share of a renumbered graph.
#[derive(Clone, Debug)]
pub struct LocalPartition<V, W> {
    pub rank: usize,
    pub number_of_vertices: usize,
    pub major_range: Range<usize>,
    /// Edges in internal ids; majors inside `major_range`.
    pub edges: EdgeList<V, W>,
    /// External ids of `major_range`.
    pub map: RenumberMap<V>,
}

impl<V, W> LocalPartition<V, W>
where
    V: VertexLike,
    W: WeightLike,
{
    pub fn build_graph<E: EdgeLike>(
        &self,
        properties: GraphProperties,
        orientation: Orientation,
    ) -> Result<Graph<V, E, W>, GraphError> {
        Graph::local_from_edge_list(
            &self.edges,
            self.number_of_vertices,
            self.major_range.clone(),
            properties,
            orientation,
        )
    }
}

/// Renumber external `edges` by `order` (see [`renumber_edges_with`]) and
/// split the result evenly over `parts` ranks.
///
/// This is the layout the distributed engine is assumed to produce; tests use
/// it to stand in for that engine.
pub fn distribute_edges<V, W>(
    edges: &EdgeList<V, W>,
    order: Vec<V>,
    parts: usize,
    orientation: Orientation,
) -> Result<Vec<LocalPartition<V, W>>, GraphError>
where
    V: VertexLike,
    W: WeightLike,
{
    let n = order.len();
    let (internal, map) = renumber_edges_with(edges, order)?;
    let partition = VertexPartition::even(n, parts)?;
    let split = split_edges_by_major(&internal, &partition, orientation)?;
    split
        .into_iter()
        .enumerate()
        .map(|(rank, edges)| {
            let major_range = partition.range(rank)?;
            let slice = map.as_slice()[major_range.clone()].to_vec();
            Ok(LocalPartition {
                rank,
                number_of_vertices: n,
                map: RenumberMap::with_first(slice, major_range.start)?,
                major_range,
                edges,
            })
        })
        .collect()
}

/// Build every rank's local graph in parallel.
#[cfg(feature = "rayon")]
pub fn build_partitions_parallel<V, E, W>(
    locals: &[LocalPartition<V, W>],
    properties: GraphProperties,
    orientation: Orientation,
) -> Result<Vec<Graph<V, E, W>>, GraphError>
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    use rayon::prelude::*;
    locals
        .par_iter()
        .map(|p| p.build_graph(properties, orientation))
        .collect()
}

/// Gather every rank's local graph and map at `root` and rebuild the
/// single-partition graph there.
///
/// Returns `Some((graph, global map))` at `root`, `None` elsewhere. The graph
/// keeps the distributed internal numbering. Collective.
pub fn assemble_reference_graph<C, V, E, W>(
    comm: &C,
    local: GraphView<'_, V, E, W>,
    map: &RenumberMap<V>,
    root: usize,
    policy: GatherPolicy,
) -> Result<Option<(Graph<V, E, W>, RenumberMap<V>)>, GraphError>
where
    C: Communicator,
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    if map.first() != local.major_range().start || map.len() != local.local_vertex_count() {
        return Err(GraphError::InvalidInput(format!(
            "map covering {}..{} does not match local range {:?}",
            map.first(),
            map.first() + map.len(),
            local.major_range()
        )));
    }
    let edges = local.to_edge_list()?;
    let srcs = gatherv(comm, edges.srcs(), root, ASSEMBLE_TAG, policy)?;
    let dsts = gatherv(comm, edges.dsts(), root, ASSEMBLE_TAG.offset(2), policy)?;
    let weights = gatherv(
        comm,
        edges.weights().unwrap_or(&[]),
        root,
        ASSEMBLE_TAG.offset(4),
        policy,
    )?;
    let external = gatherv(comm, map.as_slice(), root, ASSEMBLE_TAG.offset(6), policy)?;
    if comm.rank() != root {
        return Ok(None);
    }

    let weights = edges.weights().map(|_| weights);
    let merged = EdgeList::new(srcs, dsts, weights)?;
    let global = RenumberMap::new(external)?;
    let n_v: V = from_index(local.number_of_vertices()).ok_or_else(|| {
        GraphError::InvalidInput(format!(
            "{} vertices overflow the id type",
            local.number_of_vertices()
        ))
    })?;
    let meta = GraphMeta {
        number_of_vertices: Some(n_v),
        properties: local.properties(),
    };
    let graph = Graph::from_edge_list(&merged, meta, local.orientation(), false)?;
    log::debug!(
        "assembled {} edges over {} vertices from {} ranks",
        merged.len(),
        global.len(),
        comm.size()
    );
    Ok(Some((graph, global)))
}
