//! Drivers: graph-construction checks and vertex-metric reconciliation.
//!
//! Both follow the same shape. Every rank does its distributed share, results
//! are translated back to external ids and gathered at the coordinator, and
//! the coordinator builds its own single-partition reference from the
//! external edge list. The reference numbering is ascending external id,
//! which in general differs from the distributed one.

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::equivalence::{compare_graphs, compare_vectors};
use crate::algs::gather::{gather_pairs, gatherv};
use crate::algs::partition::{LocalPartition, VertexPartition, assemble_reference_graph};
use crate::algs::renumber::{InverseMap, RenumberMap, renumber_edges_with, to_external, to_internal};
use crate::graph::bounds::{EdgeLike, VertexLike, WeightLike, from_index};
use crate::graph::compressed::Orientation;
use crate::graph::container::{Graph, GraphMeta, GraphProperties, GraphView};
use crate::graph::edge_list::EdgeList;
use crate::graph_error::GraphError;

use super::config::{GraphUsecase, MetricUsecase};
use super::{ExecutionContext, Verdict, VertexMetric, VertexSampler};

const SEED_TAG: CommTag = CommTag::new(0x6D70);
const RESULT_TAG: CommTag = CommTag::new(0x6E70);

/// Sorted union of the edge endpoints and `known` ids.
///
/// Isolated vertices only show up in `known`, so both sides see them.
fn reference_order<V: VertexLike, W: WeightLike>(edges: &EdgeList<V, W>, known: &[V]) -> Vec<V> {
    let mut ids: Vec<V> = edges
        .srcs()
        .iter()
        .chain(edges.dsts())
        .chain(known)
        .copied()
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Build the coordinator's reference graph over `order`.
fn reference_graph<V, E, W>(
    edges: &EdgeList<V, W>,
    order: Vec<V>,
    properties: GraphProperties,
    orientation: Orientation,
    expensive_check: bool,
) -> Result<(Graph<V, E, W>, RenumberMap<V>), GraphError>
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    let n = order.len();
    let (internal, map) = renumber_edges_with(edges, order)?;
    let meta = GraphMeta {
        number_of_vertices: Some(from_index(n).ok_or_else(|| {
            GraphError::InvalidInput(format!("{n} vertices overflow the id type"))
        })?),
        properties,
    };
    let graph = Graph::from_edge_list(&internal, meta, orientation, expensive_check)?;
    Ok((graph, map))
}

/// Build this rank's local graph, assemble all of them at the coordinator and
/// compare the result with a graph built directly from `reference_edges`.
///
/// `reference_edges` carries external ids and is only read on the
/// coordinator. Collective.
pub fn verify_graph_construction<C, V, E, W>(
    ctx: &mut ExecutionContext<C>,
    local: &LocalPartition<V, W>,
    reference_edges: &EdgeList<V, W>,
    usecase: &GraphUsecase,
) -> Result<Verdict, GraphError>
where
    C: Communicator,
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    let orientation = ctx.config().orientation;
    ctx.start_phase("distributed graph construction");
    let graph = local.build_graph::<E>(usecase.properties(), orientation)?;
    ctx.stop_phase();
    if !usecase.check_correctness {
        return Ok(Verdict::Unchecked);
    }

    let assembled = assemble_reference_graph(
        ctx.comm(),
        graph.view(),
        &local.map,
        ctx.coordinator(),
        ctx.gather_policy(),
    )?;
    let Some((assembled, global)) = assembled else {
        return Ok(Verdict::NotCoordinator);
    };

    let assembled_ext = assembled
        .view()
        .to_edge_list()?
        .map_vertices(|v| global.external_of(v))?;
    let order = reference_order(reference_edges, global.as_slice());
    let cfg = ctx.config().clone();
    let (left, _) = reference_graph::<V, E, W>(
        &assembled_ext,
        order.clone(),
        usecase.properties(),
        orientation,
        false,
    )?;
    let (right, _) = reference_graph::<V, E, W>(
        reference_edges,
        order,
        usecase.properties(),
        orientation,
        cfg.expensive_check,
    )?;
    compare_graphs(left.view(), right.view(), cfg.tolerance, cfg.mode)?;

    let compared = right.view().number_of_edges();
    log::info!("graph construction verified: {compared} edges");
    Ok(Verdict::Verified { compared })
}

/// Run `metric` on the local partition, gather the external-keyed values at
/// the coordinator and reconcile them against the metric on a reference graph
/// built from `reference_edges`.
///
/// With `num_seeds` set, each rank samples its share of seeds from its own
/// major range; the coordinator translates the gathered seeds into the
/// reference numbering, failing with `UnknownVertex` on any it cannot place.
/// The reference takes its orientation from `graph`, not from the config.
/// Collective.
#[allow(clippy::too_many_arguments)]
pub fn reconcile_vertex_metric<C, V, E, W, M, S>(
    ctx: &mut ExecutionContext<C>,
    graph: GraphView<'_, V, E, W>,
    map: &RenumberMap<V>,
    reference_edges: &EdgeList<V, W>,
    metric: &M,
    sampler: &mut S,
    graph_usecase: &GraphUsecase,
    usecase: &MetricUsecase,
) -> Result<Verdict, GraphError>
where
    C: Communicator,
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
    M: VertexMetric<V, E, W>,
    S: VertexSampler<V>,
{
    let seeds = match usecase.num_seeds {
        Some(total) => {
            let share = VertexPartition::even(total, ctx.size())?.range(ctx.rank())?.len();
            let count = share.min(graph.local_vertex_count());
            Some(sampler.sample(graph.major_range(), count)?)
        }
        None => None,
    };

    ctx.start_phase("distributed metric");
    let values = metric.compute(graph, seeds.as_deref(), &usecase.params)?;
    ctx.stop_phase();
    if values.len() != graph.local_vertex_count() {
        return Err(GraphError::InvalidInput(format!(
            "metric returned {} values for {} local vertices",
            values.len(),
            graph.local_vertex_count()
        )));
    }
    if !usecase.check_correctness {
        return Ok(Verdict::Unchecked);
    }

    let seeds_ext = match &seeds {
        Some(s) => to_external(s, map)?,
        None => Vec::new(),
    };
    let root = ctx.coordinator();
    let policy = ctx.gather_policy();
    let all_seeds = gatherv(ctx.comm(), &seeds_ext, root, SEED_TAG, policy)?;
    let distributed = gather_pairs(ctx.comm(), map.as_slice(), &values, root, RESULT_TAG, policy)?;
    if !ctx.is_coordinator() {
        return Ok(Verdict::NotCoordinator);
    }

    let keys: Vec<V> = distributed.iter().map(|&(k, _)| k).collect();
    let order = reference_order(reference_edges, &keys);
    let cfg = ctx.config().clone();
    let (reference, ref_map) = reference_graph::<V, E, W>(
        reference_edges,
        order,
        graph_usecase.properties(),
        graph.orientation(),
        cfg.expensive_check,
    )?;
    let ref_seeds = match usecase.num_seeds {
        Some(_) => Some(to_internal(&all_seeds, &InverseMap::from_map(&ref_map)?)?),
        None => None,
    };
    let ref_values = metric.compute(reference.view(), ref_seeds.as_deref(), &usecase.params)?;
    let expected: Vec<(V, W)> = ref_map.as_slice().iter().copied().zip(ref_values).collect();

    compare_vectors(&distributed, &expected, cfg.tolerance, cfg.mode)?;
    log::info!("vertex metric reconciled on {} vertices", distributed.len());
    Ok(Verdict::Verified {
        compared: distributed.len(),
    })
}
