mod util;
use util::*;

use std::time::{Duration, Instant};

use graph_reconcile::algs::communicator::{Communicator, ThreadUniverse};
use graph_reconcile::algs::gather::{GATHER_TAG, GatherPolicy, gather_pairs, gatherv};
use graph_reconcile::algs::partition::{LocalPartition, VertexPartition, distribute_edges};
use graph_reconcile::graph::{EdgeList, GraphProperties, GraphView, Orientation};
use graph_reconcile::graph_error::GraphError;
use graph_reconcile::harness::{
    DegreeMetric, ExecutionContext, GraphUsecase, HarnessConfig, MetricParams, MetricUsecase,
    Verdict, VertexMetric, reconcile_vertex_metric, verify_graph_construction,
};
use graph_reconcile::synthetic::{RmatParams, UniformSampler, generate_rmat};
use serial_test::serial;

fn rmat(seed: u64, weighted: bool) -> EdgeList<u32, f64> {
    let params = RmatParams {
        scale: 6,
        edge_factor: 4,
        seed,
        scramble_vertex_ids: true,
        weighted,
        ..RmatParams::default()
    };
    generate_rmat(&params).unwrap()
}

fn construction_case(orientation: Orientation, ranks: usize) {
    init_logger();
    let edges = rmat(17, true);
    let locals = distribute_edges(&edges, shuffled_ids(64, 5), ranks, orientation).unwrap();
    let verdicts = ThreadUniverse::run(ranks, |comm| {
        let cfg = HarnessConfig {
            orientation,
            expensive_check: true,
            ..HarnessConfig::default()
        };
        let rank = comm.rank();
        let mut ctx = ExecutionContext::init(comm, cfg).unwrap();
        verify_graph_construction::<_, _, u64, _>(
            &mut ctx,
            &locals[rank],
            &edges,
            &GraphUsecase {
                test_weighted: true,
                ..GraphUsecase::default()
            },
        )
        .unwrap()
    });
    assert_eq!(
        verdicts[0],
        Verdict::Verified {
            compared: edges.len()
        }
    );
    assert!(verdicts[1..].iter().all(|v| *v == Verdict::NotCoordinator));
}

#[test]
fn assembled_graph_equals_reference_source_major() {
    construction_case(Orientation::SourceMajor, 4);
}

#[test]
fn assembled_graph_equals_reference_destination_major() {
    construction_case(Orientation::DestinationMajor, 3);
}

/// Runs `metric` on each rank's partition and reconciles at rank 1. The config
/// keeps its default orientation whatever `orientation` the graphs use.
fn reconcile_with<M>(
    metric: &M,
    edges: &EdgeList<u32, f64>,
    ranks: usize,
    orientation: Orientation,
) -> Vec<Result<Verdict, GraphError>>
where
    M: VertexMetric<u32, u32, f64> + Sync,
{
    let locals: Vec<LocalPartition<u32, f64>> =
        distribute_edges(edges, shuffled_ids(64, 9), ranks, orientation).unwrap();
    ThreadUniverse::run(ranks, |comm| {
        let rank = comm.rank();
        let cfg = HarnessConfig {
            coordinator: 1,
            ..HarnessConfig::default()
        };
        let mut ctx = ExecutionContext::init(comm, cfg).unwrap();
        let local = &locals[rank];
        let graph = local
            .build_graph::<u32>(GraphProperties::default(), orientation)
            .unwrap();
        let usecase = MetricUsecase {
            num_seeds: Some(8),
            params: MetricParams {
                normalized: true,
                include_endpoints: false,
            },
            check_correctness: true,
        };
        reconcile_vertex_metric(
            &mut ctx,
            graph.view(),
            &local.map,
            edges,
            metric,
            &mut UniformSampler::seeded(rank as u64),
            &GraphUsecase::default(),
            &usecase,
        )
    })
}

#[test]
fn degree_metric_reconciles_across_numberings() {
    init_logger();
    let edges = rmat(3, false);
    let out = reconcile_with(&DegreeMetric, &edges, 3, Orientation::SourceMajor);
    assert_eq!(out[1], Ok(Verdict::Verified { compared: 64 }));
    assert_eq!(out[0], Ok(Verdict::NotCoordinator));
    assert_eq!(out[2], Ok(Verdict::NotCoordinator));
}

#[test]
fn destination_major_metric_reconciles_under_default_config() {
    init_logger();
    // Directed R-MAT edges, so in-degree and out-degree differ.
    let edges = rmat(3, false);
    assert_eq!(HarnessConfig::default().orientation, Orientation::SourceMajor);
    let out = reconcile_with(&DegreeMetric, &edges, 3, Orientation::DestinationMajor);
    assert_eq!(out[1], Ok(Verdict::Verified { compared: 64 }));
    assert_eq!(out[0], Ok(Verdict::NotCoordinator));
    assert_eq!(out[2], Ok(Verdict::NotCoordinator));
}

/// Degree metric that corrupts the first vertex of the first partition.
struct PerturbedDegree;

impl VertexMetric<u32, u32, f64> for PerturbedDegree {
    fn compute(
        &self,
        graph: GraphView<'_, u32, u32, f64>,
        seeds: Option<&[u32]>,
        params: &MetricParams,
    ) -> Result<Vec<f64>, GraphError> {
        let mut values = DegreeMetric.compute(graph, seeds, params)?;
        if !graph.covers_all_majors() && graph.major_range().start == 0 {
            values[0] += 0.5;
        }
        Ok(values)
    }
}

#[test]
fn perturbed_value_is_reported_with_its_external_id() {
    init_logger();
    let edges = rmat(3, false);
    let out = reconcile_with(&PerturbedDegree, &edges, 2, Orientation::SourceMajor);
    let Err(GraphError::ToleranceExceeded(found)) = &out[1] else {
        panic!("expected a tolerance failure, got {:?}", out[1]);
    };
    assert_eq!(found.len(), 1);
    // Internal id 0 of the distributed numbering.
    assert_eq!(found[0].key, format!("{:?}", shuffled_ids(64, 9)[0]));
    assert!((found[0].difference - 0.5).abs() < 1e-12);
}

#[test]
fn gathered_keys_cover_every_vertex_once() {
    for ranks in 1..=4 {
        let partition = VertexPartition::even(37, ranks).unwrap();
        let out = ThreadUniverse::run(ranks, |comm| {
            let range = partition.range(comm.rank()).unwrap();
            let keys: Vec<u32> = range.clone().map(|v| v as u32).collect();
            let values: Vec<f32> = range.map(|v| v as f32 * 0.5).collect();
            gather_pairs(&comm, &keys, &values, 0, GATHER_TAG, GatherPolicy::Unbounded).unwrap()
        });
        let mut keys: Vec<u32> = out[0].iter().map(|&(k, _)| k).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..37).collect::<Vec<_>>());
        assert!(out[0].iter().all(|&(k, v)| v == k as f32 * 0.5));
    }
}

#[test]
#[serial]
fn missing_rank_times_out_under_bounded_gather() {
    init_logger();
    let policy = GatherPolicy::Bounded(Duration::from_millis(100));
    let out = ThreadUniverse::run(3, |comm| {
        if comm.rank() == 2 {
            // Never contributes.
            return Ok(Vec::new());
        }
        gatherv(&comm, &[comm.rank() as u64], 0, GATHER_TAG, policy)
    });
    assert!(matches!(
        out[0],
        Err(GraphError::CollectiveTimeout { peer: 2, .. })
    ));
    assert_eq!(out[1], Ok(Vec::new()));
}

#[test]
#[serial]
fn bounded_gather_deadline_is_shared_across_peers() {
    init_logger();
    let bound = Duration::from_millis(200);
    let out = ThreadUniverse::run(3, |comm| {
        match comm.rank() {
            0 => {
                let started = Instant::now();
                let got = gatherv(&comm, &[0u64], 0, GATHER_TAG, GatherPolicy::Bounded(bound));
                (got, started.elapsed())
            }
            1 => {
                // Late, but inside the bound.
                std::thread::sleep(Duration::from_millis(150));
                (gatherv(&comm, &[1u64], 0, GATHER_TAG, GatherPolicy::Bounded(bound)), Duration::ZERO)
            }
            // Never contributes.
            _ => (Ok(Vec::new()), Duration::ZERO),
        }
    });
    let (got, elapsed) = &out[0];
    assert!(matches!(got, Err(GraphError::CollectiveTimeout { peer: 2, .. })));
    // Rank 2 gets what rank 1 left of the bound, not a fresh one.
    assert!(elapsed < &Duration::from_millis(320), "waited {elapsed:?}");
}

#[test]
#[serial]
fn harness_config_bounds_the_metric_gather() {
    init_logger();
    let edges = rmat(1, false);
    let locals = distribute_edges(&edges, shuffled_ids(64, 2), 2, Orientation::SourceMajor).unwrap();
    let out = ThreadUniverse::run(2, |comm| {
        let rank = comm.rank();
        let cfg = HarnessConfig::from_json(r#"{ "gather_timeout_ms": 100 }"#).unwrap();
        let mut ctx = ExecutionContext::init(comm, cfg).unwrap();
        if rank == 1 {
            return Ok(Verdict::NotCoordinator);
        }
        let local = &locals[rank];
        let graph = local
            .build_graph::<u32>(GraphProperties::default(), Orientation::SourceMajor)
            .unwrap();
        reconcile_vertex_metric(
            &mut ctx,
            graph.view(),
            &local.map,
            &edges,
            &DegreeMetric,
            &mut UniformSampler::seeded(0),
            &GraphUsecase::default(),
            &MetricUsecase::default(),
        )
    });
    assert!(matches!(
        out[0],
        Err(GraphError::CollectiveTimeout { peer: 1, .. })
    ));
}
