//! Multi-worker verification harness.
//!
//! A driver creates one [`ExecutionContext`] per rank, runs the distributed
//! side through it, and lets the coordinator rebuild a single-partition
//! reference to compare against. Nothing here is process-global: tearing the
//! context down returns the communicator to the caller.

pub mod config;
pub mod driver;
pub mod timer;

use std::ops::Range;

use crate::algs::communicator::Communicator;
use crate::algs::gather::GatherPolicy;
use crate::graph::bounds::{EdgeLike, VertexLike, WeightLike};
use crate::graph::container::GraphView;
use crate::graph_error::GraphError;

pub use config::{GraphUsecase, HarnessConfig, MetricParams, MetricUsecase};
pub use driver::{reconcile_vertex_metric, verify_graph_construction};
pub use timer::HighResTimer;

/// Per-vertex algorithm under test.
///
/// `compute` returns one value per local major vertex of `graph`, in local
/// order. Seeds are internal ids in the numbering of `graph`.
pub trait VertexMetric<V, E, W> {
    fn compute(
        &self,
        graph: GraphView<'_, V, E, W>,
        seeds: Option<&[V]>,
        params: &MetricParams,
    ) -> Result<Vec<W>, GraphError>;
}

/// Picks a subset of internal vertex ids from a range.
pub trait VertexSampler<V> {
    fn sample(&mut self, range: Range<usize>, count: usize) -> Result<Vec<V>, GraphError>;
}

/// Outcome of a driver on one rank.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// This rank contributed but did not compare.
    NotCoordinator,
    /// Correctness checking was disabled by the usecase.
    Unchecked,
    /// Distributed and reference results agree on `compared` items.
    Verified { compared: usize },
}

/// Explicitly owned run state for one rank.
pub struct ExecutionContext<C: Communicator> {
    comm: C,
    config: HarnessConfig,
    timer: HighResTimer,
}

impl<C: Communicator> ExecutionContext<C> {
    pub fn init(comm: C, config: HarnessConfig) -> Result<Self, GraphError> {
        config.validate()?;
        if config.coordinator >= comm.size() {
            return Err(GraphError::Config(format!(
                "coordinator {} out of range for {} ranks",
                config.coordinator,
                comm.size()
            )));
        }
        log::debug!("rank {}/{} initialised", comm.rank(), comm.size());
        Ok(Self {
            comm,
            config,
            timer: HighResTimer::new(),
        })
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    pub fn size(&self) -> usize {
        self.comm.size()
    }

    pub fn coordinator(&self) -> usize {
        self.config.coordinator
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank() == self.config.coordinator
    }

    pub fn gather_policy(&self) -> GatherPolicy {
        self.config.gather_policy()
    }

    /// Begin a timed phase; with `perf` set every rank synchronises first.
    pub fn start_phase(&mut self, label: &str) {
        if self.config.perf {
            self.comm.barrier();
            self.timer.start(label);
        }
    }

    pub fn stop_phase(&mut self) {
        if self.config.perf {
            self.comm.barrier();
            self.timer.stop();
        }
    }

    pub fn timer(&self) -> &HighResTimer {
        &self.timer
    }

    /// Flush timings and hand the communicator back.
    pub fn teardown(mut self) -> C {
        if self.config.perf && self.is_coordinator() {
            self.timer.display_and_clear();
        }
        log::debug!("rank {} torn down", self.comm.rank());
        self.comm
    }
}

/// Out-degree of each local major vertex; seeds and params are ignored.
///
/// Useful as a stand-in metric: it is fully determined by the graph, so a
/// distributed and a reference run must agree exactly.
#[derive(Copy, Clone, Debug, Default)]
pub struct DegreeMetric;

impl<V, E, W> VertexMetric<V, E, W> for DegreeMetric
where
    V: VertexLike,
    E: EdgeLike,
    W: WeightLike,
{
    fn compute(
        &self,
        graph: GraphView<'_, V, E, W>,
        _seeds: Option<&[V]>,
        params: &MetricParams,
    ) -> Result<Vec<W>, GraphError> {
        let scale = if params.normalized && graph.number_of_vertices() > 1 {
            1.0 / (graph.number_of_vertices() - 1) as f64
        } else {
            1.0
        };
        (0..graph.local_vertex_count())
            .map(|v| {
                <W as num_traits::NumCast>::from(graph.degree(v) as f64 * scale).ok_or_else(|| {
                    GraphError::InvalidInput(format!("degree of {v} not representable"))
                })
            })
            .collect()
    }
}
