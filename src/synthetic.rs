//! Seeded synthetic input: R-MAT edge lists and uniform vertex samples.
//!
//! All randomness comes from `SmallRng` seeded from the parameters, so the
//! same parameters give the same edges on every rank.

use std::ops::Range;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::graph::bounds::{VertexLike, WeightLike, from_index};
use crate::graph::edge_list::EdgeList;
use crate::graph_error::GraphError;
use crate::harness::VertexSampler;

/// Recursive-matrix generator parameters. `d = 1 - a - b - c`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmatParams {
    /// `2^scale` vertices.
    pub scale: u32,
    /// `edge_factor * 2^scale` edges before symmetrization.
    pub edge_factor: usize,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub seed: u64,
    /// Add the reverse of every non-loop edge.
    pub undirected: bool,
    /// Relabel vertices by a seeded permutation so ids carry no locality.
    pub scramble_vertex_ids: bool,
    /// Attach uniform weights in `[0, 1)`.
    pub weighted: bool,
}

impl Default for RmatParams {
    fn default() -> Self {
        Self {
            scale: 10,
            edge_factor: 16,
            a: 0.57,
            b: 0.19,
            c: 0.19,
            seed: 0,
            undirected: false,
            scramble_vertex_ids: false,
            weighted: false,
        }
    }
}

impl RmatParams {
    pub fn number_of_vertices(&self) -> usize {
        1usize << self.scale
    }

    fn validate(&self) -> Result<(), GraphError> {
        let (a, b, c) = (self.a, self.b, self.c);
        if [a, b, c].iter().any(|p| !(0.0..=1.0).contains(p)) || a + b + c > 1.0 {
            return Err(GraphError::InvalidInput(format!(
                "R-MAT probabilities a={a} b={b} c={c} must be in [0, 1] and sum to at most 1"
            )));
        }
        if self.scale >= usize::BITS - 1 {
            return Err(GraphError::InvalidInput(format!("scale {} too large", self.scale)));
        }
        Ok(())
    }
}

/// Generate an R-MAT edge list over `[0, 2^scale)`.
///
/// Duplicate edges and self-loops are kept; the result is a multigraph.
pub fn generate_rmat<V, W>(params: &RmatParams) -> Result<EdgeList<V, W>, GraphError>
where
    V: VertexLike,
    W: WeightLike,
{
    params.validate()?;
    let n = params.number_of_vertices();
    let n_edges = params.edge_factor * n;
    let mut rng = SmallRng::seed_from_u64(params.seed);
    let (ab, abc) = (params.a + params.b, params.a + params.b + params.c);

    let permutation: Option<Vec<usize>> = params.scramble_vertex_ids.then(|| {
        let mut p: Vec<usize> = (0..n).collect();
        p.shuffle(&mut rng);
        p
    });
    let to_v = |i: usize| -> Result<V, GraphError> {
        let i = permutation.as_ref().map_or(i, |p| p[i]);
        from_index(i).ok_or_else(|| GraphError::InvalidInput(format!("vertex {i} overflows")))
    };

    let mut out = EdgeList::new(
        Vec::with_capacity(n_edges),
        Vec::with_capacity(n_edges),
        params.weighted.then(|| Vec::with_capacity(n_edges)),
    )?;
    for _ in 0..n_edges {
        let (mut src, mut dst) = (0usize, 0usize);
        for bit in (0..params.scale).rev() {
            let r: f64 = rng.gen_range(0.0..1.0);
            let (s, d) = if r < params.a {
                (0, 0)
            } else if r < ab {
                (0, 1)
            } else if r < abc {
                (1, 0)
            } else {
                (1, 1)
            };
            src |= s << bit;
            dst |= d << bit;
        }
        let weight = if params.weighted {
            <W as num_traits::NumCast>::from(rng.gen_range(0.0..1.0f64))
        } else {
            None
        };
        out.push(to_v(src)?, to_v(dst)?, weight)?;
    }

    log::debug!(
        "generated {} R-MAT edges over {n} vertices (seed {})",
        out.len(),
        params.seed
    );
    Ok(if params.undirected {
        out.symmetrized()
    } else {
        out
    })
}

/// Seeded sampler drawing distinct ids uniformly from a range.
#[derive(Clone, Debug)]
pub struct UniformSampler {
    rng: SmallRng,
}

impl UniformSampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl<V: VertexLike> VertexSampler<V> for UniformSampler {
    /// `count` distinct ids from `range`, ascending.
    fn sample(&mut self, range: Range<usize>, count: usize) -> Result<Vec<V>, GraphError> {
        if count > range.len() {
            return Err(GraphError::InvalidInput(format!(
                "cannot sample {count} distinct vertices from {range:?}"
            )));
        }
        let mut picked: Vec<usize> = rand::seq::index::sample(&mut self.rng, range.len(), count)
            .into_iter()
            .map(|i| range.start + i)
            .collect();
        picked.sort_unstable();
        picked
            .into_iter()
            .map(|i| {
                from_index(i).ok_or_else(|| GraphError::InvalidInput(format!("vertex {i} overflows")))
            })
            .collect()
    }
}
