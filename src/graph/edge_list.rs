//! Column-oriented edge list: the raw input every adjacency is built from.

use crate::graph::bounds::{VertexLike, WeightLike, from_index, to_index};
use crate::graph_error::GraphError;

/// Ordered sequence of `(src, dst, weight?)` triples stored as parallel columns.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeList<V, W> {
    srcs: Vec<V>,
    dsts: Vec<V>,
    weights: Option<Vec<W>>,
}

impl<V, W> Default for EdgeList<V, W> {
    fn default() -> Self {
        Self {
            srcs: Vec::new(),
            dsts: Vec::new(),
            weights: None,
        }
    }
}

impl<V, W> EdgeList<V, W>
where
    V: VertexLike,
    W: WeightLike,
{
    /// Build from columns. Fails with `InvalidInput` if column lengths differ.
    pub fn new(srcs: Vec<V>, dsts: Vec<V>, weights: Option<Vec<W>>) -> Result<Self, GraphError> {
        if srcs.len() != dsts.len() {
            return Err(GraphError::InvalidInput(format!(
                "{} sources but {} destinations",
                srcs.len(),
                dsts.len()
            )));
        }
        if let Some(w) = &weights {
            if w.len() != srcs.len() {
                return Err(GraphError::InvalidInput(format!(
                    "{} edges but {} weights",
                    srcs.len(),
                    w.len()
                )));
            }
        }
        Ok(Self {
            srcs,
            dsts,
            weights,
        })
    }

    /// Unweighted edge list from `(src, dst)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (V, V)>) -> Self {
        let (srcs, dsts) = pairs.into_iter().unzip();
        Self {
            srcs,
            dsts,
            weights: None,
        }
    }

    /// Weighted edge list from `(src, dst, weight)` triples.
    pub fn from_weighted(triples: impl IntoIterator<Item = (V, V, W)>) -> Self {
        let mut out = Self {
            srcs: Vec::new(),
            dsts: Vec::new(),
            weights: Some(Vec::new()),
        };
        for (s, d, w) in triples {
            out.srcs.push(s);
            out.dsts.push(d);
            if let Some(ws) = out.weights.as_mut() {
                ws.push(w);
            }
        }
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.srcs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.srcs.is_empty()
    }

    #[inline]
    pub fn is_weighted(&self) -> bool {
        self.weights.is_some()
    }

    pub fn srcs(&self) -> &[V] {
        &self.srcs
    }

    pub fn dsts(&self) -> &[V] {
        &self.dsts
    }

    pub fn weights(&self) -> Option<&[W]> {
        self.weights.as_deref()
    }

    /// Iterate `(src, dst, weight?)` in input order.
    pub fn iter(&self) -> impl Iterator<Item = (V, V, Option<W>)> + '_ {
        self.srcs
            .iter()
            .zip(&self.dsts)
            .enumerate()
            .map(move |(i, (&s, &d))| (s, d, self.weights.as_ref().map(|w| w[i])))
    }

    /// Append one edge. The weight must be present iff the list is weighted.
    pub fn push(&mut self, src: V, dst: V, weight: Option<W>) -> Result<(), GraphError> {
        match (&mut self.weights, weight) {
            (Some(ws), Some(w)) => ws.push(w),
            (None, None) => {}
            (Some(_), None) => {
                return Err(GraphError::InvalidInput(
                    "missing weight for weighted edge list".into(),
                ));
            }
            (None, Some(_)) => {
                return Err(GraphError::InvalidInput(
                    "weight supplied for unweighted edge list".into(),
                ));
            }
        }
        self.srcs.push(src);
        self.dsts.push(dst);
        Ok(())
    }

    /// Concatenate another edge list with the same weightedness.
    pub fn extend_from(&mut self, other: &EdgeList<V, W>) -> Result<(), GraphError> {
        for (s, d, w) in other.iter() {
            self.push(s, d, w)?;
        }
        Ok(())
    }

    /// `max(id over both endpoints) + 1`, or zero for an empty list.
    ///
    /// Fails with `InvalidInput` on a negative id or if the count overflows `V`.
    pub fn infer_vertex_count(&self) -> Result<V, GraphError> {
        let mut max: Option<usize> = None;
        for &v in self.srcs.iter().chain(&self.dsts) {
            let i = to_index(v).ok_or_else(|| {
                GraphError::InvalidInput(format!("vertex id {v:?} is negative or too wide"))
            })?;
            max = Some(max.map_or(i, |m| m.max(i)));
        }
        let count = max.map_or(0, |m| m + 1);
        from_index(count).ok_or_else(|| {
            GraphError::InvalidInput(format!("vertex count {count} overflows the id type"))
        })
    }

    /// Same edges with every `(src, dst)` swapped.
    pub fn reversed(&self) -> Self {
        Self {
            srcs: self.dsts.clone(),
            dsts: self.srcs.clone(),
            weights: self.weights.clone(),
        }
    }

    /// Add the reverse of every non-loop edge, producing a symmetric edge list.
    pub fn symmetrized(&self) -> Self {
        let mut out = self.clone();
        for (s, d, w) in self.iter() {
            if s != d {
                out.srcs.push(d);
                out.dsts.push(s);
                if let (Some(ws), Some(w)) = (out.weights.as_mut(), w) {
                    ws.push(w);
                }
            }
        }
        out
    }

    /// Apply `f` to every endpoint, keeping order and weights.
    pub fn map_vertices<U, F>(&self, mut f: F) -> Result<EdgeList<U, W>, GraphError>
    where
        U: VertexLike,
        F: FnMut(V) -> Result<U, GraphError>,
    {
        let mut srcs = Vec::with_capacity(self.len());
        let mut dsts = Vec::with_capacity(self.len());
        for (&s, &d) in self.srcs.iter().zip(&self.dsts) {
            srcs.push(f(s)?);
            dsts.push(f(d)?);
        }
        Ok(EdgeList {
            srcs,
            dsts,
            weights: self.weights.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_columns_rejected() {
        let err = EdgeList::<u32, f32>::new(vec![0, 1], vec![1], None).unwrap_err();
        assert!(matches!(err, GraphError::InvalidInput(_)));
        let err = EdgeList::<u32, f32>::new(vec![0], vec![1], Some(vec![])).unwrap_err();
        assert!(matches!(err, GraphError::InvalidInput(_)));
    }

    #[test]
    fn infer_count_uses_both_endpoints() {
        let e = EdgeList::<i32, f32>::from_pairs([(0, 1), (1, 7)]);
        assert_eq!(e.infer_vertex_count().unwrap(), 8);
        let empty = EdgeList::<i32, f32>::default();
        assert_eq!(empty.infer_vertex_count().unwrap(), 0);
    }

    #[test]
    fn negative_id_is_invalid_input() {
        let e = EdgeList::<i32, f32>::from_pairs([(0, -3)]);
        assert!(matches!(
            e.infer_vertex_count(),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn symmetrized_skips_self_loops() {
        let e = EdgeList::<u32, f64>::from_weighted([(0, 1, 2.0), (2, 2, 1.0)]);
        let s = e.symmetrized();
        assert_eq!(s.len(), 3);
        let triples: Vec<_> = s.iter().collect();
        assert!(triples.contains(&(1, 0, Some(2.0))));
    }

    #[test]
    fn push_enforces_weightedness() {
        let mut e = EdgeList::<u32, f32>::from_pairs([(0, 1)]);
        assert!(e.push(1, 2, Some(1.0)).is_err());
        assert!(e.push(1, 2, None).is_ok());
        assert_eq!(e.len(), 2);
    }
}
