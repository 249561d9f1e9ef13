//! Order-independent equivalence of adjacency structures and keyed vectors.
//!
//! Two structures built from the same edges may store each bucket in a
//! different order, so every bucket is canonicalized (sorted by neighbor, then
//! weight) before an elementwise comparison. Keyed result vectors are sorted
//! by key. Multiplicity is preserved: duplicate `(neighbor, weight)` pairs are
//! part of what is compared.
//!
//! Weight order is total: NaN sorts after every number, and two NaNs are
//! considered equal.

use std::cmp::Ordering;
use std::fmt::Debug;

use itertools::{EitherOrBoth, Itertools};
use serde::{Deserialize, Serialize};

use crate::graph::bounds::{EdgeLike, VertexLike, WeightLike};
use crate::graph::container::GraphView;
use crate::graph_error::{GraphError, GraphMismatch, ValueMismatch};

/// Numeric tolerance: `|a - b| <= max(absolute, relative * max(|a|, |b|))`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::EXACT
    }
}

impl Tolerance {
    pub const EXACT: Tolerance = Tolerance {
        absolute: 0.0,
        relative: 0.0,
    };

    pub fn absolute(absolute: f64) -> Self {
        Self {
            absolute,
            relative: 0.0,
        }
    }

    pub fn relative(relative: f64) -> Self {
        Self {
            absolute: 0.0,
            relative,
        }
    }

    pub fn within(&self, a: f64, b: f64) -> bool {
        if a == b || (a.is_nan() && b.is_nan()) {
            return true;
        }
        if a.is_nan() || b.is_nan() {
            return false;
        }
        // Unequal infinities would otherwise get an infinite relative bound.
        if a.is_infinite() || b.is_infinite() {
            return false;
        }
        let bound = self.absolute.max(self.relative * a.abs().max(b.abs()));
        (a - b).abs() <= bound
    }
}

/// Whether a comparison stops at the first mismatch or reports all of them.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ValidationMode {
    FailFast,
    #[default]
    Diagnostic,
}

/// Total order on weights with NaN greater than every number.
pub fn cmp_weight<W: WeightLike>(a: W, b: W) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[inline]
fn as_f64<W: WeightLike>(w: W) -> f64 {
    w.to_f64().unwrap_or(f64::NAN)
}

/// Sorted `(neighbor, weight?)` pairs of one bucket.
pub fn canonical_bucket<V, W>(neighbors: &[V], weights: Option<&[W]>) -> Vec<(V, Option<W>)>
where
    V: VertexLike,
    W: WeightLike,
{
    let mut pairs: Vec<(V, Option<W>)> = match weights {
        Some(w) => neighbors.iter().copied().zip(w.iter().copied().map(Some)).collect(),
        None => neighbors.iter().map(|&n| (n, None)).collect(),
    };
    pairs.sort_unstable_by(|(na, wa), (nb, wb)| {
        na.cmp(nb).then_with(|| match (wa, wb) {
            (Some(a), Some(b)) => cmp_weight(*a, *b),
            _ => Ordering::Equal,
        })
    });
    pairs
}

/// Compare two adjacency structures bucket by bucket.
///
/// Vertex counts, major ranges and weight presence must agree before buckets
/// are compared; a differing degree is reported without comparing that
/// bucket's contents.
pub fn compare_graphs<V, E1, E2, W>(
    left: GraphView<'_, V, E1, W>,
    right: GraphView<'_, V, E2, W>,
    tolerance: Tolerance,
    mode: ValidationMode,
) -> Result<(), GraphError>
where
    V: VertexLike,
    E1: EdgeLike,
    E2: EdgeLike,
    W: WeightLike,
{
    let mut found = Vec::new();
    let fail_fast = mode == ValidationMode::FailFast;

    if left.number_of_vertices() != right.number_of_vertices() {
        found.push(GraphMismatch::VertexCount {
            left: left.number_of_vertices(),
            right: right.number_of_vertices(),
        });
        return Err(GraphError::GraphMismatch(found));
    }
    if left.major_range() != right.major_range() {
        found.push(GraphMismatch::MajorRange {
            left: left.major_range(),
            right: right.major_range(),
        });
        return Err(GraphError::GraphMismatch(found));
    }
    if left.weights().is_some() != right.weights().is_some() {
        found.push(GraphMismatch::WeightPresence {
            left: left.weights().is_some(),
            right: right.weights().is_some(),
        });
        return Err(GraphError::GraphMismatch(found));
    }
    if left.number_of_edges() != right.number_of_edges() {
        found.push(GraphMismatch::EdgeCount {
            left: left.number_of_edges(),
            right: right.number_of_edges(),
        });
        if fail_fast {
            return Err(GraphError::GraphMismatch(found));
        }
    }

    let first = left.major_range().start;
    'vertices: for local in 0..left.local_vertex_count() {
        let vertex = first + local;
        let (dl, dr) = (left.degree(local), right.degree(local));
        if dl != dr {
            found.push(GraphMismatch::Degree {
                vertex,
                left: dl,
                right: dr,
            });
            if fail_fast {
                break;
            }
            continue;
        }
        let a = canonical_bucket(left.neighbors(local), left.neighbor_weights(local));
        let b = canonical_bucket(right.neighbors(local), right.neighbor_weights(local));
        for (slot, ((na, wa), (nb, wb))) in a.into_iter().zip(b).enumerate() {
            if na != nb {
                found.push(GraphMismatch::Neighbor {
                    vertex,
                    slot,
                    left: format!("{na:?}"),
                    right: format!("{nb:?}"),
                });
                if fail_fast {
                    break 'vertices;
                }
                // Later slots are shifted too; one report per bucket.
                continue 'vertices;
            }
            if let (Some(wa), Some(wb)) = (wa, wb) {
                let (x, y) = (as_f64(wa), as_f64(wb));
                if !tolerance.within(x, y) {
                    found.push(GraphMismatch::Weight {
                        vertex,
                        neighbor: format!("{na:?}"),
                        left: x,
                        right: y,
                        difference: (x - y).abs(),
                    });
                    if fail_fast {
                        break 'vertices;
                    }
                }
            }
        }
    }

    if found.is_empty() {
        Ok(())
    } else {
        log::debug!("graph comparison found {} mismatch(es)", found.len());
        Err(GraphError::GraphMismatch(found))
    }
}

/// True when the two structures represent the same graph.
pub fn equal_graphs<V, E1, E2, W>(
    left: GraphView<'_, V, E1, W>,
    right: GraphView<'_, V, E2, W>,
    tolerance: Tolerance,
) -> bool
where
    V: VertexLike,
    E1: EdgeLike,
    E2: EdgeLike,
    W: WeightLike,
{
    compare_graphs(left, right, tolerance, ValidationMode::FailFast).is_ok()
}

fn sorted_by_key<K, W>(v: &[(K, W)]) -> Vec<(K, W)>
where
    K: Ord + Copy,
    W: Copy,
{
    let mut out = v.to_vec();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

fn duplicated_keys<K: Ord + Copy + Debug, W>(sorted: &[(K, W)]) -> Vec<String> {
    sorted
        .iter()
        .map(|(k, _)| *k)
        .dedup_with_count()
        .filter(|(count, _)| *count > 1)
        .map(|(_, k)| format!("{k:?}"))
        .collect()
}

/// Compare two keyed result vectors irrespective of order.
///
/// Keys missing on either side or repeated within one side are a
/// `KeySetMismatch`; values are then compared within `tolerance` and reported
/// as `ToleranceExceeded`.
pub fn compare_vectors<K, W>(
    left: &[(K, W)],
    right: &[(K, W)],
    tolerance: Tolerance,
    mode: ValidationMode,
) -> Result<(), GraphError>
where
    K: Ord + Copy + Debug,
    W: WeightLike,
{
    let mut a = sorted_by_key(left);
    let mut b = sorted_by_key(right);

    let mut duplicated = duplicated_keys(&a);
    duplicated.extend(duplicated_keys(&b));
    duplicated.sort_unstable();
    duplicated.dedup();
    // Repeats are already reported; the join sees each key once per side.
    a.dedup_by(|x, y| x.0 == y.0);
    b.dedup_by(|x, y| x.0 == y.0);
    let mut missing_in_left = Vec::new();
    let mut missing_in_right = Vec::new();
    let mut mismatches = Vec::new();
    let fail_fast = mode == ValidationMode::FailFast;

    for pair in a.iter().merge_join_by(b.iter(), |x, y| x.0.cmp(&y.0)) {
        match pair {
            EitherOrBoth::Left((k, _)) => missing_in_right.push(format!("{k:?}")),
            EitherOrBoth::Right((k, _)) => missing_in_left.push(format!("{k:?}")),
            EitherOrBoth::Both((k, x), (_, y)) => {
                if fail_fast && !mismatches.is_empty() {
                    continue;
                }
                let (x, y) = (as_f64(*x), as_f64(*y));
                if !tolerance.within(x, y) {
                    mismatches.push(ValueMismatch {
                        key: format!("{k:?}"),
                        left: x,
                        right: y,
                        difference: (x - y).abs(),
                    });
                }
            }
        }
    }

    if !(missing_in_left.is_empty() && missing_in_right.is_empty() && duplicated.is_empty()) {
        return Err(GraphError::KeySetMismatch {
            missing_in_left,
            missing_in_right,
            duplicated,
        });
    }
    if mismatches.is_empty() {
        Ok(())
    } else {
        log::debug!("vector comparison found {} mismatch(es)", mismatches.len());
        Err(GraphError::ToleranceExceeded(mismatches))
    }
}

/// True when both keyed vectors hold the same keys with values within tolerance.
pub fn equal_vectors<K, W>(left: &[(K, W)], right: &[(K, W)], tolerance: Tolerance) -> bool
where
    K: Ord + Copy + Debug,
    W: WeightLike,
{
    compare_vectors(left, right, tolerance, ValidationMode::FailFast).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeList, Graph, GraphMeta, GraphProperties, Orientation};

    fn graph(e: &EdgeList<u32, f64>, multigraph: bool) -> Graph<u32, u32, f64> {
        let meta = GraphMeta {
            number_of_vertices: Some(2),
            properties: GraphProperties {
                is_symmetric: false,
                is_multigraph: multigraph,
            },
        };
        Graph::from_edge_list(e, meta, Orientation::SourceMajor, false).unwrap()
    }

    #[test]
    fn permuted_multigraph_buckets_are_equal() {
        let a = graph(&EdgeList::from_weighted([(0, 1, 1.0), (0, 1, 2.0)]), true);
        let b = graph(&EdgeList::from_weighted([(0, 1, 2.0), (0, 1, 1.0)]), true);
        assert_ne!(a.view().weights(), b.view().weights());
        assert!(equal_graphs(a.view(), b.view(), Tolerance::EXACT));
    }

    #[test]
    fn multiplicity_matters() {
        let a = graph(&EdgeList::from_weighted([(0, 1, 1.0), (0, 1, 1.0)]), true);
        let b = graph(&EdgeList::from_weighted([(0, 1, 1.0), (1, 0, 1.0)]), true);
        let err = compare_graphs(a.view(), b.view(), Tolerance::EXACT, ValidationMode::Diagnostic)
            .unwrap_err();
        let GraphError::GraphMismatch(found) = err else {
            panic!("expected graph mismatch");
        };
        assert_eq!(found.len(), 2);
        assert!(matches!(found[0], GraphMismatch::Degree { vertex: 0, left: 2, right: 1 }));
    }

    #[test]
    fn weights_compared_within_tolerance() {
        let a = graph(&EdgeList::from_weighted([(0, 1, 1.0)]), false);
        let b = graph(&EdgeList::from_weighted([(0, 1, 1.0 + 1e-7)]), false);
        assert!(!equal_graphs(a.view(), b.view(), Tolerance::EXACT));
        assert!(equal_graphs(a.view(), b.view(), Tolerance::absolute(1e-6)));
        assert!(equal_graphs(a.view(), b.view(), Tolerance::relative(1e-6)));
    }

    #[test]
    fn nan_sorts_last_and_matches_nan() {
        assert_eq!(cmp_weight(f64::NAN, 1e300), Ordering::Greater);
        assert_eq!(cmp_weight(-1.0, f64::NAN), Ordering::Less);
        let bucket = canonical_bucket(&[1u32, 1, 1], Some(&[f64::NAN, 2.0, -3.0][..]));
        assert_eq!(bucket[0], (1, Some(-3.0)));
        assert!(bucket[2].1.is_some_and(f64::is_nan));
        assert!(Tolerance::EXACT.within(f64::NAN, f64::NAN));
        assert!(!Tolerance::absolute(1.0).within(f64::NAN, 0.0));
    }

    #[test]
    fn infinities_only_match_themselves() {
        let rel = Tolerance::relative(1e-6);
        assert!(!rel.within(f64::INFINITY, 1.0));
        assert!(!rel.within(1.0, f64::NEG_INFINITY));
        assert!(!rel.within(f64::INFINITY, f64::NEG_INFINITY));
        assert!(rel.within(f64::INFINITY, f64::INFINITY));
        assert!(!Tolerance::absolute(f64::INFINITY).within(f64::INFINITY, 0.0));
        assert!(!equal_vectors(&[(0u32, f64::INFINITY)], &[(0u32, 1.0)], rel));

        let a = graph(&EdgeList::from_weighted([(0, 1, f64::INFINITY)]), false);
        let b = graph(&EdgeList::from_weighted([(0, 1, 1.0)]), false);
        assert!(!equal_graphs(a.view(), b.view(), rel));
    }

    #[test]
    fn vectors_tolerance_scenario() {
        let distributed = [(5u32, 0.4f64), (2, 0.1)];
        let reference = [(2u32, 0.1000001f64), (5, 0.4)];
        assert!(equal_vectors(&distributed, &reference, Tolerance::absolute(1e-4)));
        let err = compare_vectors(
            &distributed,
            &reference,
            Tolerance::absolute(1e-9),
            ValidationMode::Diagnostic,
        )
        .unwrap_err();
        let GraphError::ToleranceExceeded(found) = err else {
            panic!("expected tolerance failure");
        };
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "2");
        assert!((found[0].difference - 1e-7).abs() < 1e-9);
    }

    #[test]
    fn asymmetric_keys_are_hard_failures() {
        let err = compare_vectors(
            &[(1u32, 1.0f32), (2, 2.0)],
            &[(1u32, 1.0f32), (3, 3.0)],
            Tolerance::absolute(10.0),
            ValidationMode::Diagnostic,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::KeySetMismatch {
                missing_in_left: vec!["3".into()],
                missing_in_right: vec!["2".into()],
                duplicated: vec![],
            }
        );
    }

    #[test]
    fn duplicate_keys_reported() {
        let err = compare_vectors(
            &[(1u32, 1.0f32), (1, 1.0)],
            &[(1u32, 1.0f32)],
            Tolerance::EXACT,
            ValidationMode::FailFast,
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::KeySetMismatch { ref duplicated, .. } if duplicated == &vec!["1".to_string()]));

        let err = compare_vectors(
            &[(1u32, 1.0f32), (1, 1.0)],
            &[(1u32, 1.0f32)],
            Tolerance::EXACT,
            ValidationMode::Diagnostic,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::KeySetMismatch {
                missing_in_left: vec![],
                missing_in_right: vec![],
                duplicated: vec!["1".into()],
            }
        );
    }

    #[test]
    fn repeated_key_on_both_sides_is_listed_once() {
        let err = compare_vectors(
            &[(4u32, 1.0f64), (4, 1.0), (7, 2.0)],
            &[(4u32, 1.0f64), (4, 1.0), (4, 1.0)],
            Tolerance::EXACT,
            ValidationMode::Diagnostic,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::KeySetMismatch {
                missing_in_left: vec![],
                missing_in_right: vec!["7".into()],
                duplicated: vec!["4".into()],
            }
        );
    }

    #[test]
    fn vertex_count_and_major_range_reported_separately() {
        let two = graph(&EdgeList::from_pairs([(0, 1)]), false);
        let three = Graph::<u32, u32, f64>::from_edge_list(
            &EdgeList::from_pairs([(0, 1)]),
            GraphMeta {
                number_of_vertices: Some(3),
                properties: GraphProperties::default(),
            },
            Orientation::SourceMajor,
            false,
        )
        .unwrap();
        let err = compare_graphs(two.view(), three.view(), Tolerance::EXACT, ValidationMode::Diagnostic)
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::GraphMismatch(vec![GraphMismatch::VertexCount { left: 2, right: 3 }])
        );

        let low = Graph::<u32, u32, f64>::local_from_edge_list(
            &EdgeList::from_pairs([(0, 1)]),
            4,
            0..2,
            GraphProperties::default(),
            Orientation::SourceMajor,
        )
        .unwrap();
        let high = Graph::<u32, u32, f64>::local_from_edge_list(
            &EdgeList::from_pairs([(2, 3)]),
            4,
            2..4,
            GraphProperties::default(),
            Orientation::SourceMajor,
        )
        .unwrap();
        let err = compare_graphs(low.view(), high.view(), Tolerance::EXACT, ValidationMode::Diagnostic)
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::GraphMismatch(vec![GraphMismatch::MajorRange { left: 0..2, right: 2..4 }])
        );
    }

    #[test]
    fn fail_fast_stops_at_first_value() {
        let a = [(0u32, 0.0f64), (1, 1.0), (2, 2.0)];
        let b = [(0u32, 9.0f64), (1, 9.0), (2, 9.0)];
        let fast = compare_vectors(&a, &b, Tolerance::EXACT, ValidationMode::FailFast);
        let all = compare_vectors(&a, &b, Tolerance::EXACT, ValidationMode::Diagnostic);
        assert!(matches!(fast, Err(GraphError::ToleranceExceeded(ref v)) if v.len() == 1));
        assert!(matches!(all, Err(GraphError::ToleranceExceeded(ref v)) if v.len() == 3));
    }
}
