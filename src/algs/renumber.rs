//! Renumbering between dense internal vertex ids and external ids.
//!
//! A [`RenumberMap`] is indexed by internal id (offset by the first internal id
//! of the partition it covers) and holds external ids. Lookups outside the
//! covered range or of unknown external ids are surfaced as distinguishable
//! errors, never skipped silently; [`split_known`] is the explicit way to skip.

use hashbrown::{HashMap, HashSet};

use crate::graph::bounds::{VertexLike, WeightLike, from_index, to_index};
use crate::graph::edge_list::EdgeList;
use crate::graph_error::GraphError;

/// Internal → external mapping for a contiguous internal range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenumberMap<V> {
    first: usize,
    external: Vec<V>,
}

impl<V: VertexLike> RenumberMap<V> {
    /// Map covering internal ids `[0, external.len())`.
    pub fn new(external: Vec<V>) -> Result<Self, GraphError> {
        Self::with_first(external, 0)
    }

    /// Map covering internal ids `[first, first + external.len())`.
    ///
    /// Fails with `InvalidInput` if an external id repeats or is negative.
    pub fn with_first(external: Vec<V>, first: usize) -> Result<Self, GraphError> {
        let mut seen = HashSet::with_capacity(external.len());
        for &e in &external {
            if to_index(e).is_none() {
                return Err(GraphError::InvalidInput(format!(
                    "external id {e:?} is negative"
                )));
            }
            if !seen.insert(e) {
                return Err(GraphError::InvalidInput(format!(
                    "external id {e:?} mapped twice"
                )));
            }
        }
        Ok(Self { first, external })
    }

    /// Identity map over `[0, n)`.
    pub fn identity(n: usize) -> Result<Self, GraphError> {
        let external = (0..n)
            .map(|i| {
                from_index(i)
                    .ok_or_else(|| GraphError::InvalidInput(format!("id {i} overflows")))
            })
            .collect::<Result<Vec<V>, _>>()?;
        Ok(Self { first: 0, external })
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn len(&self) -> usize {
        self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.external.is_empty()
    }

    /// External ids in internal order.
    pub fn as_slice(&self) -> &[V] {
        &self.external
    }

    /// External id of one internal id.
    pub fn external_of(&self, internal: V) -> Result<V, GraphError> {
        to_index(internal)
            .and_then(|i| i.checked_sub(self.first))
            .and_then(|i| self.external.get(i).copied())
            .ok_or_else(|| GraphError::IndexOutOfRange {
                id: format!("{internal:?}"),
                first: self.first.to_string(),
                end: (self.first + self.external.len()).to_string(),
            })
    }

    /// True when the map is a bijection from `[0, n)` onto `[0, n)`.
    pub fn is_bijection_onto(&self, n: usize) -> bool {
        self.first == 0
            && self.external.len() == n
            && self.external.iter().all(|&e| to_index(e).is_some_and(|i| i < n))
    }

    /// Concatenate partition maps whose ranges are adjacent and ascending.
    pub fn concat(parts: &[RenumberMap<V>]) -> Result<Self, GraphError> {
        let first = parts.first().map_or(0, |p| p.first);
        let mut external = Vec::with_capacity(parts.iter().map(RenumberMap::len).sum());
        for p in parts {
            if p.first != first + external.len() {
                return Err(GraphError::InvalidInput(format!(
                    "partition map starting at {} does not follow {}",
                    p.first,
                    first + external.len()
                )));
            }
            external.extend_from_slice(&p.external);
        }
        Self::with_first(external, first)
    }
}

/// External → internal mapping, built once per [`RenumberMap`].
#[derive(Clone, Debug)]
pub struct InverseMap<V> {
    internal: HashMap<V, V>,
}

impl<V: VertexLike> InverseMap<V> {
    pub fn from_map(map: &RenumberMap<V>) -> Result<Self, GraphError> {
        let mut internal = HashMap::with_capacity(map.len());
        for (i, &e) in map.as_slice().iter().enumerate() {
            let id: V = from_index(map.first + i).ok_or_else(|| {
                GraphError::InvalidInput(format!("internal id {} overflows", map.first + i))
            })?;
            internal.insert(e, id);
        }
        Ok(Self { internal })
    }

    pub fn internal_of(&self, external: V) -> Result<V, GraphError> {
        self.internal
            .get(&external)
            .copied()
            .ok_or_else(|| GraphError::UnknownVertex(format!("{external:?}")))
    }

    pub fn contains(&self, external: V) -> bool {
        self.internal.contains_key(&external)
    }
}

/// `external[i] = map[internal[i]]`; fails with `IndexOutOfRange`.
pub fn to_external<V: VertexLike>(
    internal_ids: &[V],
    map: &RenumberMap<V>,
) -> Result<Vec<V>, GraphError> {
    internal_ids.iter().map(|&v| map.external_of(v)).collect()
}

/// `internal[i] = inverse[external[i]]`; fails with `UnknownVertex`.
pub fn to_internal<V: VertexLike>(
    external_ids: &[V],
    inverse: &InverseMap<V>,
) -> Result<Vec<V>, GraphError> {
    external_ids.iter().map(|&v| inverse.internal_of(v)).collect()
}

/// Translate the external ids this scope knows; return the rest untouched.
///
/// Used when checking a seed subset on one partition, where ids owned
/// elsewhere are expected.
pub fn split_known<V: VertexLike>(external_ids: &[V], inverse: &InverseMap<V>) -> (Vec<V>, Vec<V>) {
    let mut known = Vec::with_capacity(external_ids.len());
    let mut unknown = Vec::new();
    for &e in external_ids {
        match inverse.internal_of(e) {
            Ok(i) => known.push(i),
            Err(_) => unknown.push(e),
        }
    }
    if !unknown.is_empty() {
        log::warn!("{} external id(s) outside this scope", unknown.len());
    }
    (known, unknown)
}

/// Assign dense internal ids to the external ids of `edges` in ascending
/// external order. Returns the relabelled edge list and its map.
pub fn renumber_edges<V, W>(
    edges: &EdgeList<V, W>,
) -> Result<(EdgeList<V, W>, RenumberMap<V>), GraphError>
where
    V: VertexLike,
    W: WeightLike,
{
    let mut ids: Vec<V> = edges.srcs().iter().chain(edges.dsts()).copied().collect();
    ids.sort_unstable();
    ids.dedup();
    let map = RenumberMap::new(ids)?;
    let inverse = InverseMap::from_map(&map)?;
    let relabelled = edges.map_vertices(|v| inverse.internal_of(v))?;
    Ok((relabelled, map))
}

/// Relabel external ids into a permuted dense numbering.
///
/// `order[i]` is the external id that receives internal id `i`; every external
/// id of `edges` must appear exactly once.
pub fn renumber_edges_with<V, W>(
    edges: &EdgeList<V, W>,
    order: Vec<V>,
) -> Result<(EdgeList<V, W>, RenumberMap<V>), GraphError>
where
    V: VertexLike,
    W: WeightLike,
{
    let map = RenumberMap::new(order)?;
    let inverse = InverseMap::from_map(&map)?;
    let relabelled = edges.map_vertices(|v| inverse.internal_of(v))?;
    Ok((relabelled, map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_range_lookup() {
        let map = RenumberMap::with_first(vec![40u32, 10, 30], 5).unwrap();
        assert_eq!(to_external(&[5, 7], &map).unwrap(), vec![40, 30]);
        let err = to_external(&[8], &map).unwrap_err();
        assert!(matches!(err, GraphError::IndexOutOfRange { .. }));
        assert!(err.is_recoverable_lookup());
        assert!(to_external(&[4], &map).is_err());
    }

    #[test]
    fn inverse_and_unknown() {
        let map = RenumberMap::new(vec![7i64, 3, 9]).unwrap();
        let inv = InverseMap::from_map(&map).unwrap();
        assert_eq!(to_internal(&[9, 7], &inv).unwrap(), vec![2, 0]);
        let err = to_internal(&[4], &inv).unwrap_err();
        assert!(matches!(err, GraphError::UnknownVertex(_)));
        let (known, unknown) = split_known(&[3, 4, 9], &inv);
        assert_eq!(known, vec![1, 2]);
        assert_eq!(unknown, vec![4]);
    }

    #[test]
    fn duplicate_external_rejected() {
        assert!(matches!(
            RenumberMap::new(vec![1u32, 1]),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn concat_requires_adjacent_ranges() {
        let a = RenumberMap::with_first(vec![5u32, 6], 0).unwrap();
        let b = RenumberMap::with_first(vec![1u32], 2).unwrap();
        let full = RenumberMap::concat(&[a.clone(), b]).unwrap();
        assert_eq!(full.as_slice(), &[5, 6, 1]);
        let gap = RenumberMap::with_first(vec![9u32], 4).unwrap();
        assert!(RenumberMap::concat(&[a, gap]).is_err());
    }

    #[test]
    fn renumber_edges_is_dense_and_sorted() {
        let e = EdgeList::<u32, f32>::from_pairs([(100, 7), (7, 42)]);
        let (internal, map) = renumber_edges(&e).unwrap();
        assert_eq!(map.as_slice(), &[7, 42, 100]);
        assert_eq!(internal.srcs(), &[2, 0]);
        assert_eq!(internal.dsts(), &[0, 1]);
        assert!(!map.is_bijection_onto(3));
        assert!(RenumberMap::<u32>::identity(3).unwrap().is_bijection_onto(3));
    }
}
