#![allow(dead_code)]
use graph_reconcile::graph::EdgeList;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Every id in `[0, n)` in a seeded random order.
pub fn shuffled_ids(n: u32, seed: u64) -> Vec<u32> {
    let mut ids: Vec<u32> = (0..n).collect();
    ids.shuffle(&mut SmallRng::seed_from_u64(seed));
    ids
}

/// Same edges in a seeded random order.
pub fn shuffled_edges(e: &EdgeList<u32, f64>, seed: u64) -> EdgeList<u32, f64> {
    let mut triples: Vec<_> = e.iter().collect();
    triples.shuffle(&mut SmallRng::seed_from_u64(seed));
    let mut out = EdgeList::new(Vec::new(), Vec::new(), e.weights().map(|_| Vec::new())).unwrap();
    for (s, d, w) in triples {
        out.push(s, d, w).unwrap();
    }
    out
}

/// Edge multiset as sortable keys.
pub fn edge_keys(triples: impl IntoIterator<Item = (u32, u32, Option<f64>)>) -> Vec<(u32, u32, u64)> {
    let mut keys: Vec<_> = triples
        .into_iter()
        .map(|(s, d, w)| (s, d, w.map_or(0, f64::to_bits)))
        .collect();
    keys.sort_unstable();
    keys
}
