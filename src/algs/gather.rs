//! Collectives over a [`Communicator`]: variable-length gather and broadcast.
//!
//! Both run in two stages on distinct tags, like the completion exchanges:
//! 1. each sender announces its element count,
//! 2. the payload follows as raw `Pod` bytes.
//!
//! The gathered vector is the per-rank contributions concatenated in rank
//! order. Nothing here keys values by vertex; callers that need that pair each
//! value with its external id first (see [`gather_pairs`]).
//!
//! Liveness: with [`GatherPolicy::Unbounded`] a rank that never contributes
//! blocks the coordinator forever. [`GatherPolicy::Bounded`] turns that into
//! [`GraphError::CollectiveTimeout`] on backends that support timed waits.
//! The bound covers the whole collective: one deadline is fixed when the
//! receiving side starts and every peer shares it.

use std::time::{Duration, Instant};

use bytemuck::Pod;
use serde::{Deserialize, Serialize};

use crate::algs::communicator::{CommTag, Communicator, TimedOut, Wait};
use crate::algs::wire::{WireCount, cast_slice, decode_vec};
use crate::graph_error::GraphError;

/// Total time the receiving side of one collective may wait, across all peers.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum GatherPolicy {
    #[default]
    Unbounded,
    Bounded(Duration),
}

impl GatherPolicy {
    fn deadline(self) -> Option<(Instant, Duration)> {
        match self {
            GatherPolicy::Unbounded => None,
            GatherPolicy::Bounded(d) => Some((Instant::now() + d, d)),
        }
    }
}

/// Default base tag for gathers; each collective uses `tag` and `tag + 1`.
pub const GATHER_TAG: CommTag = CommTag::new(0x6A70);
/// Default base tag for broadcasts.
pub const BROADCAST_TAG: CommTag = CommTag::new(0x6B70);

fn check_root<C: Communicator>(comm: &C, root: usize) -> Result<(), GraphError> {
    if root < comm.size() {
        Ok(())
    } else {
        Err(GraphError::InvalidInput(format!(
            "coordinator rank {root} out of range for {} ranks",
            comm.size()
        )))
    }
}

fn receive<H: Wait>(
    handle: H,
    peer: usize,
    deadline: Option<(Instant, Duration)>,
) -> Result<Vec<u8>, GraphError> {
    let got = match deadline {
        None => handle.wait(),
        Some((at, waited)) => handle
            .wait_until(at)
            .map_err(|TimedOut| GraphError::CollectiveTimeout { peer, waited })?,
    };
    got.ok_or_else(|| GraphError::CommError {
        peer,
        reason: "no data received".into(),
    })
}

fn send_counted<C: Communicator, T: Pod>(comm: &C, peer: usize, tag: CommTag, values: &[T]) {
    let sends = [
        comm.isend(peer, tag, &WireCount::new(values.len()).to_bytes()),
        comm.isend(peer, tag.offset(1), cast_slice(values)),
    ];
    for s in sends {
        let _ = s.wait();
    }
}

fn receive_counted<C: Communicator, T: Pod>(
    comm: &C,
    peer: usize,
    tag: CommTag,
    deadline: Option<(Instant, Duration)>,
) -> Result<Vec<T>, GraphError> {
    let header = receive(
        comm.irecv(peer, tag, std::mem::size_of::<WireCount>()),
        peer,
        deadline,
    )?;
    let count = WireCount::from_bytes(&header)
        .map_err(|reason| GraphError::CommError { peer, reason })?
        .get();
    let bytes = receive(
        comm.irecv(peer, tag.offset(1), count * std::mem::size_of::<T>()),
        peer,
        deadline,
    )?;
    decode_vec(&bytes, count).map_err(|reason| GraphError::CommError { peer, reason })
}

/// Gather every rank's `local` slice at `root`.
///
/// Returns the concatenation in rank order at `root` and an empty vector
/// elsewhere. Collective: every rank must call it with the same `root`/`tag`.
pub fn gatherv<C, T>(
    comm: &C,
    local: &[T],
    root: usize,
    tag: CommTag,
    policy: GatherPolicy,
) -> Result<Vec<T>, GraphError>
where
    C: Communicator,
    T: Pod,
{
    check_root(comm, root)?;
    let me = comm.rank();
    if me != root {
        send_counted(comm, root, tag, local);
        return Ok(Vec::new());
    }

    let deadline = policy.deadline();
    let mut out = Vec::new();
    for peer in 0..comm.size() {
        if peer == me {
            out.extend_from_slice(local);
        } else {
            let part: Vec<T> = receive_counted(comm, peer, tag, deadline)?;
            log::debug!("gather: {} element(s) from rank {peer}", part.len());
            out.extend(part);
        }
    }
    Ok(out)
}

/// Gather `(key, value)` pairs at `root`, preserving the pairing per rank.
pub fn gather_pairs<C, K, V>(
    comm: &C,
    keys: &[K],
    values: &[V],
    root: usize,
    tag: CommTag,
    policy: GatherPolicy,
) -> Result<Vec<(K, V)>, GraphError>
where
    C: Communicator,
    K: Pod,
    V: Pod,
{
    if keys.len() != values.len() {
        return Err(GraphError::InvalidInput(format!(
            "{} keys but {} values",
            keys.len(),
            values.len()
        )));
    }
    let keys = gatherv(comm, keys, root, tag, policy)?;
    let values = gatherv(comm, values, root, tag.offset(2), policy)?;
    if keys.len() != values.len() {
        return Err(GraphError::CommError {
            peer: root,
            reason: format!("gathered {} keys but {} values", keys.len(), values.len()),
        });
    }
    Ok(keys.into_iter().zip(values).collect())
}

/// Send `root`'s `values` to every rank; every rank returns the root's data.
pub fn broadcast<C, T>(
    comm: &C,
    values: &[T],
    root: usize,
    tag: CommTag,
    policy: GatherPolicy,
) -> Result<Vec<T>, GraphError>
where
    C: Communicator,
    T: Pod,
{
    check_root(comm, root)?;
    if comm.rank() == root {
        for peer in (0..comm.size()).filter(|&p| p != root) {
            send_counted(comm, peer, tag, values);
        }
        Ok(values.to_vec())
    } else {
        receive_counted(comm, root, tag, policy.deadline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, ThreadUniverse};

    #[test]
    fn single_rank_gather_is_identity() {
        let out = gatherv(&NoComm, &[3u32, 1, 2], 0, GATHER_TAG, GatherPolicy::Unbounded).unwrap();
        assert_eq!(out, vec![3, 1, 2]);
    }

    #[test]
    fn gather_concatenates_in_rank_order() {
        let out = ThreadUniverse::run(3, |comm| {
            let local: Vec<u64> = (0..comm.rank() as u64 + 1).map(|i| 10 * comm.rank() as u64 + i).collect();
            gatherv(&comm, &local, 1, GATHER_TAG, GatherPolicy::Unbounded).unwrap()
        });
        assert!(out[0].is_empty());
        assert_eq!(out[1], vec![0, 10, 11, 20, 21, 22]);
        assert!(out[2].is_empty());
    }

    #[test]
    fn broadcast_reaches_every_rank() {
        let out = ThreadUniverse::run(3, |comm| {
            let mine = if comm.rank() == 0 { vec![0.5f32, 1.5] } else { Vec::new() };
            broadcast(&comm, &mine, 0, BROADCAST_TAG, GatherPolicy::Unbounded).unwrap()
        });
        assert!(out.iter().all(|v| v == &vec![0.5f32, 1.5]));
    }

    #[test]
    fn pairs_stay_paired() {
        let out = ThreadUniverse::run(2, |comm| {
            let r = comm.rank() as u32;
            gather_pairs(&comm, &[r, r + 10], &[r as f64, r as f64 + 0.5], 0, GATHER_TAG, GatherPolicy::Unbounded)
                .unwrap()
        });
        assert_eq!(out[0], vec![(0, 0.0), (10, 0.5), (1, 1.0), (11, 1.5)]);
    }

    #[test]
    fn bad_root_rejected() {
        let err = gatherv(&NoComm, &[1u8], 2, GATHER_TAG, GatherPolicy::Unbounded).unwrap_err();
        assert!(matches!(err, GraphError::InvalidInput(_)));
    }
}
