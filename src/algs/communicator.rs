//! Thin façade over in-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are contiguous byte slices. Sends are fire-and-forget; receives
//! return a handle that must be `.wait()`ed before the payload is available.
//! Collectives built on top live in [`crate::algs::gather`].
//!
//! There is no process-wide mailbox: the in-process backend's state is owned by
//! a [`ThreadUniverse`] that the driver creates and drops explicitly.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Barrier};
use std::time::Instant;

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};

/// Typed message tag.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CommTag(u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Derived tag for a later stage of the same collective.
    pub const fn offset(self, by: u16) -> Self {
        Self(self.0.wrapping_add(by))
    }
}

/// Marker returned when a bounded wait expires.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimedOut;

/// Anything that can be waited on.
pub trait Wait: Sized {
    /// Block until completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;

    /// Block until completion or `deadline`.
    ///
    /// Backends that cannot time out ignore the deadline and block.
    fn wait_until(self, deadline: Instant) -> Result<Option<Vec<u8>>, TimedOut> {
        let _ = deadline;
        Ok(self.wait())
    }
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Point-to-point communication plus a barrier over a fixed set of ranks.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of `len` bytes from `peer`.
    fn irecv(&self, peer: usize, tag: CommTag, len: usize) -> Self::RecvHandle;
    /// Block until every rank has entered the barrier.
    fn barrier(&self);
}

/// Single-rank communicator for purely serial runs.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: CommTag, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: CommTag, _len: usize) {}
    fn barrier(&self) {}
}

// --- ThreadComm: intra-process / one thread per rank ---

type Key = (usize, usize, u16); // (src, dst, tag)

/// Shared state for a group of in-process ranks.
#[derive(Debug)]
pub struct ThreadUniverse {
    size: usize,
    mailbox: Mutex<HashMap<Key, VecDeque<Bytes>>>,
    arrived: Condvar,
    barrier: Barrier,
}

impl ThreadUniverse {
    pub fn new(size: usize) -> Arc<Self> {
        Arc::new(Self {
            size,
            mailbox: Mutex::new(HashMap::new()),
            arrived: Condvar::new(),
            barrier: Barrier::new(size),
        })
    }

    /// Communicator handle for `rank`.
    pub fn comm(self: &Arc<Self>, rank: usize) -> ThreadComm {
        ThreadComm {
            universe: Arc::clone(self),
            rank,
        }
    }

    /// Run `f` once per rank on its own thread and collect results in rank order.
    ///
    /// A panic on any rank is re-raised on the caller.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(ThreadComm) -> R + Sync,
    {
        let universe = Self::new(size);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..size)
                .map(|rank| {
                    let comm = universe.comm(rank);
                    let f = &f;
                    scope.spawn(move || f(comm))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    }

    /// Messages posted but never received; non-zero after a run means a
    /// protocol mismatch.
    pub fn pending_messages(&self) -> usize {
        self.mailbox.lock().values().map(VecDeque::len).sum()
    }
}

#[derive(Clone, Debug)]
pub struct ThreadComm {
    universe: Arc<ThreadUniverse>,
    rank: usize,
}

/// Pending receive on a [`ThreadComm`].
pub struct ThreadRecv {
    universe: Arc<ThreadUniverse>,
    key: Key,
}

impl ThreadRecv {
    fn take(&self, queue: &mut HashMap<Key, VecDeque<Bytes>>) -> Option<Vec<u8>> {
        let q = queue.get_mut(&self.key)?;
        let msg = q.pop_front()?;
        if q.is_empty() {
            queue.remove(&self.key);
        }
        Some(msg.to_vec())
    }
}

impl Wait for ThreadRecv {
    fn wait(self) -> Option<Vec<u8>> {
        let mut guard = self.universe.mailbox.lock();
        loop {
            if let Some(msg) = self.take(&mut guard) {
                return Some(msg);
            }
            self.universe.arrived.wait(&mut guard);
        }
    }

    fn wait_until(self, deadline: Instant) -> Result<Option<Vec<u8>>, TimedOut> {
        let mut guard = self.universe.mailbox.lock();
        loop {
            if let Some(msg) = self.take(&mut guard) {
                return Ok(Some(msg));
            }
            if self
                .universe
                .arrived
                .wait_until(&mut guard, deadline)
                .timed_out()
            {
                return self.take(&mut guard).map(Some).ok_or(TimedOut);
            }
        }
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ();
    type RecvHandle = ThreadRecv;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.universe.size
    }

    fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) {
        let key = (self.rank, peer, tag.as_u16());
        self.universe
            .mailbox
            .lock()
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        self.universe.arrived.notify_all();
    }

    fn irecv(&self, peer: usize, tag: CommTag, _len: usize) -> ThreadRecv {
        ThreadRecv {
            universe: Arc::clone(&self.universe),
            key: (peer, self.rank, tag.as_u16()),
        }
    }

    fn barrier(&self) {
        self.universe.barrier.wait();
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{CommTag, Communicator, Wait};
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{
        Communicator as _, CommunicatorCollectives as _, Destination as _, Source as _,
    };

    /// MPI world communicator. Point-to-point calls are blocking; receives
    /// complete before `irecv` returns, so `wait_until` cannot time out.
    pub struct MpiComm {
        _universe: Universe,
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        /// Initialise MPI. Returns `None` if MPI was already initialised.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = usize::try_from(world.rank()).ok()?;
            let size = usize::try_from(world.size()).ok()?;
            Some(Self {
                _universe: universe,
                world,
                rank,
                size,
            })
        }

        fn mpi_rank(peer: usize) -> mpi::Rank {
            mpi::Rank::try_from(peer).unwrap_or(mpi::Rank::MAX)
        }
    }

    pub struct MpiHandle(Option<Vec<u8>>);

    impl Wait for MpiHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.0
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = ();
        type RecvHandle = MpiHandle;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) {
            self.world
                .process_at_rank(Self::mpi_rank(peer))
                .send_with_tag(buf, mpi::Tag::from(tag.as_u16()));
        }

        fn irecv(&self, peer: usize, tag: CommTag, _len: usize) -> MpiHandle {
            let (data, _status) = self
                .world
                .process_at_rank(Self::mpi_rank(peer))
                .receive_vec_with_tag::<u8>(mpi::Tag::from(tag.as_u16()));
            MpiHandle(Some(data))
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
