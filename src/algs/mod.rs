//! Re-export public algorithms.

pub mod communicator;
pub mod equivalence;
pub mod gather;
pub mod partition;
pub mod renumber;
pub mod wire;

pub use equivalence::{
    Tolerance, ValidationMode, compare_graphs, compare_vectors, equal_graphs, equal_vectors,
};
pub use gather::{GatherPolicy, broadcast, gather_pairs, gatherv};
pub use partition::{
    LocalPartition, VertexPartition, assemble_reference_graph, distribute_edges,
    split_edges_by_major,
};
pub use renumber::{InverseMap, RenumberMap, renumber_edges, split_known, to_external, to_internal};
