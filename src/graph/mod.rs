//! Edge lists, the compressed adjacency builder, and the immutable container.

pub mod bounds;
pub mod compressed;
pub mod container;
pub mod edge_list;

pub use bounds::{EdgeLike, VertexLike, WeightLike};
pub use compressed::{Compressed, Orientation, build_compressed};
pub use container::{Graph, GraphMeta, GraphProperties, GraphView, verify_symmetry};
pub use edge_list::EdgeList;
