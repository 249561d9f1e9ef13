//! Common bound aliases for the three numeric parameters of a graph.
//!
//! These traits have blanket impls, so any type satisfying the underlying
//! bounds implements them automatically. Vertex ids, edge offsets and weights
//! are chosen independently (e.g. `i32` vertices with `i64` offsets and `f32`
//! weights).

use num_traits::{Float, NumCast, PrimInt};
use std::fmt::Debug;
use std::hash::Hash;

/// Vertex identifier.
///
/// - `PrimInt` so signed widths are representable (negative ids are rejected at
///   the boundary, not by the type)
/// - `Hash` for the inverse renumbering map
/// - `Pod` so ids can be gathered as raw bytes
pub trait VertexLike:
    PrimInt + Hash + Debug + bytemuck::Pod + Send + Sync + 'static
{
}
impl<T> VertexLike for T where T: PrimInt + Hash + Debug + bytemuck::Pod + Send + Sync + 'static {}

/// Edge offset / edge count type used by `offsets`.
pub trait EdgeLike: PrimInt + Debug + bytemuck::Pod + Send + Sync + 'static {}
impl<T> EdgeLike for T where T: PrimInt + Debug + bytemuck::Pod + Send + Sync + 'static {}

/// Edge weight / metric value type.
pub trait WeightLike: Float + Debug + bytemuck::Pod + Send + Sync + 'static {}
impl<T> WeightLike for T where T: Float + Debug + bytemuck::Pod + Send + Sync + 'static {}

/// Convert an id or offset to a slice index; `None` when negative or too wide.
#[inline]
pub fn to_index<T: PrimInt>(v: T) -> Option<usize> {
    v.to_usize()
}

/// Convert a slice index back to an id or offset; `None` on overflow.
#[inline]
pub fn from_index<T: NumCast>(i: usize) -> Option<T> {
    <T as NumCast>::from(i)
}
