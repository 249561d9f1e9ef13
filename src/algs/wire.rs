//! Wire helpers for collective payloads.
//!
//! Size headers are fixed-layout little-endian records. Payloads are raw `Pod`
//! slices in host byte order; all ranks of one run are assumed to share it.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Element count announced before a payload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u64,
}

const_assert_eq!(size_of::<WireCount>(), 8);

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u64).to_le(),
        }
    }

    pub fn get(&self) -> usize {
        u64::from_le(self.n_le) as usize
    }

    pub fn to_bytes(self) -> [u8; size_of::<WireCount>()] {
        bytemuck::cast(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, String> {
        expect_exact_len(data.len(), size_of::<WireCount>())?;
        let mut out = WireCount::zeroed();
        bytemuck::bytes_of_mut(&mut out).copy_from_slice(data);
        Ok(out)
    }
}

/// Decode `count` elements of `T` from an unaligned byte buffer.
pub fn decode_vec<T: Pod>(data: &[u8], count: usize) -> Result<Vec<T>, String> {
    expect_exact_len(data.len(), count * size_of::<T>())?;
    let mut out = vec![T::zeroed(); count];
    bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(data);
    Ok(out)
}
