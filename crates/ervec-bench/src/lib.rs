//! Workloads and utilities for benchmarking `ervec`.
//!
//! - [`element_pattern`]: deterministic element bytes of any width
//! - [`filled`]: a vector pre-loaded with `n` patterned elements
//! - [`removal_indices`]: a seeded sequence of valid indices for a
//!   shrinking vector

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ervec::{ErasedVec, InitError};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Element widths exercised by the benches: a byte, a word, a small
/// record and a cache line.
pub const ELEMENT_SIZES: [usize; 4] = [1, 8, 24, 64];

/// Bytes of element number `i`, `element_size` long.
pub fn element_pattern(i: usize, element_size: usize) -> Vec<u8> {
    (0..element_size)
        .map(|b| (i.wrapping_mul(31).wrapping_add(b) & 0xff) as u8)
        .collect()
}

/// A vector of `n` patterned elements that started at `initial_capacity`
/// and grew on demand.
pub fn filled(
    n: usize,
    initial_capacity: usize,
    element_size: usize,
) -> Result<ErasedVec, InitError> {
    let mut vec = ErasedVec::new(initial_capacity, element_size)?;
    for i in 0..n {
        vec.push(&element_pattern(i, element_size))?;
    }
    Ok(vec)
}

/// `n` indices for removing every element of an `n`-element vector one at
/// a time: the `k`-th index is below `n - k`.
pub fn removal_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|k| (rng.next_u64() % (n - k) as u64) as usize)
        .collect()
}
