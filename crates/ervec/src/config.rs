//! Vector construction parameters.

use ervec_core::{slots_layout, ConfigError};

/// Configuration for an [`ErasedVec`](crate::ErasedVec).
///
/// Both values are fixed at construction. `element_size` never changes for
/// the lifetime of the vector; `initial_capacity` only changes through
/// growth or an explicit resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VecConfig {
    /// Number of slots allocated (zero-filled) up front.
    ///
    /// Default: 8. Note that a capacity below 2 cannot grow on its own:
    /// the 3/2 growth factor rounds back down to the same value, so such a
    /// vector needs an explicit `resize` before `push` can extend it.
    pub initial_capacity: usize,

    /// Width of one element in bytes. Must be non-zero.
    pub element_size: usize,
}

impl VecConfig {
    /// Default initial capacity.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 8;

    /// Config for `element_size`-byte elements with the default capacity.
    pub fn new(element_size: usize) -> Self {
        Self::with_capacity(Self::DEFAULT_INITIAL_CAPACITY, element_size)
    }

    /// Config with an explicit initial capacity.
    pub fn with_capacity(initial_capacity: usize, element_size: usize) -> Self {
        Self {
            initial_capacity,
            element_size,
        }
    }

    /// Config for a byte vector, the shape the string conversions expect.
    pub fn bytes() -> Self {
        Self::new(1)
    }

    /// Size of the initial buffer in bytes, or `None` on overflow.
    pub fn initial_bytes(&self) -> Option<usize> {
        self.initial_capacity.checked_mul(self.element_size)
    }

    /// Check the structural invariants. Run by every vector constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.element_size == 0 {
            return Err(ConfigError::ZeroElementSize);
        }
        slots_layout(self.initial_capacity, self.element_size).map_err(|_| {
            ConfigError::CapacityOverflow {
                capacity: self.initial_capacity,
                element_size: self.element_size,
            }
        })?;
        Ok(())
    }
}

impl Default for VecConfig {
    fn default() -> Self {
        Self::bytes()
    }
}
