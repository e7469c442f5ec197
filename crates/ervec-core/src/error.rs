//! Error types for the ervec workspace.
//!
//! Only recoverable conditions live here. Contract violations (an
//! out-of-bounds index, a null handle, an element of the wrong width) are
//! not errors: they are reported on stderr and abort the process, see
//! `ervec::fatal`.

use std::error::Error;
use std::fmt;

/// Recoverable allocation failures.
///
/// Any mutating operation that returns one of these leaves the vector
/// exactly as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The allocator refused to hand out (or resize to) `bytes` bytes.
    OutOfMemory {
        /// Size of the block that was requested.
        bytes: usize,
    },
    /// `capacity * element_size` does not fit in a valid allocation layout.
    CapacityOverflow {
        /// Number of slots that was requested.
        capacity: usize,
        /// Width of one slot in bytes.
        element_size: usize,
    },
    /// Applying the 3/2 growth factor would not increase the capacity
    /// (capacity 0 or 1), or the multiplication overflowed.
    GrowthStalled {
        /// Capacity at the time of the refused growth.
        capacity: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { bytes } => {
                write!(f, "allocator failed to provide {bytes} bytes")
            }
            Self::CapacityOverflow {
                capacity,
                element_size,
            } => {
                write!(
                    f,
                    "capacity overflow: {capacity} slots of {element_size} bytes"
                )
            }
            Self::GrowthStalled { capacity } => {
                write!(f, "cannot grow beyond capacity {capacity}")
            }
        }
    }
}

impl Error for AllocError {}

/// Invalid construction parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Elements must be at least one byte wide.
    ZeroElementSize,
    /// The initial buffer size overflows a valid allocation layout.
    CapacityOverflow {
        /// Requested initial capacity.
        capacity: usize,
        /// Requested element size.
        element_size: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroElementSize => write!(f, "element size must be non-zero"),
            Self::CapacityOverflow {
                capacity,
                element_size,
            } => write!(
                f,
                "initial capacity {capacity} x {element_size} bytes overflows"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Errors from vector construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitError {
    /// The configuration failed validation.
    Config(ConfigError),
    /// The initial buffer could not be allocated.
    Alloc(AllocError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid vector config: {e}"),
            Self::Alloc(e) => write!(f, "vector allocation failed: {e}"),
        }
    }
}

impl Error for InitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Alloc(e) => Some(e),
        }
    }
}

impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<AllocError> for InitError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_sizes() {
        let e = AllocError::CapacityOverflow {
            capacity: 10,
            element_size: 4,
        };
        assert_eq!(e.to_string(), "capacity overflow: 10 slots of 4 bytes");
        assert_eq!(
            AllocError::OutOfMemory { bytes: 64 }.to_string(),
            "allocator failed to provide 64 bytes"
        );
    }

    #[test]
    fn init_error_exposes_source() {
        let e = InitError::from(AllocError::GrowthStalled { capacity: 1 });
        let source = e.source().expect("alloc variant has a source");
        assert_eq!(source.to_string(), "cannot grow beyond capacity 1");

        let e = InitError::from(ConfigError::ZeroElementSize);
        assert!(e.to_string().starts_with("invalid vector config"));
    }
}
