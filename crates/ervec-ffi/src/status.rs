//! C-compatible status codes.
//!
//! [`ErvecStatus`] is a `repr(i32)` enum covering every recoverable
//! condition of the vector. Contract violations have no status code: they
//! abort. Conversions from the Rust error types are provided.

use ervec::{AllocError, ConfigError, InitError};

/// C-compatible status code returned by the fallible FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErvecStatus {
    /// Success.
    Ok = 0,
    /// An out-pointer or element pointer is null.
    InvalidArgument = -1,
    /// Construction parameters rejected (zero element size, size overflow).
    InvalidConfig = -2,
    /// The allocator refused a request. The vector is unchanged.
    AllocationFailed = -3,
    /// Requested capacity does not fit in memory. The vector is unchanged.
    CapacityOverflow = -4,
    /// Capacity too small (0 or 1) to grow by 3/2. The vector is unchanged.
    GrowthStalled = -5,
    /// Pop on an empty vector.
    Empty = -6,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&AllocError> for ErvecStatus {
    fn from(e: &AllocError) -> Self {
        match e {
            AllocError::OutOfMemory { .. } => ErvecStatus::AllocationFailed,
            AllocError::CapacityOverflow { .. } => ErvecStatus::CapacityOverflow,
            AllocError::GrowthStalled { .. } => ErvecStatus::GrowthStalled,
        }
    }
}

impl From<&ConfigError> for ErvecStatus {
    fn from(_e: &ConfigError) -> Self {
        ErvecStatus::InvalidConfig
    }
}

impl From<&InitError> for ErvecStatus {
    fn from(e: &InitError) -> Self {
        match e {
            InitError::Config(c) => ErvecStatus::from(c),
            InitError::Alloc(a) => ErvecStatus::from(a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_values_are_stable() {
        assert_eq!(ErvecStatus::Ok as i32, 0);
        assert_eq!(ErvecStatus::InvalidArgument as i32, -1);
        assert_eq!(ErvecStatus::InvalidConfig as i32, -2);
        assert_eq!(ErvecStatus::AllocationFailed as i32, -3);
        assert_eq!(ErvecStatus::CapacityOverflow as i32, -4);
        assert_eq!(ErvecStatus::GrowthStalled as i32, -5);
        assert_eq!(ErvecStatus::Empty as i32, -6);
        assert_eq!(ErvecStatus::Panicked as i32, -128);
    }

    #[test]
    fn alloc_error_to_status() {
        assert_eq!(
            ErvecStatus::from(&AllocError::OutOfMemory { bytes: 1 }),
            ErvecStatus::AllocationFailed
        );
        assert_eq!(
            ErvecStatus::from(&AllocError::CapacityOverflow {
                capacity: usize::MAX,
                element_size: 2,
            }),
            ErvecStatus::CapacityOverflow
        );
        assert_eq!(
            ErvecStatus::from(&AllocError::GrowthStalled { capacity: 1 }),
            ErvecStatus::GrowthStalled
        );
    }

    #[test]
    fn init_error_to_status() {
        assert_eq!(
            ErvecStatus::from(&InitError::Config(ConfigError::ZeroElementSize)),
            ErvecStatus::InvalidConfig
        );
        assert_eq!(
            ErvecStatus::from(&InitError::Alloc(AllocError::OutOfMemory { bytes: 8 })),
            ErvecStatus::AllocationFailed
        );
    }
}
