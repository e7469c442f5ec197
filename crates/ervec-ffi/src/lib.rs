//! C FFI bindings for the `ervec` type-erased vector.
//!
//! Exposes an opaque `ErVec` handle and status-code returning functions.
//! Null vector handles and out-of-bounds indices abort, exactly as in the
//! Rust API. Null out-pointers are reported as `InvalidArgument`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run an FFI body, turning a panic into `ErvecStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(code) => code,
            Err(_) => $crate::status::ErvecStatus::Panicked as i32,
        }
    };
}

pub mod buffer;
pub mod status;
pub mod vector;

pub use status::ErvecStatus;
pub use vector::ErVec;
