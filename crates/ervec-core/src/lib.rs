//! Core types for the ervec workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! allocator boundary ([`RawAlloc`], [`System`]) and the recoverable error
//! types shared by the vector, the C ABI and the test utilities.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod alloc;
pub mod error;

pub use alloc::{slots_layout, RawAlloc, System, ELEMENT_ALIGN};
pub use error::{AllocError, ConfigError, InitError};
