//! A type-erased growable vector.
//!
//! [`ErasedVec`] holds elements of a fixed, caller-declared byte width in a
//! single contiguous buffer that grows by a factor of 3/2 when full. It
//! never interprets element bytes; callers decide what they mean.
//!
//! # Layout
//!
//! ```text
//! ErasedVec
//! ├── RawBlock (capacity * element_size bytes, zero-filled on allocation)
//! │   ├── slots 0..len        live elements
//! │   └── slots len..capacity unspecified (stale or zero)
//! └── A: RawAlloc (System by default)
//! ```
//!
//! # Exits
//!
//! - Drop (or [`ErasedVec::free`]) releases the buffer.
//! - [`ErasedVec::detach`] hands the whole buffer over as an [`OwnedBuffer`].
//! - [`ErasedVec::into_c_string`] trims a byte vector to `len + 1` bytes,
//!   appends a zero byte and hands it over as a [`NulTerminated`].
//!
//! Contract violations abort the process (see [`fatal`]); allocation
//! failures are returned as [`AllocError`] and leave the vector unchanged.
//!
//! `unsafe` is confined to `raw.rs` and the raw-parts constructors in
//! `buffer.rs`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod fatal;
mod raw;
pub mod vector;

// Public re-exports for the primary API surface.
pub use buffer::{NulTerminated, OwnedBuffer};
pub use config::VecConfig;
pub use ervec_core::{AllocError, ConfigError, InitError, RawAlloc, System, ELEMENT_ALIGN};
pub use vector::{ErasedVec, IntoStrError};
