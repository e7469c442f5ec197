//! Contract-violation reporting.
//!
//! An out-of-bounds index, a null handle or an element of the wrong width
//! means the caller has a bug. These are never turned into `Result`s: the
//! violation is printed to stderr and the process aborts without unwinding.

use std::fmt;
use std::panic::Location;

#[cold]
#[inline(never)]
fn abort_with(args: fmt::Arguments<'_>, location: &Location<'_>) -> ! {
    eprintln!("ervec: {args} (at {location})");
    std::process::abort()
}

/// Abort because `index` is not below the live length `len`.
#[cold]
#[track_caller]
pub fn index_out_of_bounds(index: usize, len: usize) -> ! {
    abort_with(
        format_args!("index out of bounds: {index} (len {len})"),
        Location::caller(),
    )
}

/// Abort because an element of `actual` bytes was handed to a vector of
/// `expected`-byte elements.
#[cold]
#[track_caller]
pub fn element_size_mismatch(expected: usize, actual: usize) -> ! {
    abort_with(
        format_args!("element size mismatch: vector holds {expected}-byte elements, got {actual} bytes"),
        Location::caller(),
    )
}

/// Abort because a string conversion was requested on a vector whose
/// elements are not single bytes.
#[cold]
#[track_caller]
pub fn not_a_byte_vector(element_size: usize) -> ! {
    abort_with(
        format_args!("string conversion needs 1-byte elements, vector holds {element_size}-byte elements"),
        Location::caller(),
    )
}

/// Abort because `operation` was handed a null vector handle.
#[cold]
#[track_caller]
pub fn null_handle(operation: &str) -> ! {
    abort_with(
        format_args!("{operation}: trying to use a null vector handle"),
        Location::caller(),
    )
}
