//! The raw allocator boundary.
//!
//! Every byte the workspace owns comes from a [`RawAlloc`]. The default
//! [`System`] allocator forwards to `std::alloc`; tests substitute a
//! fault-injecting allocator to exercise the failure paths.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::AllocError;

/// Alignment of every block handed out by the workspace.
///
/// Elements are type-erased, so the buffer cannot know the alignment the
/// caller needs. 16 bytes matches what `malloc` guarantees on 64-bit
/// targets and covers every primitive type.
pub const ELEMENT_ALIGN: usize = 16;

/// Layout of a block holding `capacity` slots of `element_size` bytes.
///
/// Returns [`AllocError::CapacityOverflow`] if the byte count overflows
/// `usize` or exceeds the maximum layout size.
pub fn slots_layout(capacity: usize, element_size: usize) -> Result<Layout, AllocError> {
    let overflow = AllocError::CapacityOverflow {
        capacity,
        element_size,
    };
    let bytes = capacity.checked_mul(element_size).ok_or(overflow.clone())?;
    Layout::from_size_align(bytes, ELEMENT_ALIGN).map_err(|_| overflow)
}

/// A fallible raw memory allocator.
///
/// All methods report exhaustion with `None` rather than aborting, so the
/// caller can leave its own state untouched.
///
/// # Safety
///
/// Implementors must return blocks that are valid for reads and writes of
/// `layout.size()` bytes and aligned to `layout.align()`, and must accept
/// back in [`reallocate`](RawAlloc::reallocate) and
/// [`release`](RawAlloc::release) exactly the blocks they handed out.
/// Callers never pass zero-sized layouts.
pub unsafe trait RawAlloc {
    /// Allocate an uninitialised block.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Allocate a block whose bytes are all zero.
    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Resize a block, preserving the first `min(old, new_size)` bytes.
    ///
    /// On `None` the original block is untouched and still owned by the
    /// caller.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by this allocator with `layout`, and
    /// `new_size` must be non-zero and form a valid layout with
    /// `layout.align()`.
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Option<NonNull<u8>>;

    /// Return a block to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by this allocator with `layout` and
    /// must not be used afterwards.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The host allocator, via `std::alloc`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

// SAFETY: forwards to the global allocator, which upholds the same contract.
unsafe impl RawAlloc for System {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() > 0);
        // SAFETY: layout has non-zero size per trait contract.
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() > 0);
        // SAFETY: layout has non-zero size per trait contract.
        NonNull::new(unsafe { std::alloc::alloc_zeroed(layout) })
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        NonNull::new(unsafe { std::alloc::realloc(ptr.as_ptr(), layout, new_size) })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_layout_multiplies_and_aligns() {
        let layout = slots_layout(10, 12).unwrap();
        assert_eq!(layout.size(), 120);
        assert_eq!(layout.align(), ELEMENT_ALIGN);
    }

    #[test]
    fn slots_layout_rejects_overflow() {
        assert_eq!(
            slots_layout(usize::MAX, 2),
            Err(AllocError::CapacityOverflow {
                capacity: usize::MAX,
                element_size: 2,
            })
        );
        // Fits in usize but not in isize.
        assert!(slots_layout(usize::MAX / 2 + 1, 1).is_err());
    }

    #[test]
    fn system_zeroed_block_round_trip() {
        let layout = slots_layout(4, 8).unwrap();
        let ptr = System.allocate_zeroed(layout).unwrap();
        // SAFETY: freshly allocated block of layout.size() bytes.
        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), layout.size()) };
        assert!(bytes.iter().all(|&b| b == 0));
        assert_eq!(ptr.as_ptr() as usize % ELEMENT_ALIGN, 0);

        // SAFETY: ptr came from System with this layout.
        let grown = unsafe { System.reallocate(ptr, layout, 64) }.unwrap();
        let grown_layout = Layout::from_size_align(64, ELEMENT_ALIGN).unwrap();
        // SAFETY: first 32 bytes were preserved by reallocate.
        let kept = unsafe { std::slice::from_raw_parts(grown.as_ptr(), 32) };
        assert!(kept.iter().all(|&b| b == 0));
        // SAFETY: grown came from System with grown_layout.
        unsafe { System.release(grown, grown_layout) };
    }
}
