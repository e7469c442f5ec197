//! Low-level owned memory block.
//!
//! [`RawBlock`] is the only place in this crate that touches raw pointers.
//! Everything above it works on byte slices. Every byte of a live block is
//! initialised: fresh blocks are zero-filled and growth zero-fills the new
//! tail, so handing out `&[u8]` over the whole block is always sound.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

use ervec_core::{AllocError, RawAlloc, ELEMENT_ALIGN};

/// An exclusively owned, fully initialised block of bytes.
///
/// Zero-sized blocks never reach the allocator; they hold a dangling
/// pointer instead.
pub(crate) struct RawBlock<A: RawAlloc> {
    ptr: NonNull<u8>,
    size: usize,
    alloc: A,
}

// SAFETY: the block is uniquely owned, like a `Vec<u8>`.
unsafe impl<A: RawAlloc + Send> Send for RawBlock<A> {}

impl<A: RawAlloc> RawBlock<A> {
    /// Allocate a zero-filled block of `layout.size()` bytes.
    pub fn zeroed(layout: Layout, alloc: A) -> Result<Self, AllocError> {
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            alloc
                .allocate_zeroed(layout)
                .ok_or(AllocError::OutOfMemory {
                    bytes: layout.size(),
                })?
        };
        Ok(Self {
            ptr,
            size: layout.size(),
            alloc,
        })
    }

    /// Allocate a block of `layout.size()` bytes starting with a copy of
    /// `src`; any remaining bytes are zero.
    pub fn copy_from(src: &[u8], layout: Layout, alloc: A) -> Result<Self, AllocError> {
        debug_assert!(src.len() <= layout.size());
        if layout.size() == 0 {
            return Self::zeroed(layout, alloc);
        }
        let ptr = alloc.allocate(layout).ok_or(AllocError::OutOfMemory {
            bytes: layout.size(),
        })?;
        // SAFETY: ptr is valid for layout.size() >= src.len() bytes and
        // cannot overlap src, which lives in some other allocation.
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr(), src.len());
            ptr.as_ptr()
                .add(src.len())
                .write_bytes(0, layout.size() - src.len());
        }
        Ok(Self {
            ptr,
            size: layout.size(),
            alloc,
        })
    }

    /// Resize to `layout.size()` bytes, preserving the common prefix.
    ///
    /// On error the block is untouched: same pointer, same size, same
    /// contents.
    pub fn resize(&mut self, layout: Layout) -> Result<(), AllocError> {
        let new_size = layout.size();
        if new_size == self.size {
            return Ok(());
        }

        let ptr = if self.size == 0 {
            self.alloc
                .allocate_zeroed(layout)
                .ok_or(AllocError::OutOfMemory { bytes: new_size })?
        } else if new_size == 0 {
            // SAFETY: the block is non-empty, so it came from self.alloc
            // with self.layout().
            unsafe { self.alloc.release(self.ptr, self.layout()) };
            NonNull::dangling()
        } else {
            // SAFETY: the block came from self.alloc with self.layout();
            // new_size is non-zero and forms a valid layout (checked by the
            // caller when building `layout`).
            let ptr = unsafe { self.alloc.reallocate(self.ptr, self.layout(), new_size) }
                .ok_or(AllocError::OutOfMemory { bytes: new_size })?;
            if new_size > self.size {
                // SAFETY: bytes [size, new_size) belong to the new block.
                unsafe {
                    ptr.as_ptr()
                        .add(self.size)
                        .write_bytes(0, new_size - self.size)
                };
            }
            ptr
        };

        self.ptr = ptr;
        self.size = new_size;
        Ok(())
    }

    /// Size of the block in bytes.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid and initialised for size bytes (or dangling
        // with size 0), and we hold the only reference to the block.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, plus &mut self guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Give up ownership without releasing the memory.
    pub fn into_raw_parts(self) -> (NonNull<u8>, usize, A) {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so reading the allocator out
        // moves it exactly once.
        let alloc = unsafe { std::ptr::read(&this.alloc) };
        (this.ptr, this.size, alloc)
    }

    /// Rebuild a block from [`into_raw_parts`](Self::into_raw_parts).
    ///
    /// # Safety
    ///
    /// `ptr` and `size` must come from `into_raw_parts` on a block that
    /// used `alloc` (or an allocator that shares its heap), and must not
    /// have been rebuilt already.
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, size: usize, alloc: A) -> Self {
        Self { ptr, size, alloc }
    }

    fn layout(&self) -> Layout {
        // SAFETY: size was accepted by Layout::from_size_align when the
        // block was created or last resized.
        unsafe { Layout::from_size_align_unchecked(self.size, ELEMENT_ALIGN) }
    }
}

impl<A: RawAlloc> Drop for RawBlock<A> {
    fn drop(&mut self) {
        if self.size > 0 {
            // SAFETY: a non-empty block always came from self.alloc with
            // self.layout().
            unsafe { self.alloc.release(self.ptr, self.layout()) };
        }
    }
}
