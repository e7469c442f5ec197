//! Owned byte buffers handed out by the vector.
//!
//! [`OwnedBuffer`] is what a detached vector or a popped element becomes:
//! memory the caller now owns, released on drop. [`NulTerminated`] is the
//! result of the string conversions and guarantees a trailing zero byte.

#![allow(unsafe_code)]

use std::ffi::CStr;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use ervec_core::{slots_layout, AllocError, RawAlloc, System};

use crate::raw::RawBlock;

/// An owned block of bytes, released through its allocator on drop.
pub struct OwnedBuffer<A: RawAlloc = System> {
    block: RawBlock<A>,
}

impl<A: RawAlloc> OwnedBuffer<A> {
    pub(crate) fn from_block(block: RawBlock<A>) -> Self {
        Self { block }
    }

    /// Allocate a fresh buffer holding a copy of `bytes`.
    pub fn copy_of(bytes: &[u8], alloc: A) -> Result<Self, AllocError> {
        let layout = slots_layout(bytes.len(), 1)?;
        RawBlock::copy_from(bytes, layout, alloc).map(Self::from_block)
    }

    /// Size of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.block.len() == 0
    }

    /// The allocator that will release this buffer.
    pub fn allocator(&self) -> &A {
        self.block.allocator()
    }

    /// Give up ownership of the memory without releasing it.
    ///
    /// The pointer is aligned to [`ELEMENT_ALIGN`](ervec_core::ELEMENT_ALIGN).
    /// Hand the parts back to [`from_raw_parts`](Self::from_raw_parts) to
    /// release them.
    pub fn into_raw_parts(self) -> (NonNull<u8>, usize, A) {
        self.block.into_raw_parts()
    }

    /// Reclaim a buffer from [`into_raw_parts`](Self::into_raw_parts).
    ///
    /// # Safety
    ///
    /// The parts must come from `into_raw_parts` on a buffer backed by the
    /// same heap as `alloc`, and each set of parts may be reclaimed once.
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize, alloc: A) -> Self {
        // SAFETY: forwarded caller contract.
        Self::from_block(unsafe { RawBlock::from_raw_parts(ptr, len, alloc) })
    }
}

impl<A: RawAlloc> Deref for OwnedBuffer<A> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.block.as_slice()
    }
}

impl<A: RawAlloc> DerefMut for OwnedBuffer<A> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.block.as_mut_slice()
    }
}

impl<A: RawAlloc> AsRef<[u8]> for OwnedBuffer<A> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl<A: RawAlloc> fmt::Debug for OwnedBuffer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedBuffer").field(&&**self).finish()
    }
}

/// An owned byte string ending in exactly one appended zero byte.
///
/// The bytes before the terminator are whatever the vector held, so they
/// may themselves contain zeros; [`as_c_str`](Self::as_c_str) stops at the
/// first one.
pub struct NulTerminated<A: RawAlloc = System> {
    buf: OwnedBuffer<A>,
}

impl<A: RawAlloc> NulTerminated<A> {
    /// Wrap a buffer whose last byte is the terminator.
    pub(crate) fn from_buffer(buf: OwnedBuffer<A>) -> Self {
        debug_assert_eq!(buf.last(), Some(&0));
        Self { buf }
    }

    /// Number of bytes before the terminator.
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    /// Whether there are no bytes before the terminator.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bytes without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// The bytes including the terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf
    }

    /// View as a C string, up to the first zero byte.
    pub fn as_c_str(&self) -> &CStr {
        match CStr::from_bytes_until_nul(&self.buf) {
            Ok(s) => s,
            // The final byte is always zero.
            Err(_) => unreachable!("NulTerminated lost its terminator"),
        }
    }

    /// Unwrap into the underlying buffer (terminator included).
    pub fn into_buffer(self) -> OwnedBuffer<A> {
        self.buf
    }
}

impl<A: RawAlloc> fmt::Debug for NulTerminated<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NulTerminated")
            .field(&String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_of_is_independent() {
        let mut src = [1u8, 2, 3];
        let buf = OwnedBuffer::copy_of(&src, System).unwrap();
        src[0] = 9;
        assert_eq!(src[0], 9);
        assert_eq!(&*buf, &[1, 2, 3]);
    }

    #[test]
    fn empty_copy() {
        let buf = OwnedBuffer::copy_of(&[], System).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn nul_terminated_views() {
        let buf = OwnedBuffer::copy_of(b"hi\0there\0", System).unwrap();
        let s = NulTerminated::from_buffer(buf);
        assert_eq!(s.len(), 8);
        assert_eq!(s.as_bytes(), b"hi\0there");
        assert_eq!(s.as_bytes_with_nul(), b"hi\0there\0");
        assert_eq!(s.as_c_str().to_bytes(), b"hi");
        assert_eq!(s.into_buffer().len(), 9);
    }

    #[test]
    fn buffer_raw_parts_round_trip() {
        let buf = OwnedBuffer::copy_of(b"xyz", System).unwrap();
        let (ptr, len, alloc) = buf.into_raw_parts();
        assert_eq!(ptr.as_ptr() as usize % ervec_core::ELEMENT_ALIGN, 0);
        // SAFETY: parts come straight from into_raw_parts.
        let buf = unsafe { OwnedBuffer::from_raw_parts(ptr, len, alloc) };
        assert_eq!(&*buf, b"xyz");
    }
}
