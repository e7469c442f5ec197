//! The type-erased growable vector.
//!
//! [`ErasedVec`] stores `capacity` fixed-width slots in one contiguous
//! block, the first `len` of which are live. The vector never looks inside
//! an element: it only copies and moves `element_size`-byte runs.
//!
//! # Failure classes
//!
//! - Allocation failures are recoverable and reported as [`AllocError`]
//!   (or `None`). The vector is unchanged after any failed call.
//! - Contract violations (index out of bounds, element of the wrong
//!   width, string conversion on a non-byte vector) abort the process via
//!   [`fatal`](crate::fatal).
//!
//! # References into the buffer
//!
//! [`get`](ErasedVec::get), [`get_mut`](ErasedVec::get_mut) and
//! [`push`](ErasedVec::push) return slices borrowing the live buffer. The
//! borrow checker keeps them from outliving the next call that may
//! reallocate.

use std::error::Error;
use std::fmt;
use std::ops::Range;

use ervec_core::{slots_layout, AllocError, InitError, RawAlloc, System};

use crate::buffer::{NulTerminated, OwnedBuffer};
use crate::config::VecConfig;
use crate::fatal;
use crate::raw::RawBlock;

/// A growable array of fixed-width, type-erased elements.
///
/// Not safe to share between threads: it is `Send` (when the allocator
/// is) but deliberately not `Sync`.
pub struct ErasedVec<A: RawAlloc = System> {
    block: RawBlock<A>,
    capacity: usize,
    len: usize,
    element_size: usize,
}

impl ErasedVec<System> {
    /// Create a vector of `element_size`-byte elements with room for
    /// `initial_capacity` of them, zero-filled.
    pub fn new(initial_capacity: usize, element_size: usize) -> Result<Self, InitError> {
        Self::with_config(VecConfig::with_capacity(initial_capacity, element_size))
    }

    /// Create a vector from a [`VecConfig`] using the host allocator.
    pub fn with_config(config: VecConfig) -> Result<Self, InitError> {
        Self::new_in(config, System)
    }
}

impl<A: RawAlloc> ErasedVec<A> {
    /// Create a vector backed by `alloc`.
    ///
    /// Fails if the config is invalid or the initial buffer cannot be
    /// allocated; nothing is leaked either way.
    pub fn new_in(config: VecConfig, alloc: A) -> Result<Self, InitError> {
        config.validate()?;
        let layout = slots_layout(config.initial_capacity, config.element_size)?;
        let block = RawBlock::zeroed(layout, alloc)?;
        Ok(Self {
            block,
            capacity: config.initial_capacity,
            len: 0,
            element_size: config.element_size,
        })
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no live elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Width of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// The allocator backing this vector.
    pub fn allocator(&self) -> &A {
        self.block.allocator()
    }

    /// The live elements as one contiguous byte slice
    /// (`len * element_size` bytes).
    pub fn as_bytes(&self) -> &[u8] {
        &self.block.as_slice()[..self.len * self.element_size]
    }

    /// Mutable view of the live elements.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let end = self.len * self.element_size;
        &mut self.block.as_mut_slice()[..end]
    }

    /// Abort the process unless `index < len`.
    #[track_caller]
    pub fn validate_index(&self, index: usize) {
        if index >= self.len {
            fatal::index_out_of_bounds(index, self.len);
        }
    }

    /// Grow the capacity by a factor of 3/2 (rounded down).
    ///
    /// Returns [`AllocError::GrowthStalled`] without touching anything if
    /// that would not increase the capacity or would overflow.
    pub fn grow(&mut self) -> Result<(), AllocError> {
        let stalled = AllocError::GrowthStalled {
            capacity: self.capacity,
        };
        let new_capacity = match self.capacity.checked_mul(3) {
            Some(tripled) => tripled / 2,
            None => return Err(stalled),
        };
        if new_capacity <= self.capacity {
            return Err(stalled);
        }
        self.resize(new_capacity)
    }

    /// Reallocate to exactly `capacity` slots.
    ///
    /// Shrinking below `len` drops the elements at `capacity..len`. On
    /// error nothing changes.
    pub fn resize(&mut self, capacity: usize) -> Result<(), AllocError> {
        let layout = slots_layout(capacity, self.element_size)?;
        self.block.resize(layout)?;
        self.capacity = capacity;
        self.len = self.len.min(capacity);
        Ok(())
    }

    /// Append a copy of `element`, growing first if the vector is full.
    ///
    /// Returns the stored element. If growth fails the element is not
    /// copied and nothing changes. Aborts if `element` is not exactly
    /// `element_size` bytes.
    #[track_caller]
    pub fn push(&mut self, element: &[u8]) -> Result<&mut [u8], AllocError> {
        if element.len() != self.element_size {
            fatal::element_size_mismatch(self.element_size, element.len());
        }
        if self.len == self.capacity {
            self.grow()?;
        }
        let index = self.len;
        self.len += 1;
        let slot = self.slot_mut(index);
        slot.copy_from_slice(element);
        Ok(slot)
    }

    /// Remove the last element and return an independent copy of it.
    ///
    /// `Ok(None)` if the vector is empty. If the copy cannot be allocated
    /// the element stays in place.
    pub fn try_pop(&mut self) -> Result<Option<OwnedBuffer<A>>, AllocError>
    where
        A: Clone,
    {
        let Some(last) = self.len.checked_sub(1) else {
            return Ok(None);
        };
        let alloc = self.block.allocator().clone();
        let copy = OwnedBuffer::copy_of(self.slot(last), alloc)?;
        self.len = last;
        Ok(Some(copy))
    }

    /// Like [`try_pop`](Self::try_pop), folding allocation failure into
    /// `None`.
    pub fn pop(&mut self) -> Option<OwnedBuffer<A>>
    where
        A: Clone,
    {
        self.try_pop().ok().flatten()
    }

    /// The element at `index`. Aborts if out of bounds.
    #[track_caller]
    pub fn get(&self, index: usize) -> &[u8] {
        self.validate_index(index);
        self.slot(index)
    }

    /// Mutable access to the element at `index`. Aborts if out of bounds.
    #[track_caller]
    pub fn get_mut(&mut self, index: usize) -> &mut [u8] {
        self.validate_index(index);
        self.slot_mut(index)
    }

    /// Remove the element at `index`, shifting the tail left so the
    /// remaining elements keep their order. Aborts if out of bounds.
    #[track_caller]
    pub fn remove(&mut self, index: usize) {
        self.validate_index(index);
        let last = self.len - 1;
        if index != last {
            let size = self.element_size;
            let tail = (index + 1) * size..self.len * size;
            self.block.as_mut_slice().copy_within(tail, index * size);
        }
        self.len = last;
    }

    /// Remove the element at `index` by overwriting it with the last one.
    /// Constant time; does not preserve order. Aborts if out of bounds.
    #[track_caller]
    pub fn swap_remove(&mut self, index: usize) {
        self.validate_index(index);
        let last = self.len - 1;
        if index != last {
            let src = self.slot_range(last);
            let dst = index * self.element_size;
            self.block.as_mut_slice().copy_within(src, dst);
        }
        self.len = last;
    }

    /// Forget every element. Capacity and buffer bytes are left as they
    /// are.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Release the buffer. Same as dropping the vector.
    pub fn free(self) {
        drop(self);
    }

    /// Hand over the whole buffer, including unused capacity.
    ///
    /// The buffer is `capacity * element_size` bytes; the live elements
    /// are its first `len * element_size` bytes.
    pub fn detach(self) -> OwnedBuffer<A> {
        let Self { block, .. } = self;
        OwnedBuffer::from_block(block)
    }

    /// Convert a byte vector into a NUL-terminated string.
    ///
    /// The buffer is first resized to exactly `len + 1` bytes; if that
    /// fails the vector is returned untouched inside the error. Aborts if
    /// the elements are not single bytes.
    #[track_caller]
    pub fn into_c_string(mut self) -> Result<NulTerminated<A>, IntoStrError<A>> {
        self.require_bytes();
        let len = self.len;
        if let Err(error) = self.resize(len + 1) {
            return Err(IntoStrError { vec: self, error });
        }
        self.block.as_mut_slice()[len] = 0;
        Ok(NulTerminated::from_buffer(self.detach()))
    }

    /// Copy the live bytes into a fresh NUL-terminated string, leaving the
    /// vector untouched. `None` if the copy cannot be allocated. Aborts if
    /// the elements are not single bytes.
    #[track_caller]
    pub fn clone_c_string(&self) -> Option<NulTerminated<A>>
    where
        A: Clone,
    {
        self.require_bytes();
        let layout = slots_layout(self.len + 1, 1).ok()?;
        let alloc = self.block.allocator().clone();
        let block = RawBlock::copy_from(self.as_bytes(), layout, alloc).ok()?;
        Some(NulTerminated::from_buffer(OwnedBuffer::from_block(block)))
    }

    #[track_caller]
    fn require_bytes(&self) {
        if self.element_size != 1 {
            fatal::not_a_byte_vector(self.element_size);
        }
    }

    fn slot_range(&self, index: usize) -> Range<usize> {
        let start = index * self.element_size;
        start..start + self.element_size
    }

    fn slot(&self, index: usize) -> &[u8] {
        let range = self.slot_range(index);
        &self.block.as_slice()[range]
    }

    fn slot_mut(&mut self, index: usize) -> &mut [u8] {
        let range = self.slot_range(index);
        &mut self.block.as_mut_slice()[range]
    }
}

impl<A: RawAlloc> fmt::Debug for ErasedVec<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedVec")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("element_size", &self.element_size)
            .finish_non_exhaustive()
    }
}

/// A failed [`ErasedVec::into_c_string`], carrying the vector back.
pub struct IntoStrError<A: RawAlloc = System> {
    vec: ErasedVec<A>,
    error: AllocError,
}

impl<A: RawAlloc> IntoStrError<A> {
    /// The allocation failure that stopped the conversion.
    pub fn error(&self) -> &AllocError {
        &self.error
    }

    /// Recover the untouched vector.
    pub fn into_inner(self) -> ErasedVec<A> {
        self.vec
    }
}

impl<A: RawAlloc> fmt::Debug for IntoStrError<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoStrError")
            .field("vec", &self.vec)
            .field("error", &self.error)
            .finish()
    }
}

impl<A: RawAlloc> fmt::Display for IntoStrError<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "string conversion failed: {}", self.error)
    }
}

impl<A: RawAlloc> Error for IntoStrError<A> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}
