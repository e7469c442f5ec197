//! Vector lifecycle and element FFI.
//!
//! An `ErVec*` owns one [`ErasedVec`]. Terminating calls (`ervec_free`,
//! `ervec_leak`, a successful `ervec_to_str`) take the handle by
//! `ErVec**` and null it, so a dangling handle cannot be reused by
//! accident.

use std::alloc::{self, Layout};
use std::ffi::{c_char, c_void};
use std::ptr;

use ervec::{fatal, ErasedVec};

use crate::buffer::hand_out;
use crate::status::ErvecStatus;

/// Opaque vector handle.
pub struct ErVec {
    inner: ErasedVec,
}

/// Move `inner` into a heap control block. `None` if the control block
/// cannot be allocated; `inner` is dropped in that case.
#[allow(unsafe_code)]
fn box_vec(inner: ErasedVec) -> Option<*mut ErVec> {
    let layout = Layout::new::<ErVec>();
    // SAFETY: ErVec holds a pointer and sizes, so the layout is non-zero.
    let raw = unsafe { alloc::alloc(layout) }.cast::<ErVec>();
    if raw.is_null() {
        return None;
    }
    // SAFETY: raw is fresh, aligned and sized for ErVec.
    unsafe { raw.write(ErVec { inner }) };
    Some(raw)
}

/// Take the control block behind `*handle` and null the handle.
#[allow(unsafe_code)]
#[track_caller]
fn take_raw(handle: *mut *mut ErVec, operation: &str) -> *mut ErVec {
    if handle.is_null() {
        fatal::null_handle(operation);
    }
    // SAFETY: handle is non-null and valid per caller contract.
    let raw = unsafe { handle.replace(ptr::null_mut()) };
    if raw.is_null() {
        fatal::null_handle(operation);
    }
    raw
}

/// Take ownership of the vector behind `*handle` and null the handle.
#[allow(unsafe_code)]
#[track_caller]
fn take(handle: *mut *mut ErVec, operation: &str) -> Box<ErVec> {
    let raw = take_raw(handle, operation);
    // SAFETY: raw came from box_vec, whose layout matches Box<ErVec>.
    unsafe { Box::from_raw(raw) }
}

#[allow(unsafe_code)]
#[track_caller]
fn vec_ref<'a>(vec: *const ErVec, operation: &str) -> &'a ErasedVec {
    if vec.is_null() {
        fatal::null_handle(operation);
    }
    // SAFETY: vec is non-null and live per caller contract.
    unsafe { &(*vec).inner }
}

#[allow(unsafe_code)]
#[track_caller]
fn vec_mut<'a>(vec: *mut ErVec, operation: &str) -> &'a mut ErasedVec {
    if vec.is_null() {
        fatal::null_handle(operation);
    }
    // SAFETY: vec is non-null, live and not aliased per caller contract.
    unsafe { &mut (*vec).inner }
}

/// Create a vector with `initial_capacity` zeroed slots of `element_size`
/// bytes.
///
/// On success writes the handle to `out` and returns `ERVEC_STATUS_OK`.
/// On failure `*out` is set to null and nothing is leaked.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_init(
    initial_capacity: usize,
    element_size: usize,
    out: *mut *mut ErVec,
) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return ErvecStatus::InvalidArgument as i32;
        }
        // SAFETY: out is non-null and writable per caller contract.
        unsafe { *out = ptr::null_mut() };

        let inner = match ErasedVec::new(initial_capacity, element_size) {
            Ok(v) => v,
            Err(e) => return ErvecStatus::from(&e) as i32,
        };
        let Some(raw) = box_vec(inner) else {
            return ErvecStatus::AllocationFailed as i32;
        };
        // SAFETY: as above.
        unsafe { *out = raw };
        ErvecStatus::Ok as i32
    })
}

/// Release a vector and null the handle. No-op if `vec` or `*vec` is null.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_free(vec: *mut *mut ErVec) {
    if vec.is_null() {
        return;
    }
    // SAFETY: vec is non-null per the check above.
    if unsafe { (*vec).is_null() } {
        return;
    }
    take(vec, "ervec_free").inner.free();
}

/// Detach the whole buffer (including unused capacity) and release the
/// control block. Nulls the handle.
///
/// `*size_out` receives `capacity * element_size`. A zero-sized buffer is
/// reported as null. Release the buffer with `ervec_buffer_free`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_leak(
    vec: *mut *mut ErVec,
    buf_out: *mut *mut u8,
    size_out: *mut usize,
) -> i32 {
    ffi_guard!({
        if buf_out.is_null() || size_out.is_null() {
            return ErvecStatus::InvalidArgument as i32;
        }
        let (buf, size) = hand_out(take(vec, "ervec_leak").inner.detach());
        // SAFETY: both out-pointers are non-null per the check above.
        unsafe {
            *buf_out = buf;
            *size_out = size;
        }
        ErvecStatus::Ok as i32
    })
}

/// Grow capacity by 3/2. On failure the vector is unchanged.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_grow(vec: *mut ErVec) -> i32 {
    ffi_guard!({
        match vec_mut(vec, "ervec_grow").grow() {
            Ok(()) => ErvecStatus::Ok as i32,
            Err(e) => ErvecStatus::from(&e) as i32,
        }
    })
}

/// Set capacity to exactly `capacity` slots, truncating the length if
/// needed. On failure the vector is unchanged.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_resize(vec: *mut ErVec, capacity: usize) -> i32 {
    ffi_guard!({
        match vec_mut(vec, "ervec_resize").resize(capacity) {
            Ok(()) => ErvecStatus::Ok as i32,
            Err(e) => ErvecStatus::from(&e) as i32,
        }
    })
}

/// Append `element_size` bytes read from `element`.
///
/// If `slot_out` is non-null it receives a pointer to the stored copy,
/// valid until the next call that may reallocate. On failure the vector is
/// unchanged and `*slot_out` is null.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_push(
    vec: *mut ErVec,
    element: *const c_void,
    slot_out: *mut *mut c_void,
) -> i32 {
    ffi_guard!({
        let inner = vec_mut(vec, "ervec_push");
        if !slot_out.is_null() {
            // SAFETY: slot_out is non-null and writable per caller contract.
            unsafe { *slot_out = ptr::null_mut() };
        }
        if element.is_null() {
            return ErvecStatus::InvalidArgument as i32;
        }
        // SAFETY: element points to element_size readable bytes per caller
        // contract.
        let bytes =
            unsafe { std::slice::from_raw_parts(element.cast::<u8>(), inner.element_size()) };
        match inner.push(bytes) {
            Ok(slot) => {
                if !slot_out.is_null() {
                    // SAFETY: as above.
                    unsafe { *slot_out = slot.as_mut_ptr().cast() };
                }
                ErvecStatus::Ok as i32
            }
            Err(e) => ErvecStatus::from(&e) as i32,
        }
    })
}

/// Remove the last element, writing a fresh copy of it to `*element_out`.
///
/// Returns `ERVEC_STATUS_EMPTY` if there is nothing to pop. The copy is
/// `element_size` bytes; release it with `ervec_buffer_free`. If the copy
/// cannot be allocated the element stays in the vector.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_pop(vec: *mut ErVec, element_out: *mut *mut c_void) -> i32 {
    ffi_guard!({
        let inner = vec_mut(vec, "ervec_pop");
        if element_out.is_null() {
            return ErvecStatus::InvalidArgument as i32;
        }
        // SAFETY: element_out is non-null per the check above.
        unsafe { *element_out = ptr::null_mut() };
        match inner.try_pop() {
            Ok(Some(buf)) => {
                let (ptr, _) = hand_out(buf);
                // SAFETY: as above.
                unsafe { *element_out = ptr.cast() };
                ErvecStatus::Ok as i32
            }
            Ok(None) => ErvecStatus::Empty as i32,
            Err(e) => ErvecStatus::from(&e) as i32,
        }
    })
}

/// Pointer to the element at `index`. Aborts if `index >= len`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_get(vec: *mut ErVec, index: usize) -> *mut c_void {
    vec_mut(vec, "ervec_get")
        .get_mut(index)
        .as_mut_ptr()
        .cast()
}

/// Remove the element at `index`, keeping order. Aborts if out of bounds.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_remove(vec: *mut ErVec, index: usize) {
    vec_mut(vec, "ervec_remove").remove(index);
}

/// Remove the element at `index` by moving the last element into its
/// place. Aborts if out of bounds.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_swap_remove(vec: *mut ErVec, index: usize) {
    vec_mut(vec, "ervec_swap_remove").swap_remove(index);
}

/// Set the length to zero. Capacity is kept.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_clear(vec: *mut ErVec) {
    vec_mut(vec, "ervec_clear").clear();
}

/// Number of live elements.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_len(vec: *const ErVec) -> usize {
    vec_ref(vec, "ervec_len").len()
}

/// Number of element slots the buffer holds.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_capacity(vec: *const ErVec) -> usize {
    vec_ref(vec, "ervec_capacity").capacity()
}

/// Size of one element in bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_element_size(vec: *const ErVec) -> usize {
    vec_ref(vec, "ervec_element_size").element_size()
}

/// Convert a byte vector into a NUL-terminated string, consuming it.
///
/// On success the handle is nulled, `*str_out` receives the string and
/// `*size_out` its allocation size (length plus the terminator). On
/// failure `*str_out` is null, `*size_out` is 0 and the handle is left
/// intact. Aborts unless `element_size` is 1.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_to_str(
    vec: *mut *mut ErVec,
    str_out: *mut *mut c_char,
    size_out: *mut usize,
) -> i32 {
    ffi_guard!({
        if str_out.is_null() || size_out.is_null() {
            return ErvecStatus::InvalidArgument as i32;
        }
        // SAFETY: both out-pointers are non-null per the check above.
        unsafe {
            *str_out = ptr::null_mut();
            *size_out = 0;
        }
        let raw = take_raw(vec, "ervec_to_str");
        // SAFETY: raw is a live control block. Its vector is moved out here
        // and either written back or the block is released without drop.
        // `into_c_string` aborts rather than unwinds, so the bitwise copy
        // left behind is never dropped twice.
        let inner = unsafe { ptr::read(ptr::addr_of!((*raw).inner)) };
        match inner.into_c_string() {
            Ok(s) => {
                // SAFETY: raw came from box_vec with this layout and its
                // contents were moved out above.
                unsafe { alloc::dealloc(raw.cast(), Layout::new::<ErVec>()) };
                let (buf, size) = hand_out(s.into_buffer());
                // SAFETY: as above.
                unsafe {
                    *str_out = buf.cast();
                    *size_out = size;
                }
                ErvecStatus::Ok as i32
            }
            Err(e) => {
                let status = ErvecStatus::from(e.error());
                // SAFETY: the slot was vacated above; vec was non-null when
                // raw was taken from it.
                unsafe {
                    ptr::addr_of_mut!((*raw).inner).write(e.into_inner());
                    *vec = raw;
                }
                status as i32
            }
        }
    })
}

/// Copy a byte vector's elements into a fresh NUL-terminated string.
///
/// The vector is not modified. `*size_out` receives the allocation size
/// (length plus the terminator). A null `vec` is reported as
/// `ERVEC_STATUS_INVALID_ARGUMENT`; on any failure `*str_out` is null and
/// `*size_out` is 0. Aborts unless `element_size` is 1.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_clone_str(
    vec: *const ErVec,
    str_out: *mut *mut c_char,
    size_out: *mut usize,
) -> i32 {
    ffi_guard!({
        if str_out.is_null() || size_out.is_null() {
            return ErvecStatus::InvalidArgument as i32;
        }
        // SAFETY: both out-pointers are non-null per the check above.
        unsafe {
            *str_out = ptr::null_mut();
            *size_out = 0;
        }
        if vec.is_null() {
            return ErvecStatus::InvalidArgument as i32;
        }
        match vec_ref(vec, "ervec_clone_str").clone_c_string() {
            Some(s) => {
                let (buf, size) = hand_out(s.into_buffer());
                // SAFETY: as above.
                unsafe {
                    *str_out = buf.cast();
                    *size_out = size;
                }
                ErvecStatus::Ok as i32
            }
            None => ErvecStatus::AllocationFailed as i32,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ervec_buffer_free;
    use std::ffi::CStr;

    fn new_vec(capacity: usize, element_size: usize) -> *mut ErVec {
        let mut vec = ptr::null_mut();
        assert_eq!(
            ervec_init(capacity, element_size, &mut vec),
            ErvecStatus::Ok as i32
        );
        assert!(!vec.is_null());
        vec
    }

    fn push_u32(vec: *mut ErVec, value: u32) {
        let bytes = value.to_le_bytes();
        let rc = ervec_push(vec, bytes.as_ptr().cast(), ptr::null_mut());
        assert_eq!(rc, ErvecStatus::Ok as i32);
    }

    #[allow(unsafe_code)]
    fn read_u32(ptr: *const c_void) -> u32 {
        let mut bytes = [0u8; 4];
        // SAFETY: test pointers come from a 4-byte-element vector.
        unsafe { ptr::copy_nonoverlapping(ptr.cast::<u8>(), bytes.as_mut_ptr(), 4) };
        u32::from_le_bytes(bytes)
    }

    fn push_bytes(vec: *mut ErVec, bytes: &[u8]) {
        for b in bytes {
            let rc = ervec_push(vec, (b as *const u8).cast(), ptr::null_mut());
            assert_eq!(rc, ErvecStatus::Ok as i32);
        }
    }

    #[test]
    fn init_and_free_nulls_handle() {
        let mut vec = new_vec(4, 8);
        assert_eq!(ervec_len(vec), 0);
        assert_eq!(ervec_capacity(vec), 4);
        assert_eq!(ervec_element_size(vec), 8);
        ervec_free(&mut vec);
        assert!(vec.is_null());
        // Second free is a no-op.
        ervec_free(&mut vec);
        ervec_free(ptr::null_mut());
    }

    #[test]
    fn init_rejects_bad_arguments() {
        assert_eq!(
            ervec_init(4, 4, ptr::null_mut()),
            ErvecStatus::InvalidArgument as i32
        );
        let mut vec = ptr::null_mut();
        assert_eq!(ervec_init(4, 0, &mut vec), ErvecStatus::InvalidConfig as i32);
        assert!(vec.is_null());
        assert_eq!(
            ervec_init(usize::MAX, 2, &mut vec),
            ErvecStatus::InvalidConfig as i32
        );
        assert!(vec.is_null());
    }

    #[test]
    fn push_get_and_grow_through_the_handle() {
        let mut vec = new_vec(2, 4);
        for v in 0..10u32 {
            push_u32(vec, v * 3);
        }
        assert_eq!(ervec_len(vec), 10);
        assert!(ervec_capacity(vec) >= 10);
        for i in 0..10 {
            assert_eq!(read_u32(ervec_get(vec, i)), i as u32 * 3);
        }
        ervec_free(&mut vec);
    }

    #[test]
    fn push_reports_the_stored_slot() {
        let mut vec = new_vec(1, 4);
        let value = 0xdead_beef_u32.to_le_bytes();
        let mut slot = ptr::null_mut();
        assert_eq!(
            ervec_push(vec, value.as_ptr().cast(), &mut slot),
            ErvecStatus::Ok as i32
        );
        assert_eq!(slot, ervec_get(vec, 0));
        assert_eq!(read_u32(slot), 0xdead_beef);
        ervec_free(&mut vec);
    }

    #[test]
    fn push_null_element_is_invalid() {
        let mut vec = new_vec(1, 4);
        let mut slot = ptr::null_mut();
        assert_eq!(
            ervec_push(vec, ptr::null(), &mut slot),
            ErvecStatus::InvalidArgument as i32
        );
        assert!(slot.is_null());
        assert_eq!(ervec_len(vec), 0);
        ervec_free(&mut vec);
    }

    #[test]
    fn grow_and_resize_status() {
        let mut vec = new_vec(4, 1);
        assert_eq!(ervec_grow(vec), ErvecStatus::Ok as i32);
        assert_eq!(ervec_capacity(vec), 6);
        assert_eq!(ervec_resize(vec, 1), ErvecStatus::Ok as i32);
        assert_eq!(ervec_grow(vec), ErvecStatus::GrowthStalled as i32);
        assert_eq!(ervec_capacity(vec), 1);
        assert_eq!(
            ervec_resize(vec, usize::MAX),
            ErvecStatus::CapacityOverflow as i32
        );
        assert_eq!(ervec_capacity(vec), 1);
        ervec_free(&mut vec);
    }

    #[test]
    fn pop_returns_copy_then_empty() {
        let mut vec = new_vec(2, 4);
        push_u32(vec, 7);
        let mut out = ptr::null_mut();
        assert_eq!(ervec_pop(vec, &mut out), ErvecStatus::Ok as i32);
        assert_eq!(read_u32(out), 7);
        ervec_buffer_free(out, 4);

        assert_eq!(ervec_pop(vec, &mut out), ErvecStatus::Empty as i32);
        assert!(out.is_null());
        assert_eq!(
            ervec_pop(vec, ptr::null_mut()),
            ErvecStatus::InvalidArgument as i32
        );
        ervec_free(&mut vec);
    }

    #[test]
    fn remove_and_swap_remove() {
        let mut vec = new_vec(4, 4);
        for v in [10, 20, 30, 40] {
            push_u32(vec, v);
        }
        ervec_remove(vec, 0);
        assert_eq!(ervec_len(vec), 3);
        assert_eq!(read_u32(ervec_get(vec, 0)), 20);
        ervec_swap_remove(vec, 0);
        assert_eq!(ervec_len(vec), 2);
        assert_eq!(read_u32(ervec_get(vec, 0)), 40);
        assert_eq!(read_u32(ervec_get(vec, 1)), 30);
        ervec_clear(vec);
        assert_eq!(ervec_len(vec), 0);
        assert_eq!(ervec_capacity(vec), 4);
        ervec_free(&mut vec);
    }

    #[test]
    fn leak_hands_over_full_capacity() {
        let mut vec = new_vec(8, 2);
        let pair = [1u8, 2];
        assert_eq!(
            ervec_push(vec, pair.as_ptr().cast(), ptr::null_mut()),
            ErvecStatus::Ok as i32
        );

        let mut buf = ptr::null_mut();
        let mut size = 0;
        assert_eq!(ervec_leak(&mut vec, &mut buf, &mut size), ErvecStatus::Ok as i32);
        assert!(vec.is_null());
        assert_eq!(size, 16);
        assert!(!buf.is_null());
        ervec_buffer_free(buf.cast(), size);
    }

    #[test]
    fn leak_of_empty_capacity_is_null() {
        let mut vec = new_vec(0, 4);
        let mut buf = ptr::null_mut();
        let mut size = 99;
        assert_eq!(ervec_leak(&mut vec, &mut buf, &mut size), ErvecStatus::Ok as i32);
        assert!(vec.is_null());
        assert!(buf.is_null());
        assert_eq!(size, 0);
    }

    #[test]
    fn leak_with_null_out_keeps_handle() {
        let mut vec = new_vec(2, 1);
        let mut size = 0;
        assert_eq!(
            ervec_leak(&mut vec, ptr::null_mut(), &mut size),
            ErvecStatus::InvalidArgument as i32
        );
        assert!(!vec.is_null());
        ervec_free(&mut vec);
    }

    #[test]
    #[allow(unsafe_code)]
    fn to_str_consumes_and_terminates() {
        let mut vec = new_vec(16, 1);
        push_bytes(vec, b"hello");

        let mut s = ptr::null_mut();
        let mut size = 0;
        assert_eq!(ervec_to_str(&mut vec, &mut s, &mut size), ErvecStatus::Ok as i32);
        assert!(vec.is_null());
        assert_eq!(size, 6);
        // SAFETY: s is a NUL-terminated string from ervec_to_str.
        let text = unsafe { CStr::from_ptr(s) };
        assert_eq!(text.to_bytes(), b"hello");
        ervec_buffer_free(s.cast(), size);
    }

    #[test]
    #[allow(unsafe_code)]
    fn clone_str_leaves_vector_alive() {
        let mut vec = new_vec(2, 1);
        push_bytes(vec, b"abc");

        let mut s = ptr::null_mut();
        let mut size = 0;
        assert_eq!(ervec_clone_str(vec, &mut s, &mut size), ErvecStatus::Ok as i32);
        assert_eq!(size, 4);
        // SAFETY: s is a NUL-terminated string from ervec_clone_str.
        assert_eq!(unsafe { CStr::from_ptr(s) }.to_bytes(), b"abc");
        ervec_buffer_free(s.cast(), size);

        assert_eq!(ervec_len(vec), 3);
        push_bytes(vec, b"d");
        assert_eq!(ervec_len(vec), 4);
        ervec_free(&mut vec);
    }

    #[test]
    fn clone_str_of_null_source_is_absent() {
        let mut sentinel = 0u8;
        let mut s: *mut c_char = (&mut sentinel as *mut u8).cast();
        let mut size = 99;
        assert_eq!(
            ervec_clone_str(ptr::null(), &mut s, &mut size),
            ErvecStatus::InvalidArgument as i32
        );
        assert!(s.is_null());
        assert_eq!(size, 0);
    }

    #[test]
    fn to_str_with_null_out_keeps_handle() {
        let mut vec = new_vec(4, 1);
        push_bytes(vec, b"hi");
        let mut size = 99;
        assert_eq!(
            ervec_to_str(&mut vec, ptr::null_mut(), &mut size),
            ErvecStatus::InvalidArgument as i32
        );
        assert!(!vec.is_null());
        assert_eq!(ervec_len(vec), 2);
        ervec_free(&mut vec);
    }

    #[test]
    fn empty_vector_to_str_is_just_the_terminator() {
        let mut vec = new_vec(0, 1);
        let mut s = ptr::null_mut();
        let mut size = 0;
        assert_eq!(ervec_to_str(&mut vec, &mut s, &mut size), ErvecStatus::Ok as i32);
        assert!(!s.is_null());
        assert_eq!(size, 1);
        ervec_buffer_free(s.cast(), size);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn handle_matches_model(values in proptest::collection::vec(any::<u32>(), 0..64)) {
                let mut vec = new_vec(3, 4);
                for &v in &values {
                    push_u32(vec, v);
                }
                prop_assert_eq!(ervec_len(vec), values.len());
                for (i, &v) in values.iter().enumerate() {
                    prop_assert_eq!(read_u32(ervec_get(vec, i)), v);
                }
                ervec_free(&mut vec);
                prop_assert!(vec.is_null());
            }
        }
    }
}
