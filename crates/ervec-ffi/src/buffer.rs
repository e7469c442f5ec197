//! Buffers crossing the C boundary.
//!
//! Every buffer the library hands out (a leaked vector buffer, a popped
//! element, a string) is released through [`ervec_buffer_free`] with the
//! size that was reported alongside it.

use std::ffi::c_void;
use std::ptr::{self, NonNull};

use ervec::{OwnedBuffer, System};

/// Give up ownership of `buf`, returning a pointer C can hold and its size.
///
/// Empty buffers come back as `(null, 0)`.
pub(crate) fn hand_out(buf: OwnedBuffer) -> (*mut u8, usize) {
    let (ptr, size, _) = buf.into_raw_parts();
    if size == 0 {
        (ptr::null_mut(), 0)
    } else {
        (ptr.as_ptr(), size)
    }
}

/// Release a buffer returned by `ervec_leak`, `ervec_pop`, `ervec_to_str`
/// or `ervec_clone_str`.
///
/// `size` must be the size reported for that buffer: the leak/string
/// `size_out` value, or the element size for a popped element. A null
/// `ptr` is a no-op.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ervec_buffer_free(ptr: *mut c_void, size: usize) {
    let Some(ptr) = NonNull::new(ptr.cast::<u8>()) else {
        return;
    };
    // SAFETY: per caller contract, ptr/size were produced by `hand_out`
    // from a System-backed buffer and are released once.
    drop(unsafe { OwnedBuffer::from_raw_parts(ptr, size, System) });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_out_and_free_round_trip() {
        let buf = OwnedBuffer::copy_of(b"abcd", System).unwrap();
        let (ptr, size) = hand_out(buf);
        assert!(!ptr.is_null());
        assert_eq!(size, 4);
        ervec_buffer_free(ptr.cast(), size);
    }

    #[test]
    fn empty_buffer_becomes_null() {
        let buf = OwnedBuffer::copy_of(b"", System).unwrap();
        let (ptr, size) = hand_out(buf);
        assert!(ptr.is_null());
        assert_eq!(size, 0);
        ervec_buffer_free(ptr.cast(), size);
    }
}
