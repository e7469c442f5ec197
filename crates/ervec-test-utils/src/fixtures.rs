//! Reusable element fixtures.
//!
//! The vector only sees bytes, so tests need a few concrete element shapes:
//!
//! - single bytes, via plain `&[u8]` literals;
//! - little-endian `u32`s, via [`u32_element`] / [`read_u32`];
//! - a 12-byte [`Record`] whose fields make misplaced bytes obvious.

/// Encode a `u32` as a 4-byte element.
pub fn u32_element(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Decode a 4-byte element.
///
/// # Panics
///
/// Panics if `bytes` is not exactly 4 bytes long.
pub fn read_u32(bytes: &[u8]) -> u32 {
    let arr: [u8; 4] = bytes
        .try_into()
        .unwrap_or_else(|_| panic!("expected a 4-byte element, got {} bytes", bytes.len()));
    u32::from_le_bytes(arr)
}

/// Decode a buffer of packed 4-byte elements.
pub fn read_u32s(bytes: &[u8]) -> Vec<u32> {
    bytes.chunks_exact(4).map(read_u32).collect()
}

/// A multi-byte element with distinct fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    pub id: u32,
    pub x: i32,
    pub y: i32,
}

impl Record {
    /// Encoded width in bytes.
    pub const SIZE: usize = 12;

    pub fn new(id: u32, x: i32, y: i32) -> Self {
        Self { id, x, y }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.id.to_le_bytes());
        out[4..8].copy_from_slice(&self.x.to_le_bytes());
        out[8..12].copy_from_slice(&self.y.to_le_bytes());
        out
    }

    /// # Panics
    ///
    /// Panics if `bytes` is not exactly [`Record::SIZE`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), Self::SIZE, "record element has wrong width");
        let field = |i: usize| -> [u8; 4] { [bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]] };
        Self {
            id: u32::from_le_bytes(field(0)),
            x: i32::from_le_bytes(field(4)),
            y: i32::from_le_bytes(field(8)),
        }
    }
}

/// `n` records with ids `0..n` and coordinates derived from the id.
pub fn records(n: u32) -> Vec<Record> {
    (0..n)
        .map(|id| Record::new(id, id as i32 * 3 - 7, -(id as i32) * 5))
        .collect()
}
