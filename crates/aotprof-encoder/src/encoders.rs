//! Low-level encoders for the profile log's primitives.
//!
//! These can be used directly to splice custom data into a log, though the
//! [`Profile`](crate::Profile) builder covers the defined record kinds.

/// Encode a `u32` as a ULEB128 into `sink`.
pub fn u32(sink: &mut Vec<u8>, value: u32) {
    leb128::write::unsigned(sink, value.into()).unwrap();
}

/// Encode an `i32` as a SLEB128 into `sink`.
pub fn s32(sink: &mut Vec<u8>, value: i32) {
    leb128::write::signed(sink, value.into()).unwrap();
}

/// Encode a length-prefixed UTF-8 string into `sink`.
pub fn str(sink: &mut Vec<u8>, value: &str) {
    u32(sink, u32::try_from(value.len()).unwrap());
    sink.extend_from_slice(value.as_bytes());
}
