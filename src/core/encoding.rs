//! Binary encoding/decoding utilities for identifiers and index keys
//!
//! Integers are written big-endian so that encoded keys sort byte-wise in the
//! same order as their numeric values.

use crate::core::id::{Id, ID_LENGTH};

/// Encode a u32 into the first 4 bytes of a buffer
pub fn encode_u32(buffer: &mut [u8], value: u32) {
    buffer[0..4].copy_from_slice(&value.to_be_bytes());
}

/// Encode a u64 into the first 8 bytes of a buffer
pub fn encode_u64(buffer: &mut [u8], value: u64) {
    buffer[0..8].copy_from_slice(&value.to_be_bytes());
}

/// Encode an i64 into the first 8 bytes of a buffer
pub fn encode_i64(buffer: &mut [u8], value: i64) {
    buffer[0..8].copy_from_slice(&value.to_be_bytes());
}

/// Decode a u32 from the first 4 bytes, `None` if the slice is too short
pub fn decode_u32(bytes: &[u8]) -> Option<u32> {
    let head: [u8; 4] = bytes.get(0..4)?.try_into().ok()?;
    Some(u32::from_be_bytes(head))
}

/// Decode a u64 from the first 8 bytes, `None` if the slice is too short
pub fn decode_u64(bytes: &[u8]) -> Option<u64> {
    let head: [u8; 8] = bytes.get(0..8)?.try_into().ok()?;
    Some(u64::from_be_bytes(head))
}

/// Decode an i64 from the first 8 bytes, `None` if the slice is too short
pub fn decode_i64(bytes: &[u8]) -> Option<i64> {
    let head: [u8; 8] = bytes.get(0..8)?.try_into().ok()?;
    Some(i64::from_be_bytes(head))
}

/// Concatenate byte slices into one buffer
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut buffer = Vec::with_capacity(total);
    for part in parts {
        buffer.extend_from_slice(part);
    }
    buffer
}

/// Bounds-checked sub-array
pub fn slice(bytes: &[u8], offset: usize, length: usize) -> Option<&[u8]> {
    let end = offset.checked_add(length)?;
    bytes.get(offset..end)
}

/// Encode a sequence of identifiers as a single index key
pub fn encode_ids(ids: &[Id]) -> Vec<u8> {
    let mut key = Vec::with_capacity(ids.len() * ID_LENGTH);
    for id in ids {
        key.extend_from_slice(id.as_bytes());
    }
    key
}

/// Decode an index key back into identifiers
///
/// Returns `None` when the key length is not a multiple of `ID_LENGTH`.
pub fn decode_ids(key: &[u8]) -> Option<Vec<Id>> {
    if key.len() % ID_LENGTH != 0 {
        return None;
    }
    key.chunks_exact(ID_LENGTH).map(Id::from_slice).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_sorts_bytewise() {
        let mut low = [0u8; 8];
        let mut high = [0u8; 8];
        encode_u64(&mut low, 255);
        encode_u64(&mut high, 256);
        assert!(low < high);
        assert_eq!(decode_u64(&high), Some(256));
    }

    #[test]
    fn test_decode_short_input() {
        assert_eq!(decode_u32(&[1, 2, 3]), None);
        assert_eq!(decode_u64(&[0; 7]), None);
        assert_eq!(decode_i64(&[]), None);
    }

    #[test]
    fn test_negative_i64() {
        let mut buffer = [0u8; 8];
        encode_i64(&mut buffer, -1);
        assert_eq!(decode_i64(&buffer), Some(-1));
    }

    #[test]
    fn test_concat_and_slice() {
        let joined = concat(&[&[1, 2], &[], &[3, 4, 5]]);
        assert_eq!(joined, vec![1, 2, 3, 4, 5]);
        assert_eq!(slice(&joined, 1, 3), Some(&[2u8, 3, 4][..]));
        assert_eq!(slice(&joined, 4, 2), None);
        assert_eq!(slice(&joined, usize::MAX, 2), None);
    }

    #[test]
    fn test_ids_key() {
        let ids = [Id::from_u64(7), Id::from_u64(42), Id::from_u64(9)];
        let key = encode_ids(&ids);
        assert_eq!(key.len(), 3 * ID_LENGTH);
        assert_eq!(decode_ids(&key), Some(ids.to_vec()));
        assert_eq!(decode_ids(&key[1..]), None);
    }
}
