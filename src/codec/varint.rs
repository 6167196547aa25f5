use bytes::BufMut;

use crate::internal::error::VarintError;

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Encodes an unsigned 64-bit integer in base-128 (LEB128).
/// Returns the encoded bytes.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(varint_size(value));
    put_varint(&mut buf, value);
    buf
}

/// Appends the base-128 encoding of `value` to `buf`.
pub fn put_varint<B: BufMut>(buf: &mut B, value: u64) {
    let mut value = value;

    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Number of bytes `encode_varint(value)` produces.
pub fn varint_size(value: u64) -> usize {
    // One byte per started group of 7 bits, at least one byte for zero.
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Decodes an unsigned 64-bit integer from the front of `data`.
/// Returns the decoded value and the number of bytes read.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut value = 0u64;

    for (i, byte) in data.iter().enumerate().take(MAX_VARINT_LEN) {
        let low_seven_bits = (byte & 0x7F) as u64;
        if i == MAX_VARINT_LEN - 1 && low_seven_bits > 1 {
            // The tenth byte may only contribute bit 63.
            return Err(VarintError::Overflow);
        }
        value |= low_seven_bits << (7 * i);
        if (byte & 0x80) == 0 {
            return Ok((value, i + 1));
        }
    }

    if data.len() >= MAX_VARINT_LEN {
        Err(VarintError::Overflow)
    } else {
        Err(VarintError::Truncated(data.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_varint() {
        assert_eq!(encode_varint(0), vec![0x00]);
        assert_eq!(encode_varint(1), vec![0x01]);
        assert_eq!(encode_varint(127), vec![0x7F]);
        assert_eq!(encode_varint(128), vec![0x80, 0x01]);
        assert_eq!(encode_varint(300), vec![0xAC, 0x02]);
        assert_eq!(
            encode_varint(u64::MAX),
            vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
        );
    }

    #[test]
    fn test_varint_size_matches_encoding() {
        for value in [0, 1, 127, 128, 16_383, 16_384, 1 << 35, (1 << 56) - 1, 1 << 63, u64::MAX] {
            assert_eq!(varint_size(value), encode_varint(value).len(), "value {}", value);
        }
    }

    #[test]
    fn test_decode_varint() {
        assert_eq!(decode_varint(&[0x00]).unwrap(), (0, 1));
        assert_eq!(decode_varint(&[0x7F]).unwrap(), (127, 1));
        assert_eq!(decode_varint(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(decode_varint(&[0xAC, 0x02, 0xFF]).unwrap(), (300, 2));
        assert_eq!(
            decode_varint(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]).unwrap(),
            (u64::MAX, 10)
        );
    }

    #[test]
    fn test_decode_varint_incomplete() {
        assert_eq!(decode_varint(&[]), Err(VarintError::Truncated(0)));
        assert_eq!(decode_varint(&[0x80]), Err(VarintError::Truncated(1)));
        assert_eq!(
            decode_varint(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
            Err(VarintError::Truncated(9))
        );
    }

    #[test]
    fn test_decode_varint_too_large() {
        // Eleven bytes of continuation.
        let data = vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        assert_eq!(decode_varint(&data), Err(VarintError::Overflow));
        // Ten bytes, but the last one carries more than bit 63.
        let data = vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02];
        assert_eq!(decode_varint(&data), Err(VarintError::Overflow));
    }
}
