//! Little-endian conversion between unbounded integers and octet strings.

use num_bigint_dig::BigUint;

use crate::error::CodecError;

/// Converts `i` to an octet string of exactly `length` bytes, little-endian
/// (least-significant byte first). Fails with [`CodecError::Overflow`] if
/// `i` does not fit in `length` bytes.
pub fn int_to_bytes(i: &BigUint, length: usize) -> Result<Vec<u8>, CodecError> {
    let mut bytes = i.to_bytes_le();
    if bytes.len() > length {
        return Err(CodecError::Overflow);
    }
    bytes.resize(length, 0);
    Ok(bytes)
}

/// Converts `i` to the shortest octet string that represents it,
/// little-endian. The bit length is rounded up to the next whole byte only
/// when it isn't already one, so a value whose bit length is already a
/// multiple of 8 gets no extra byte. `i = 0` has bit length 0, which rounds
/// to zero bytes: the empty representation, allowed only for `i = 0`.
pub fn int_to_bytes_unsized(i: &BigUint) -> Vec<u8> {
    if i.bits() == 0 {
        return Vec::new();
    }
    let bit_length = i.bits() as usize;
    let rem = bit_length % 8;
    let pad = if rem == 0 { 0 } else { 8 - rem };
    let length = (bit_length + pad) / 8;
    let mut bytes = i.to_bytes_le();
    bytes.resize(length, 0);
    bytes
}

/// Converts a little-endian octet string to a non-negative integer.
pub fn bytes_to_int(b: &[u8]) -> BigUint {
    BigUint::from_bytes_le(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    #[test]
    fn round_trips_fixed_length() {
        let i = BigUint::from(0x1234u32);
        let b = int_to_bytes(&i, 4).unwrap();
        assert_eq!(b, vec![0x34, 0x12, 0x00, 0x00]);
        assert_eq!(bytes_to_int(&b), i);
    }

    #[test]
    fn rejects_overflow() {
        let i = BigUint::from(0x1_0000u32);
        assert!(int_to_bytes(&i, 2).is_err());
    }

    #[test]
    fn unsized_rounds_up_to_whole_byte() {
        // 0xFF has bit_length 8 (a whole byte); 0x100 needs a 9th bit so 2 bytes.
        assert_eq!(int_to_bytes_unsized(&BigUint::from(0xFFu32)).len(), 1);
        assert_eq!(int_to_bytes_unsized(&BigUint::from(0x100u32)).len(), 2);
        // i=0 has bit_length 0, which rounds to the empty representation.
        assert_eq!(int_to_bytes_unsized(&BigUint::zero()).len(), 0);
    }

    #[test]
    fn zero_byte_string_round_trips() {
        assert_eq!(bytes_to_int(&int_to_bytes_unsized(&BigUint::zero())), BigUint::zero());
    }

    proptest::proptest! {
        #[test]
        fn unsized_round_trip_is_lossless(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let i = bytes_to_int(&bytes);
            let round_tripped = bytes_to_int(&int_to_bytes_unsized(&i));
            proptest::prop_assert_eq!(round_tripped, i);
        }

        #[test]
        fn fixed_length_round_trip_is_lossless(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..32)) {
            let i = bytes_to_int(&bytes);
            let encoded = int_to_bytes(&i, bytes.len()).unwrap();
            proptest::prop_assert_eq!(bytes_to_int(&encoded), i);
        }
    }
}
