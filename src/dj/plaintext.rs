//! Damgard-Jurik plaintext values.

use num_bigint_dig::BigUint;

use crate::codec;
use crate::error::CodecError;

/// A Damgard-Jurik plaintext: a non-negative integer whose lifetime is
/// user-controlled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plaintext(BigUint);

impl Plaintext {
    /// Wraps an integer directly.
    pub fn from_int(i: BigUint) -> Self {
        Plaintext(i)
    }

    /// Interprets `bytes` as a little-endian integer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Plaintext(codec::bytes_to_int(bytes))
    }

    /// The wrapped integer.
    pub fn as_int(&self) -> &BigUint {
        &self.0
    }

    /// Encodes this plaintext as exactly `length` little-endian bytes.
    pub fn to_bytes(&self, length: usize) -> Result<Vec<u8>, CodecError> {
        codec::int_to_bytes(&self.0, length)
    }
}

impl From<BigUint> for Plaintext {
    fn from(i: BigUint) -> Self {
        Plaintext(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_trip() {
        let pt = Plaintext::from_bytes(&[0x34, 0x12]);
        assert_eq!(pt.as_int(), &BigUint::from(0x1234u32));
        assert_eq!(pt.to_bytes(2).unwrap(), vec![0x34, 0x12]);
    }
}
