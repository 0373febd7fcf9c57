//! Uniform arbitrary-precision integer facade.
//!
//! This is a thin layer over [`num_bigint_dig`]'s `BigUint`/`BigInt`, the
//! RSA-oriented fork of `num-bigint` that bundles both bignum arithmetic
//! and prime generation in the same crate. Everything above this module
//! talks in terms of [`BigUint`] directly; this module exists to give the
//! handful of operations the rest of the crate needs (`invert`, `lcm`,
//! `gen_prime`) a single, well-tested home instead of scattering
//! extended-Euclid code throughout the DJ implementation.

use num_bigint_dig::{BigInt, BigUint, RandPrime};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::RngCore;

use crate::error::BigIntError;

/// Computes `gcd(a, b)`.
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

/// Computes `lcm(a, b) = a * b / gcd(a, b)`.
pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    a.lcm(b)
}

/// Computes the multiplicative inverse of `a` modulo `m` via the extended
/// Euclidean algorithm. Fails with [`BigIntError::NoInverse`] iff
/// `gcd(a, m) != 1`.
pub fn invert(a: &BigUint, m: &BigUint) -> Result<BigUint, BigIntError> {
    let a = BigInt::from(a.clone());
    let m_big = BigInt::from(m.clone());
    let (g, x, _) = extended_gcd(&a, &m_big);
    if g != BigInt::one() {
        return Err(BigIntError::NoInverse);
    }
    let result = ((x % &m_big) + &m_big) % &m_big;
    Ok(result
        .to_biguint()
        .expect("result of mod reduction against a positive modulus is non-negative"))
}

/// Returns `(gcd(a, b), x, y)` such that `a*x + b*y = gcd(a, b)`.
fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if a.is_zero() {
        return (b.clone(), BigInt::zero(), BigInt::one());
    }
    let (g, x1, y1) = extended_gcd(&b.mod_floor(a), a);
    let x = y1 - (b.div_floor(a)) * &x1;
    (g, x, x1)
}

/// Generates an odd prime of approximately `bits` bits using `rng`,
/// delegating to `num-bigint-dig`'s Miller-Rabin-backed prime sieve rather
/// than hand-rolling primality testing.
pub fn gen_prime<R: RngCore>(bits: usize, rng: &mut R) -> BigUint {
    rng.gen_prime(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_round_trips() {
        let a = BigUint::from(17u32);
        let m = BigUint::from(3120u32);
        let inv = invert(&a, &m).unwrap();
        assert_eq!((&a * &inv) % &m, BigUint::one());
    }

    #[test]
    fn invert_rejects_non_coprime() {
        let a = BigUint::from(6u32);
        let m = BigUint::from(9u32);
        assert!(invert(&a, &m).is_err());
    }

    #[test]
    fn lcm_matches_definition() {
        let a = BigUint::from(21u32);
        let b = BigUint::from(6u32);
        assert_eq!(lcm(&a, &b), BigUint::from(42u32));
    }
}
