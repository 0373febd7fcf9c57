//! Damgard-Jurik ciphertexts and their homomorphisms.
//!
//! A ciphertext is `(c, m)` with `m = n^(s+1)`; two ciphertexts are
//! compatible iff their `m` values match. Plaintext arithmetic modulo `n^s`
//! translates into ciphertext arithmetic modulo `m`: addition becomes
//! multiplication, negation becomes inversion, and scalar multiplication
//! becomes modular exponentiation. [`Ciphertext::scalar_mul`] is a clean
//! textbook square-and-multiply over the power cache, with no dead
//! recomputation path that could leak the wrong power on certain bit
//! patterns.

use std::cell::RefCell;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint_dig::BigUint;
use num_traits::One;

use crate::bigint;
use crate::error::DjError;

/// A Damgard-Jurik ciphertext `(c, m)` with an optional lazily-filled power
/// cache. The cache is derived state: [`PartialEq`]/[`Eq`] compare only `c`
/// and `m`.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    c: BigUint,
    m: BigUint,
    cache: Option<RefCell<Vec<Option<BigUint>>>>,
}

impl PartialEq for Ciphertext {
    fn eq(&self, other: &Self) -> bool {
        self.c == other.c && self.m == other.m
    }
}

impl Eq for Ciphertext {}

impl Ciphertext {
    /// Wraps a raw `(c, m)` pair, optionally enabling the power cache used
    /// by [`Self::scalar_mul`]. DJ encryption enables the cache by default
    /// for `Plaintext`-shaped messages; results of homomorphic combination
    /// are constructed cache-less via [`Self::new_raw`] since they are
    /// typically one-shot values.
    pub fn new(c: BigUint, m: BigUint, cache_enabled: bool) -> Self {
        let cache = if cache_enabled {
            Some(RefCell::new(vec![None; m.bits() as usize + 1]))
        } else {
            None
        };
        Ciphertext { c, m, cache }
    }

    /// Wraps `(c, m)` with no power cache.
    pub fn new_raw(c: BigUint, m: BigUint) -> Self {
        Ciphertext { c, m, cache: None }
    }

    /// The multiplicative identity ciphertext for modulus `m`: the neutral
    /// element for [`Self::checked_add`], used as the fold seed in
    /// `TauschRouter::route_messages`.
    pub fn identity(m: BigUint) -> Self {
        Ciphertext::new_raw(BigUint::one(), m)
    }

    /// Enables the power cache on this ciphertext if it isn't already.
    pub fn with_cache(mut self) -> Self {
        if self.cache.is_none() {
            self.cache = Some(RefCell::new(vec![None; self.m.bits() as usize + 1]));
        }
        self
    }

    /// The raw ciphertext integer `c`.
    pub fn c(&self) -> &BigUint {
        &self.c
    }

    /// The ciphertext modulus `m = n^(s+1)`.
    pub fn m(&self) -> &BigUint {
        &self.m
    }

    /// Whether this ciphertext carries a power cache.
    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Two ciphertexts are compatible iff their `m` values match.
    pub fn compatible_with(&self, other: &Ciphertext) -> bool {
        self.m == other.m
    }

    /// Plaintext addition: `x * y mod m`. Fails with
    /// [`DjError::KeyMismatch`] if `x` and `y` belong to different moduli.
    pub fn checked_add(&self, other: &Ciphertext) -> Result<Ciphertext, DjError> {
        if !self.compatible_with(other) {
            return Err(DjError::KeyMismatch);
        }
        Ok(Ciphertext::new_raw(&self.c * &other.c % &self.m, self.m.clone()))
    }

    /// Plaintext subtraction: `x * y^-1 mod m`. Fails with
    /// [`DjError::KeyMismatch`] on incompatible moduli, or propagates
    /// [`crate::error::BigIntError::NoInverse`] in the vanishingly unlikely
    /// event `y`'s ciphertext integer shares a factor with `m`.
    pub fn checked_sub(&self, other: &Ciphertext) -> Result<Ciphertext, DjError> {
        if !self.compatible_with(other) {
            return Err(DjError::KeyMismatch);
        }
        let inv = bigint::invert(&other.c, &self.m)?;
        Ok(Ciphertext::new_raw(&self.c * &inv % &self.m, self.m.clone()))
    }

    /// Plaintext negation: `x^-1 mod m`.
    pub fn checked_neg(&self) -> Result<Ciphertext, DjError> {
        let inv = bigint::invert(&self.c, &self.m)?;
        Ok(Ciphertext::new_raw(inv, self.m.clone()))
    }

    /// Mixes a raw integer `k` into this ciphertext on the addition side,
    /// treating `k` directly as an encrypted constant: `x * k mod m`.
    pub fn add_constant(&self, k: &BigUint) -> Ciphertext {
        let k = k % &self.m;
        Ciphertext::new_raw(&self.c * &k % &self.m, self.m.clone())
    }

    /// Plaintext scalar multiplication `a * k`: `x^(k mod m) mod m`, via
    /// square-and-multiply. When the power cache is enabled, bit `i` of the
    /// (reduced) exponent reuses the cached `x^(2^i) mod m` lane instead of
    /// recomputing it.
    pub fn scalar_mul(&self, k: &BigUint) -> Ciphertext {
        let k = k % &self.m;
        match &self.cache {
            None => Ciphertext::new_raw(self.c.modpow(&k, &self.m), self.m.clone()),
            Some(cache) => {
                let bits = k.bits() as usize;
                let mut cache = cache.borrow_mut();
                if cache.len() < bits {
                    cache.resize(bits, None);
                }
                let mut result = BigUint::one();
                for i in 0..bits {
                    if bit(&k, i) {
                        if cache[i].is_none() {
                            let exp = BigUint::one() << i;
                            cache[i] = Some(self.c.modpow(&exp, &self.m));
                        }
                        result = &result * cache[i].as_ref().expect("just populated") % &self.m;
                    }
                }
                Ciphertext::new_raw(result, self.m.clone())
            }
        }
    }

    /// Recovers the expansion factor `s` such that `m = n^(s+1)` for the
    /// public modulus `n`. Used by decryption and by the router to validate
    /// that a subscription's selectors belong to the subscriber's own key.
    pub fn derive_s(&self, n: &BigUint) -> Result<usize, DjError> {
        derive_s(n, &self.m)
    }
}

fn bit(x: &BigUint, i: usize) -> bool {
    (x >> i) & BigUint::one() == BigUint::one()
}

/// Finds `s` such that `m = n^(s+1)`, by repeated multiplication rather
/// than floating-point `log`. Fails with [`DjError::InvalidCiphertext`] if
/// `m` is not an exact power of `n` at least `n^2`.
pub(crate) fn derive_s(n: &BigUint, m: &BigUint) -> Result<usize, DjError> {
    let mut power = n.clone();
    let mut exponent = 1usize;
    while &power < m {
        power *= n;
        exponent += 1;
    }
    if &power != m || exponent < 2 {
        return Err(DjError::InvalidCiphertext);
    }
    Ok(exponent - 1)
}

impl Add<&Ciphertext> for &Ciphertext {
    type Output = Result<Ciphertext, DjError>;
    fn add(self, rhs: &Ciphertext) -> Self::Output {
        self.checked_add(rhs)
    }
}

impl Add<&BigUint> for &Ciphertext {
    type Output = Ciphertext;
    fn add(self, rhs: &BigUint) -> Ciphertext {
        self.add_constant(rhs)
    }
}

impl Sub<&Ciphertext> for &Ciphertext {
    type Output = Result<Ciphertext, DjError>;
    fn sub(self, rhs: &Ciphertext) -> Self::Output {
        self.checked_sub(rhs)
    }
}

impl Neg for &Ciphertext {
    type Output = Result<Ciphertext, DjError>;
    fn neg(self) -> Self::Output {
        self.checked_neg()
    }
}

impl Mul<&BigUint> for &Ciphertext {
    type Output = Ciphertext;
    fn mul(self, rhs: &BigUint) -> Ciphertext {
        self.scalar_mul(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> (BigUint, BigUint) {
        // n = 11*13 = 143, s = 1, m = n^2 = 20449.
        (BigUint::from(143u32), BigUint::from(143u32 * 143u32))
    }

    #[test]
    fn equality_ignores_cache() {
        let (_, m) = toy();
        let a = Ciphertext::new(BigUint::from(5u32), m.clone(), true);
        let b = Ciphertext::new(BigUint::from(5u32), m, false);
        assert_eq!(a, b);
    }

    #[test]
    fn key_mismatch_is_rejected() {
        let (_, m) = toy();
        let a = Ciphertext::new_raw(BigUint::from(5u32), m);
        let b = Ciphertext::new_raw(BigUint::from(5u32), BigUint::from(9999u32));
        assert!(matches!(a.checked_add(&b), Err(DjError::KeyMismatch)));
    }

    #[test]
    fn scalar_mul_matches_plain_modpow_with_and_without_cache() {
        let (_, m) = toy();
        let c = BigUint::from(12345u32) % &m;
        let k = BigUint::from(37u32);
        let cached = Ciphertext::new(c.clone(), m.clone(), true).scalar_mul(&k);
        let uncached = Ciphertext::new_raw(c, m).scalar_mul(&k);
        assert_eq!(cached, uncached);
    }

    #[test]
    fn derive_s_recovers_expansion_factor() {
        let (n, m) = toy();
        assert_eq!(derive_s(&n, &m).unwrap(), 1);
        assert!(derive_s(&n, &n).is_err());
    }

    #[test]
    fn identity_is_neutral_for_add() {
        let (_, m) = toy();
        let x = Ciphertext::new_raw(BigUint::from(777u32) % &m, m.clone());
        let id = Ciphertext::identity(m);
        assert_eq!((&id).add(&x).unwrap(), x);
    }

    proptest::proptest! {
        #[test]
        fn scalar_mul_agrees_with_modpow_over_random_inputs(
            c_raw in 0u64..143u64 * 143,
            k_raw in 0u64..1_000_000,
        ) {
            let (_, m) = toy();
            let c = BigUint::from(c_raw);
            let k = BigUint::from(k_raw);
            let expected = c.modpow(&(k.clone() % &m), &m);

            let cached = Ciphertext::new(c.clone(), m.clone(), true).scalar_mul(&k);
            let uncached = Ciphertext::new_raw(c, m).scalar_mul(&k);
            proptest::prop_assert_eq!(cached.c(), &expected);
            proptest::prop_assert_eq!(uncached.c(), &expected);
        }

        #[test]
        fn checked_add_matches_c_product_mod_m(a_raw in 0u64..143u64 * 143, b_raw in 0u64..143u64 * 143) {
            let (_, m) = toy();
            let a = Ciphertext::new_raw(BigUint::from(a_raw), m.clone());
            let b = Ciphertext::new_raw(BigUint::from(b_raw), m.clone());
            let sum = a.checked_add(&b).unwrap();
            proptest::prop_assert_eq!(sum.c(), &(BigUint::from(a_raw) * BigUint::from(b_raw) % &m));
        }
    }
}
