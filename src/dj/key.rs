//! Damgard-Jurik key types.

use num_bigint_dig::BigUint;
use num_traits::One;
use rand_core::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::bigint;

/// A Damgard-Jurik public key: just the modulus `n = p*q`.
///
/// `n`'s bit length determines `keylen`: for a key generated by
/// [`DjKeyPair::generate`], `floor(log2(n)) in {keylen-1, keylen, keylen+1}`
/// (the prime-length rule below admits a one-bit overshoot).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DjPublicKey {
    pub(crate) n: BigUint,
}

impl DjPublicKey {
    /// The modulus `n`.
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /// The bit length of `n`, i.e. the `keylen` this key was generated
    /// (or closely approximates) with.
    pub fn keylen(&self) -> usize {
        self.n.bits() as usize
    }

    /// A stable, cheap-to-hash identifier for this key: the Keccak-256
    /// digest of `n`'s little-endian byte encoding. Used by
    /// [`crate::router::TauschRouter`] in place of hashing the raw modulus
    /// repeatedly.
    pub fn key_id(&self) -> crate::router::KeyId {
        crate::router::KeyId::of(&self.n)
    }
}

/// A Damgard-Jurik keypair with private material (`lambda = lcm(p-1,
/// q-1)`). Wraps [`DjPublicKey`] plus the private exponent.
///
/// The private exponent is zeroized on drop, following this corpus's use of
/// `zeroize` for sensitive cryptographic state.
#[derive(Clone, Debug, Zeroize, ZeroizeOnDrop)]
pub struct DjKeyPair {
    #[zeroize(skip)]
    pub(crate) public: DjPublicKey,
    pub(crate) lambda: BigUint,
}

impl DjKeyPair {
    /// Generates a new keypair with the given `keylen`, using `rng` to
    /// source two primes:
    ///
    /// 1. `p` has length `ceil(keylen/2) + 1` bits, `q` has length
    ///    `ceil(keylen/2)` bits.
    /// 2. `n = p*q`, `lambda = lcm(p-1, q-1)`.
    /// 3. The primes themselves are discarded; only `n` and `lambda`
    ///    survive.
    pub fn generate<R: RngCore>(keylen: usize, rng: &mut R) -> Self {
        let half = keylen.div_ceil(2);
        let p = bigint::gen_prime(half + 1, rng);
        let q = bigint::gen_prime(half, rng);
        let n = &p * &q;
        let lambda = bigint::lcm(&(&p - BigUint::one()), &(&q - BigUint::one()));
        DjKeyPair {
            public: DjPublicKey { n },
            lambda,
        }
    }

    /// Generates a new keypair using the OS entropy source directly,
    /// for callers that don't need a reproducible [`crate::keccak::KeccakPrg`]
    /// (`rand`'s `OsRng` satisfies the same `RngCore` bound `generate`
    /// takes).
    pub fn generate_os(keylen: usize) -> Self {
        Self::generate(keylen, &mut rand::rngs::OsRng)
    }

    /// Constructs a keypair from already-known `(n, lambda)` private
    /// material, e.g. when deserializing a persisted key.
    pub fn from_private_parts(n: BigUint, lambda: BigUint) -> Self {
        DjKeyPair {
            public: DjPublicKey { n },
            lambda,
        }
    }

    /// The public half of this keypair.
    pub fn public(&self) -> &DjPublicKey {
        &self.public
    }

    /// `n`.
    pub fn n(&self) -> &BigUint {
        &self.public.n
    }

    /// `lambda`.
    pub fn lambda(&self) -> &BigUint {
        &self.lambda
    }

    /// The bit length of `n`.
    pub fn keylen(&self) -> usize {
        self.public.keylen()
    }
}

/// A key as it comes off the wire: either the public modulus alone, or the
/// full keypair with private material.
#[derive(Clone, Debug)]
pub enum DjKey {
    /// A public-only key: no private material, decryption is unavailable.
    Public(DjPublicKey),
    /// A full keypair.
    Private(DjKeyPair),
}

impl DjKey {
    /// The public modulus, regardless of which variant this is.
    pub fn public(&self) -> &DjPublicKey {
        match self {
            DjKey::Public(p) => p,
            DjKey::Private(kp) => kp.public(),
        }
    }

    /// `n`.
    pub fn n(&self) -> &BigUint {
        &self.public().n
    }

    /// Returns the private keypair, or fails with
    /// [`crate::error::DjError::NoPrivateKey`] if this key is public-only.
    pub fn require_private(&self) -> Result<&DjKeyPair, crate::error::DjError> {
        match self {
            DjKey::Private(kp) => Ok(kp),
            DjKey::Public(_) => Err(crate::error::DjError::NoPrivateKey),
        }
    }
}

impl From<DjKeyPair> for DjKey {
    fn from(kp: DjKeyPair) -> Self {
        DjKey::Private(kp)
    }
}

impl From<DjPublicKey> for DjKey {
    fn from(pk: DjPublicKey) -> Self {
        DjKey::Public(pk)
    }
}
