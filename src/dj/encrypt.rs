//! Damgard-Jurik encryption.

use num_bigint_dig::BigUint;
use num_traits::One;
use rand_core::RngCore;

use crate::codec;
use crate::dj::ciphertext::Ciphertext;
use crate::dj::key::DjPublicKey;
use crate::dj::plaintext::Plaintext;
use crate::error::DjError;

/// Picks the smallest `s >= 1` with `i < n^s`, the `s=None` inference rule
/// for integer messages.
pub fn infer_s(n: &BigUint, i: &BigUint) -> usize {
    let mut s = 1usize;
    let mut ns = n.clone();
    while &ns <= i {
        ns *= n;
        s += 1;
    }
    s
}

fn random_bits<R: RngCore + ?Sized>(rng: &mut R, bits: usize) -> BigUint {
    let nbytes = bits.div_ceil(8);
    let mut buf = vec![0u8; nbytes];
    rng.fill_bytes(&mut buf);
    let extra = nbytes * 8 - bits;
    if extra > 0 {
        let last = nbytes - 1;
        buf[last] &= 0xFFu8 >> extra;
    }
    BigUint::from_bytes_le(&buf)
}

/// Samples `r` uniformly from `[1, m)` by rejection sampling `keylen*(s+1)`
/// bits at a time.
fn sample_r<R: RngCore + ?Sized>(m: &BigUint, keylen: usize, s: usize, rng: &mut R) -> BigUint {
    let bits = keylen * (s + 1);
    loop {
        let candidate = random_bits(rng, bits);
        if candidate >= BigUint::one() && candidate < *m {
            return candidate;
        }
    }
}

/// Encrypts integer `i` under public key `key`, at expansion `s` (or the
/// smallest fitting `s` if `None`). Returns the raw ciphertext integer and
/// the `s` actually used. Fails with [`DjError::MessageTooLarge`] if `s` is
/// given explicitly and `i >= n^s`.
pub fn encrypt_int<R: RngCore + ?Sized>(
    key: &DjPublicKey,
    i: &BigUint,
    s: Option<usize>,
    rng: &mut R,
) -> Result<(BigUint, usize), DjError> {
    let n = key.n();
    let s = match s {
        Some(s) => {
            if i >= &n.pow(s as u32) {
                return Err(DjError::MessageTooLarge);
            }
            s
        }
        None => infer_s(n, i),
    };
    let m = n.pow((s + 1) as u32);
    let ns = n.pow(s as u32);
    let r = sample_r(&m, key.keylen(), s, rng);
    let base = n + BigUint::one();
    let c = base.modpow(i, &m) * r.modpow(&ns, &m) % &m;
    Ok((c, s))
}

/// Encrypts a byte string, returning ciphertext bytes of exactly
/// `ceil(keylen*(s+1)/8)` bytes.
pub fn encrypt_bytes<R: RngCore + ?Sized>(
    key: &DjPublicKey,
    bytes: &[u8],
    s: Option<usize>,
    rng: &mut R,
) -> Result<Vec<u8>, DjError> {
    let i = codec::bytes_to_int(bytes);
    let (c, s) = encrypt_int(key, &i, s, rng)?;
    let len = (key.keylen() * (s + 1)).div_ceil(8);
    Ok(codec::int_to_bytes(&c, len).expect("c < n^(s+1) fits in the computed byte length"))
}

/// Encrypts a [`Plaintext`], returning a [`Ciphertext`] with its power
/// cache enabled by default.
pub fn encrypt_plaintext<R: RngCore + ?Sized>(
    key: &DjPublicKey,
    message: &Plaintext,
    s: Option<usize>,
    rng: &mut R,
) -> Result<Ciphertext, DjError> {
    let (c, s) = encrypt_int(key, message.as_int(), s, rng)?;
    let m = key.n().pow((s + 1) as u32);
    Ok(Ciphertext::new(c, m, true))
}
