//! A deterministic pseudorandom generator built on the Keccak sponge, used
//! both as a faithful `rand_core::RngCore` for production use and as a
//! reproducible source for key-generation test vectors.

use num_bigint_dig::BigUint;
use rand_core::{CryptoRng, Error as RandError, RngCore};

use super::sponge::KeccakSponge;

/// A snapshot of a [`KeccakPrg`]'s internal state, suitable for
/// `getstate`/`setstate`/`from_state` round-tripping.
#[derive(Clone, Debug)]
pub struct PrgState {
    sponge: KeccakSponge,
    buffer: BigUint,
    buffer_len: usize,
}

/// A Keccak-sponge-backed deterministic PRG.
///
/// State is `(sponge parameters, sponge state, bit-buffer integer,
/// bit-buffer length)`. For a fixed seed and fixed sponge parameters, two
/// instances emit bit-identical streams, including after
/// `setstate`/`from_state` at any offset.
#[derive(Clone, Debug)]
pub struct KeccakPrg {
    sponge: KeccakSponge,
    buffer: BigUint,
    buffer_len: usize,
}

impl KeccakPrg {
    /// Seeds a fresh PRG from `seed`. If `seed` is `None`, `ceil(c/8)` bytes
    /// are read from the OS entropy source (via the `getrandom` crate) and
    /// used instead; this is the one place in this crate that blocks on I/O.
    pub fn seed(seed: Option<&[u8]>, r: usize, c: usize) -> Self {
        let mut sponge = KeccakSponge::new(r, c).expect("valid Keccak sponge parameters");
        match seed {
            Some(bytes) => {
                sponge.absorb(bytes).expect("sponge has not begun squeezing");
            }
            None => {
                let mut entropy = vec![0u8; c.div_ceil(8)];
                getrandom::getrandom(&mut entropy).expect("failed to read OS entropy");
                sponge.absorb(&entropy).expect("sponge has not begun squeezing");
            }
        }
        KeccakPrg {
            sponge,
            buffer: BigUint::from(0u32),
            buffer_len: 0,
        }
    }

    /// Seeds a fresh PRG using the default sponge parameters (`r=1024,
    /// c=576`).
    pub fn seed_default(seed: Option<&[u8]>) -> Self {
        Self::seed(seed, 1024, 576)
    }

    /// Returns an integer in `[0, 2^n)`, built by squeezing whole sponge
    /// blocks into a little-endian bit buffer until it holds at least `n`
    /// bits, then returning (and consuming) the low `n` bits.
    pub fn getrandbits(&mut self, n: usize) -> BigUint {
        let block_bits = self.sponge.rate();
        while self.buffer_len < n {
            let block = self.sponge.squeeze(block_bits / 8);
            let block_int = BigUint::from_bytes_le(&block);
            self.buffer |= block_int << self.buffer_len;
            self.buffer_len += block_bits;
        }
        let mask = (BigUint::from(1u32) << n) - BigUint::from(1u32);
        let result = &self.buffer & &mask;
        self.buffer >>= n;
        self.buffer_len -= n;
        result
    }

    /// Captures the PRG's current state for later restoration.
    pub fn getstate(&self) -> PrgState {
        PrgState {
            sponge: self.sponge.clone(),
            buffer: self.buffer.clone(),
            buffer_len: self.buffer_len,
        }
    }

    /// Restores a previously captured state, reproducing the exact bit
    /// sequence that would follow from that point forward.
    pub fn setstate(&mut self, state: PrgState) {
        self.sponge = state.sponge;
        self.buffer = state.buffer;
        self.buffer_len = state.buffer_len;
    }

    /// Constructs a PRG directly from a captured state.
    pub fn from_state(state: PrgState) -> Self {
        KeccakPrg {
            sponge: state.sponge,
            buffer: state.buffer,
            buffer_len: state.buffer_len,
        }
    }

    /// Advances the sponge by `k` block-sized squeezes, discarding the
    /// output and clearing the bit buffer.
    pub fn jumpahead(&mut self, k: usize) {
        let block_bytes = self.sponge.rate() / 8;
        for _ in 0..k {
            self.sponge.squeeze(block_bytes);
        }
        self.buffer = BigUint::from(0u32);
        self.buffer_len = 0;
    }

    fn next_u64_via_getrandbits(&mut self) -> u64 {
        let v = self.getrandbits(64);
        let bytes = v.to_bytes_le();
        let mut buf = [0u8; 8];
        buf[..bytes.len().min(8)].copy_from_slice(&bytes[..bytes.len().min(8)]);
        u64::from_le_bytes(buf)
    }
}

impl RngCore for KeccakPrg {
    fn next_u32(&mut self) -> u32 {
        let v = self.getrandbits(32);
        let bytes = v.to_bytes_le();
        let mut buf = [0u8; 4];
        buf[..bytes.len().min(4)].copy_from_slice(&bytes[..bytes.len().min(4)]);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_via_getrandbits()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let v = self.getrandbits(dest.len() * 8);
        let mut bytes = v.to_bytes_le();
        bytes.resize(dest.len(), 0);
        dest.copy_from_slice(&bytes);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// The PRG is a deterministic cryptographic construction (the Keccak
/// sponge), so it is safe to use wherever a `CryptoRng` is required.
impl CryptoRng for KeccakPrg {}
