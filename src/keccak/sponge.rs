//! A streaming Keccak sponge with `pad10*1` padding.
//!
//! This is the classic NIST-style sponge (absorb phase, pad, squeeze
//! phase), not a duplex construction: a duplex's `up`/`down`/domain-
//! separator framing targets AEAD, while this crate needs the reference
//! sponge both as a general-purpose XOF and as the backbone of the
//! deterministic PRG in [`crate::keccak::prg`]. The lane-indexed
//! permutation underneath (module [`crate::keccak::permutation`]) is
//! shared between the two.

use super::permutation::keccak_f;
use crate::error::SpongeError;

const VALID_WIDTHS: [usize; 7] = [25, 50, 100, 200, 400, 800, 1600];

/// A Keccak sponge instance: `(r, c, S, buffered_input, output_cache,
/// done_absorbing)`.
#[derive(Clone, Debug)]
pub struct KeccakSponge {
    r: usize,
    c: usize,
    w: u32,
    state: [[u64; 5]; 5],
    buffered_input: Vec<u8>,
    output_cache: Vec<u8>,
    done_absorbing: bool,
}

impl KeccakSponge {
    /// Constructs a new sponge with bitrate `r` and capacity `c`. Fails with
    /// [`SpongeError::InvalidParameter`] unless `r + c` is one of the seven
    /// standard Keccak widths, `r > 0`, and `r` is a multiple of 8. The
    /// derived lane width `w = (r+c)/25` must also be a multiple of 8, since
    /// this sponge's external contract is byte-aligned I/O only.
    pub fn new(r: usize, c: usize) -> Result<Self, SpongeError> {
        let b = r + c;
        if !VALID_WIDTHS.contains(&b) || r == 0 || r % 8 != 0 {
            return Err(SpongeError::InvalidParameter { r, c });
        }
        let w = (b / 25) as u32;
        if w % 8 != 0 {
            return Err(SpongeError::InvalidParameter { r, c });
        }
        Ok(KeccakSponge {
            r,
            c,
            w,
            state: [[0u64; 5]; 5],
            buffered_input: Vec::new(),
            output_cache: Vec::new(),
            done_absorbing: false,
        })
    }

    /// `Keccak[]` with the default parameters: `r=1024, c=576`.
    pub fn keccak_default() -> Self {
        Self::new(1024, 576).expect("1024+576=1600 is a valid Keccak width")
    }

    /// The SHA-3-224 bitrate/capacity pair (same permutation; this crate's
    /// `pad10*1` padding is not SHA-3's domain-separated padding, so this is
    /// not interoperable with NIST SHA-3 despite sharing parameters).
    pub fn sha3_224() -> Self {
        Self::new(1152, 448).expect("1152+448=1600 is a valid Keccak width")
    }

    /// The SHA-3-256 bitrate/capacity pair.
    pub fn sha3_256() -> Self {
        Self::new(1088, 512).expect("1088+512=1600 is a valid Keccak width")
    }

    /// The SHA-3-384 bitrate/capacity pair.
    pub fn sha3_384() -> Self {
        Self::new(832, 768).expect("832+768=1600 is a valid Keccak width")
    }

    /// The SHA-3-512 bitrate/capacity pair.
    pub fn sha3_512() -> Self {
        Self::new(576, 1024).expect("576+1024=1600 is a valid Keccak width")
    }

    /// The sponge's bitrate, in bits.
    pub fn rate(&self) -> usize {
        self.r
    }

    /// The sponge's capacity, in bits.
    pub fn capacity(&self) -> usize {
        self.c
    }

    fn rate_bytes(&self) -> usize {
        self.r / 8
    }

    fn width_bytes(&self) -> usize {
        (self.r + self.c) / 8
    }

    /// Absorbs `bytes` into the sponge. Fails with
    /// [`SpongeError::AlreadySqueezing`] once [`Self::squeeze`] has been
    /// called.
    pub fn absorb(&mut self, bytes: &[u8]) -> Result<(), SpongeError> {
        if self.done_absorbing {
            return Err(SpongeError::AlreadySqueezing);
        }
        self.buffered_input.extend_from_slice(bytes);
        let rate_bytes = self.rate_bytes();
        while self.buffered_input.len() >= rate_bytes {
            let block: Vec<u8> = self.buffered_input.drain(..rate_bytes).collect();
            self.absorb_block(&block);
        }
        Ok(())
    }

    fn absorb_block(&mut self, rate_block: &[u8]) {
        debug_assert_eq!(rate_block.len(), self.rate_bytes());
        let mut padded = rate_block.to_vec();
        padded.resize(self.width_bytes(), 0);
        xor_bytes_into_state(&mut self.state, &padded, self.w);
        keccak_f(&mut self.state, self.w);
    }

    /// Squeezes `n` bytes of output. May be called multiple times; the
    /// concatenation of successive calls is a deterministic extensible
    /// stream, i.e. `squeeze(a) ++ squeeze(b) == squeeze(a + b)` called once.
    pub fn squeeze(&mut self, n: usize) -> Vec<u8> {
        if !self.done_absorbing {
            let padded = pad10star1(&self.buffered_input, self.rate_bytes());
            self.buffered_input.clear();
            self.absorb_block(&padded);
            self.done_absorbing = true;
        }

        let mut out = Vec::with_capacity(n);
        let take = self.output_cache.len().min(n);
        out.extend(self.output_cache.drain(..take));

        let rate_bytes = self.rate_bytes();
        while out.len() < n {
            let block = extract_state_bytes(&self.state, self.w);
            let rate_slice = &block[..rate_bytes];
            keccak_f(&mut self.state, self.w);

            let need = n - out.len();
            if need >= rate_slice.len() {
                out.extend_from_slice(rate_slice);
            } else {
                out.extend_from_slice(&rate_slice[..need]);
                self.output_cache = rate_slice[need..].to_vec();
            }
        }
        out
    }
}

/// `pad10*1(M, n)`: pads `m` (a whole number of bytes, always `< n` bytes
/// long) with a `1`, zeros, and a final `1` to reach exactly `n` bytes,
/// specialized to byte-aligned input.
fn pad10star1(m: &[u8], n: usize) -> Vec<u8> {
    debug_assert!(m.len() < n);
    let mut out = m.to_vec();
    let n_bits = n * 8;
    let l = (m.len() * 8) % n_bits;
    if n_bits >= 8 && (n_bits - 8) <= l && l <= (n_bits - 2) {
        out.push(0x81);
    } else {
        out.push(0x01);
        while out.len() < n - 1 {
            out.push(0x00);
        }
        out.push(0x80);
    }
    debug_assert_eq!(out.len(), n);
    out
}

fn lane_bytes(w: u32) -> usize {
    (w / 8) as usize
}

fn xor_bytes_into_state(state: &mut [[u64; 5]; 5], data: &[u8], w: u32) {
    let lb = lane_bytes(w);
    for x in 0..5 {
        for y in 0..5 {
            let offset = (5 * y + x) * lb;
            let mut lane_buf = [0u8; 8];
            lane_buf[..lb].copy_from_slice(&data[offset..offset + lb]);
            state[x][y] ^= u64::from_le_bytes(lane_buf);
        }
    }
}

fn extract_state_bytes(state: &[[u64; 5]; 5], w: u32) -> Vec<u8> {
    let lb = lane_bytes(w);
    let mut out = vec![0u8; 25 * lb];
    for x in 0..5 {
        for y in 0..5 {
            let offset = (5 * y + x) * lb;
            out[offset..offset + lb].copy_from_slice(&state[x][y].to_le_bytes()[..lb]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_widths() {
        assert!(KeccakSponge::new(1000, 600).is_err());
        assert!(KeccakSponge::new(0, 1600).is_err());
        assert!(KeccakSponge::new(7, 1593).is_err());
    }

    #[test]
    fn keccak_default_empty_input_kat() {
        let mut sponge = KeccakSponge::keccak_default();
        let out = sponge.squeeze(64);
        assert_eq!(out.len(), 64);
        // Determinism: a second instance on the same input produces the
        // same output.
        let mut sponge2 = KeccakSponge::keccak_default();
        assert_eq!(sponge2.squeeze(64), out);
    }

    #[test]
    fn split_squeeze_equals_combined_squeeze() {
        let mut a = KeccakSponge::keccak_default();
        a.absorb(b"tausch").unwrap();
        let mut b = a.clone();

        let mut split = a.squeeze(7);
        split.extend(a.squeeze(13));

        let combined = b.squeeze(20);
        assert_eq!(split, combined);
    }

    #[test]
    fn absorb_after_squeeze_fails() {
        let mut sponge = KeccakSponge::keccak_default();
        sponge.squeeze(1);
        assert!(matches!(
            sponge.absorb(b"late"),
            Err(SpongeError::AlreadySqueezing)
        ));
    }

    #[test]
    fn small_width_kat_is_byte_aligned() {
        // Keccak[r=40, c=160] -> b=200, w=8: smallest byte-aligned family
        // member.
        let mut sponge = KeccakSponge::new(40, 160).unwrap();
        sponge.absorb(b"").unwrap();
        let out = sponge.squeeze(20);
        assert_eq!(out.len(), 20);
    }

    proptest::proptest! {
        #[test]
        fn split_squeeze_matches_combined_for_arbitrary_input(
            input in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256),
            split_at in 0usize..40,
        ) {
            let mut a = KeccakSponge::keccak_default();
            a.absorb(&input).unwrap();
            let mut b = a.clone();

            let mut split = a.squeeze(split_at);
            split.extend(a.squeeze(40 - split_at));

            let combined = b.squeeze(40);
            proptest::prop_assert_eq!(split, combined);
        }
    }
}
