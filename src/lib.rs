//! `tausch`: a Damgard-Jurik generalized Paillier cryptosystem, a Keccak
//! sponge/PRG, and a homomorphic message router built on both.
//!
//! The three subsystems compose: [`dj`] provides the keys, plaintexts, and
//! ciphertexts; [`keccak`] provides both a general-purpose hash/XOF and the
//! deterministic PRG used to make key generation and test vectors
//! reproducible; [`router`] combines queued per-round messages with
//! subscribers' encrypted routing vectors via [`dj`]'s ciphertext
//! homomorphisms, never seeing a plaintext message or a plaintext
//! selector.
//!
//! Out of scope: prime generation internals beyond
//! [`bigint::gen_prime`]'s thin delegation to `num-bigint-dig`, mnemonic
//! word-encoding, "randomart" visualization, OAEP padding, a persistence
//! wire format beyond the byte encoding in [`codec`], CLI, and packaging.
//! Side-channel resistance and hardware acceleration are explicit
//! non-goals; the router assumes an honest-but-curious operator and
//! cooperative subscribers.

pub mod bigint;
pub mod codec;
pub mod dj;
pub mod error;
pub mod keccak;
pub mod router;

pub use dj::{Ciphertext, DjKey, DjKeyPair, DjPublicKey, Plaintext};
pub use error::{Error, Result};
pub use keccak::{KeccakPrg, KeccakSponge};
pub use router::{KeyId, RouterEvent, TauschRouter};
