//! The Keccak-_f_ permutation, sponge, and PRG.

pub mod permutation;
pub mod prg;
pub mod sponge;

pub use prg::KeccakPrg;
pub use sponge::KeccakSponge;
