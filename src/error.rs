//! The error taxonomy shared by every module in this crate.

use thiserror::Error;

/// Errors raised by the [`crate::bigint`] facade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BigIntError {
    /// Extended Euclid found `gcd(a, m) != 1`: no multiplicative inverse exists.
    #[error("no modular inverse exists")]
    NoInverse,
}

/// Errors raised by the [`crate::codec`] byte/int conversions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The integer does not fit in the requested number of bytes.
    #[error("integer does not fit in the requested byte length")]
    Overflow,
}

/// Errors raised by the Keccak sponge and PRG.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpongeError {
    /// `r + c` is not one of the seven valid Keccak widths, or `r` is not a
    /// positive multiple of 8.
    #[error("invalid sponge parameters: r={r}, c={c}")]
    InvalidParameter {
        /// The requested bitrate.
        r: usize,
        /// The requested capacity.
        c: usize,
    },
    /// `absorb` was called after `squeeze` had already begun.
    #[error("cannot absorb after squeezing has started")]
    AlreadySqueezing,
}

/// Errors raised by Damgard-Jurik encryption and decryption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DjError {
    /// The plaintext integer is `>= n^s` for the chosen expansion `s`.
    #[error("message is too large for the given expansion factor")]
    MessageTooLarge,
    /// The ciphertext integer is `>= n^(s+1)`, or no positive `s` satisfies
    /// `n^s <= c < n^(s+1)`.
    #[error("ciphertext is not a valid Damgard-Jurik ciphertext under this key")]
    InvalidCiphertext,
    /// `decrypt` was called on a public-only key.
    #[error("this key has no private material for decryption")]
    NoPrivateKey,
    /// The two ciphertext operands belong to different moduli.
    #[error("ciphertexts belong to different keys")]
    KeyMismatch,
    /// Division, bitwise, or shift operations are not defined on ciphertexts.
    #[error("operation is not supported on ciphertexts")]
    UnsupportedOperation,
    /// A modular inverse required during decryption does not exist.
    #[error(transparent)]
    NoInverse(#[from] BigIntError),
}

/// Errors raised by the Tausch router.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// `add_user` was called with an identity already present in the table.
    #[error("user is already registered with the router")]
    DuplicateUser,
    /// The referenced identity is not present in the table.
    #[error("user is not registered with the router")]
    UnknownUser,
    /// `queue_message` was called twice for the same identity in one round.
    #[error("user has already queued a message for this round")]
    DuplicateQueued,
    /// `route_messages` was called before every subscriber had queued.
    #[error("not every subscriber has queued a message for this round")]
    IncompleteQueue,
    /// A subscription's domain does not match the router's table, or a
    /// selector ciphertext does not belong to the subscriber's own key.
    #[error("subscription does not match the routing table")]
    TypeMismatch,
}

/// The crate-wide error type. Each module's error enum converts into this
/// one via `#[from]`, following the layered-`thiserror` style used
/// throughout this corpus.
#[derive(Debug, Error)]
pub enum Error {
    /// See [`BigIntError`].
    #[error(transparent)]
    BigInt(#[from] BigIntError),
    /// See [`CodecError`].
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// See [`SpongeError`].
    #[error(transparent)]
    Sponge(#[from] SpongeError),
    /// See [`DjError`].
    #[error(transparent)]
    Dj(#[from] DjError),
    /// See [`RouterError`].
    #[error(transparent)]
    Router(#[from] RouterError),
    /// One or more router callbacks returned an error while being dispatched
    /// after a state change, paired with the subscriber each failure came
    /// from. The router's state is already committed by the time this is
    /// raised; it is purely informational.
    #[error("{} router callback(s) failed during dispatch", .0.len())]
    CallbackFailures(Vec<(crate::router::KeyId, String)>),
}

/// A `Result` alias using this crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
