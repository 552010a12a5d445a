use thiserror::Error;

/// Failure kinds for Argon2 derivation, PHC decoding, and verification.
///
/// Every failed call reports exactly one kind, and the output buffer is
/// never partially written on failure. Messages are stable and name the
/// offending field so callers without typed dispatch can match on them.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("salt is too short: minimum 8 bytes")]
    SaltTooShort,

    #[error("salt is too long")]
    SaltTooLong,

    #[error("output is too short: minimum 4 bytes")]
    OutputTooShort,

    #[error("output is too long")]
    OutputTooLong,

    #[error("password is too long")]
    PasswordTooLong,

    #[error("secret is too long")]
    SecretTooLong,

    #[error("associated data is too long")]
    AssociatedDataTooLong,

    #[error("time cost is too small: minimum 1 pass")]
    TimeTooSmall,

    #[error("time cost is too large")]
    TimeTooLarge,

    #[error("memory cost is too little: minimum 8 blocks")]
    MemoryTooLittle,

    #[error("memory cost is too much")]
    MemoryTooMuch,

    #[error("too few lanes: minimum 1")]
    LanesTooFew,

    #[error("too many lanes: maximum 2^24 - 1")]
    LanesTooMany,

    #[error("too few threads: minimum 1")]
    ThreadsTooFew,

    #[error("too many threads: maximum 2^24 - 1")]
    ThreadsTooMany,

    #[error("decoding failed")]
    DecodingFail,

    #[error("verification mismatch")]
    VerifyMismatch,

    #[error("incorrect Argon2 type")]
    IncorrectType,

    #[error("memory allocation failed")]
    MemoryAllocation,
}
