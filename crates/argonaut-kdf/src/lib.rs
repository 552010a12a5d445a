//! Argon2 memory-hard password hashing (RFC 9106, version 0x13).
//!
//! All three variants are implemented from scratch: Argon2d (data-dependent
//! addressing), Argon2i (data-independent), and the hybrid Argon2id. A
//! derivation produces either a raw digest or a PHC-encoded string, and
//! verification re-derives from the parameters stored in the string and
//! compares in constant time.
//!
//! # Example
//!
//! ```
//! use argonaut_kdf::{hash_id, verify_id};
//!
//! # fn main() -> argonaut_kdf::Result<()> {
//! let encoded = hash_id(2, 256, 2, b"hunter42", b"0123456789abcdef", 32)?;
//! assert!(encoded.starts_with("$argon2id$v=19$m=256,t=2,p=2$"));
//! verify_id(&encoded, b"hunter42")?;
//! # Ok(())
//! # }
//! ```
//!
//! The reference crates this implementation is tested against live in
//! dev-dependencies only.

#![deny(unsafe_code)]

mod block;
mod indexing;
mod memory;
mod params;
mod segment;
mod variant;

pub mod blake2b;
pub mod phc;

pub use argonaut_core::{Error, Result};
pub use params::{
    Flags, Params, DEFAULT_LANES, DEFAULT_M_COST, DEFAULT_OUT_LEN, DEFAULT_T_COST, MAX_LANES,
    MIN_LANES, MIN_M_COST, MIN_OUT_LEN, MIN_SALT_LEN, MIN_T_COST, RECOMMENDED_SALT_LEN, VERSION,
};
pub use phc::PhcHash;
pub use variant::Variant;

use zeroize::Zeroize;

/// Argon2 derivation context: a variant, cost parameters, and optional
/// keyed secret and associated data.
///
/// The context is reusable; every call allocates and drops its own memory
/// matrix.
#[derive(Clone, Default)]
pub struct Argon2 {
    variant: Variant,
    params: Params,
    secret: Vec<u8>,
    associated_data: Vec<u8>,
}

impl Argon2 {
    pub fn new(variant: Variant, params: Params) -> Self {
        Self {
            variant,
            params,
            secret: Vec::new(),
            associated_data: Vec::new(),
        }
    }

    /// Keyed hashing: the secret ("pepper") participates in the initial
    /// hash, so verification needs the same secret.
    pub fn with_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Associated data mixed into the initial hash.
    pub fn with_associated_data(mut self, associated_data: impl Into<Vec<u8>>) -> Self {
        self.associated_data = associated_data.into();
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Derive into a caller-provided buffer; the buffer length is the tag
    /// length. On failure the buffer is left untouched.
    pub fn hash_into(&self, password: &[u8], salt: &[u8], out: &mut [u8]) -> Result<()> {
        memory::derive(
            self.variant,
            &self.params,
            password,
            salt,
            &self.secret,
            &self.associated_data,
            out,
        )
    }

    /// Like [`hash_into`](Self::hash_into), but additionally wipes the
    /// input buffers selected by `flags` before returning, whether the
    /// derivation succeeded or not. A `clear_secret` run leaves this
    /// context with an empty secret.
    pub fn hash_into_wiping(
        &mut self,
        password: &mut [u8],
        salt: &[u8],
        out: &mut [u8],
        flags: Flags,
    ) -> Result<()> {
        let result = memory::derive(
            self.variant,
            &self.params,
            password,
            salt,
            &self.secret,
            &self.associated_data,
            out,
        );
        if flags.clear_password {
            password.zeroize();
        }
        if flags.clear_secret {
            self.secret.zeroize();
            self.secret.clear();
        }
        result
    }

    /// Derive an `out_len`-byte digest.
    pub fn hash_raw(&self, password: &[u8], salt: &[u8], out_len: usize) -> Result<Vec<u8>> {
        if out_len < MIN_OUT_LEN {
            return Err(Error::OutputTooShort);
        }
        if out_len > u32::MAX as usize {
            return Err(Error::OutputTooLong);
        }
        let mut out = vec![0u8; out_len];
        self.hash_into(password, salt, &mut out)?;
        Ok(out)
    }

    /// Derive an `out_len`-byte digest and encode it as a PHC string.
    pub fn hash_encoded(&self, password: &[u8], salt: &[u8], out_len: usize) -> Result<String> {
        let digest = self.hash_raw(password, salt, out_len)?;
        Ok(phc::encode(
            self.variant,
            self.params.m_cost,
            self.params.t_cost,
            self.params.lanes,
            salt,
            &digest,
        ))
    }

    /// Verify a password against a PHC string whose variant must match
    /// this context's. The derivation re-runs with the parameters stored
    /// in the string, keeping this context's secret and associated data.
    pub fn verify(&self, encoded: &str, password: &[u8]) -> Result<()> {
        let parsed = phc::decode(encoded)?;
        if parsed.variant != self.variant {
            return Err(Error::IncorrectType);
        }
        verify_decoded(&parsed, password, &self.secret, &self.associated_data)
    }
}

/// Raw Argon2d digest.
pub fn hash_d_raw(
    t_cost: u32,
    m_cost: u32,
    parallelism: u32,
    password: &[u8],
    salt: &[u8],
    out_len: usize,
) -> Result<Vec<u8>> {
    Argon2::new(Variant::Argon2d, Params::new(m_cost, t_cost, parallelism))
        .hash_raw(password, salt, out_len)
}

/// Raw Argon2i digest.
pub fn hash_i_raw(
    t_cost: u32,
    m_cost: u32,
    parallelism: u32,
    password: &[u8],
    salt: &[u8],
    out_len: usize,
) -> Result<Vec<u8>> {
    Argon2::new(Variant::Argon2i, Params::new(m_cost, t_cost, parallelism))
        .hash_raw(password, salt, out_len)
}

/// Raw Argon2id digest.
pub fn hash_id_raw(
    t_cost: u32,
    m_cost: u32,
    parallelism: u32,
    password: &[u8],
    salt: &[u8],
    out_len: usize,
) -> Result<Vec<u8>> {
    Argon2::new(Variant::Argon2id, Params::new(m_cost, t_cost, parallelism))
        .hash_raw(password, salt, out_len)
}

/// PHC-encoded Argon2d hash.
pub fn hash_d(
    t_cost: u32,
    m_cost: u32,
    parallelism: u32,
    password: &[u8],
    salt: &[u8],
    out_len: usize,
) -> Result<String> {
    Argon2::new(Variant::Argon2d, Params::new(m_cost, t_cost, parallelism))
        .hash_encoded(password, salt, out_len)
}

/// PHC-encoded Argon2i hash.
pub fn hash_i(
    t_cost: u32,
    m_cost: u32,
    parallelism: u32,
    password: &[u8],
    salt: &[u8],
    out_len: usize,
) -> Result<String> {
    Argon2::new(Variant::Argon2i, Params::new(m_cost, t_cost, parallelism))
        .hash_encoded(password, salt, out_len)
}

/// PHC-encoded Argon2id hash.
pub fn hash_id(
    t_cost: u32,
    m_cost: u32,
    parallelism: u32,
    password: &[u8],
    salt: &[u8],
    out_len: usize,
) -> Result<String> {
    Argon2::new(Variant::Argon2id, Params::new(m_cost, t_cost, parallelism))
        .hash_encoded(password, salt, out_len)
}

/// PHC-encoded Argon2id hash with the default costs (t=3, m=65536, p=4,
/// 32-byte tag). Unlike the per-variant functions this requires a salt of
/// at least 16 bytes.
pub fn hash(password: &[u8], salt: &[u8]) -> Result<String> {
    if salt.len() < RECOMMENDED_SALT_LEN {
        return Err(Error::SaltTooShort);
    }
    hash_id(
        DEFAULT_T_COST,
        DEFAULT_M_COST,
        DEFAULT_LANES,
        password,
        salt,
        DEFAULT_OUT_LEN,
    )
}

/// PHC-encoded Argon2id hash with explicit costs.
pub fn hash_with_params(
    t_cost: u32,
    m_cost: u32,
    parallelism: u32,
    password: &[u8],
    salt: &[u8],
    out_len: usize,
) -> Result<String> {
    hash_id(t_cost, m_cost, parallelism, password, salt, out_len)
}

/// Verify a password against a PHC string, requiring `expected` as the
/// encoded variant. A different variant reports [`Error::IncorrectType`]
/// before any derivation work.
pub fn argon2_verify(encoded: &str, password: &[u8], expected: Variant) -> Result<()> {
    let parsed = phc::decode(encoded)?;
    if parsed.variant != expected {
        return Err(Error::IncorrectType);
    }
    verify_decoded(&parsed, password, &[], &[])
}

/// Verify against an Argon2d PHC string.
pub fn verify_d(encoded: &str, password: &[u8]) -> Result<()> {
    argon2_verify(encoded, password, Variant::Argon2d)
}

/// Verify against an Argon2i PHC string.
pub fn verify_i(encoded: &str, password: &[u8]) -> Result<()> {
    argon2_verify(encoded, password, Variant::Argon2i)
}

/// Verify against an Argon2id PHC string.
pub fn verify_id(encoded: &str, password: &[u8]) -> Result<()> {
    argon2_verify(encoded, password, Variant::Argon2id)
}

/// Verify a password against a PHC string of any variant. Returns whether
/// the password matches; decoding problems still surface as errors.
pub fn verify(encoded: &str, password: &[u8]) -> Result<bool> {
    let parsed = phc::decode(encoded)?;
    match verify_decoded(&parsed, password, &[], &[]) {
        Ok(()) => Ok(true),
        Err(Error::VerifyMismatch) => Ok(false),
        Err(other) => Err(other),
    }
}

fn verify_decoded(
    parsed: &PhcHash,
    password: &[u8],
    secret: &[u8],
    associated_data: &[u8],
) -> Result<()> {
    let params = Params::new(parsed.m_cost, parsed.t_cost, parsed.parallelism);
    let mut digest = vec![0u8; parsed.hash.len()];
    memory::derive(
        parsed.variant,
        &params,
        password,
        &parsed.salt,
        secret,
        associated_data,
        &mut digest,
    )?;

    if constant_time_eq(&digest, &parsed.hash) {
        Ok(())
    } else {
        Err(Error::VerifyMismatch)
    }
}

/// Compare every byte regardless of where the first mismatch occurs, so
/// timing reveals nothing about matching prefixes.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
