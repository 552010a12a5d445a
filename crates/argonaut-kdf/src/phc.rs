//! PHC string codec: `$argon2id$v=19$m=65536,t=2,p=1$<salt>$<hash>`.
//!
//! Salt and hash are standard-alphabet base64 without padding. The encoder
//! always emits parameters in `m,t,p` order; the decoder accepts any order
//! but requires all three and nothing else.

#![forbid(unsafe_code)]

use crate::params::VERSION;
use crate::variant::Variant;
use argonaut_core::{Error, Result};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;

/// A parsed PHC record.
///
/// `salt` and `hash` are the exact decoded bytes; their lengths are taken
/// as stored and not re-checked against current policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhcHash {
    pub variant: Variant,
    pub version: u32,
    pub m_cost: u32,
    pub t_cost: u32,
    pub parallelism: u32,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

/// Encode a computed digest together with its parameters.
pub fn encode(
    variant: Variant,
    m_cost: u32,
    t_cost: u32,
    parallelism: u32,
    salt: &[u8],
    hash: &[u8],
) -> String {
    format!(
        "${}$v={}$m={},t={},p={}${}${}",
        variant.ident(),
        VERSION,
        m_cost,
        t_cost,
        parallelism,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash),
    )
}

/// Parse an encoded hash. Every malformation, from a wrong segment count
/// to an unknown parameter key, reports [`Error::DecodingFail`].
pub fn decode(encoded: &str) -> Result<PhcHash> {
    let mut parts = encoded.split('$');

    // The string begins with '$', so the first split element is empty
    if parts.next() != Some("") {
        return Err(Error::DecodingFail);
    }

    let variant = Variant::from_ident(next_segment(&mut parts)?)?;

    let version: u32 = next_segment(&mut parts)?
        .strip_prefix("v=")
        .ok_or(Error::DecodingFail)?
        .parse()
        .map_err(|_| Error::DecodingFail)?;
    if version != VERSION {
        return Err(Error::DecodingFail);
    }

    let (mut m_cost, mut t_cost, mut parallelism) = (None, None, None);
    for pair in next_segment(&mut parts)?.split(',') {
        let (key, value) = pair.split_once('=').ok_or(Error::DecodingFail)?;
        let value: u32 = value.parse().map_err(|_| Error::DecodingFail)?;
        match key {
            "m" => m_cost = Some(value),
            "t" => t_cost = Some(value),
            "p" => parallelism = Some(value),
            _ => return Err(Error::DecodingFail),
        }
    }

    let salt = decode_b64(next_segment(&mut parts)?)?;
    let hash = decode_b64(next_segment(&mut parts)?)?;

    if parts.next().is_some() {
        return Err(Error::DecodingFail);
    }

    Ok(PhcHash {
        variant,
        version,
        m_cost: m_cost.ok_or(Error::DecodingFail)?,
        t_cost: t_cost.ok_or(Error::DecodingFail)?,
        parallelism: parallelism.ok_or(Error::DecodingFail)?,
        salt,
        hash,
    })
}

fn next_segment<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<&'a str> {
    match parts.next() {
        Some(segment) if !segment.is_empty() => Ok(segment),
        _ => Err(Error::DecodingFail),
    }
}

fn decode_b64(segment: &str) -> Result<Vec<u8>> {
    STANDARD_NO_PAD
        .decode(segment)
        .map_err(|_| Error::DecodingFail)
}
