//! Argon2 variant selection.

#![forbid(unsafe_code)]

use argonaut_core::{Error, Result};
use std::fmt;

/// The three Argon2 variants.
///
/// The numeric value is hashed into the initial hash H0 and into the
/// data-independent address generator, so it is fixed by RFC 9106.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Data-dependent addressing everywhere. Strongest against
    /// time-memory trade-offs, but open to cache-timing side channels.
    Argon2d = 0,

    /// Data-independent addressing everywhere.
    Argon2i = 1,

    /// Data-independent addressing for the first two slices of the first
    /// pass, data-dependent afterwards (RFC 9106 recommended default).
    #[default]
    Argon2id = 2,
}

impl Variant {
    /// Numeric tag as hashed into H0 and address blocks.
    pub(crate) fn tag(self) -> u32 {
        self as u32
    }

    /// Identifier token used in PHC strings.
    pub fn ident(self) -> &'static str {
        match self {
            Variant::Argon2d => "argon2d",
            Variant::Argon2i => "argon2i",
            Variant::Argon2id => "argon2id",
        }
    }

    pub(crate) fn from_ident(ident: &str) -> Result<Self> {
        match ident {
            "argon2d" => Ok(Variant::Argon2d),
            "argon2i" => Ok(Variant::Argon2i),
            "argon2id" => Ok(Variant::Argon2id),
            _ => Err(Error::DecodingFail),
        }
    }

    /// Whether reference addresses are data-independent at this point of
    /// the fill. For Argon2id only the first half of the first pass is.
    pub(crate) fn data_independent(self, pass: u32, slice: u32) -> bool {
        match self {
            Variant::Argon2d => false,
            Variant::Argon2i => true,
            Variant::Argon2id => pass == 0 && slice < 2,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ident())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_round_trip() {
        for variant in [Variant::Argon2d, Variant::Argon2i, Variant::Argon2id] {
            assert_eq!(Variant::from_ident(variant.ident()).unwrap(), variant);
        }
        assert_eq!(Variant::from_ident("argon2"), Err(Error::DecodingFail));
        assert_eq!(Variant::from_ident("Argon2id"), Err(Error::DecodingFail));
    }

    #[test]
    fn test_addressing_mode_schedule() {
        // Argon2id switches modes mid-first-pass; the others never switch.
        for slice in 0..4 {
            assert!(!Variant::Argon2d.data_independent(0, slice));
            assert!(Variant::Argon2i.data_independent(0, slice));
            assert!(Variant::Argon2i.data_independent(3, slice));
        }
        assert!(Variant::Argon2id.data_independent(0, 0));
        assert!(Variant::Argon2id.data_independent(0, 1));
        assert!(!Variant::Argon2id.data_independent(0, 2));
        assert!(!Variant::Argon2id.data_independent(0, 3));
        assert!(!Variant::Argon2id.data_independent(1, 0));
    }
}
