//! Cost parameters, limits, and validation.

#![forbid(unsafe_code)]

use argonaut_core::{Error, Result};

/// Minimum salt length in bytes.
pub const MIN_SALT_LEN: usize = 8;

/// Salt length required by the defaulted [`hash`](crate::hash) helper.
pub const RECOMMENDED_SALT_LEN: usize = 16;

/// Minimum digest length in bytes.
pub const MIN_OUT_LEN: usize = 4;

/// Minimum number of passes over memory.
pub const MIN_T_COST: u32 = 1;

/// Absolute minimum memory in KiB blocks. The effective floor is
/// 8 x lanes; a request below it is raised, not rejected.
pub const MIN_M_COST: u32 = 8;

/// Minimum lanes / threads.
pub const MIN_LANES: u32 = 1;

/// Maximum lanes / threads.
pub const MAX_LANES: u32 = 0xFF_FFFF;

/// The only supported algorithm version: 0x13, spelled `v=19` in PHC
/// strings.
pub const VERSION: u32 = 0x13;

/// Default time cost.
pub const DEFAULT_T_COST: u32 = 3;

/// Default memory cost (64 MiB).
pub const DEFAULT_M_COST: u32 = 65536;

/// Default parallelism.
pub const DEFAULT_LANES: u32 = 4;

/// Default digest length in bytes.
pub const DEFAULT_OUT_LEN: usize = 32;

/// Tunable costs for a derivation.
///
/// `lanes` is the parallelism degree baked into the digest; `threads` only
/// bounds how many lanes are filled concurrently and never affects the
/// output. `threads` above `lanes` is clamped down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    /// Memory cost in KiB blocks.
    pub m_cost: u32,
    /// Number of passes over memory.
    pub t_cost: u32,
    /// Independent memory lanes.
    pub lanes: u32,
    /// Worker threads filling lanes within a slice.
    pub threads: u32,
}

impl Params {
    /// Parameters with `threads` matching `lanes`.
    pub fn new(m_cost: u32, t_cost: u32, lanes: u32) -> Self {
        Self {
            m_cost,
            t_cost,
            lanes,
            threads: lanes,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.lanes < MIN_LANES {
            return Err(Error::LanesTooFew);
        }
        if self.lanes > MAX_LANES {
            return Err(Error::LanesTooMany);
        }
        if self.threads < MIN_LANES {
            return Err(Error::ThreadsTooFew);
        }
        if self.threads > MAX_LANES {
            return Err(Error::ThreadsTooMany);
        }
        if self.t_cost < MIN_T_COST {
            return Err(Error::TimeTooSmall);
        }
        if self.m_cost < MIN_M_COST {
            return Err(Error::MemoryTooLittle);
        }
        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new(DEFAULT_M_COST, DEFAULT_T_COST, DEFAULT_LANES)
    }
}

/// Wipe requests honored after a derivation.
///
/// See [`Argon2::hash_into_wiping`](crate::Argon2::hash_into_wiping).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Zero the password buffer before returning.
    pub clear_password: bool,
    /// Zero the configured secret before returning.
    pub clear_secret: bool,
}
