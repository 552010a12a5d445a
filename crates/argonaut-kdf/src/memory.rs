//! The block matrix and the lane/slice fill schedule.
//!
//! Memory is a matrix of 1024-byte blocks, `lanes` rows of `lane_length`
//! blocks, each lane split into four slices. Slices are filled in order
//! and act as synchronization points: a position may reference any
//! completed block of an earlier slice in any lane, so lanes only run in
//! parallel inside one slice.

#![forbid(unsafe_code)]

use crate::blake2b::{self, Blake2b};
use crate::block::{Block, BLOCK_SIZE};
use crate::params::{Params, MIN_OUT_LEN, MIN_SALT_LEN, VERSION};
use crate::segment;
use crate::variant::Variant;
use argonaut_core::{Error, Result};
use zeroize::Zeroize;

/// Slices per lane; cross-lane references synchronize at slice boundaries.
pub(crate) const SYNC_POINTS: u32 = 4;

/// Length of the initial hash H0.
const PREHASH_LEN: usize = 64;

/// H0 plus the two LE32 words appended when seeding bootstrap blocks.
const PREHASH_SEED_LEN: usize = PREHASH_LEN + 8;

/// Geometry and schedule constants shared with the segment workers.
pub(crate) struct FillConfig {
    pub(crate) variant: Variant,
    pub(crate) t_cost: u32,
    pub(crate) lanes: u32,
    pub(crate) lane_length: u32,
    pub(crate) segment_length: u32,
    pub(crate) memory_blocks: u32,
}

/// One derivation's working state. Owned by a single call; the matrix
/// never escapes and is dropped when the tag has been squeezed out.
struct Instance {
    memory: Vec<Block>,
    cfg: FillConfig,
    threads: u32,
}

impl Instance {
    fn new(variant: Variant, params: &Params) -> Result<Self> {
        // Raise the request to the floor of 8 blocks per lane, then
        // truncate down so each lane holds four equal slices.
        let floor = 2 * SYNC_POINTS * params.lanes;
        let granularity = SYNC_POINTS * params.lanes;
        let memory_blocks = params.m_cost.max(floor) / granularity * granularity;

        let lane_length = memory_blocks / params.lanes;
        let segment_length = lane_length / SYNC_POINTS;

        let mut memory = Vec::new();
        memory
            .try_reserve_exact(memory_blocks as usize)
            .map_err(|_| Error::MemoryAllocation)?;
        memory.resize(memory_blocks as usize, Block::ZERO);

        Ok(Self {
            memory,
            cfg: FillConfig {
                variant,
                t_cost: params.t_cost,
                lanes: params.lanes,
                lane_length,
                segment_length,
                memory_blocks,
            },
            threads: params.threads.min(params.lanes),
        })
    }

    /// Seed the first two blocks of every lane from H0.
    ///
    /// The seed buffer is H0 followed by LE32(block index) and LE32(lane);
    /// only the trailing eight bytes change between invocations.
    fn bootstrap(&mut self, seed: &mut [u8; PREHASH_SEED_LEN]) {
        let mut bytes = [0u8; BLOCK_SIZE];
        for lane in 0..self.cfg.lanes {
            seed[PREHASH_LEN + 4..].copy_from_slice(&lane.to_le_bytes());
            for block in 0..2u32 {
                seed[PREHASH_LEN..PREHASH_LEN + 4].copy_from_slice(&block.to_le_bytes());
                blake2b::blake2b_long(&mut bytes, &seed[..]);
                self.memory[(lane * self.cfg.lane_length + block) as usize].load_bytes(&bytes);
            }
        }
        bytes.zeroize();
    }

    fn fill(&mut self) {
        for pass in 0..self.cfg.t_cost {
            for slice in 0..SYNC_POINTS {
                segment::fill_slice(&mut self.memory, &self.cfg, pass, slice, self.threads);
            }
        }
    }

    /// XOR the last block of every lane and squeeze the tag out through H'.
    fn finalize(self, out: &mut [u8]) {
        let last = (self.cfg.lane_length - 1) as usize;
        let mut acc = self.memory[last];
        for lane in 1..self.cfg.lanes {
            acc.xor_assign(&self.memory[(lane * self.cfg.lane_length) as usize + last]);
        }

        let mut bytes = acc.to_bytes();
        acc.0.zeroize();
        blake2b::blake2b_long(out, &bytes);
        bytes.zeroize();
    }
}

/// Run a full derivation into `out`; the buffer length is the tag length.
pub(crate) fn derive(
    variant: Variant,
    params: &Params,
    password: &[u8],
    salt: &[u8],
    secret: &[u8],
    associated_data: &[u8],
    out: &mut [u8],
) -> Result<()> {
    params.validate()?;

    if out.len() < MIN_OUT_LEN {
        return Err(Error::OutputTooShort);
    }
    if out.len() > u32::MAX as usize {
        return Err(Error::OutputTooLong);
    }
    if password.len() > u32::MAX as usize {
        return Err(Error::PasswordTooLong);
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(Error::SaltTooShort);
    }
    if salt.len() > u32::MAX as usize {
        return Err(Error::SaltTooLong);
    }
    if secret.len() > u32::MAX as usize {
        return Err(Error::SecretTooLong);
    }
    if associated_data.len() > u32::MAX as usize {
        return Err(Error::AssociatedDataTooLong);
    }

    let mut instance = Instance::new(variant, params)?;

    let mut seed = initial_hash(
        variant,
        params,
        out.len() as u32,
        password,
        salt,
        secret,
        associated_data,
    );
    instance.bootstrap(&mut seed);
    seed.zeroize();

    instance.fill();
    instance.finalize(out);
    Ok(())
}

/// H0 (RFC 9106 §3.2): Blake2b-512 over every parameter and input, each
/// variable-length field preceded by its LE32 length.
///
/// The memory cost hashed here is the caller's request, not the value
/// rounded to the slice granularity; the reference implementation does the
/// same. The trailing eight bytes of the returned buffer are zero, reserved
/// for the bootstrap counters.
fn initial_hash(
    variant: Variant,
    params: &Params,
    out_len: u32,
    password: &[u8],
    salt: &[u8],
    secret: &[u8],
    associated_data: &[u8],
) -> [u8; PREHASH_SEED_LEN] {
    let mut state = Blake2b::new(PREHASH_LEN);
    state.update(&params.lanes.to_le_bytes());
    state.update(&out_len.to_le_bytes());
    state.update(&params.m_cost.to_le_bytes());
    state.update(&params.t_cost.to_le_bytes());
    state.update(&VERSION.to_le_bytes());
    state.update(&variant.tag().to_le_bytes());
    state.update(&(password.len() as u32).to_le_bytes());
    state.update(password);
    state.update(&(salt.len() as u32).to_le_bytes());
    state.update(salt);
    state.update(&(secret.len() as u32).to_le_bytes());
    state.update(secret);
    state.update(&(associated_data.len() as u32).to_le_bytes());
    state.update(associated_data);

    let mut seed = [0u8; PREHASH_SEED_LEN];
    state.finalize(&mut seed[..PREHASH_LEN]);
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_is_rounded_to_slice_granularity() {
        let instance = Instance::new(Variant::Argon2id, &Params::new(19, 1, 2)).unwrap();
        // floor is 16, granularity 8: 19 rounds down to 16
        assert_eq!(instance.cfg.memory_blocks, 16);
        assert_eq!(instance.cfg.lane_length, 8);
        assert_eq!(instance.cfg.segment_length, 2);
    }

    #[test]
    fn test_memory_request_below_floor_is_raised() {
        let instance = Instance::new(Variant::Argon2id, &Params::new(8, 1, 4)).unwrap();
        assert_eq!(instance.cfg.memory_blocks, 32);
    }

    #[test]
    fn test_initial_hash_covers_every_field() {
        let params = Params::new(64, 2, 1);
        let base = initial_hash(Variant::Argon2i, &params, 32, b"password", b"somesalt", b"", b"");

        let other_variant =
            initial_hash(Variant::Argon2d, &params, 32, b"password", b"somesalt", b"", b"");
        assert_ne!(base, other_variant);

        let other_out = initial_hash(Variant::Argon2i, &params, 33, b"password", b"somesalt", b"", b"");
        assert_ne!(base, other_out);

        let keyed = initial_hash(Variant::Argon2i, &params, 32, b"password", b"somesalt", b"k", b"");
        assert_ne!(base, keyed);

        let with_ad = initial_hash(Variant::Argon2i, &params, 32, b"password", b"somesalt", b"", b"x");
        assert_ne!(base, with_ad);
    }

    #[test]
    fn test_derive_validates_inputs() {
        let mut out = [0u8; 32];
        let params = Params::new(64, 2, 1);

        assert_eq!(
            derive(Variant::Argon2id, &params, b"pw", b"short", b"", b"", &mut out),
            Err(Error::SaltTooShort)
        );

        let mut tiny = [0u8; 3];
        assert_eq!(
            derive(Variant::Argon2id, &params, b"pw", b"goodsalt", b"", b"", &mut tiny),
            Err(Error::OutputTooShort)
        );

        assert_eq!(
            derive(
                Variant::Argon2id,
                &Params::new(1, 2, 1),
                b"pw",
                b"goodsalt",
                b"",
                b"",
                &mut out
            ),
            Err(Error::MemoryTooLittle)
        );
    }

    #[test]
    fn test_output_untouched_on_failure() {
        let mut out = [0xaau8; 32];
        let result = derive(
            Variant::Argon2id,
            &Params::new(64, 2, 1),
            b"pw",
            b"short",
            b"",
            b"",
            &mut out,
        );
        assert!(result.is_err());
        assert_eq!(out, [0xaau8; 32]);
    }
}
