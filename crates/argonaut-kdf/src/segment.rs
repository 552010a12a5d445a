//! Per-segment fill workers and their shared view of the block matrix.
//!
//! Within one slice the lanes' segments are independent: each worker writes
//! only its own (lane, slice) segment and reads only blocks finished in
//! earlier slices, the two bootstrap blocks, or earlier positions of its
//! own lane. That discipline is what makes the unsynchronized view below
//! sound; the slice barrier is the parallel iterator completing.

#![allow(unsafe_code)]

use crate::block::Block;
use crate::indexing::{self, AddressGenerator, ADDRESSES_PER_BLOCK};
use crate::memory::FillConfig;
use rayon::prelude::*;

/// Unsynchronized view of the whole matrix, scoped to one segment worker.
struct SegmentView {
    memory: *mut Block,
    len: usize,
}

impl SegmentView {
    /// # Safety
    ///
    /// `memory` must point to `len` live blocks, and the caller must
    /// guarantee the fill discipline above: among concurrently live views,
    /// write regions are disjoint and no view reads a block another view
    /// writes.
    unsafe fn new(memory: *mut Block, len: usize) -> Self {
        Self { memory, len }
    }

    #[inline]
    fn read(&self, index: u32) -> &Block {
        debug_assert!((index as usize) < self.len);
        unsafe { &*self.memory.add(index as usize) }
    }

    #[inline]
    fn write(&self, index: u32, value: Block, xor: bool) {
        debug_assert!((index as usize) < self.len);
        let block = unsafe { &mut *self.memory.add(index as usize) };
        if xor {
            block.xor_assign(&value);
        } else {
            *block = value;
        }
    }
}

/// Fill every lane's segment of the given slice, in parallel when the
/// configuration asks for more than one thread. Lane order never affects
/// the digest.
pub(crate) fn fill_slice(
    memory: &mut [Block],
    cfg: &FillConfig,
    pass: u32,
    slice: u32,
    threads: u32,
) {
    let memory_ptr = memory.as_mut_ptr() as usize;
    let len = memory.len();

    if threads > 1 && cfg.lanes > 1 {
        // Lanes per worker, so at most `threads` segments run at once
        let lanes_per_worker = cfg.lanes.div_ceil(threads) as usize;
        (0..cfg.lanes)
            .into_par_iter()
            .with_min_len(lanes_per_worker)
            .for_each(|lane| {
                // SAFETY: the view lives for one (pass, slice, lane)
                // segment; distinct lanes have disjoint write regions, and
                // every read targets a block no concurrent worker writes.
                let view = unsafe { SegmentView::new(memory_ptr as *mut Block, len) };
                fill_segment(&view, cfg, pass, slice, lane);
            });
    } else {
        // SAFETY: single worker, exclusive access through `memory`.
        let view = unsafe { SegmentView::new(memory_ptr as *mut Block, len) };
        for lane in 0..cfg.lanes {
            fill_segment(&view, cfg, pass, slice, lane);
        }
    }
}

fn fill_segment(view: &SegmentView, cfg: &FillConfig, pass: u32, slice: u32, lane: u32) {
    let mut addresses = if cfg.variant.data_independent(pass, slice) {
        Some(AddressGenerator::new(
            pass,
            lane,
            slice,
            cfg.memory_blocks,
            cfg.t_cost,
            cfg.variant.tag(),
        ))
    } else {
        None
    };

    // The two bootstrap blocks of each lane are already present
    let start = if pass == 0 && slice == 0 { 2 } else { 0 };
    if start != 0 {
        if let Some(generator) = addresses.as_mut() {
            generator.refill();
        }
    }

    let lane_base = lane * cfg.lane_length;

    for index in start..cfg.segment_length {
        let index_in_lane = slice * cfg.segment_length + index;
        let prev_in_lane = if index_in_lane == 0 {
            cfg.lane_length - 1
        } else {
            index_in_lane - 1
        };

        let prev = view.read(lane_base + prev_in_lane);

        let j = match addresses.as_mut() {
            Some(generator) => {
                if index % ADDRESSES_PER_BLOCK == 0 {
                    generator.refill();
                }
                generator.word(index)
            }
            None => prev.word(0),
        };

        let (ref_lane, ref_in_lane) = indexing::reference_position(
            pass,
            slice,
            lane,
            index,
            cfg.lanes,
            cfg.lane_length,
            cfg.segment_length,
            j as u32,
            (j >> 32) as u32,
        );

        let reference = view.read(ref_lane * cfg.lane_length + ref_in_lane);
        let result = Block::compress(prev, reference);
        view.write(lane_base + index_in_lane, result, pass > 0);
    }
}
