/*
    egabench
    https://github.com/dbalsom/egabench

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    blit.rs

    The three benchmark drawing strategies. All assume the fixed 320x200,
    4-plane, 16-color geometry; each is a composition of plane selection and
    the display interface's block-copy primitives.

*/

use crate::display::{DisplayIo, FRAME_BUFFER_SIZE, PLANE_FRAME_SIZE, SCREEN_ROW_PITCH, TILE_BANK_OFFSET};

pub const TILE_COLS: usize = 40;
pub const TILE_ROWS: usize = 25;
pub const TILE_HEIGHT: usize = 8;

/// Bytes per tile per plane in the off-screen bank (one column byte per row).
pub const TILE_BANK_STRIDE: usize = 8;

/// Bytes per tile in a planar-interleaved main-memory buffer: 8 rows x 4
/// plane bytes.
pub const TILE_RECORD_SIZE: usize = 32;

/// Destination stride between tile rows: 8 scanlines of 40 bytes.
const TILE_ROW_STRIDE: usize = SCREEN_ROW_PITCH * TILE_HEIGHT;

/// The baseline: one large sequential transfer per plane.
///
/// For each plane in order 0 to 3, restrict writes to that plane and copy
/// one contiguous quarter of the source buffer to `dest`. The source
/// pointer advances linearly across planes; the destination rewinds to
/// `dest` for each plane.
pub fn draw_fullscreen(dsp: &mut DisplayIo, buffer: &[u8; FRAME_BUFFER_SIZE], dest: usize) {
    for plane in 0..4 {
        dsp.select_plane(plane);
        dsp.copy_from_slice(
            &buffer[plane * PLANE_FRAME_SIZE..(plane + 1) * PLANE_FRAME_SIZE],
            1,
            dest,
            1,
            PLANE_FRAME_SIZE,
        );
    }
}

/// The fast tiled path: latch copies from the off-screen tile bank.
///
/// Latched transfer is established once, then each of the 1000 tile
/// positions receives an 8-byte copy from the bank; every transferred byte
/// moves one tile row across all four planes at once.
pub fn draw_tiled(dsp: &mut DisplayIo, dest: usize) {
    dsp.setup_latch_copy();

    let mut idx = TILE_BANK_OFFSET;
    for row in 0..TILE_ROWS {
        for col in 0..TILE_COLS {
            dsp.copy_vram(
                idx,
                1,
                dest + row * TILE_ROW_STRIDE + col,
                SCREEN_ROW_PITCH,
                TILE_HEIGHT,
            );
            idx += TILE_BANK_STRIDE;
        }
    }
}

/// The naive tiled path: per-plane transfers from main memory.
///
/// For each tile, each of the four planes is selected in turn and the
/// tile's 8 bytes for that plane are copied with source stride 4 (the plane
/// interleave within the tile record) and destination stride 40. Both
/// pointers rewind to the tile's start between planes. Four full
/// plane-select-and-transfer cycles per tile make this the worst case.
pub fn draw_tiled_slow(dsp: &mut DisplayIo, buffer: &[u8; FRAME_BUFFER_SIZE], dest: usize) {
    dsp.set_default_mode();

    let mut record = 0;
    for row in 0..TILE_ROWS {
        for col in 0..TILE_COLS {
            let tile_dest = dest + row * TILE_ROW_STRIDE + col;
            for plane in 0..4 {
                dsp.select_plane(plane);
                dsp.copy_from_slice(
                    &buffer[record + plane..],
                    4,
                    tile_dest,
                    SCREEN_ROW_PITCH,
                    TILE_HEIGHT,
                );
            }
            record += TILE_RECORD_SIZE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{display::DisplayIo, machine::Machine};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn filled_buffer(fill: impl FnMut() -> u8) -> Box<[u8; FRAME_BUFFER_SIZE]> {
        let mut f = fill;
        let v: Vec<u8> = (0..FRAME_BUFFER_SIZE).map(|_| f()).collect();
        v.into_boxed_slice().try_into().unwrap()
    }

    fn plane_region(machine: &Machine, plane: usize, len: usize) -> Vec<u8> {
        machine.bus().ega().plane_slice(plane)[..len].to_vec()
    }

    #[test]
    fn fullscreen_blit_of_zeros_leaves_planes_zero() {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());
        dsp.init_video();

        // Dirty all four planes first so the zero blit is observable
        let ones = filled_buffer(|| 0xFF);
        draw_fullscreen(&mut dsp, &ones, 0);

        let zeros = filled_buffer(|| 0x00);
        draw_fullscreen(&mut dsp, &zeros, 0);

        // Read back through the read map, as a CPU would
        for plane in 0..4 {
            let readback = dsp.read_plane_region(plane, 0, PLANE_FRAME_SIZE);
            assert!(readback.iter().all(|&b| b == 0), "plane {} not cleared", plane);
        }
    }

    #[test]
    fn fullscreen_blit_distributes_quarters() {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());
        dsp.init_video();

        let buffer = filled_buffer({
            let mut i = 0usize;
            move || {
                let b = (i / PLANE_FRAME_SIZE) as u8 + 1;
                i += 1;
                b
            }
        });
        draw_fullscreen(&mut dsp, &buffer, 0);

        for plane in 0..4 {
            assert!(plane_region(&machine, plane, PLANE_FRAME_SIZE)
                .iter()
                .all(|&b| b == plane as u8 + 1));
        }
    }

    // The two tiled strategies are different performance paths to the same
    // visual result: given identical source data, the resulting planes must
    // be byte-identical.
    #[test]
    fn tiled_strategies_are_equivalent() {
        let mut rng = StdRng::seed_from_u64(0x1993);
        let buffer = filled_buffer(|| rng.gen());

        let mut slow_machine = Machine::new();
        let mut dsp = DisplayIo::new(slow_machine.bus_mut());
        dsp.init_video();
        draw_tiled_slow(&mut dsp, &buffer, 0);

        let mut latch_machine = Machine::new();
        let mut dsp = DisplayIo::new(latch_machine.bus_mut());
        dsp.init_video();
        dsp.copy_planar(&buffer[..], TILE_BANK_OFFSET);
        draw_tiled(&mut dsp, 0);

        for plane in 0..4 {
            assert_eq!(
                plane_region(&latch_machine, plane, PLANE_FRAME_SIZE),
                plane_region(&slow_machine, plane, PLANE_FRAME_SIZE),
                "plane {} differs between latch and slow tiled paths",
                plane
            );
        }
    }

    #[test]
    fn tiled_blit_honors_destination_offset() {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());
        dsp.init_video();

        let buffer = filled_buffer(|| 0x5A);
        draw_tiled_slow(&mut dsp, &buffer, 0x2000);

        let plane = plane_region(&machine, 0, 0x2000 + PLANE_FRAME_SIZE);
        assert!(plane[..0x2000].iter().all(|&b| b == 0));
        assert!(plane[0x2000..].iter().all(|&b| b == 0x5A));
    }
}
