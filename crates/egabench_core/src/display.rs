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

    display.rs

    Implements the display memory interface: the register sequences that
    select the active plane, switch between latched and direct transfers,
    flip display pages, and the strided block-copy primitives every blit
    strategy is built from. Isolating plane selection here keeps the
    hardware protocol out of the drawing algorithms.

*/

use crate::{
    bus::HardwareBus,
    devices::ega::{
        CRTC_REGISTER_ADDRESS,
        EGA_GRAPHICS_ADDRESS,
        EGA_MEM_ADDRESS,
        SEQUENCER_ADDRESS_REGISTER,
    },
};

/// Width of one scanline in bytes (320 pixels / 8).
pub const SCREEN_ROW_PITCH: usize = 40;
pub const SCREEN_ROWS: usize = 200;

/// One plane's worth of a full 320x200 frame.
pub const PLANE_FRAME_SIZE: usize = SCREEN_ROW_PITCH * SCREEN_ROWS;

/// A full planar-interleaved frame in main memory: 4 planes x 8000 bytes.
pub const FRAME_BUFFER_SIZE: usize = PLANE_FRAME_SIZE * 4;

/// Size of one display page in VRAM, per plane.
pub const PAGE_SIZE: usize = 0x2000;

/// VRAM offset of the off-screen tile bank (segment A400 on hardware).
pub const TILE_BANK_OFFSET: usize = 0x4000;

pub struct DisplayIo<'a> {
    bus: &'a mut HardwareBus,
}

impl<'a> DisplayIo<'a> {
    pub fn new(bus: &'a mut HardwareBus) -> Self {
        Self { bus }
    }

    /// Restrict writes to a single plane and select the same plane for
    /// reads. Map Mask = 1 << plane, Read Map Select = plane.
    #[inline]
    pub fn select_plane(&mut self, plane: usize) {
        self.bus
            .io_write_u16(SEQUENCER_ADDRESS_REGISTER, 0x0002 | (0x0100 << plane));
        self.bus
            .io_write_u16(EGA_GRAPHICS_ADDRESS, 0x0004 | ((plane as u16) << 8));
    }

    /// Enable writes to all four planes and switch to latched (write mode 1)
    /// transfers. Must be established once before a run of latch copies.
    pub fn setup_latch_copy(&mut self) {
        self.bus.io_write_u16(SEQUENCER_ADDRESS_REGISTER, 0x0F02);
        self.bus.io_write_u16(EGA_GRAPHICS_ADDRESS, 0x0105);
    }

    /// Reset read and write modes to their default state, allowing direct
    /// (non-latched) writes from the CPU.
    pub fn set_default_mode(&mut self) {
        self.bus.io_write_u16(EGA_GRAPHICS_ADDRESS, 0x0005);
    }

    /// Reset the bit mask to its default state, allowing writes to all eight
    /// pixel positions in each written byte.
    pub fn set_default_bitmask(&mut self) {
        self.bus.io_write_u16(EGA_GRAPHICS_ADDRESS, 0xFF08);
    }

    /// Restore the default map mask, allowing writes to all four planes.
    pub fn reset_write_mask(&mut self) {
        self.bus.io_write_u16(SEQUENCER_ADDRESS_REGISTER, 0x0F02);
    }

    /// Establish the register state the drawing code expects after mode set.
    pub fn init_video(&mut self) {
        self.set_default_bitmask();
        self.set_default_mode();
        self.reset_write_mask();
        log::debug!("Video state initialized");
    }

    /// Reset the card on the way out, as the mode restore would on hardware.
    pub fn exit_video(&mut self) {
        self.bus.ega_mut().reset();
        log::debug!("Video state reset");
    }

    /// Select which display page is scanned out, by programming the CRTC
    /// start address to the page's base offset.
    pub fn set_display_page(&mut self, page: usize) {
        let start = (page * PAGE_SIZE) as u16;
        self.bus
            .io_write_u16(CRTC_REGISTER_ADDRESS, (start & 0xFF00) | 0x0C);
        self.bus
            .io_write_u16(CRTC_REGISTER_ADDRESS, ((start & 0x00FF) << 8) | 0x0D);
    }

    /// Load planar-interleaved data into display memory one plane at a time,
    /// cycling the write mask across all four planes for every destination
    /// byte. Four source bytes are consumed per destination offset. Used to
    /// prime the off-screen tile bank; not part of any hot benchmark path.
    pub fn copy_planar(&mut self, src: &[u8], dest: usize) {
        let size = src.len() / 4;
        let mut si = 0;

        for i in 0..size {
            let mut mask: u16 = 0x0100;
            while mask < 0x1000 {
                self.bus.io_write_u16(SEQUENCER_ADDRESS_REGISTER, mask | 0x0002);
                self.mem_write(dest + i, src[si]);
                si += 1;
                mask <<= 1;
            }
        }
    }

    /// Zero-fill one frame's worth of the primary display page under the
    /// default write mask. The write mode in effect is deliberately left
    /// alone, as the original does.
    pub fn clear(&mut self) {
        self.reset_write_mask();
        for i in 0..PLANE_FRAME_SIZE {
            self.mem_write(i, 0);
        }
    }

    /// Block copy from main memory into display memory: `count` bytes, the
    /// source advancing by `src_stride` and the destination by `dst_stride`
    /// per byte.
    #[inline]
    pub fn copy_from_slice(
        &mut self,
        src: &[u8],
        src_stride: usize,
        dest: usize,
        dst_stride: usize,
        count: usize,
    ) {
        for k in 0..count {
            self.mem_write(dest + k * dst_stride, src[k * src_stride]);
        }
    }

    /// Block copy within display memory. Each step reads the source byte,
    /// which loads all four latches, then writes the destination; under
    /// write mode 1 the write stores the latches to every enabled plane, so
    /// one byte transferred moves all four planes at once.
    #[inline]
    pub fn copy_vram(
        &mut self,
        src: usize,
        src_stride: usize,
        dest: usize,
        dst_stride: usize,
        count: usize,
    ) {
        for k in 0..count {
            let byte = self.mem_read(src + k * src_stride);
            self.mem_write(dest + k * dst_stride, byte);
        }
    }

    /// Read back one plane's frame region. Test support; reads go through
    /// the read map like any CPU read.
    pub fn read_plane_region(&mut self, plane: usize, offset: usize, len: usize) -> Vec<u8> {
        self.select_plane(plane);
        (offset..offset + len).map(|o| self.mem_read(o)).collect()
    }

    #[inline]
    fn mem_read(&mut self, offset: usize) -> u8 {
        self.bus.mem_read_u8(EGA_MEM_ADDRESS + offset)
    }

    #[inline]
    fn mem_write(&mut self, offset: usize, data: u8) {
        self.bus.mem_write_u8(EGA_MEM_ADDRESS + offset, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;

    #[test]
    fn select_plane_programs_mask_and_read_map() {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());

        dsp.select_plane(2);
        let ega = machine.bus().ega();
        assert_eq!(ega.sequencer().map_mask, 0x04);
        assert_eq!(ega.gc.read_map_select(), 2);
    }

    #[test]
    fn copy_planar_interleaves_across_planes() {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());
        dsp.init_video();

        let src: Vec<u8> = (0..16u8).collect();
        dsp.copy_planar(&src, TILE_BANK_OFFSET);

        let ega = machine.bus().ega();
        for i in 0..4 {
            for plane in 0..4 {
                assert_eq!(
                    ega.plane_slice(plane)[TILE_BANK_OFFSET + i],
                    (i * 4 + plane) as u8
                );
            }
        }
    }

    #[test]
    fn clear_zeroes_the_frame_region() {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());
        dsp.init_video();

        dsp.reset_write_mask();
        for i in 0..PLANE_FRAME_SIZE {
            dsp.mem_write(i, 0xFF);
        }
        dsp.clear();

        let ega = machine.bus().ega();
        for plane in 0..4 {
            assert!(ega.plane_slice(plane)[..PLANE_FRAME_SIZE].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn page_select_programs_crtc_start_address() {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());

        dsp.set_display_page(1);
        assert_eq!(machine.bus().ega().display_page(), 1);
        let mut dsp = DisplayIo::new(machine.bus_mut());
        dsp.set_display_page(0);
        assert_eq!(machine.bus().ega().display_page(), 0);
    }
}
