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

    ---------------------------------------------------------------------------

    ega::mod.rs

    Implements the EGA card: sequencer, graphics controller, CRTC subset,
    palette DAC, and four planes of video RAM, addressable through the 64k
    aperture at A000:0000. CPU reads and writes pass through the graphics
    controller's latch and write-mode pipeline.

*/

pub mod crtc;
pub mod dac;
pub mod graphics;
pub mod sequencer;
pub mod vram;

use crate::bus::IoDevice;

use crtc::Crtc;
use dac::Dac;
use graphics::GraphicsController;
use sequencer::Sequencer;

pub const EGA_MEM_ADDRESS: usize = 0xA0000;
pub const EGA_MEM_WINDOW_64: usize = 0x10000;
pub const EGA_MEM_END_64: usize = EGA_MEM_ADDRESS + EGA_MEM_WINDOW_64 - 1;

pub const EGA_GFX_PLANE_SIZE: usize = 65536;

pub const SEQUENCER_ADDRESS_REGISTER: u16 = 0x3C4;
pub const SEQUENCER_DATA_REGISTER: u16 = 0x3C5;

pub const EGA_GRAPHICS_ADDRESS: u16 = 0x3CE;
pub const EGA_GRAPHICS_DATA: u16 = 0x3CF;

pub const CRTC_REGISTER_ADDRESS: u16 = 0x3D4;
pub const CRTC_REGISTER: u16 = 0x3D5;

pub const DAC_WRITE_INDEX_REGISTER: u16 = 0x3C8;
pub const DAC_DATA_REGISTER: u16 = 0x3C9;

pub struct EgaCard {
    pub sequencer: Sequencer,
    pub gc: GraphicsController,
    pub crtc: Crtc,
    pub dac: Dac,
}

impl Default for EgaCard {
    fn default() -> Self {
        Self {
            sequencer: Sequencer::new(),
            gc: GraphicsController::new(),
            crtc: Crtc::new(),
            dac: Dac::new(),
        }
    }
}

impl IoDevice for EgaCard {
    fn read_u8(&mut self, port: u16) -> u8 {
        match port {
            CRTC_REGISTER => self.crtc.read_data(),
            _ => {
                // The sequencer and graphics controller registers are
                // write-only on the EGA
                0xFF
            }
        }
    }

    fn write_u8(&mut self, port: u16, data: u8) {
        match port {
            SEQUENCER_ADDRESS_REGISTER => self.sequencer.write_address(data),
            SEQUENCER_DATA_REGISTER => self.sequencer.write_data(data),
            EGA_GRAPHICS_ADDRESS => self.gc.write_address(data),
            EGA_GRAPHICS_DATA => self.gc.write_data(data),
            CRTC_REGISTER_ADDRESS => self.crtc.write_address(data),
            CRTC_REGISTER => self.crtc.write_data(data),
            DAC_WRITE_INDEX_REGISTER => self.dac.write_index(data),
            DAC_DATA_REGISTER => self.dac.write_data(data),
            _ => {}
        }
    }

    fn port_list(&self) -> Vec<(String, u16)> {
        vec![
            (String::from("Sequencer Address Register"), SEQUENCER_ADDRESS_REGISTER),
            (String::from("Sequencer Data Register"), SEQUENCER_DATA_REGISTER),
            (String::from("Graphics Address Register"), EGA_GRAPHICS_ADDRESS),
            (String::from("Graphics Data Register"), EGA_GRAPHICS_DATA),
            (String::from("CRTC Address Register"), CRTC_REGISTER_ADDRESS),
            (String::from("CRTC Data Register"), CRTC_REGISTER),
            (String::from("DAC Write Index Register"), DAC_WRITE_INDEX_REGISTER),
            (String::from("DAC Data Register"), DAC_DATA_REGISTER),
        ]
    }
}

impl EgaCard {
    pub fn new() -> Self {
        EgaCard::default()
    }

    pub fn reset(&mut self) {
        self.sequencer.reset();
        self.gc.reset();
        self.crtc.reset();
        self.dac.reset();
    }

    #[inline]
    fn aperture_offset(address: usize) -> usize {
        debug_assert!((EGA_MEM_ADDRESS..=EGA_MEM_END_64).contains(&address));
        address - EGA_MEM_ADDRESS
    }

    /// CPU read from the memory aperture. Loads the latches.
    pub fn mem_read_u8(&mut self, address: usize) -> u8 {
        let offset = Self::aperture_offset(address);
        self.gc.cpu_read_u8(&self.sequencer, offset)
    }

    /// CPU write to the memory aperture, through the write-mode pipeline.
    pub fn mem_write_u8(&mut self, address: usize, byte: u8) {
        let offset = Self::aperture_offset(address);
        self.gc.cpu_write_u8(&mut self.sequencer, offset, byte);
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn plane_slice(&self, plane: usize) -> &[u8] {
        self.sequencer.vram.plane_slice(plane)
    }

    /// The display page currently scanned out, derived from the CRTC start
    /// address.
    pub fn display_page(&self) -> usize {
        (self.crtc.start_address() as usize) / 0x2000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The port-level plane select the drawing code uses
    fn select_plane(ega: &mut EgaCard, plane: u8) {
        ega.write_u8(SEQUENCER_ADDRESS_REGISTER, 0x02);
        ega.write_u8(SEQUENCER_DATA_REGISTER, 1 << plane);
        ega.write_u8(EGA_GRAPHICS_ADDRESS, 0x04);
        ega.write_u8(EGA_GRAPHICS_DATA, plane);
    }

    fn default_pipeline(ega: &mut EgaCard) {
        ega.write_u8(EGA_GRAPHICS_ADDRESS, 0x08);
        ega.write_u8(EGA_GRAPHICS_DATA, 0xFF);
        ega.write_u8(EGA_GRAPHICS_ADDRESS, 0x05);
        ega.write_u8(EGA_GRAPHICS_DATA, 0x00);
    }

    #[test]
    fn plane_select_isolates_writes_and_reads() {
        let mut ega = EgaCard::new();
        default_pipeline(&mut ega);

        for plane in 0..4u8 {
            select_plane(&mut ega, plane);
            ega.mem_write_u8(EGA_MEM_ADDRESS + 0x100, 0x10 + plane);
        }

        for plane in 0..4u8 {
            select_plane(&mut ega, plane);
            assert_eq!(ega.mem_read_u8(EGA_MEM_ADDRESS + 0x100), 0x10 + plane);
        }
    }

    #[test]
    fn latch_copy_moves_all_planes_in_one_write() {
        let mut ega = EgaCard::new();
        default_pipeline(&mut ega);

        for plane in 0..4u8 {
            select_plane(&mut ega, plane);
            ega.mem_write_u8(EGA_MEM_ADDRESS + 0x4000, 0xA0 | plane);
        }

        // All planes writable, write mode 1: the latch copy setup
        ega.write_u8(SEQUENCER_ADDRESS_REGISTER, 0x02);
        ega.write_u8(SEQUENCER_DATA_REGISTER, 0x0F);
        ega.write_u8(EGA_GRAPHICS_ADDRESS, 0x05);
        ega.write_u8(EGA_GRAPHICS_DATA, 0x01);

        let byte = ega.mem_read_u8(EGA_MEM_ADDRESS + 0x4000);
        ega.mem_write_u8(EGA_MEM_ADDRESS + 0x0020, byte);

        for plane in 0..4 {
            assert_eq!(ega.plane_slice(plane)[0x0020], 0xA0 | plane as u8);
        }
    }

    #[test]
    fn display_page_follows_start_address() {
        let mut ega = EgaCard::new();
        assert_eq!(ega.display_page(), 0);
        ega.write_u8(CRTC_REGISTER_ADDRESS, 0x0C);
        ega.write_u8(CRTC_REGISTER, 0x20);
        ega.write_u8(CRTC_REGISTER_ADDRESS, 0x0D);
        ega.write_u8(CRTC_REGISTER, 0x00);
        assert_eq!(ega.display_page(), 1);
    }
}
