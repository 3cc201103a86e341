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

    ega::sequencer.rs

    Implements the EGA Sequencer. The register that matters for plane-masked
    drawing is the Map Mask: a write to video memory only reaches the planes
    whose bit is set in it.

*/

use crate::devices::ega::vram::Vram;

#[derive(Copy, Clone, Debug)]
pub enum SequencerRegister {
    Reset,
    ClockingMode,
    MapMask,
    CharacterMapSelect,
    MemoryMode,
}

pub struct Sequencer {
    pub address_byte: u8,
    pub register_selected: SequencerRegister,
    pub reset: u8,                // S(0) Reset (WO)
    pub clocking_mode: u8,        // S(1) Clocking Mode (WO)
    pub map_mask: u8,             // S(2) Map Mask (WO)
    pub character_map_select: u8, // S(3) Character Map Select (WO)
    pub memory_mode: u8,          // S(4) Memory Mode (WO)

    pub vram: Vram,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            address_byte: 0,
            register_selected: SequencerRegister::Reset,
            reset: 0,
            clocking_mode: 0,
            map_mask: 0,
            character_map_select: 0,
            memory_mode: 0,

            vram: Vram::new(),
        }
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Sequencer::default()
    }

    pub fn reset(&mut self) {
        *self = Sequencer::default();
    }

    /// Handle a write to the Sequencer Address register.
    ///
    /// The value written to this register controls which register will be
    /// written to when a byte is sent to the Sequencer Data register.
    pub fn write_address(&mut self, byte: u8) {
        self.address_byte = byte & 0x1F;

        self.register_selected = match self.address_byte {
            0x00 => SequencerRegister::Reset,
            0x01 => SequencerRegister::ClockingMode,
            0x02 => SequencerRegister::MapMask,
            0x03 => SequencerRegister::CharacterMapSelect,
            0x04 => SequencerRegister::MemoryMode,
            _ => {
                log::debug!("Select to invalid sequencer register: {:02X}", byte);
                self.register_selected
            }
        }
    }

    /// Handle a write to the Sequencer Data register.
    ///
    /// Will write to the internal register selected by the Sequencer Address
    /// register.
    pub fn write_data(&mut self, byte: u8) {
        match self.register_selected {
            SequencerRegister::Reset => {
                self.reset = byte & 0x03;
                log::trace!("Write to Sequencer::Reset register: {:02X}", byte);
            }
            SequencerRegister::ClockingMode => {
                self.clocking_mode = byte;
                log::trace!("Write to Sequencer::ClockingMode register: {:02X}", byte);
            }
            SequencerRegister::MapMask => {
                self.map_mask = byte & 0x0F;
                // Warning: noisy
                //log::trace!("Write to Sequencer::MapMask register: {:02X}", byte);
            }
            SequencerRegister::CharacterMapSelect => {
                self.character_map_select = byte & 0x0F;
                log::trace!("Write to Sequencer::CharacterMapSelect register: {:02X}", byte);
            }
            SequencerRegister::MemoryMode => {
                self.memory_mode = byte & 0x07;
                log::trace!("Write to Sequencer::MemoryMode register: {:02X}", byte);
            }
        }
    }

    #[inline]
    pub fn read_u8(&self, plane: usize, offset: usize) -> u8 {
        self.vram.read_u8(plane, offset)
    }

    /// Write a byte to a plane, gated by the Map Mask.
    #[inline]
    pub fn plane_set(&mut self, plane: usize, offset: usize, data: u8) {
        if self.map_mask & (1 << plane) != 0 {
            self.vram.plane_set(plane, offset, data);
        }
    }

    #[inline]
    pub fn plane_and(&mut self, plane: usize, offset: usize, data: u8) {
        if self.map_mask & (1 << plane) != 0 {
            self.vram.plane_and(plane, offset, data);
        }
    }

    #[inline]
    pub fn plane_or(&mut self, plane: usize, offset: usize, data: u8) {
        if self.map_mask & (1 << plane) != 0 {
            self.vram.plane_or(plane, offset, data);
        }
    }
}
