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

    ega::graphics.rs

    Implements the EGA Graphics Controller. Although there are two physical
    LSI chips on the IBM EGA, we treat them as one functional unit here.

    Every CPU read of video memory loads one byte from each plane into the
    four latches; CPU writes pass through the write-mode pipeline, which can
    combine CPU data, the Set/Reset expansion, the bit mask, and the latch
    contents before the sequencer commits the result per plane. Write mode 1
    stores the latches directly, which is what makes single-byte four-plane
    tile copies possible.

*/

use modular_bitfield::prelude::*;

use crate::devices::ega::sequencer::Sequencer;

#[derive(Copy, Clone, Debug)]
pub enum GraphicsRegister {
    SetReset,
    EnableSetReset,
    ColorCompare,
    DataRotate,
    ReadMapSelect,
    Mode,
    Miscellaneous,
    ColorDontCare,
    BitMask,
}

#[bitfield]
pub struct GDataRotateRegister {
    pub count: B3,
    #[bits = 2]
    pub function: RotateFunction,
    #[skip]
    unused: B3,
}

#[bitfield]
#[derive(Copy, Clone)]
pub struct GModeRegister {
    #[bits = 2]
    pub write_mode: WriteMode,
    pub test_condition: bool,
    #[bits = 1]
    pub read_mode: ReadMode,
    pub odd_even: B1,
    pub shift_mode: B1,
    #[skip]
    unused: B2,
}

#[derive(Copy, Clone, Debug, BitfieldSpecifier)]
pub enum RotateFunction {
    Unmodified,
    And,
    Or,
    Xor,
}

#[derive(Copy, Clone, Debug, PartialEq, BitfieldSpecifier)]
pub enum WriteMode {
    Mode0,
    Mode1,
    Mode2,
    Invalid,
}

#[derive(Copy, Clone, Debug, PartialEq, BitfieldSpecifier)]
pub enum ReadMode {
    ReadSelectedPlane,
    ReadComparedPlanes,
}

pub struct GraphicsController {
    register_select_byte: u8,
    register_selected: GraphicsRegister,
    set_reset: u8,
    enable_set_reset: u8,
    color_compare: u8,
    data_rotate: GDataRotateRegister,
    read_map_select: u8,
    mode: GModeRegister,
    color_dont_care: u8,
    bitmask: u8,

    latches: [u8; 4],
    pipeline_buf: [u8; 4],
}

impl Default for GraphicsController {
    fn default() -> Self {
        Self {
            register_select_byte: 0,
            register_selected: GraphicsRegister::SetReset,
            set_reset: 0,
            enable_set_reset: 0,
            color_compare: 0,
            data_rotate: GDataRotateRegister::new(),
            read_map_select: 0,
            mode: GModeRegister::new(),
            color_dont_care: 0,
            bitmask: 0,

            latches: [0; 4],
            pipeline_buf: [0; 4],
        }
    }
}

#[inline]
fn rotate_right_u8(mut byte: u8, mut count: u8) -> u8 {
    while count > 0 {
        let carry = byte & 0x01 != 0;
        byte >>= 1;
        if carry {
            byte |= 0x80;
        }
        count -= 1;
    }
    byte
}

impl GraphicsController {
    pub fn new() -> Self {
        GraphicsController::default()
    }

    pub fn reset(&mut self) {
        *self = GraphicsController::default();
    }

    /// Handle a write to the Graphics Address register.
    pub fn write_address(&mut self, byte: u8) {
        self.register_select_byte = byte & 0x0F;

        self.register_selected = match self.register_select_byte {
            0x00 => GraphicsRegister::SetReset,
            0x01 => GraphicsRegister::EnableSetReset,
            0x02 => GraphicsRegister::ColorCompare,
            0x03 => GraphicsRegister::DataRotate,
            0x04 => GraphicsRegister::ReadMapSelect,
            0x05 => GraphicsRegister::Mode,
            0x06 => GraphicsRegister::Miscellaneous,
            0x07 => GraphicsRegister::ColorDontCare,
            0x08 => GraphicsRegister::BitMask,
            _ => self.register_selected,
        }
    }

    pub fn write_data(&mut self, byte: u8) {
        match self.register_selected {
            GraphicsRegister::SetReset => {
                // Bits 0-3: Set/Reset Bits 0-3
                self.set_reset = byte & 0x0F;
            }
            GraphicsRegister::EnableSetReset => {
                // Bits 0-3: Enable Set/Reset Bits 0-3
                self.enable_set_reset = byte & 0x0F;
            }
            GraphicsRegister::ColorCompare => {
                // Bits 0-3: Color Compare 0-3
                self.color_compare = byte & 0x0F;
            }
            GraphicsRegister::DataRotate => {
                // Bits 0-2: Rotate Count
                // Bits 3-4: Function Select
                self.data_rotate = GDataRotateRegister::from_bytes([byte]);
            }
            GraphicsRegister::ReadMapSelect => {
                // Bits 0-2: Map Select 0-2
                self.read_map_select = byte & 0x03;
            }
            GraphicsRegister::Mode => {
                // Bits 0-1: Write Mode
                // Bit 2: Test Condition
                // Bit 3: Read Mode
                // Bit 4: Odd/Even
                // Bit 5: Shift Register Mode
                self.mode = GModeRegister::from_bytes([byte]);
            }
            GraphicsRegister::Miscellaneous => {
                // Memory map select and chaining are fixed in this model; the
                // benchmark never reprograms them after mode set.
                log::trace!("Write to Graphics::Miscellaneous register: {:02X}", byte);
            }
            GraphicsRegister::ColorDontCare => {
                // Bits 0-3: Color Don't Care
                self.color_dont_care = byte & 0x0F;
            }
            GraphicsRegister::BitMask => {
                // Bits 0-7: Bit Mask
                self.bitmask = byte;
            }
        }
    }

    /// Implement a read of video memory via the CPU. This loads the latches
    /// and evaluates the configured read mode.
    pub fn cpu_read_u8(&mut self, seq: &Sequencer, offset: usize) -> u8 {
        // Load all the latches regardless of selected plane
        for i in 0..4 {
            self.latches[i] = seq.read_u8(i, offset);
        }

        match self.mode.read_mode() {
            ReadMode::ReadSelectedPlane => {
                // Read Mode 0: the processor reads data from the memory plane
                // selected by the Read Map Select register.
                seq.read_u8(self.read_map_select as usize, offset)
            }
            ReadMode::ReadComparedPlanes => {
                // Read Mode 1: the processor reads the result of a comparison
                // with the value in the Color Compare register, from the set
                // of planes enabled in the Color Don't Care register.
                self.pixel_op_compare()
            }
        }
    }

    pub fn cpu_write_u8(&mut self, seq: &mut Sequencer, offset: usize, byte: u8) {
        match self.mode.write_mode() {
            WriteMode::Mode0 => {
                // Write mode 0 performs a pipeline of operations:
                // First, data is rotated as specified by the Rotate Count field
                // of the Data Rotate register.
                let data_rot = rotate_right_u8(byte, self.data_rotate.count());

                // Second, data is either passed through to the next stage or
                // replaced by a value determined by the Set/Reset register.
                // The Enable Set/Reset register bits control whether this
                // occurs per plane.
                for i in 0..4 {
                    if self.enable_set_reset & (0x01 << i) != 0 {
                        self.pipeline_buf[i] = match self.set_reset & (0x01 << i) != 0 {
                            true => 0xFF,
                            false => 0x00,
                        }
                    }
                    else {
                        self.pipeline_buf[i] = data_rot
                    }
                }

                // Third, the operation specified by the Logical Operation
                // field of the Data Rotate register is performed on the data
                // for each plane and the latch read register. A set bit in
                // the Bit Mask register passes the result bit; a clear bit
                // passes the bit unchanged from the latch.
                for i in 0..4 {
                    self.pipeline_buf[i] = match self.data_rotate.function() {
                        RotateFunction::Unmodified => {
                            (self.pipeline_buf[i] & self.bitmask) | (!self.bitmask & self.latches[i])
                        }
                        RotateFunction::And => (self.pipeline_buf[i] | !self.bitmask) & self.latches[i],
                        RotateFunction::Or => (self.pipeline_buf[i] & self.bitmask) | self.latches[i],
                        RotateFunction::Xor => (self.pipeline_buf[i] & self.bitmask) ^ self.latches[i],
                    }
                }

                // Finally, write data to the planes enabled in the Memory
                // Plane Write Enable field of the Sequencer Map Mask register.
                for i in 0..4 {
                    seq.plane_set(i, offset, self.pipeline_buf[i]);
                }
            }
            WriteMode::Mode1 => {
                // Write the contents of the latches to their corresponding
                // planes. This assumes that the latches were loaded properly
                // via a previous read operation.
                for i in 0..4 {
                    seq.plane_set(i, offset, self.latches[i]);
                }
            }
            WriteMode::Mode2 => {
                for i in 0..4 {
                    // Extend the bit for this plane to 8 bits.
                    let bit_span: u8 = match byte & (0x01 << i) != 0 {
                        true => 0xFF,
                        false => 0x00,
                    };

                    // Clear bits not masked
                    seq.plane_and(i, offset, !self.bitmask);
                    // Mask off bits not to set
                    seq.plane_or(i, offset, bit_span & self.bitmask);
                }
            }
            WriteMode::Invalid => {
                log::warn!("Invalid write mode!");
            }
        }
    }

    /// Compare the latched pixels with the Color Compare register, honoring
    /// the Color Don't Care register. Returns one result bit per pixel.
    fn pixel_op_compare(&self) -> u8 {
        let mut comparison = 0;

        for i in 0..8 {
            let mut plane_comp = 0;

            plane_comp |= match self.latches[0] & (0x01 << i) != 0 {
                true => 0x01,
                false => 0x00,
            };
            plane_comp |= match self.latches[1] & (0x01 << i) != 0 {
                true => 0x02,
                false => 0x00,
            };
            plane_comp |= match self.latches[2] & (0x01 << i) != 0 {
                true => 0x04,
                false => 0x00,
            };
            plane_comp |= match self.latches[3] & (0x01 << i) != 0 {
                true => 0x08,
                false => 0x00,
            };

            let masked_cmp = self.color_compare & self.color_dont_care;

            if (plane_comp & self.color_dont_care) == masked_cmp {
                comparison |= 0x01 << i
            }
        }
        comparison
    }

    #[inline]
    pub fn write_mode(&self) -> WriteMode {
        self.mode.write_mode()
    }

    #[inline]
    pub fn read_map_select(&self) -> u8 {
        self.read_map_select
    }

    #[inline]
    pub fn bitmask(&self) -> u8 {
        self.bitmask
    }

    #[inline]
    pub fn latches(&self) -> &[u8; 4] {
        &self.latches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_with_mask(mask: u8) -> Sequencer {
        let mut seq = Sequencer::new();
        seq.write_address(0x02);
        seq.write_data(mask);
        seq
    }

    #[test]
    fn write_mode_0_default_bitmask_is_direct() {
        let mut seq = seq_with_mask(0x0F);
        let mut gc = GraphicsController::new();
        gc.write_address(0x08);
        gc.write_data(0xFF);

        gc.cpu_write_u8(&mut seq, 0x100, 0x5A);
        for plane in 0..4 {
            assert_eq!(seq.read_u8(plane, 0x100), 0x5A);
        }
    }

    #[test]
    fn write_mode_0_bitmask_blends_with_latches() {
        let mut seq = seq_with_mask(0x0F);
        let mut gc = GraphicsController::new();
        gc.write_address(0x08);
        gc.write_data(0xFF);

        // Seed the byte and load the latches with it
        gc.cpu_write_u8(&mut seq, 0x20, 0xF0);
        gc.cpu_read_u8(&seq, 0x20);

        // Only the low nibble of CPU data passes; high nibble from latches
        gc.write_data(0x0F);
        gc.cpu_write_u8(&mut seq, 0x20, 0x0A);
        for plane in 0..4 {
            assert_eq!(seq.read_u8(plane, 0x20), 0xFA);
        }
    }

    #[test]
    fn write_mode_1_copies_latches_to_all_planes() {
        let mut seq = seq_with_mask(0x0F);
        let mut gc = GraphicsController::new();
        gc.write_address(0x08);
        gc.write_data(0xFF);

        // Put distinct data in each plane at the source offset
        for plane in 0..4 {
            seq.vram.plane_set(plane, 0x40, 0x11 << plane);
        }

        // Latch load then mode 1 store
        gc.cpu_read_u8(&seq, 0x40);
        gc.write_address(0x05);
        gc.write_data(0x01);
        gc.cpu_write_u8(&mut seq, 0x80, 0x00);

        for plane in 0..4 {
            assert_eq!(seq.read_u8(plane, 0x80), 0x11 << plane);
        }
    }

    #[test]
    fn write_mode_2_expands_color() {
        let mut seq = seq_with_mask(0x0F);
        let mut gc = GraphicsController::new();
        gc.write_address(0x08);
        gc.write_data(0xFF);
        gc.write_address(0x05);
        gc.write_data(0x02);

        gc.cpu_write_u8(&mut seq, 0x10, 0x05);
        assert_eq!(seq.read_u8(0, 0x10), 0xFF);
        assert_eq!(seq.read_u8(1, 0x10), 0x00);
        assert_eq!(seq.read_u8(2, 0x10), 0xFF);
        assert_eq!(seq.read_u8(3, 0x10), 0x00);
    }

    #[test]
    fn read_mode_0_selects_plane() {
        let mut seq = seq_with_mask(0x0F);
        let mut gc = GraphicsController::new();

        for plane in 0..4 {
            seq.vram.plane_set(plane, 0x30, plane as u8 + 1);
        }

        for plane in 0..4u8 {
            gc.write_address(0x04);
            gc.write_data(plane);
            assert_eq!(gc.cpu_read_u8(&seq, 0x30), plane + 1);
        }
    }

    #[test]
    fn test_color_compare() {
        let mut seq = seq_with_mask(0x0F);
        let mut gc = GraphicsController::new();

        // Pixel values across the byte, MSB first:
        // 0b1100, 0b0101, 0b1010, 0b1111, 0b0001, 0b1010, 0b1010, 0b0010
        seq.vram.plane_set(0, 0x00, 0b0101_1000);
        seq.vram.plane_set(1, 0x00, 0b0011_0111);
        seq.vram.plane_set(2, 0x00, 0b1101_0000);
        seq.vram.plane_set(3, 0x00, 0b1011_0110);

        // Read mode 1
        gc.write_address(0x05);
        gc.write_data(0x08);

        gc.write_address(0x02);
        gc.write_data(0b1010);
        gc.write_address(0x07);
        gc.write_data(0b1111);
        assert_eq!(gc.cpu_read_u8(&seq, 0x00), 0b0010_0110);

        gc.write_address(0x07);
        gc.write_data(0b0000);
        assert_eq!(gc.cpu_read_u8(&seq, 0x00), 0b1111_1111);
    }
}
