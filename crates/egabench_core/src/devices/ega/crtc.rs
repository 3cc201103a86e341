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

    ega::crtc.rs

    Implements the CRT Controller's register interface. No raster timing is
    modeled; the register that matters is the Start Address pair, which
    selects which display page is scanned out.

*/

pub const CRTC_REG_COUNT: usize = 0x19;

pub const CRTC_START_ADDRESS_HO: u8 = 0x0C;
pub const CRTC_START_ADDRESS_LO: u8 = 0x0D;

pub struct Crtc {
    register_select_byte: u8,
    registers: [u8; CRTC_REG_COUNT],
}

impl Default for Crtc {
    fn default() -> Self {
        Self {
            register_select_byte: 0,
            registers: [0; CRTC_REG_COUNT],
        }
    }
}

impl Crtc {
    pub fn new() -> Self {
        Crtc::default()
    }

    pub fn reset(&mut self) {
        *self = Crtc::default();
    }

    /// Handle a write to the CRTC Address register.
    pub fn write_address(&mut self, byte: u8) {
        self.register_select_byte = byte & 0x1F;
        if self.register_select_byte as usize >= CRTC_REG_COUNT {
            log::debug!("Select to invalid CRTC register: {:02X}", byte);
        }
    }

    /// Handle a write to the CRTC Data register.
    pub fn write_data(&mut self, byte: u8) {
        let idx = self.register_select_byte as usize;
        if idx < CRTC_REG_COUNT {
            self.registers[idx] = byte;
            log::trace!("Write to CRTC register {:02X}: {:02X}", idx, byte);
        }
    }

    pub fn read_data(&self) -> u8 {
        let idx = self.register_select_byte as usize;
        if idx < CRTC_REG_COUNT {
            self.registers[idx]
        }
        else {
            0xFF
        }
    }

    /// The display start address currently programmed, in bytes.
    pub fn start_address(&self) -> u16 {
        ((self.registers[CRTC_START_ADDRESS_HO as usize] as u16) << 8)
            | self.registers[CRTC_START_ADDRESS_LO as usize] as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_address_pair_assembles() {
        let mut crtc = Crtc::new();
        crtc.write_address(CRTC_START_ADDRESS_HO);
        crtc.write_data(0x20);
        crtc.write_address(CRTC_START_ADDRESS_LO);
        crtc.write_data(0x00);
        assert_eq!(crtc.start_address(), 0x2000);
    }
}
