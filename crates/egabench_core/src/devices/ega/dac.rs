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

    ega::dac.rs

    Implements the palette DAC's write path. An index write selects the
    palette entry; each subsequent data write supplies one 6-bit color
    component, red, green then blue, auto-incrementing the entry after blue.

*/

pub struct Dac {
    write_index: u8,
    rgb_phase: usize,
    palette: [[u8; 3]; 256],
}

impl Default for Dac {
    fn default() -> Self {
        Self {
            write_index: 0,
            rgb_phase: 0,
            palette: [[0; 3]; 256],
        }
    }
}

impl Dac {
    pub fn new() -> Self {
        Dac::default()
    }

    pub fn reset(&mut self) {
        *self = Dac::default();
    }

    pub fn write_index(&mut self, byte: u8) {
        self.write_index = byte;
        self.rgb_phase = 0;
    }

    pub fn write_data(&mut self, byte: u8) {
        self.palette[self.write_index as usize][self.rgb_phase] = byte & 0x3F;
        self.rgb_phase += 1;
        if self.rgb_phase == 3 {
            self.rgb_phase = 0;
            self.write_index = self.write_index.wrapping_add(1);
        }
    }

    pub fn entry(&self, index: usize) -> [u8; 3] {
        self.palette[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_writes_cycle_rgb_and_autoincrement() {
        let mut dac = Dac::new();
        dac.write_index(0x10);
        dac.write_data(0x3F);
        dac.write_data(0x20);
        dac.write_data(0x00);
        dac.write_data(0x01);

        assert_eq!(dac.entry(0x10), [0x3F, 0x20, 0x00]);
        assert_eq!(dac.entry(0x11), [0x01, 0x00, 0x00]);
    }
}
