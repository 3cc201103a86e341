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

    palette.rs

    Programs the 16-color default palette through the DAC write path before
    the first benchmark draws. Palette content has no effect on timing; it
    only makes the verification draws look right.

*/

use egabench_core::{
    bus::HardwareBus,
    devices::ega::{DAC_DATA_REGISTER, DAC_WRITE_INDEX_REGISTER},
};

// Game-format palette values, 0..=0x40 per component
const PALETTE: [u8; 48] = [
    0x00, 0x00, 0x00, 0x10, 0x10, 0x10, 0x20, 0x20, 0x20, 0x30, 0x30, 0x30, //
    0x20, 0x00, 0x00, 0x30, 0x00, 0x00, 0x40, 0x1C, 0x10, 0x40, 0x40, 0x00, //
    0x00, 0x10, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x30, 0x00, 0x00, 0x40, //
    0x00, 0x20, 0x00, 0x00, 0x30, 0x00, 0x20, 0x10, 0x00, 0x40, 0x40, 0x40, //
];

// Scale a 0..=0x40 palette component to the DAC's 6-bit range
fn adjust_palette_value(value: u8) -> u8 {
    ((value as u16 * 15) >> 4) as u8
}

pub fn set_default_palette(bus: &mut HardwareBus) {
    for i in 0..16u8 {
        // In the 16-color modes, entries 8-15 are looked up at DAC indices
        // 16-23
        let index = if i <= 7 { i } else { i + 8 };
        bus.io_write_u8(DAC_WRITE_INDEX_REGISTER, index);
        bus.io_write_u8(DAC_DATA_REGISTER, adjust_palette_value(PALETTE[i as usize * 3]));
        bus.io_write_u8(DAC_DATA_REGISTER, adjust_palette_value(PALETTE[i as usize * 3 + 1]));
        bus.io_write_u8(DAC_DATA_REGISTER, adjust_palette_value(PALETTE[i as usize * 3 + 2]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egabench_core::machine::Machine;

    #[test]
    fn palette_lands_at_remapped_indices() {
        let mut machine = Machine::new();
        set_default_palette(machine.bus_mut());

        let dac = &machine.bus().ega().dac;
        // Entry 1 is a gray ramp step: 0x10 scaled to 6 bits
        assert_eq!(dac.entry(1), [0x0F, 0x0F, 0x0F]);
        // Entry 8 of the palette lands at DAC index 16
        assert_eq!(dac.entry(16), [0x00, 0x0F, 0x00]);
        assert_eq!(dac.entry(8), [0x00, 0x00, 0x00]);
    }
}
