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

    devices::pic.rs

    Implements the 8259 PIC (Programmable Interrupt Controller) in single
    mode. The timer interrupt path needs request/acknowledge tracking and
    end-of-interrupt handling; cascading and the rotation modes are not
    modeled.

*/

#![allow(dead_code)]

use crate::bus::IoDevice;

pub const PIC_COMMAND_PORT: u16 = 0x20;
pub const PIC_DATA_PORT: u16 = 0x21;

const ICW1_ICW4_NEEDED: u8 = 0b0000_0001; // Bit set if a 4th control word will follow
const ICW1_SINGLE_MODE: u8 = 0b0000_0010; // Bit set if PIC is operating in single mode (only supported configuration)
const ICW1_ADI: u8 = 0b0000_0100; // Bit set if PIC is using a call address interval of 4
const ICW1_LTIM: u8 = 0b0000_1000; // Bit set if PIC is in Level Triggered Mode
const ICW1_IS_ICW1: u8 = 0b0001_0000; // Bit determines if input is ICW1

const ICW2_MASK: u8 = 0b1111_1000; // Bit mask for ICW2 offset

const OCW_IS_OCW3: u8 = 0b0000_1000; // Bit on if OCW is OCW3

pub const OCW2_NONSPECIFIC_EOI: u8 = 0b0010_0000;
const OCW2_SPECIFIC_EOI: u8 = 0b0110_0000;
const OCW3_RR_COMMAND: u8 = 0b0000_0011;

pub enum InitializationState {
    Normal,        // Normal operation, can receive an ICW1 at any point
    ExpectingIcw2, // In initialization sequence, expecting ICW2
    ExpectingIcw4, // In initialization sequence, expecting ICW4
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TriggerMode {
    Edge,
    Level,
}

#[derive(Copy, Clone)]
pub enum ReadSelect {
    Isr,
    Irr,
}

pub struct Pic {
    init_state: InitializationState,
    int_offset: u8, // Interrupt Vector Offset (always 8 on the IBM PC)
    imr: u8,        // Interrupt Mask Register
    isr: u8,        // In-Service Register
    irr: u8,        // Interrupt Request Register
    read_select: ReadSelect,
    trigger_mode: TriggerMode,
    expecting_icw4: bool, // ICW3 is skipped in single mode operation
    error: bool,          // We encountered an invalid condition or request
}

impl Default for Pic {
    fn default() -> Self {
        Self {
            init_state: InitializationState::Normal,
            int_offset: 0,
            imr: 0xFF, // All IRQs initially masked
            isr: 0x00,
            irr: 0x00,
            read_select: ReadSelect::Irr,
            trigger_mode: TriggerMode::Edge,
            expecting_icw4: false,
            error: false,
        }
    }
}

impl IoDevice for Pic {
    fn read_u8(&mut self, port: u16) -> u8 {
        match port {
            PIC_COMMAND_PORT => match self.read_select {
                ReadSelect::Irr => self.irr,
                ReadSelect::Isr => self.isr,
            },
            PIC_DATA_PORT => self.imr,
            _ => unreachable!("PIC: Bad port #"),
        }
    }

    fn write_u8(&mut self, port: u16, data: u8) {
        match port {
            PIC_COMMAND_PORT => self.handle_command_register_write(data),
            PIC_DATA_PORT => self.handle_data_register_write(data),
            _ => unreachable!("PIC: Bad port #"),
        }
    }

    fn port_list(&self) -> Vec<(String, u16)> {
        vec![
            (String::from("PIC Command Port"), PIC_COMMAND_PORT),
            (String::from("PIC Data Port"), PIC_DATA_PORT),
        ]
    }
}

impl Pic {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn reset(&mut self) {
        *self = Default::default();
    }

    fn handle_command_register_write(&mut self, byte: u8) {
        if byte & ICW1_IS_ICW1 != 0 {
            if let InitializationState::Normal = self.init_state {
                // Reset the IMR & ISR on ICW
                self.isr = 0;
                self.imr = 0;
                log::debug!("PIC: Read ICW1: {:02X}", byte);
            }
            else {
                log::warn!("PIC: Received unexpected ICW1: {:02X}", byte);
            }

            if byte & ICW1_SINGLE_MODE == 0 {
                log::error!("PIC: Chained mode not supported");
                self.error = true;
            }
            if byte & ICW1_ADI != 0 {
                log::error!("PIC: 4 byte ADI unsupported");
                self.error = true;
            }

            self.trigger_mode = if byte & ICW1_LTIM != 0 {
                TriggerMode::Level
            }
            else {
                TriggerMode::Edge
            };

            self.expecting_icw4 = byte & ICW1_ICW4_NEEDED != 0;
            self.init_state = InitializationState::ExpectingIcw2;
        }
        else if byte & OCW2_SPECIFIC_EOI == OCW2_SPECIFIC_EOI {
            self.eoi(Some(byte & 0x07));
        }
        else if byte & OCW2_NONSPECIFIC_EOI != 0 {
            self.eoi(None);
        }
        else if byte & OCW_IS_OCW3 != 0 {
            self.read_select = match byte & OCW3_RR_COMMAND {
                0b10 => ReadSelect::Irr,
                0b11 => ReadSelect::Isr,
                _ => self.read_select,
            };
        }
        else {
            log::warn!("PIC: Unhandled command byte: {:02X}", byte);
        }
    }

    fn handle_data_register_write(&mut self, byte: u8) {
        match self.init_state {
            InitializationState::ExpectingIcw2 => {
                self.int_offset = byte & ICW2_MASK;
                log::debug!("PIC: Read ICW2: {:02X} offset: {:02X}", byte, self.int_offset);
                self.init_state = if self.expecting_icw4 {
                    InitializationState::ExpectingIcw4
                }
                else {
                    InitializationState::Normal
                };
            }
            InitializationState::ExpectingIcw4 => {
                // Only 8086 mode is supported; nothing in ICW4 changes behavior here
                log::debug!("PIC: Read ICW4: {:02X}", byte);
                self.init_state = InitializationState::Normal;
            }
            InitializationState::Normal => {
                // OCW1: set the interrupt mask
                self.imr = byte;
            }
        }
    }

    /// Raise an IR line.
    pub fn request(&mut self, irq: u8) {
        self.irr |= 1 << irq;
    }

    /// Acknowledge the highest-priority unmasked pending request, moving it
    /// to in-service, and return its vector number. None if nothing is
    /// deliverable.
    pub fn ack(&mut self) -> Option<u8> {
        let pending = self.irr & !self.imr;
        if pending == 0 {
            return None;
        }
        let irq = pending.trailing_zeros() as u8;
        self.irr &= !(1 << irq);
        self.isr |= 1 << irq;
        Some(self.int_offset + irq)
    }

    fn eoi(&mut self, irq: Option<u8>) {
        match irq {
            Some(irq) => {
                self.isr &= !(1 << irq);
            }
            None => {
                // Non-specific EOI clears the highest priority in-service bit
                if self.isr != 0 {
                    let irq = self.isr.trailing_zeros();
                    self.isr &= !(1 << irq);
                }
            }
        }
    }

    pub fn isr(&self) -> u8 {
        self.isr
    }

    pub fn imr(&self) -> u8 {
        self.imr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_pic() -> Pic {
        let mut pic = Pic::new();
        // The initialization sequence the PC BIOS programs
        pic.write_u8(PIC_COMMAND_PORT, 0x13);
        pic.write_u8(PIC_DATA_PORT, 0x08);
        pic.write_u8(PIC_DATA_PORT, 0x09);
        pic.write_u8(PIC_DATA_PORT, 0xFE); // Unmask IRQ0
        pic
    }

    #[test]
    fn init_sequence_sets_offset_and_mask() {
        let mut pic = init_pic();
        assert_eq!(pic.imr(), 0xFE);
        assert_eq!(pic.read_u8(PIC_DATA_PORT), 0xFE);
    }

    #[test]
    fn request_ack_eoi_cycle() {
        let mut pic = init_pic();
        pic.request(0);
        let vector = pic.ack();
        assert_eq!(vector, Some(8));
        assert_eq!(pic.isr(), 0x01);

        pic.write_u8(PIC_COMMAND_PORT, OCW2_NONSPECIFIC_EOI);
        assert_eq!(pic.isr(), 0x00);
    }

    #[test]
    fn masked_request_is_not_delivered() {
        let mut pic = init_pic();
        pic.write_u8(PIC_DATA_PORT, 0xFF);
        pic.request(0);
        assert_eq!(pic.ack(), None);
    }

    #[test]
    fn specific_eoi_clears_named_level() {
        let mut pic = init_pic();
        pic.write_u8(PIC_DATA_PORT, 0x00);
        pic.request(0);
        pic.request(3);
        pic.ack();
        pic.ack();
        assert_eq!(pic.isr(), 0b0000_1001);

        pic.write_u8(PIC_COMMAND_PORT, OCW2_SPECIFIC_EOI | 3);
        assert_eq!(pic.isr(), 0b0000_0001);
    }
}
