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

    bus.rs

    Implements the hardware access bus. Port IO is dispatched to the device
    registered for each port; memory access in the EGA aperture is dispatched
    to the video card. The bus also holds the IRQ0 vector slot, standing in
    for the interrupt vector table entry the original hardware would use.

*/

use std::sync::{Arc, Mutex};

use fxhash::FxHashMap;

use crate::devices::{
    ega::{EgaCard, EGA_MEM_ADDRESS, EGA_MEM_END_64},
    pic::Pic,
    pit::Pit,
};

/// Interface for devices reachable through port IO.
///
/// A device reports the ports it decodes via `port_list`; the bus routes
/// reads and writes on those ports to it.
pub trait IoDevice {
    fn read_u8(&mut self, port: u16) -> u8;
    fn write_u8(&mut self, port: u16, data: u8);
    fn port_list(&self) -> Vec<(String, u16)>;
}

/// A handler installed on the IRQ0 vector slot.
pub type TimerVector = Box<dyn FnMut() + Send + 'static>;

#[derive(Copy, Clone, Debug)]
pub enum IoDeviceType {
    Pit,
    Pic,
    Ega,
}

pub struct HardwareBus {
    io_map: FxHashMap<u16, IoDeviceType>,
    pit: Pit,
    pic: Arc<Mutex<Pic>>,
    ega: EgaCard,
    timer_vector: Option<TimerVector>,
}

impl HardwareBus {
    pub fn new(pit: Pit, pic: Arc<Mutex<Pic>>, ega: EgaCard) -> Self {
        let mut io_map = FxHashMap::default();

        for (_, port) in pit.port_list() {
            io_map.insert(port, IoDeviceType::Pit);
        }
        for (_, port) in pic.lock().unwrap().port_list() {
            io_map.insert(port, IoDeviceType::Pic);
        }
        for (_, port) in ega.port_list() {
            io_map.insert(port, IoDeviceType::Ega);
        }

        Self {
            io_map,
            pit,
            pic,
            ega,
            timer_vector: None,
        }
    }

    pub fn io_read_u8(&mut self, port: u16) -> u8 {
        match self.io_map.get(&port).copied() {
            Some(IoDeviceType::Pit) => self.pit.read_u8(port),
            Some(IoDeviceType::Pic) => self.pic.lock().unwrap().read_u8(port),
            Some(IoDeviceType::Ega) => self.ega.read_u8(port),
            None => {
                // Open bus
                0xFF
            }
        }
    }

    pub fn io_write_u8(&mut self, port: u16, data: u8) {
        match self.io_map.get(&port).copied() {
            Some(IoDeviceType::Pit) => self.pit.write_u8(port, data),
            Some(IoDeviceType::Pic) => self.pic.lock().unwrap().write_u8(port, data),
            Some(IoDeviceType::Ega) => self.ega.write_u8(port, data),
            None => {
                log::trace!("Write to unmapped port: {:04X}", port);
            }
        }
    }

    /// Perform a word-sized port write, as the x86 `out dx, ax` instruction
    /// does against an address/data register pair: the low byte lands on
    /// `port`, the high byte on `port + 1`.
    pub fn io_write_u16(&mut self, port: u16, data: u16) {
        self.io_write_u8(port, (data & 0xFF) as u8);
        self.io_write_u8(port + 1, (data >> 8) as u8);
    }

    pub fn mem_read_u8(&mut self, address: usize) -> u8 {
        match address {
            EGA_MEM_ADDRESS..=EGA_MEM_END_64 => self.ega.mem_read_u8(address),
            _ => {
                log::warn!("Memory read outside EGA aperture: {:05X}", address);
                0xFF
            }
        }
    }

    pub fn mem_write_u8(&mut self, address: usize, data: u8) {
        match address {
            EGA_MEM_ADDRESS..=EGA_MEM_END_64 => self.ega.mem_write_u8(address, data),
            _ => {
                log::warn!("Memory write outside EGA aperture: {:05X}", address);
            }
        }
    }

    /// Remove and return the currently installed IRQ0 vector.
    pub fn take_timer_vector(&mut self) -> Option<TimerVector> {
        self.timer_vector.take()
    }

    /// Install a handler on the IRQ0 vector slot.
    pub fn set_timer_vector(&mut self, vector: TimerVector) {
        self.timer_vector = Some(vector);
    }

    /// Invoke the current IRQ0 vector, as a software-triggered interrupt
    /// would. Used by tests to observe which handler is installed.
    pub fn fire_timer_vector(&mut self) {
        if let Some(vector) = self.timer_vector.as_mut() {
            vector();
        }
    }

    pub fn pit(&self) -> &Pit {
        &self.pit
    }

    pub fn ega(&self) -> &EgaCard {
        &self.ega
    }

    pub fn ega_mut(&mut self) -> &mut EgaCard {
        &mut self.ega
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::pit::PIT_COMMAND_REGISTER;

    fn test_bus() -> HardwareBus {
        let pic = Arc::new(Mutex::new(Pic::new()));
        HardwareBus::new(Pit::new(), pic, EgaCard::new())
    }

    #[test]
    fn unmapped_port_reads_open_bus() {
        let mut bus = test_bus();
        assert_eq!(bus.io_read_u8(0x0378), 0xFF);
    }

    #[test]
    fn word_write_splits_across_register_pair() {
        let mut bus = test_bus();
        // Map mask write: index 2 to 3C4, value 0x05 to 3C5
        bus.io_write_u16(0x3C4, 0x0502);
        assert_eq!(bus.ega().sequencer().map_mask, 0x05);
    }

    #[test]
    fn pit_dispatch_reaches_device() {
        let mut bus = test_bus();
        bus.io_write_u8(PIT_COMMAND_REGISTER, 0x36);
        bus.io_write_u8(0x40, 0xA9);
        bus.io_write_u8(0x40, 0x04);
        assert_eq!(bus.pit().reload_value(0), 0x04A9);
    }
}
