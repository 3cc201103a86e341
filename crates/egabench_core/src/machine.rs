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

    machine.rs

    Assembles the devices onto the bus and owns the clock. The machine boots
    with the PIC initialized the way the PC BIOS leaves it (vector offset 8,
    IRQ0 unmasked) and a host timer vector installed on IRQ0 that performs
    the stock 18.2 Hz bookkeeping: this is the handler the clock subsystem
    saves, chains to, and must restore.

*/

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
    Mutex,
};

use crate::{
    bus::{HardwareBus, IoDevice},
    clock::HardwareClock,
    devices::{
        ega::EgaCard,
        pic::{Pic, OCW2_NONSPECIFIC_EOI, PIC_COMMAND_PORT, PIC_DATA_PORT},
        pit::Pit,
    },
};

pub struct Machine {
    bus: HardwareBus,
    clock: HardwareClock,
    host_ticks: Arc<AtomicU64>,
}

impl Machine {
    pub fn new() -> Self {
        let pic = Arc::new(Mutex::new(Pic::new()));
        let pit = Pit::new();
        let ega = EgaCard::new();

        let mut bus = HardwareBus::new(pit, Arc::clone(&pic), ega);

        // PIC initialization as the PC BIOS performs it: edge triggered,
        // single mode, vector offset 8, 8086 mode, then unmask IRQ0
        bus.io_write_u8(PIC_COMMAND_PORT, 0x13);
        bus.io_write_u8(PIC_DATA_PORT, 0x08);
        bus.io_write_u8(PIC_DATA_PORT, 0x09);
        bus.io_write_u8(PIC_DATA_PORT, 0xFE);

        // The host's own timer handler: counts the 18.2 Hz ticks and issues
        // its own EOI, as the BIOS INT 08h service does
        let host_ticks = Arc::new(AtomicU64::new(0));
        let vector_ticks = Arc::clone(&host_ticks);
        let vector_pic = Arc::clone(&pic);
        bus.set_timer_vector(Box::new(move || {
            vector_ticks.fetch_add(1, Ordering::Relaxed);
            vector_pic
                .lock()
                .unwrap()
                .write_u8(PIC_COMMAND_PORT, OCW2_NONSPECIFIC_EOI);
        }));

        let clock = HardwareClock::new(Arc::clone(&pic));

        Self {
            bus,
            clock,
            host_ticks,
        }
    }

    pub fn bus(&self) -> &HardwareBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut HardwareBus {
        &mut self.bus
    }

    pub fn clock(&self) -> &HardwareClock {
        &self.clock
    }

    /// Split borrow for callers that drive the clock against the bus.
    pub fn clock_and_bus_mut(&mut self) -> (&mut HardwareClock, &mut HardwareBus) {
        (&mut self.clock, &mut self.bus)
    }

    /// The host bookkeeping tick count, advanced by the default IRQ0 vector
    /// at the stock 18.2 Hz cadence (directly, or chained through an
    /// installed timer subsystem).
    pub fn host_ticks(&self) -> u64 {
        self.host_ticks.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_vector_counts_host_ticks() {
        let mut machine = Machine::new();
        assert_eq!(machine.host_ticks(), 0);
        machine.bus_mut().fire_timer_vector();
        machine.bus_mut().fire_timer_vector();
        assert_eq!(machine.host_ticks(), 2);
    }

    // install(); uninstall() must be observationally a no-op: the original
    // vector and divisor are back in place afterwards.
    #[test]
    fn clock_install_uninstall_round_trips() {
        let mut machine = Machine::new();

        let (clock, bus) = machine.clock_and_bus_mut();
        let reload_before = bus.pit().reload_value(0);
        clock.install(bus, 1000).unwrap();
        assert_eq!(bus.pit().reload_value(0), 1193);
        clock.uninstall(bus).unwrap();
        assert!(!clock.is_installed());
        assert_eq!(bus.pit().reload_value(0), reload_before);

        // The restored vector is the host handler again
        let before = machine.host_ticks();
        machine.bus_mut().fire_timer_vector();
        assert_eq!(machine.host_ticks(), before + 1);
    }

    #[test]
    fn installed_vector_counts_measurement_ticks() {
        let mut machine = Machine::new();
        let (clock, bus) = machine.clock_and_bus_mut();
        clock.install(bus, 19).unwrap();

        clock.reset_ticks();
        bus.fire_timer_vector();
        bus.fire_timer_vector();
        bus.fire_timer_vector();
        assert_eq!(clock.elapsed_ticks(), 3);

        clock.uninstall(bus).unwrap();
    }

    // At rate r, waiting a wall-clock duration d yields about r*d ticks.
    // Kept at a modest rate with a wide tolerance to stay robust against
    // scheduling jitter.
    #[test]
    fn tick_rate_tracks_wall_clock() {
        let mut machine = Machine::new();
        let (clock, bus) = machine.clock_and_bus_mut();
        clock.install(bus, 200).unwrap();

        clock.reset_ticks();
        std::thread::sleep(Duration::from_millis(500));
        let ticks = clock.elapsed_ticks();

        clock.uninstall(bus).unwrap();

        // 500 ms at 200 Hz is 100 ticks
        assert!(
            (60..=140).contains(&ticks),
            "expected ~100 ticks, measured {}",
            ticks
        );
    }

    #[test]
    fn chained_handler_keeps_host_cadence() {
        let mut machine = Machine::new();
        let (clock, bus) = machine.clock_and_bus_mut();
        clock.install(bus, 1000).unwrap();

        // 65536 firings at reload 1193 must chain exactly 1193 times
        for _ in 0..65536 {
            bus.fire_timer_vector();
        }
        clock.uninstall(bus).unwrap();

        // The thread may have added a few chains of its own while we fired;
        // allow a small margin above the deterministic count
        let host = machine.host_ticks();
        assert!(
            (1193..1193 + 32).contains(&host),
            "expected ~1193 host ticks, measured {}",
            host
        );
    }
}
