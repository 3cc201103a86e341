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

    clock.rs

    Implements the timer subsystem: PIT channel 0 is reprogrammed to fire at
    a configurable rate, a service routine is hooked onto the IRQ0 vector,
    and a free-running tick counter provides the unit of elapsed-time
    measurement.

    The periodic interrupt is realized as a dedicated thread firing against
    the OS monotonic clock at the PIT-programmed rate. On each firing the
    service routine increments the tick counter and adds the reload value to
    a 16-bit accumulator; when the accumulator overflows, the previously
    installed vector is chained so that whatever relies on the stock 18.2 Hz
    cadence keeps seeing it. When the chain is skipped, the service routine
    must issue the end-of-interrupt to the PIC itself.

*/

use std::{
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        Arc,
        Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use thiserror::Error;

use crate::{
    bus::{HardwareBus, IoDevice, TimerVector},
    devices::{
        pic::{Pic, OCW2_NONSPECIFIC_EOI, PIC_COMMAND_PORT},
        pit::{PIT_CHANNEL_0_DATA_PORT, PIT_COMMAND_REGISTER, PIT_FREQ, PIT_OSC_HZ},
    },
};

/// The rate at which one tick equals one millisecond; also the default
/// benchmark rate and the reference for tick-to-ms conversion.
pub const REFERENCE_TIMER_RATE: u32 = 1000;

/// The lowest rate the 16-bit divisor can express.
pub const TIMER_RATE_MIN: u32 = 19;
pub const TIMER_RATE_MAX: u32 = PIT_OSC_HZ;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("timer subsystem is already installed")]
    AlreadyInstalled,
    #[error("timer subsystem is not installed")]
    NotInstalled,
    #[error("invalid timer rate: {0} Hz (supported range {TIMER_RATE_MIN}..={TIMER_RATE_MAX})")]
    InvalidRate(u32),
}

struct ClockShared {
    ticks: AtomicU64,
    reload: AtomicU32,
    accumulator: AtomicU32,
    chained_vector: Mutex<Option<TimerVector>>,
}

impl ClockShared {
    fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            reload: AtomicU32::new(65536),
            accumulator: AtomicU32::new(0),
            chained_vector: Mutex::new(None),
        }
    }
}

/// Whether adding one reload to the accumulator carries out of its low 16
/// bits. The carry is the signal to chain the saved vector: it pops at the
/// stock 18.2 Hz cadence (PIT_OSC_HZ / 65536) for any programmed reload.
/// The accumulator itself is advanced with a fetch_add and allowed to wrap;
/// 2^32 is a multiple of 2^16, so the low 16 bits stay consistent.
#[inline]
fn accumulator_carries(acc: u32, reload: u32) -> bool {
    (acc & 0xFFFF) + reload > 0xFFFF
}

/// The timer interrupt service routine. Runs on the timer thread on each
/// firing, and on any manual invocation of the IRQ0 vector.
fn timer_interrupt_service(shared: &ClockShared, pic: &Mutex<Pic>) {
    {
        let mut pic = pic.lock().unwrap();
        pic.request(0);
        if pic.ack().is_none() {
            // Masked at the PIC; nothing was delivered
            return;
        }
    }

    shared.ticks.fetch_add(1, Ordering::Relaxed);

    let reload = shared.reload.load(Ordering::Relaxed);
    let prev = shared.accumulator.fetch_add(reload, Ordering::Relaxed);

    if accumulator_carries(prev, reload) {
        // Chain to the previously installed vector, which performs the
        // host's own bookkeeping and issues its own EOI
        let mut guard = shared.chained_vector.lock().unwrap();
        if let Some(vector) = guard.as_mut() {
            vector();
            return;
        }
    }

    pic.lock()
        .unwrap()
        .write_u8(PIC_COMMAND_PORT, OCW2_NONSPECIFIC_EOI);
}

pub struct HardwareClock {
    shared: Arc<ClockShared>,
    pic: Arc<Mutex<Pic>>,
    thread: Option<thread::JoinHandle<()>>,
    shutdown_tx: Option<Sender<()>>,
    saved_reload: u16,
    rate: u32,
    installed: bool,
}

impl HardwareClock {
    pub fn new(pic: Arc<Mutex<Pic>>) -> Self {
        Self {
            shared: Arc::new(ClockShared::new()),
            pic,
            thread: None,
            shutdown_tx: None,
            saved_reload: 0,
            rate: REFERENCE_TIMER_RATE,
            installed: false,
        }
    }

    /// Save the current IRQ0 vector and PIT divisor, hook the service
    /// routine, start the firing thread and program the requested rate.
    ///
    /// Must be paired with [`uninstall`](Self::uninstall) on every exit
    /// path; until then the vector and divisor belong to this subsystem.
    pub fn install(&mut self, bus: &mut HardwareBus, rate: u32) -> Result<(), ClockError> {
        if self.installed {
            return Err(ClockError::AlreadyInstalled);
        }
        if !(TIMER_RATE_MIN..=TIMER_RATE_MAX).contains(&rate) {
            return Err(ClockError::InvalidRate(rate));
        }

        self.saved_reload = bus.pit().reload_value(0);
        *self.shared.chained_vector.lock().unwrap() = bus.take_timer_vector();
        self.shared.accumulator.store(0, Ordering::Relaxed);
        self.shared.ticks.store(0, Ordering::Relaxed);

        // Hook the vector so that a manual firing reaches the same service
        // routine the thread runs
        let shared = Arc::clone(&self.shared);
        let pic = Arc::clone(&self.pic);
        bus.set_timer_vector(Box::new(move || timer_interrupt_service(&shared, &pic)));

        // Program the divisor before the firing thread exists, so its first
        // period is already the requested one
        self.installed = true;
        self.set_rate(bus, rate)?;

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let shared = Arc::clone(&self.shared);
        let pic = Arc::clone(&self.pic);

        let handle = thread::Builder::new()
            .name("timer-irq0".to_string())
            .spawn(move || {
                let mut deadline = Instant::now();
                loop {
                    let reload = shared.reload.load(Ordering::Relaxed).max(1);
                    deadline += Duration::from_secs_f64(reload as f64 / PIT_FREQ);
                    match shutdown_rx.recv_deadline(deadline) {
                        Err(RecvTimeoutError::Timeout) => timer_interrupt_service(&shared, &pic),
                        _ => break,
                    }
                }
            })
            .expect("failed to spawn timer thread");

        self.thread = Some(handle);
        self.shutdown_tx = Some(shutdown_tx);

        log::debug!("Timer subsystem installed at {} Hz", rate);
        Ok(())
    }

    /// Reprogram PIT channel 0 to fire `hz` times per second.
    ///
    /// The divisor is written through the two-byte port protocol and then
    /// published to the firing thread in a single atomic store, so the
    /// thread can never observe a torn reload value.
    pub fn set_rate(&mut self, bus: &mut HardwareBus, hz: u32) -> Result<(), ClockError> {
        if !self.installed {
            return Err(ClockError::NotInstalled);
        }
        if !(TIMER_RATE_MIN..=TIMER_RATE_MAX).contains(&hz) {
            return Err(ClockError::InvalidRate(hz));
        }

        let divisor = (PIT_OSC_HZ / hz) as u16;
        Self::program_divisor(bus, divisor);

        // Read the effective reload back from the device and publish it
        let effective = bus.pit().effective_reload(0);
        self.shared.reload.store(effective, Ordering::Relaxed);
        self.rate = hz;

        log::debug!("PIT channel 0 reprogrammed: divisor {} ({} Hz)", effective, hz);
        Ok(())
    }

    /// Restore the saved IRQ0 vector and divisor and stop the firing
    /// thread. After this returns, an external timing consumer observes the
    /// same handler and rate as before `install`.
    pub fn uninstall(&mut self, bus: &mut HardwareBus) -> Result<(), ClockError> {
        if !self.installed {
            return Err(ClockError::NotInstalled);
        }

        self.stop_thread();

        if let Some(vector) = self.shared.chained_vector.lock().unwrap().take() {
            bus.set_timer_vector(vector);
        }
        else {
            bus.take_timer_vector();
        }

        Self::program_divisor(bus, self.saved_reload);
        self.installed = false;

        log::debug!("Timer subsystem uninstalled");
        Ok(())
    }

    fn program_divisor(bus: &mut HardwareBus, divisor: u16) {
        /*
        Bit Pattern | Interpretation
        ------------|---------------
        00xxxxxx    | Select timer channel 0
        xx11xxxx    | Access Mode: "Low byte, followed by high byte"
        xxxx011x    | Mode 3: Square wave generator
        xxxxxxx0    | 16-bit binary counting mode
        */
        bus.io_write_u8(PIT_COMMAND_REGISTER, 0x36);
        bus.io_write_u8(PIT_CHANNEL_0_DATA_PORT, (divisor & 0xFF) as u8);
        bus.io_write_u8(PIT_CHANNEL_0_DATA_PORT, (divisor >> 8) as u8);
    }

    fn stop_thread(&mut self) {
        self.shutdown_tx.take();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// The rate currently programmed, in Hz.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    #[inline]
    pub fn elapsed_ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset_ticks(&self) {
        self.shared.ticks.store(0, Ordering::Relaxed);
    }

    /// Reset the counter and spin until `ticks` firings have been observed.
    ///
    /// This is a deliberate busy-wait on the shared counter, preserving the
    /// overhead profile of an environment with no scheduler to yield to.
    pub fn wait_ticks(&self, ticks: u64) {
        debug_assert!(self.installed, "wait_ticks with no timer installed will never return");
        self.reset_ticks();
        while self.elapsed_ticks() < ticks {
            std::hint::spin_loop();
        }
    }

    /// Wait approximately `ms` milliseconds at the current rate.
    pub fn wait_ms(&self, ms: u32) {
        let ticks = ms as u64 * self.rate as u64 / REFERENCE_TIMER_RATE as u64;
        self.wait_ticks(ticks);
    }

    #[cfg(test)]
    pub(crate) fn test_advance_ticks(&self, n: u64) {
        self.shared.ticks.fetch_add(n, Ordering::Relaxed);
    }
}

impl Drop for HardwareClock {
    fn drop(&mut self) {
        if self.installed {
            // The bus is not reachable from here, so the vector and divisor
            // cannot be restored; uninstall() is the supported teardown path.
            log::warn!("HardwareClock dropped while installed; IRQ0 vector and PIT divisor were not restored");
            self.stop_thread();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_carries_at_host_cadence() {
        // Over a full accumulator period, the carry count must equal the
        // reload value: hz * (reload / 65536) == PIT_OSC_HZ / 65536 (18.2 Hz)
        let reload = 1193u32; // 1000 Hz
        let mut acc = 0u32;
        let mut carries = 0u32;
        for _ in 0..65536 {
            if accumulator_carries(acc, reload) {
                carries += 1;
            }
            acc = acc.wrapping_add(reload);
        }
        assert_eq!(carries, reload);
        assert_eq!(acc & 0xFFFF, 0);
    }

    #[test]
    fn max_divisor_chains_every_firing() {
        assert!(accumulator_carries(0, 65536));
        assert!(accumulator_carries(0x1234, 65536));
    }

    #[test]
    fn accumulator_is_wrap_consistent() {
        // The low 16 bits behave identically on either side of a u32 wrap
        let reload = 1193u32;
        let acc = u32::MAX - reload + 1;
        assert_eq!(
            accumulator_carries(acc, reload),
            accumulator_carries(acc & 0xFFFF, reload)
        );
    }

    #[test]
    fn reset_then_elapsed_is_zero() {
        let pic = Arc::new(Mutex::new(Pic::new()));
        let clock = HardwareClock::new(pic);
        clock.test_advance_ticks(42);
        clock.reset_ticks();
        assert_eq!(clock.elapsed_ticks(), 0);
    }

    #[test]
    fn set_rate_requires_install() {
        let pic = Arc::new(Mutex::new(Pic::new()));
        let mut clock = HardwareClock::new(Arc::clone(&pic));
        let mut bus = HardwareBus::new(
            crate::devices::pit::Pit::new(),
            pic,
            crate::devices::ega::EgaCard::new(),
        );
        assert!(matches!(
            clock.set_rate(&mut bus, 1000),
            Err(ClockError::NotInstalled)
        ));
    }

    #[test]
    fn install_rejects_out_of_range_rates() {
        let pic = Arc::new(Mutex::new(Pic::new()));
        let mut clock = HardwareClock::new(Arc::clone(&pic));
        let mut bus = HardwareBus::new(
            crate::devices::pit::Pit::new(),
            pic,
            crate::devices::ega::EgaCard::new(),
        );
        assert!(matches!(
            clock.install(&mut bus, 18),
            Err(ClockError::InvalidRate(18))
        ));
        assert!(!clock.is_installed());
    }
}
