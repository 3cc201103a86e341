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

    devices::pit.rs

    Implements the register protocol of the Intel 8253 Programmable Interval
    Timer. The counting elements are not clocked here; the interesting state
    is the per-channel reload value, which the timer subsystem reads back
    after programming to derive its firing period.

*/

use modular_bitfield::prelude::*;

use crate::bus::IoDevice;

pub const PIT_CHANNEL_0_DATA_PORT: u16 = 0x40;
pub const PIT_CHANNEL_1_DATA_PORT: u16 = 0x41;
pub const PIT_CHANNEL_2_DATA_PORT: u16 = 0x42;
pub const PIT_COMMAND_REGISTER: u16 = 0x43;

/// The PIT input clock, in Hz. Dividing this by a channel's reload value
/// gives the channel's output rate.
pub const PIT_OSC_HZ: u32 = 1_193_182;
pub const PIT_FREQ: f64 = 1_193_182.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ChannelMode {
    InterruptOnTerminalCount,
    HardwareRetriggerableOneShot,
    RateGenerator,
    SquareWaveGenerator,
    SoftwareTriggeredStrobe,
    HardwareTriggeredStrobe,
}

// We implement From<u8> for this enum ourselves rather than deriving
// BitfieldSpecifier as there is more than one bit mapping per variant
// (6 and 7 map to modes 2 & 3 again).
impl From<u8> for ChannelMode {
    fn from(orig: u8) -> Self {
        match orig {
            0x0 => ChannelMode::InterruptOnTerminalCount,
            0x1 => ChannelMode::HardwareRetriggerableOneShot,
            0x2 => ChannelMode::RateGenerator,
            0x3 => ChannelMode::SquareWaveGenerator,
            0x4 => ChannelMode::SoftwareTriggeredStrobe,
            0x5 => ChannelMode::HardwareTriggeredStrobe,
            0x6 => ChannelMode::RateGenerator,
            0x7 => ChannelMode::SquareWaveGenerator,
            _ => panic!("From<u8> for ChannelMode: Invalid u8 value"),
        }
    }
}

#[derive(Debug, PartialEq, BitfieldSpecifier)]
enum RwModeField {
    LatchCommand,
    Lsb,
    Msb,
    LsbMsb,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RwMode {
    Lsb,
    Msb,
    LsbMsb,
}

#[bitfield]
pub struct ControlByte {
    bcd: bool,
    channel_mode: B3,
    rw_mode: RwModeField,
    channel: B2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum LoadState {
    WaitingForLsb,
    WaitingForMsb,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum ReadState {
    NoRead,
    ReadLsb,
}

#[allow(dead_code)]
pub struct Channel {
    c: usize,
    mode: ChannelMode,
    rw_mode: RwMode,
    load_state: LoadState,
    reload_value: u16,
    output_latch: u16,
    count_is_latched: bool,
    read_state: ReadState,
    bcd_mode: bool,
}

impl Channel {
    fn new(c: usize) -> Self {
        Self {
            c,
            mode: ChannelMode::InterruptOnTerminalCount,
            rw_mode: RwMode::Lsb,
            load_state: LoadState::WaitingForLsb,
            reload_value: 0,
            output_latch: 0,
            count_is_latched: false,
            read_state: ReadState::NoRead,
            bcd_mode: false,
        }
    }

    fn set_mode(&mut self, mode: ChannelMode, rw_mode: RwMode, bcd: bool) {
        log::debug!(
            "PIT: Channel {} mode set: {:?}, rw mode: {:?}, bcd: {}",
            self.c,
            mode,
            rw_mode,
            bcd
        );
        self.mode = mode;
        self.rw_mode = rw_mode;
        self.bcd_mode = bcd;
        self.load_state = LoadState::WaitingForLsb;
        self.read_state = ReadState::NoRead;
        self.count_is_latched = false;
    }

    // Latch the current count for reading. The counting element is not
    // clocked in this model; the reload value stands in for it.
    fn latch_count(&mut self) {
        self.output_latch = self.reload_value;
        self.count_is_latched = true;
    }

    fn write_data(&mut self, data: u8) {
        match self.rw_mode {
            RwMode::Lsb => {
                self.reload_value = (self.reload_value & 0xFF00) | data as u16;
            }
            RwMode::Msb => {
                self.reload_value = (self.reload_value & 0x00FF) | ((data as u16) << 8);
            }
            RwMode::LsbMsb => match self.load_state {
                LoadState::WaitingForLsb => {
                    self.reload_value = (self.reload_value & 0xFF00) | data as u16;
                    self.load_state = LoadState::WaitingForMsb;
                }
                LoadState::WaitingForMsb => {
                    self.reload_value = (self.reload_value & 0x00FF) | ((data as u16) << 8);
                    self.load_state = LoadState::WaitingForLsb;
                    log::trace!("PIT: Channel {} reload value: {}", self.c, self.reload_value);
                }
            },
        }
    }

    fn read_data(&mut self) -> u8 {
        let value = if self.count_is_latched {
            self.output_latch
        }
        else {
            self.reload_value
        };

        match self.rw_mode {
            RwMode::Lsb => (value & 0xFF) as u8,
            RwMode::Msb => (value >> 8) as u8,
            RwMode::LsbMsb => match self.read_state {
                ReadState::NoRead => {
                    self.read_state = ReadState::ReadLsb;
                    (value & 0xFF) as u8
                }
                ReadState::ReadLsb => {
                    self.read_state = ReadState::NoRead;
                    self.count_is_latched = false;
                    (value >> 8) as u8
                }
            },
        }
    }
}

pub struct ProgrammableIntervalTimer {
    channels: Vec<Channel>,
}
pub type Pit = ProgrammableIntervalTimer;

impl IoDevice for ProgrammableIntervalTimer {
    fn read_u8(&mut self, port: u16) -> u8 {
        match port {
            PIT_COMMAND_REGISTER => 0,
            PIT_CHANNEL_0_DATA_PORT => self.data_read(0),
            PIT_CHANNEL_1_DATA_PORT => self.data_read(1),
            PIT_CHANNEL_2_DATA_PORT => self.data_read(2),
            _ => unreachable!("PIT: Bad port #"),
        }
    }

    fn write_u8(&mut self, port: u16, data: u8) {
        match port {
            PIT_COMMAND_REGISTER => self.control_register_write(data),
            PIT_CHANNEL_0_DATA_PORT => self.data_write(0, data),
            PIT_CHANNEL_1_DATA_PORT => self.data_write(1, data),
            PIT_CHANNEL_2_DATA_PORT => self.data_write(2, data),
            _ => unreachable!("PIT: Bad port #"),
        }
    }

    fn port_list(&self) -> Vec<(String, u16)> {
        vec![
            (String::from("PIT Channel 0 Data Port"), PIT_CHANNEL_0_DATA_PORT),
            (String::from("PIT Channel 1 Data Port"), PIT_CHANNEL_1_DATA_PORT),
            (String::from("PIT Channel 2 Data Port"), PIT_CHANNEL_2_DATA_PORT),
            (String::from("PIT Command Register"), PIT_COMMAND_REGISTER),
        ]
    }
}

impl ProgrammableIntervalTimer {
    pub fn new() -> Self {
        Self {
            channels: (0..3usize).map(Channel::new).collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn control_register_write(&mut self, data: u8) {
        let control = ControlByte::from_bytes([data]);
        let channel = control.channel() as usize;

        if channel == 3 {
            // Read-back command; 8254 only
            log::warn!("PIT: Unsupported read-back command: {:02X}", data);
            return;
        }

        match control.rw_mode() {
            RwModeField::LatchCommand => self.channels[channel].latch_count(),
            RwModeField::Lsb => {
                self.channels[channel].set_mode(
                    ChannelMode::from(control.channel_mode()),
                    RwMode::Lsb,
                    control.bcd(),
                );
            }
            RwModeField::Msb => {
                self.channels[channel].set_mode(
                    ChannelMode::from(control.channel_mode()),
                    RwMode::Msb,
                    control.bcd(),
                );
            }
            RwModeField::LsbMsb => {
                self.channels[channel].set_mode(
                    ChannelMode::from(control.channel_mode()),
                    RwMode::LsbMsb,
                    control.bcd(),
                );
            }
        }
    }

    fn data_write(&mut self, channel: usize, data: u8) {
        self.channels[channel].write_data(data);
    }

    fn data_read(&mut self, channel: usize) -> u8 {
        self.channels[channel].read_data()
    }

    /// The raw 16-bit reload value programmed into a channel. 0 encodes the
    /// maximum divisor; see [`effective_reload`](Self::effective_reload).
    pub fn reload_value(&self, channel: usize) -> u16 {
        self.channels[channel].reload_value
    }

    /// The divisor a channel actually counts with: a programmed reload of 0
    /// divides by 65536.
    pub fn effective_reload(&self, channel: usize) -> u32 {
        match self.channels[channel].reload_value {
            0 => 65536,
            n => n as u32,
        }
    }

    /// A channel's output rate in Hz for its current reload value.
    pub fn output_rate_hz(&self, channel: usize) -> f64 {
        PIT_FREQ / self.effective_reload(channel) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(pit: &mut Pit, control: u8, lsb: u8, msb: u8) {
        pit.write_u8(PIT_COMMAND_REGISTER, control);
        pit.write_u8(PIT_CHANNEL_0_DATA_PORT, lsb);
        pit.write_u8(PIT_CHANNEL_0_DATA_PORT, msb);
    }

    #[test]
    fn lsb_msb_load_protocol() {
        let mut pit = Pit::new();
        // Channel 0, lobyte/hibyte, mode 3, binary: the control word the
        // benchmark programs.
        program(&mut pit, 0x36, 0xA9, 0x04);
        assert_eq!(pit.reload_value(0), 0x04A9);
        assert_eq!(pit.effective_reload(0), 1193);
    }

    #[test]
    fn zero_reload_is_max_divisor() {
        let mut pit = Pit::new();
        program(&mut pit, 0x36, 0x00, 0x00);
        assert_eq!(pit.reload_value(0), 0);
        assert_eq!(pit.effective_reload(0), 65536);
        // Divisor 65536 is the stock 18.2 Hz rate
        assert!((pit.output_rate_hz(0) - 18.2).abs() < 0.01);
    }

    #[test]
    fn latch_command_freezes_read() {
        let mut pit = Pit::new();
        program(&mut pit, 0x36, 0x34, 0x12);
        // Latch channel 0
        pit.write_u8(PIT_COMMAND_REGISTER, 0x00);
        assert_eq!(pit.read_u8(PIT_CHANNEL_0_DATA_PORT), 0x34);
        assert_eq!(pit.read_u8(PIT_CHANNEL_0_DATA_PORT), 0x12);
    }

    #[test]
    fn reprogram_overwrites_reload() {
        let mut pit = Pit::new();
        program(&mut pit, 0x36, 0xA9, 0x04);
        program(&mut pit, 0x36, 0xFF, 0xFF);
        assert_eq!(pit.reload_value(0), 0xFFFF);
    }
}
