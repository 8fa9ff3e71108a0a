//! Register map of the Moticam 3+ sensor bridge.
//!
//! The protocol is undocumented; addresses, segment limits and byte
//! sequences below were captured from the vendor driver and must be kept
//! exactly as they are.

use crate::settings::Resolution;

pub const REG_RESET: u16 = 0xba00;
pub const REG_RESOLUTION_INIT: u16 = 0xba01;
pub const REG_EXPOSURE: u16 = 0xba09;
pub const REG_RESOLUTION: u16 = 0xba22;
/// The analog gain channels, in write order.
pub const REG_GAIN: [u16; 4] = [0xba2d, 0xba2b, 0xba2e, 0xba2c];

/// Exposure register units per millisecond.
const EXPOSURE_SCALE: f64 = 12.82;
const EXPOSURE_MIN: u16 = 0x000c;
const EXPOSURE_MAX: u16 = 0xffff;

const RESOLUTION_INIT: [u8; 8] = [0x00, 0x14, 0x00, 0x20, 0x05, 0xff, 0x07, 0xff];
const RESOLUTION_512X384: [u8; 4] = [0x00, 0x03, 0x00, 0x03];
const RESOLUTION_1024X768: [u8; 4] = [0x00, 0x11, 0x00, 0x11];
const RESOLUTION_2048X1536: [u8; 4] = [0x00, 0x00, 0x00, 0x00];

const MAX_PAYLOAD: usize = 8;

/// One linear piece of the gain curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainSegment {
    /// Inclusive upper end of the gain values routed to this segment.
    pub upper: f64,
    pub gain_min: f64,
    pub gain_max: f64,
    pub code_min: u16,
    pub code_max: u16,
    /// Code goes to the high byte, with 0x60 in the low byte.
    pub shifted: bool,
}

pub static GAIN_SEGMENTS: [GainSegment; 3] = [
    GainSegment {
        upper: 1.34,
        gain_min: 0.33,
        gain_max: 1.33,
        code_min: 0x08,
        code_max: 0x20,
        shifted: false,
    },
    GainSegment {
        upper: 2.68,
        gain_min: 1.42,
        gain_max: 2.67,
        code_min: 0x51,
        code_max: 0x60,
        shifted: false,
    },
    GainSegment {
        upper: f64::INFINITY,
        gain_min: 3.0,
        gain_max: 42.67,
        code_min: 0x01,
        code_max: 0x78,
        shifted: true,
    },
];

impl GainSegment {
    pub fn for_gain(gain: f64) -> &'static GainSegment {
        GAIN_SEGMENTS
            .iter()
            .find(|segment| gain <= segment.upper)
            .unwrap_or(&GAIN_SEGMENTS[GAIN_SEGMENTS.len() - 1])
    }

    /// Raw 7-bit code before packing.
    pub fn code(&self, gain: f64) -> u16 {
        let span = f64::from(self.code_max - self.code_min);
        let x = (gain - self.gain_min) / (self.gain_max - self.gain_min) * span
            + f64::from(self.code_min);
        x.round()
            .clamp(f64::from(self.code_min), f64::from(self.code_max)) as u16
    }

    pub fn pack(&self, code: u16) -> u16 {
        if self.shifted {
            (code << 8) | 0x60
        } else {
            code
        }
    }
}

/// A single vendor write: register address plus 1 to 8 payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCommand {
    pub register: u16,
    payload: [u8; MAX_PAYLOAD],
    len: usize,
}

impl ControlCommand {
    pub fn new(register: u16, payload: &[u8]) -> Self {
        assert!(
            (1..=MAX_PAYLOAD).contains(&payload.len()),
            "control payload must be 1 to {MAX_PAYLOAD} bytes, got {}",
            payload.len()
        );
        let mut bytes = [0; MAX_PAYLOAD];
        bytes[..payload.len()].copy_from_slice(payload);
        Self {
            register,
            payload: bytes,
            len: payload.len(),
        }
    }

    /// A 16-bit register value, sent high byte first.
    pub fn word(register: u16, value: u16) -> Self {
        Self::new(register, &value.to_be_bytes())
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len]
    }
}

pub fn encode_gain(gain: f64) -> u16 {
    let segment = GainSegment::for_gain(gain);
    segment.pack(segment.code(gain))
}

pub fn encode_exposure(ms: f64) -> u16 {
    (ms * EXPOSURE_SCALE)
        .round()
        .clamp(f64::from(EXPOSURE_MIN), f64::from(EXPOSURE_MAX)) as u16
}

/// Init sequence and size selector, in write order.
pub fn encode_resolution(resolution: Resolution) -> (&'static [u8; 8], &'static [u8; 4]) {
    let selector = match resolution {
        Resolution::Low => &RESOLUTION_512X384,
        Resolution::Medium => &RESOLUTION_1024X768,
        Resolution::Full => &RESOLUTION_2048X1536,
    };
    (&RESOLUTION_INIT, selector)
}

/// Writing 0 then 1 re-arms the sensor.
pub fn reset_commands() -> [ControlCommand; 2] {
    [
        ControlCommand::word(REG_RESET, 0x0000),
        ControlCommand::word(REG_RESET, 0x0001),
    ]
}

pub fn gain_commands(gain: f64) -> [ControlCommand; 4] {
    let value = encode_gain(gain);
    REG_GAIN.map(|register| ControlCommand::word(register, value))
}

pub fn exposure_command(ms: f64) -> ControlCommand {
    ControlCommand::word(REG_EXPOSURE, encode_exposure(ms))
}

pub fn resolution_commands(resolution: Resolution) -> [ControlCommand; 2] {
    let (init, selector) = encode_resolution(resolution);
    [
        ControlCommand::new(REG_RESOLUTION_INIT, init),
        ControlCommand::new(REG_RESOLUTION, selector),
    ]
}
