//! Validated capture settings.
//!
//! Everything that reaches the device session goes through
//! [`DeviceSettings::new`], so the encoder and session never see a width
//! without its paired height or a value outside the accepted ranges.

use std::fmt;

use thiserror::Error;

pub const EXPOSURE_MIN_MS: f64 = 1.0;
pub const EXPOSURE_MAX_MS: f64 = 5000.0;
/// Gain must be strictly greater than this.
pub const GAIN_MIN: f64 = 0.0;
/// Gain must be strictly less than this.
pub const GAIN_MAX: f64 = 43.0;

/// The three sensor readout sizes the camera supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    Low,
    #[default]
    Medium,
    Full,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Low, Resolution::Medium, Resolution::Full];

    pub const fn width(self) -> usize {
        match self {
            Resolution::Low => 512,
            Resolution::Medium => 1024,
            Resolution::Full => 2048,
        }
    }

    pub const fn height(self) -> usize {
        match self {
            Resolution::Low => 384,
            Resolution::Medium => 768,
            Resolution::Full => 1536,
        }
    }

    /// Bytes in one raw sensor frame (one byte per Bayer site).
    pub const fn frame_bytes(self) -> usize {
        self.width() * self.height()
    }

    pub fn from_width(width: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.width() == width)
    }

    pub fn from_dimensions(width: usize, height: usize) -> Option<Self> {
        Self::from_width(width).filter(|r| r.height() == height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("bad width value {0} (512, 1024 or 2048)")]
    Width(usize),
    #[error("bad exposure value {0} (1 to 5000 ms)")]
    Exposure(f64),
    #[error("bad gain value {0} (must be above 0 and below 43)")]
    Gain(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSettings {
    resolution: Resolution,
    exposure_ms: f64,
    gain: f64,
}

impl DeviceSettings {
    pub fn new(resolution: Resolution, exposure_ms: f64, gain: f64) -> Result<Self, SettingsError> {
        if !(EXPOSURE_MIN_MS..=EXPOSURE_MAX_MS).contains(&exposure_ms) {
            return Err(SettingsError::Exposure(exposure_ms));
        }
        if !(gain > GAIN_MIN && gain < GAIN_MAX) {
            return Err(SettingsError::Gain(gain));
        }
        Ok(Self {
            resolution,
            exposure_ms,
            gain,
        })
    }

    /// Like [`DeviceSettings::new`] but starting from a raw width, as typed by a user.
    pub fn from_width(width: usize, exposure_ms: f64, gain: f64) -> Result<Self, SettingsError> {
        let resolution = Resolution::from_width(width).ok_or(SettingsError::Width(width))?;
        Self::new(resolution, exposure_ms, gain)
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn width(&self) -> usize {
        self.resolution.width()
    }

    pub fn height(&self) -> usize {
        self.resolution.height()
    }

    pub fn exposure_ms(&self) -> f64 {
        self.exposure_ms
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::Medium,
            exposure_ms: 100.0,
            gain: 1.0,
        }
    }
}
