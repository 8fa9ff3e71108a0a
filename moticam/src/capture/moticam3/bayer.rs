//! GRBG Bayer to BGRA conversion.
//!
//! Sensor layout, starting at the top left corner:
//!
//! ```text
//! G R G R ...
//! B G B G ...
//! G R G R ...
//! ```
//!
//! Each interior site keeps its own sample and averages its neighbours for
//! the two missing colors. The outer ring of pixels copies the nearest
//! interior pixel.

use crate::error::{zeroed_buffer, Result};

pub const CHANNELS: usize = 4;
pub const ALPHA: u8 = 0xff;

const B: usize = 0;
const G: usize = 1;
const R: usize = 2;
const A: usize = 3;

#[inline]
fn avg2(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + 1) >> 1) as u8
}

#[inline]
fn avg4(a: u8, b: u8, c: u8, d: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + u16::from(c) + u16::from(d) + 2) >> 2) as u8
}

/// Demosaics `raw` (`width * height` bytes) into `out` (`width * height * 4` bytes, BGRA).
///
/// # Panics
///
/// If either buffer has the wrong length or the frame is smaller than 3x3.
pub fn demosaic(raw: &[u8], width: usize, height: usize, out: &mut [u8]) {
    assert!(width >= 3 && height >= 3, "frame too small: {width}x{height}");
    assert_eq!(raw.len(), width * height, "raw frame size");
    assert_eq!(out.len(), width * height * CHANNELS, "color frame size");

    let stride = width * CHANNELS;

    for y in 1..height - 1 {
        let above = &raw[(y - 1) * width..y * width];
        let row = &raw[y * width..(y + 1) * width];
        let below = &raw[(y + 1) * width..(y + 2) * width];
        let out_row = &mut out[y * stride..(y + 1) * stride];

        if y % 2 == 0 {
            green_red_row(above, row, below, out_row);
        } else {
            blue_green_row(above, row, below, out_row);
        }

        out_row.copy_within(CHANNELS..2 * CHANNELS, 0);
        out_row.copy_within(stride - 2 * CHANNELS..stride - CHANNELS, stride - CHANNELS);
    }

    out.copy_within(stride..2 * stride, 0);
    out.copy_within((height - 2) * stride..(height - 1) * stride, (height - 1) * stride);
}

/// Even rows: G at even columns, R at odd columns.
fn green_red_row(above: &[u8], row: &[u8], below: &[u8], out: &mut [u8]) {
    for x in 1..row.len() - 1 {
        let px = &mut out[x * CHANNELS..(x + 1) * CHANNELS];
        if x % 2 == 0 {
            px[B] = avg2(above[x], below[x]);
            px[G] = row[x];
            px[R] = avg2(row[x - 1], row[x + 1]);
        } else {
            px[B] = avg4(above[x - 1], above[x + 1], below[x - 1], below[x + 1]);
            px[G] = avg4(above[x], below[x], row[x - 1], row[x + 1]);
            px[R] = row[x];
        }
        px[A] = ALPHA;
    }
}

/// Odd rows: B at even columns, G at odd columns.
fn blue_green_row(above: &[u8], row: &[u8], below: &[u8], out: &mut [u8]) {
    for x in 1..row.len() - 1 {
        let px = &mut out[x * CHANNELS..(x + 1) * CHANNELS];
        if x % 2 == 0 {
            px[B] = row[x];
            px[G] = avg4(above[x], below[x], row[x - 1], row[x + 1]);
            px[R] = avg4(above[x - 1], above[x + 1], below[x - 1], below[x + 1]);
        } else {
            px[B] = avg2(row[x - 1], row[x + 1]);
            px[G] = row[x];
            px[R] = avg2(above[x], below[x]);
        }
        px[A] = ALPHA;
    }
}

/// A BGRA image, allocated once and refilled for every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorFrame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ColorFrame {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Ok(Self {
            width,
            height,
            data: zeroed_buffer(width * height * CHANNELS)?,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// `[b, g, r, a]` at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * CHANNELS;
        self.data[offset..offset + CHANNELS].try_into().ok()
    }

    pub fn fill_from_bayer(&mut self, raw: &[u8]) {
        demosaic(raw, self.width, self.height, &mut self.data);
    }
}
