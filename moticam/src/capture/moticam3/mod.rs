//! Moticam 3+ sensor bridge: session setup, capture loop and teardown.

pub mod bayer;
pub mod frame;
pub mod registers;

use std::{thread, time::Duration};

use log::{debug, info, warn};
use rusb::UsbContext;

use super::{open_device, Transport, UsbTransport};
use crate::error::{Error, Result};
use crate::settings::DeviceSettings;
use crate::sink::FrameSink;
use bayer::ColorFrame;
use frame::{FrameRead, FrameReader};
use registers::ControlCommand;

pub const VENDOR_ID: u16 = 0x232f;
pub const PRODUCT_ID: u16 = 0x0100;

/// Short exposure applied while the resolution changes.
pub const WARM_UP_EXPOSURE_MS: f64 = 30.0;
/// Wait after configuration before the first frame is usable.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);
/// Zero-exposure writes needed to park the sensor.
const PARK_WRITES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Closed,
    Opened,
    Reset,
    Configured,
    Capturing,
    Deactivated,
}

/// Exclusive owner of the device channel for one capture run.
///
/// Dropping a session whose sensor is still active parks it first; errors
/// during that last attempt are only logged.
pub struct Session<T: Transport> {
    transport: T,
    state: SessionState,
    settings: Option<DeviceSettings>,
}

/// Opens the camera on `context`.
pub fn connect<T: UsbContext>(context: &T) -> Result<Session<UsbTransport<T>>> {
    let handle = open_device(context, VENDOR_ID, PRODUCT_ID)?;
    info!("Opened {:04x}:{:04x}", VENDOR_ID, PRODUCT_ID);
    Ok(Session::new(UsbTransport::new(handle)))
}

impl<T: Transport> Session<T> {
    /// Wraps an already opened channel.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: SessionState::Opened,
            settings: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Settings applied by the last successful [`Session::configure`].
    pub fn settings(&self) -> Option<&DeviceSettings> {
        self.settings.as_ref()
    }

    fn transition(&mut self, next: SessionState) {
        debug!("session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn send(&mut self, command: ControlCommand) -> Result<()> {
        self.transport
            .write_vendor(command.register, command.payload())
            .map_err(|source| Error::ControlTransferFailed {
                register: command.register,
                source,
            })
    }

    pub fn reset(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, SessionState::Opened);
        for command in registers::reset_commands() {
            self.send(command)?;
        }
        self.transition(SessionState::Reset);
        Ok(())
    }

    /// Gain, warm-up exposure, resolution, real exposure, then the settle delay.
    pub fn configure(&mut self, settings: &DeviceSettings) -> Result<()> {
        debug_assert_eq!(self.state, SessionState::Reset);
        info!(
            "Configuring {} exposure {} ms gain {}",
            settings.resolution(),
            settings.exposure_ms(),
            settings.gain()
        );

        for command in registers::gain_commands(settings.gain()) {
            self.send(command)?;
        }
        self.send(registers::exposure_command(WARM_UP_EXPOSURE_MS))?;
        for command in registers::resolution_commands(settings.resolution()) {
            self.send(command)?;
        }
        self.send(registers::exposure_command(settings.exposure_ms()))?;
        thread::sleep(SETTLE_DELAY);

        self.settings = Some(*settings);
        self.transition(SessionState::Configured);
        Ok(())
    }

    /// Parks the sensor. Not retried on failure.
    pub fn deactivate(&mut self) -> Result<()> {
        self.transition(SessionState::Deactivated);
        for _ in 0..PARK_WRITES {
            self.send(registers::exposure_command(0.0))?;
        }
        Ok(())
    }

    fn sensor_active(&self) -> bool {
        matches!(
            self.state,
            SessionState::Reset | SessionState::Configured | SessionState::Capturing
        )
    }

    /// Deactivates if still needed and releases the channel.
    pub fn close(mut self) -> Result<()> {
        let parked = if self.sensor_active() {
            self.deactivate()
        } else {
            Ok(())
        };
        self.transition(SessionState::Closed);
        parked
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.sensor_active() {
            if let Err(err) = self.deactivate() {
                warn!("can not deactivate sensor: {}", err);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Hand the sensor bytes through untouched.
    Raw,
    /// Demosaic to BGRA first.
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureSummary {
    /// Accepted frames handed to the sink.
    pub frames: u32,
    /// Reads discarded for a bad size.
    pub dropped: u32,
    pub cancelled: bool,
}

/// Reads frames until `count` are accepted or, with no count, until the sink cancels.
///
/// # Panics
///
/// If the session has not been configured.
pub fn do_capture<T, S>(
    session: &mut Session<T>,
    sink: &mut S,
    mode: OutputMode,
    count: Option<u32>,
) -> Result<CaptureSummary>
where
    T: Transport,
    S: FrameSink + ?Sized,
{
    let settings = *session
        .settings()
        .expect("capture requires a configured session");

    let mut reader = FrameReader::new(settings.resolution().frame_bytes())?;
    let mut color = match mode {
        OutputMode::Color => Some(ColorFrame::new(settings.width(), settings.height())?),
        OutputMode::Raw => None,
    };

    session.transition(SessionState::Capturing);
    match count {
        Some(n) => info!("Starting capture of {} frames", n),
        None => info!("Starting capture"),
    }

    let mut summary = CaptureSummary::default();
    while count.map_or(true, |n| summary.frames < n) {
        if sink.cancelled() {
            info!("Capture cancelled after {} frames", summary.frames);
            summary.cancelled = true;
            break;
        }

        let raw = match reader.read_frame(&mut session.transport)? {
            FrameRead::Frame(raw) => raw,
            FrameRead::Dropped { .. } => {
                summary.dropped += 1;
                continue;
            }
        };

        match count {
            Some(n) => info!("write {}/{} ({})", summary.frames + 1, n, raw.len()),
            None => debug!("write {} ({})", summary.frames, raw.len()),
        }

        let sent = match color.as_mut() {
            Some(color) => {
                color.fill_from_bayer(raw);
                sink.color_frame(summary.frames, color)
            }
            None => sink.raw_frame(summary.frames, raw),
        };
        sent.map_err(Error::Sink)?;
        summary.frames += 1;
    }

    Ok(summary)
}

/// Full run: reset, configure, capture, then deactivate and close even on failure.
pub fn run<T, S>(
    mut session: Session<T>,
    settings: &DeviceSettings,
    sink: &mut S,
    mode: OutputMode,
    count: Option<u32>,
) -> Result<CaptureSummary>
where
    T: Transport,
    S: FrameSink + ?Sized,
{
    let captured = setup_and_capture(&mut session, settings, sink, mode, count);
    let closed = session.close();

    match captured {
        Ok(summary) => closed.map(|()| summary),
        Err(err) => {
            if let Err(close_err) = closed {
                warn!("{}", close_err);
            }
            Err(err)
        }
    }
}

fn setup_and_capture<T, S>(
    session: &mut Session<T>,
    settings: &DeviceSettings,
    sink: &mut S,
    mode: OutputMode,
    count: Option<u32>,
) -> Result<CaptureSummary>
where
    T: Transport,
    S: FrameSink + ?Sized,
{
    session.reset()?;
    session.configure(settings)?;
    do_capture(session, sink, mode, count)
}
