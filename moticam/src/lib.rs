pub mod capture;
pub mod error;
pub mod settings;
pub mod sink;

use rusb::Context;

pub use rusb;

pub use capture::moticam3::bayer::{demosaic, ColorFrame};
pub use capture::moticam3::frame::{FrameRead, FrameReader};
pub use capture::moticam3::{
    do_capture, run, CaptureSummary, OutputMode, Session, SessionState, PRODUCT_ID, VENDOR_ID,
};
pub use capture::{open_device, Transport, UsbTransport};
pub use error::{Error, Result, SinkError};
pub use settings::{DeviceSettings, Resolution, SettingsError};
pub use sink::FrameSink;

/// An attached camera, opened through its own libusb context.
pub struct Moticam {
    session: Session<UsbTransport<Context>>,
}

impl Moticam {
    pub fn connect() -> Result<Self> {
        let context = Context::new().map_err(|source| Error::Usb {
            operation: "initialize libusb",
            source,
        })?;
        let session = capture::moticam3::connect(&context)?;
        Ok(Self { session })
    }

    /// Resets and configures the sensor, captures, then parks and closes the device.
    pub fn run<S: FrameSink + ?Sized>(
        self,
        settings: &DeviceSettings,
        sink: &mut S,
        mode: OutputMode,
        count: Option<u32>,
    ) -> Result<CaptureSummary> {
        run(self.session, settings, sink, mode, count)
    }
}
