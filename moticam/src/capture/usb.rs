use std::time::Duration;

use log::trace;
use rusb::{DeviceHandle, Direction, Recipient, RequestType, UsbContext};

use super::Transport;

/// Vendor request code for every register write.
pub const VENDOR_REQUEST: u8 = 240;

/// libusb treats a zero timeout as "wait forever".
const NO_TIMEOUT: Duration = Duration::ZERO;

/// [`Transport`] over a libusb device handle.
pub struct UsbTransport<T: UsbContext> {
    handle: DeviceHandle<T>,
}

impl<T: UsbContext> UsbTransport<T> {
    pub fn new(handle: DeviceHandle<T>) -> Self {
        Self { handle }
    }
}

impl<T: UsbContext> Transport for UsbTransport<T> {
    fn write_vendor(&mut self, register: u16, payload: &[u8]) -> rusb::Result<()> {
        let request_type = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        trace!("vendor write 0x{:04x} {:02x?}", register, payload);
        self.handle
            .write_control(request_type, VENDOR_REQUEST, register, 0, payload, NO_TIMEOUT)
            .map(|_| ())
    }

    fn read_bulk(&mut self, endpoint: u8, buf: &mut [u8]) -> rusb::Result<usize> {
        self.handle.read_bulk(endpoint, buf, NO_TIMEOUT)
    }
}
