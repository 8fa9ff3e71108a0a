pub mod moticam3;
mod usb;

use log::debug;
use rusb::{DeviceHandle, UsbContext};

use crate::error::{Error, Result};

pub use usb::UsbTransport;

/// The two primitives the camera protocol needs from a USB channel.
///
/// Both calls block with no timeout of their own.
pub trait Transport {
    /// Vendor-class OUT control transfer carrying `payload`, with `register` as `wValue`.
    fn write_vendor(&mut self, register: u16, payload: &[u8]) -> rusb::Result<()>;

    /// Bulk IN transfer into `buf`, returning the number of bytes received.
    fn read_bulk(&mut self, endpoint: u8, buf: &mut [u8]) -> rusb::Result<usize>;
}

/// Opens the single attached device matching `vid:pid`.
pub fn open_device<T: UsbContext>(context: &T, vid: u16, pid: u16) -> Result<DeviceHandle<T>> {
    let devices = context.devices().map_err(|source| Error::Usb {
        operation: "list devices",
        source,
    })?;

    let mut found = Vec::new();
    for device in devices.iter() {
        let device_desc = device.device_descriptor().map_err(|source| Error::Usb {
            operation: "get device descriptor",
            source,
        })?;

        if device_desc.vendor_id() == vid && device_desc.product_id() == pid {
            debug!(
                "found {:04x}:{:04x} on bus {} address {}",
                vid,
                pid,
                device.bus_number(),
                device.address()
            );
            found.push(device);
        }
    }

    let device = single_match(found, vid, pid)?;
    device.open().map_err(|source| Error::Usb {
        operation: "open device",
        source,
    })
}

/// Refuses to guess when zero or several devices match.
fn single_match<D>(mut found: Vec<D>, vid: u16, pid: u16) -> Result<D> {
    match found.len() {
        0 => Err(Error::DeviceNotFound {
            vendor_id: vid,
            product_id: pid,
        }),
        1 => Ok(found.remove(0)),
        count => Err(Error::AmbiguousDevice { count }),
    }
}
