use std::collections::TryReserveError;

use thiserror::Error;

/// Boxed error returned by frame sinks.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to find device {vendor_id:04x}:{product_id:04x}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("more than one matching device ({count}), not supported")]
    AmbiguousDevice { count: usize },

    /// Enumeration or open failure reported by the USB stack.
    #[error("can not {operation}: {source}")]
    Usb {
        operation: &'static str,
        #[source]
        source: rusb::Error,
    },

    #[error("can not send vendor request to register 0x{register:04x}: {source}")]
    ControlTransferFailed {
        register: u16,
        #[source]
        source: rusb::Error,
    },

    #[error("can not read data: {0}")]
    BulkReadFailed(#[source] rusb::Error),

    /// Not fatal: the capture loop logs it and reads again.
    #[error("bad image size ({actual}, expected {expected})")]
    FrameSizeMismatch { expected: usize, actual: usize },

    #[error("can not allocate {bytes} bytes of frame buffer")]
    AllocationFailed {
        bytes: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("frame sink failed: {0}")]
    Sink(#[source] SinkError),
}

impl Error {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::FrameSizeMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Allocates a zeroed buffer without aborting the process when memory runs out.
pub(crate) fn zeroed_buffer(bytes: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(bytes)
        .map_err(|source| Error::AllocationFailed { bytes, source })?;
    buffer.resize(bytes, 0);
    Ok(buffer)
}
