use log::warn;

use crate::capture::Transport;
use crate::error::{zeroed_buffer, Error, Result};

pub const ENDPOINT: u8 = 0x83;

/// USB transfer granularity the device streams frames in.
pub const CHUNK_SIZE: usize = 0x4000;

/// Bulk request size for one frame.
///
/// Always one chunk more than the frame needs so the zero length packet that
/// ends every frame is consumed by the same transfer.
pub const fn transfer_size(frame_bytes: usize) -> usize {
    (frame_bytes / CHUNK_SIZE + 1) * CHUNK_SIZE
}

#[derive(Debug, PartialEq, Eq)]
pub enum FrameRead<'a> {
    /// Exactly one raw frame.
    Frame(&'a [u8]),
    Dropped { transferred: usize },
}

/// Owns the bulk buffer, reused for every read.
pub struct FrameReader {
    buffer: Vec<u8>,
    frame_bytes: usize,
}

impl FrameReader {
    pub fn new(frame_bytes: usize) -> Result<Self> {
        Ok(Self {
            buffer: zeroed_buffer(transfer_size(frame_bytes))?,
            frame_bytes,
        })
    }

    pub fn read_frame<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<FrameRead<'_>> {
        let transferred = transport
            .read_bulk(ENDPOINT, &mut self.buffer)
            .map_err(Error::BulkReadFailed)?;

        if transferred != self.frame_bytes {
            let mismatch = Error::FrameSizeMismatch {
                expected: self.frame_bytes,
                actual: transferred,
            };
            warn!("{mismatch}, drop");
            return Ok(FrameRead::Dropped { transferred });
        }

        Ok(FrameRead::Frame(&self.buffer[..transferred]))
    }
}
