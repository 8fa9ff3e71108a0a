use crate::capture::moticam3::bayer::ColorFrame;
use crate::error::SinkError;

/// Receives frames from the capture loop, in arrival order.
///
/// `index` counts accepted frames from zero; dropped reads never get one.
pub trait FrameSink {
    fn raw_frame(&mut self, index: u32, data: &[u8]) -> Result<(), SinkError>;

    fn color_frame(&mut self, index: u32, frame: &ColorFrame) -> Result<(), SinkError>;

    /// Polled once per loop iteration, before the next read.
    fn cancelled(&mut self) -> bool {
        false
    }
}
