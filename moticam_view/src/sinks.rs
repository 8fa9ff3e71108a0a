use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use moticam::{ColorFrame, FrameSink, SinkError};

/// `<base>_<index>.png`, keeping whatever extension `base` had.
pub fn numbered_path(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!("_{index:04}.png"));
    PathBuf::from(name)
}

pub fn bgra_to_rgba(bgra: &[u8], rgba: &mut Vec<u8>) {
    rgba.clear();
    rgba.extend(
        bgra.chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]]),
    );
}

/// Writes each color frame to its own numbered PNG file.
pub struct PngSink {
    base: PathBuf,
    rgba: Vec<u8>,
}

impl PngSink {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            rgba: Vec::new(),
        }
    }
}

impl FrameSink for PngSink {
    fn raw_frame(&mut self, _index: u32, _data: &[u8]) -> Result<(), SinkError> {
        Err("PNG output needs color frames".into())
    }

    fn color_frame(&mut self, index: u32, frame: &ColorFrame) -> Result<(), SinkError> {
        let path = numbered_path(&self.base, index);
        bgra_to_rgba(frame.as_bytes(), &mut self.rgba);
        image::save_buffer(
            &path,
            &self.rgba,
            frame.width() as u32,
            frame.height() as u32,
            image::ColorType::Rgba8,
        )?;
        info!("saved {}", path.display());
        Ok(())
    }
}

/// Appends every raw frame to a single file.
pub struct RawSink {
    out: BufWriter<File>,
}

impl RawSink {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }

    pub fn finish(mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl FrameSink for RawSink {
    fn raw_frame(&mut self, _index: u32, data: &[u8]) -> Result<(), SinkError> {
        self.out.write_all(data)?;
        Ok(())
    }

    fn color_frame(&mut self, _index: u32, _frame: &ColorFrame) -> Result<(), SinkError> {
        Err("raw output needs raw frames".into())
    }
}
