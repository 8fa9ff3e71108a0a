//! Live preview of camera frames on a window, through wgpu.

mod primitive;
mod render;
mod screen;

pub use render::State;
pub use screen::{fit, FRAME_FORMAT};
pub use wgpu::SurfaceError;
