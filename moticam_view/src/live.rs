use std::error::Error;

use futures::executor;
use log::{info, warn};
use moticam::{ColorFrame, FrameSink, Resolution, SinkError};
use moticam_render::{State, SurfaceError};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    platform::run_return::EventLoopExtRunReturn,
    window::{Window, WindowBuilder},
};

/// Shows frames in a window; closing it or pressing Escape or Q cancels the capture.
pub struct LiveSink {
    // The renderer must be declared before the window so it gets dropped
    // first, its surface holds raw references to the window's resources.
    renderer: State,
    window: Window,
    event_loop: EventLoop<()>,
    quit: bool,
}

impl LiveSink {
    pub fn new(resolution: Resolution) -> Result<Self, Box<dyn Error>> {
        let (width, height) = (resolution.width() as u32, resolution.height() as u32);

        let event_loop = EventLoop::new();
        let window = WindowBuilder::new()
            .with_title(format!("Moticam {resolution}"))
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)?;

        let size = window.inner_size();
        // SAFETY: the window is stored next to the renderer and dropped after it.
        let renderer =
            unsafe { executor::block_on(State::new(&window, size.width, size.height, width, height)) }?;

        Ok(Self {
            renderer,
            window,
            event_loop,
            quit: false,
        })
    }

    /// Handles whatever the window system queued since the last call, without blocking.
    fn pump_events(&mut self) {
        let Self {
            renderer,
            window,
            event_loop,
            quit,
        } = self;
        let window_id = window.id();

        event_loop.run_return(|event, _, control_flow| match event {
            Event::WindowEvent { event, window_id: id } if id == window_id => match event {
                WindowEvent::CloseRequested => *quit = true,
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(VirtualKeyCode::Escape | VirtualKeyCode::Q),
                            ..
                        },
                    ..
                } => *quit = true,
                WindowEvent::Resized(size) => renderer.resize(size.width, size.height),
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    renderer.resize(new_inner_size.width, new_inner_size.height)
                }
                _ => {}
            },
            Event::MainEventsCleared => *control_flow = ControlFlow::Exit,
            _ => {}
        });
    }
}

impl FrameSink for LiveSink {
    fn raw_frame(&mut self, _index: u32, _data: &[u8]) -> Result<(), SinkError> {
        Err("live view needs color frames".into())
    }

    fn color_frame(&mut self, index: u32, frame: &ColorFrame) -> Result<(), SinkError> {
        self.renderer.write_frame(frame);
        match self.renderer.render() {
            Ok(()) => {}
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                self.renderer.reconfigure()
            }
            Err(SurfaceError::OutOfMemory) => return Err("out of graphics memory".into()),
            Err(err) => warn!("frame {} not shown: {}", index, err),
        }
        Ok(())
    }

    fn cancelled(&mut self) -> bool {
        self.pump_events();
        if self.quit {
            info!("Window closed");
        }
        self.quit
    }
}
