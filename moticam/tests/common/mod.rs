#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use moticam::{ColorFrame, FrameSink, SinkError, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Write(u16, Vec<u8>),
    Read { endpoint: u8, requested: usize },
}

#[derive(Default)]
struct State {
    ops: Vec<Op>,
    reads: VecDeque<rusb::Result<usize>>,
    fail_register: Option<u16>,
    fill: u8,
}

/// In-memory device: records every transfer and replays scripted read sizes.
///
/// Clones share the same state, so a test can keep one while the session owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reads(reads: impl IntoIterator<Item = rusb::Result<usize>>) -> Self {
        let mock = Self::new();
        mock.state.borrow_mut().reads.extend(reads);
        mock
    }

    /// Frames of `frame_bytes` each, all with every sample set to `fill`.
    pub fn with_frames(count: usize, frame_bytes: usize, fill: u8) -> Self {
        let mock = Self::with_reads((0..count).map(|_| Ok(frame_bytes)));
        mock.state.borrow_mut().fill = fill;
        mock
    }

    pub fn fail_writes_to(&self, register: u16) {
        self.state.borrow_mut().fail_register = Some(register);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.borrow().ops.clone()
    }

    pub fn writes(&self) -> Vec<(u16, Vec<u8>)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write(register, payload) => Some((register, payload)),
                Op::Read { .. } => None,
            })
            .collect()
    }

    pub fn read_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, Op::Read { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.state.borrow_mut().ops.clear();
    }
}

impl Transport for MockTransport {
    fn write_vendor(&mut self, register: u16, payload: &[u8]) -> rusb::Result<()> {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Write(register, payload.to_vec()));
        if state.fail_register == Some(register) {
            return Err(rusb::Error::Pipe);
        }
        Ok(())
    }

    fn read_bulk(&mut self, endpoint: u8, buf: &mut [u8]) -> rusb::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Read {
            endpoint,
            requested: buf.len(),
        });
        let len = state.reads.pop_front().unwrap_or(Err(rusb::Error::NoDevice))?;
        if len > buf.len() {
            return Err(rusb::Error::Overflow);
        }
        buf[..len].fill(state.fill);
        Ok(len)
    }
}

/// Sink that remembers what it was given and can cancel after a number of polls.
#[derive(Default)]
pub struct RecordingSink {
    pub raw: Vec<(u32, Vec<u8>)>,
    pub color: Vec<(u32, usize, usize, Vec<u8>)>,
    pub cancel_after_polls: Option<usize>,
    pub polls: usize,
    pub fail: bool,
}

impl FrameSink for RecordingSink {
    fn raw_frame(&mut self, index: u32, data: &[u8]) -> Result<(), SinkError> {
        if self.fail {
            return Err("disk full".into());
        }
        self.raw.push((index, data.to_vec()));
        Ok(())
    }

    fn color_frame(&mut self, index: u32, frame: &ColorFrame) -> Result<(), SinkError> {
        if self.fail {
            return Err("disk full".into());
        }
        self.color
            .push((index, frame.width(), frame.height(), frame.as_bytes().to_vec()));
        Ok(())
    }

    fn cancelled(&mut self) -> bool {
        self.polls += 1;
        self.cancel_after_polls.map_or(false, |n| self.polls > n)
    }
}
