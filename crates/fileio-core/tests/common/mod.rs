//! Shared test backends.
//!
//! Deterministic stand-ins for the awkward streams the handle has to cope
//! with: writers that accept only part of each request, readers that hand
//! data back in ragged chunks, and streams that fail partway through.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use fileio_core::{Backend, Error, Whence, error::errno};

/// Byte sink shared between a backend and the test body.
#[derive(Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    pub fn new() -> SharedSink {
        SharedSink::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    pub fn push(&self, bytes: &[u8]) {
        self.0.lock().extend_from_slice(bytes);
    }
}

/// Writer that accepts every byte it is offered.
pub struct CollectingWriter {
    pub sink: SharedSink,
}

impl CollectingWriter {
    pub fn new(sink: &SharedSink) -> CollectingWriter {
        CollectingWriter { sink: sink.clone() }
    }
}

impl Backend for CollectingWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.sink.push(buf);
        Ok(buf.len())
    }
}

/// Writer that accepts only about half of each request, so every bulk write
/// exercises the short-write retry loop.
pub struct ChunkyWriter {
    pub sink: SharedSink,
}

impl ChunkyWriter {
    pub fn new(sink: &SharedSink) -> ChunkyWriter {
        ChunkyWriter { sink: sink.clone() }
    }
}

impl Backend for ChunkyWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let n = buf.len().div_ceil(2);
        self.sink.push(&buf[..n]);
        Ok(n)
    }
}

/// Writer that takes half of the first request and errors on the second.
#[derive(Default)]
pub struct HalfFaultyWriter {
    times: u32,
}

impl Backend for HalfFaultyWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if self.times > 0 {
            return Err(Error::Os(errno::EIO));
        }
        self.times += 1;
        Ok(buf.len().div_ceil(2))
    }
}

/// Reader that serves its data in ragged chunk sizes, cycling 1..=7 bytes,
/// then reports end of file.
pub struct ChunkyReader {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl ChunkyReader {
    pub fn new(data: &[u8]) -> ChunkyReader {
        ChunkyReader {
            data: data.to_vec(),
            pos: 0,
            step: 0,
        }
    }
}

impl Backend for ChunkyReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.step = self.step % 7 + 1;
        let remaining = self.data.len() - self.pos;
        let n = self.step.min(buf.len()).min(remaining);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Reader that half-fills the first request with `@` and errors on the
/// second.
#[derive(Default)]
pub struct HalfFaultyReader {
    times: u32,
}

impl Backend for HalfFaultyReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self.times > 0 {
            return Err(Error::Os(errno::EIO));
        }
        self.times += 1;
        let n = buf.len().div_ceil(2);
        buf[..n].fill(b'@');
        Ok(n)
    }
}

/// One backend call, as seen by [`OpRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Seek(Whence),
    Write(usize),
}

/// Writer that records the order of seek and write calls.
#[derive(Clone, Default)]
pub struct OpRecorder {
    ops: Arc<Mutex<Vec<Op>>>,
}

impl OpRecorder {
    pub fn new() -> OpRecorder {
        OpRecorder::default()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }
}

impl Backend for OpRecorder {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.ops.lock().push(Op::Write(buf.len()));
        Ok(buf.len())
    }

    fn seek(&mut self, _offset: i64, whence: Whence) -> Result<i64, Error> {
        self.ops.lock().push(Op::Seek(whence));
        Ok(0)
    }
}

/// Resizable backend with no seek capability, for the truncate error path.
#[derive(Clone, Default)]
pub struct ResizeProbe {
    resized: Arc<Mutex<Option<i64>>>,
}

impl ResizeProbe {
    pub fn new() -> ResizeProbe {
        ResizeProbe::default()
    }

    pub fn resized_to(&self) -> Option<i64> {
        *self.resized.lock()
    }
}

impl Backend for ResizeProbe {
    fn resize(&mut self, len: i64) -> Result<(), Error> {
        *self.resized.lock() = Some(len);
        Ok(())
    }
}
