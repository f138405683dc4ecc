//! Stream backends.
//!
//! A backend is any user type that performs physical I/O for a handle: a raw
//! file descriptor, an in-memory buffer, a socket wrapper, a test double.
//! Capability probing is compile-time: a type implements the [`Backend`]
//! methods it supports and inherits well-defined failures for the rest.

use crate::error::Error;

pub mod fd;

pub use fd::FdStream;

/// Seek origin, matching the `lseek` whence values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// From the start of the stream (`SEEK_SET`).
    Beginning,
    /// From the current position (`SEEK_CUR`).
    Current,
    /// From the end of the stream (`SEEK_END`).
    Ending,
}

impl Whence {
    /// The raw `SEEK_*` constant.
    pub fn as_raw(self) -> i32 {
        match self {
            Whence::Beginning => libc::SEEK_SET,
            Whence::Current => libc::SEEK_CUR,
            Whence::Ending => libc::SEEK_END,
        }
    }
}

/// The capability set a handle drives.
///
/// Default method bodies encode capability absence: `read`, `write`, `seek`,
/// and `resize` fail with [`Error::BadFileDescriptor`] without touching the
/// implementor, `close` succeeds, and `fd` reports no descriptor. Partial
/// reads and writes are allowed and expected; `Ok(0)` from `read` means end
/// of file.
pub trait Backend: Send {
    /// Fills `buf` with up to `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let _ = buf;
        Err(Error::BadFileDescriptor)
    }

    /// Deposits up to `buf.len()` bytes.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let _ = buf;
        Err(Error::BadFileDescriptor)
    }

    /// Moves the stream position and returns the new offset.
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<i64, Error> {
        let _ = (offset, whence);
        Err(Error::BadFileDescriptor)
    }

    /// Truncates or extends the stream to `len` bytes.
    fn resize(&mut self, len: i64) -> Result<(), Error> {
        let _ = len;
        Err(Error::BadFileDescriptor)
    }

    /// Releases the backend's resources. Called exactly once per handle.
    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// The underlying OS descriptor, when there is one.
    fn fd(&self) -> Option<i32> {
        None
    }
}

/// Growable in-memory backend.
///
/// Reads, writes, seeks, and resizes against a `Vec<u8>`. Seeking past the
/// end is allowed; a later write zero-fills the gap, the way a sparse file
/// would read back.
#[derive(Debug, Clone, Default)]
pub struct MemStream {
    data: Vec<u8>,
    pos: usize,
}

impl MemStream {
    /// An empty stream positioned at offset 0.
    pub fn new() -> MemStream {
        MemStream::default()
    }

    /// A stream over existing contents, positioned at offset 0.
    pub fn with_contents(data: Vec<u8>) -> MemStream {
        MemStream { data, pos: 0 }
    }

    /// The full contents, independent of the current position.
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the stream and returns its contents.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Backend for MemStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let available = self.data.len().saturating_sub(self.pos);
        let n = buf.len().min(available);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if self.pos > self.data.len() {
            self.data.resize(self.pos, 0);
        }
        let end = self.pos + buf.len();
        if end <= self.data.len() {
            self.data[self.pos..end].copy_from_slice(buf);
        } else {
            let overlap = self.data.len() - self.pos;
            self.data[self.pos..].copy_from_slice(&buf[..overlap]);
            self.data.extend_from_slice(&buf[overlap..]);
        }
        self.pos = end;
        Ok(buf.len())
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<i64, Error> {
        let base = match whence {
            Whence::Beginning => 0,
            Whence::Current => self.pos as i64,
            Whence::Ending => self.data.len() as i64,
        };
        let target = base
            .checked_add(offset)
            .filter(|&off| off >= 0)
            .ok_or(Error::InvalidArgument)?;
        self.pos = target as usize;
        Ok(target)
    }

    fn resize(&mut self, len: i64) -> Result<(), Error> {
        if len < 0 {
            return Err(Error::InvalidArgument);
        }
        self.data.resize(len as usize, 0);
        Ok(())
    }
}
