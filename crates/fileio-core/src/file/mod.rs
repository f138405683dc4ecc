//! The file handle and its I/O orchestration.
//!
//! [`File`] wraps a [`Backend`] and layers buffering, append handling, wide
//! output, and lock-target interop on top of it. The buffer is allocated
//! lazily at the first buffered operation; until then the handle is just a
//! thin pass-through. One buffer serves both directions, so the handle
//! tracks which direction it is in and flushes or discards when the caller
//! switches.

use crate::backend::{Backend, Whence, fd};
use crate::buffer::{BufferEngine, DEFAULT_BUFFER_SIZE};
use crate::error::{Error, errno};
use crate::flags::{Buffering, Opening};
use crate::lock::{LockGuard, LockTarget};
use crate::wide::{MB_LEN_MAX, WideEncoder};

/// Scratch size for unbuffered wide output.
const WIDE_SCRATCH: usize = 128;

/// Outcome of a data operation.
///
/// Partial success is the norm, not an exception: a short read at end of
/// file yields `ok() == false` with the bytes transferred and no error; a
/// backend failure midway yields the error *and* the bytes that made it
/// through. [`checked`] lifts the embedded error into a `Result` for
/// callers using `?`.
///
/// [`checked`]: IoResult::checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoResult {
    ok: bool,
    count: usize,
    err: Option<Error>,
}

impl IoResult {
    fn done(count: usize) -> IoResult {
        IoResult {
            ok: true,
            count,
            err: None,
        }
    }

    fn short(count: usize) -> IoResult {
        IoResult {
            ok: false,
            count,
            err: None,
        }
    }

    fn fail(count: usize, err: Error) -> IoResult {
        IoResult {
            ok: false,
            count,
            err: Some(err),
        }
    }

    /// True when the full request was satisfied without error.
    pub fn ok(&self) -> bool {
        self.ok
    }

    /// Bytes transferred or accepted into the buffer.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The failure, if the operation hit one.
    pub fn err(&self) -> Option<Error> {
        self.err
    }

    /// Converts an embedded error into `Err`, keeping short-but-clean
    /// results (such as end of file) as `Ok`.
    pub fn checked(self) -> Result<IoResult, Error> {
        match self.err {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

/// Buffered file handle over a pluggable backend.
///
/// Movable, not copyable. Dropping the handle flushes pending writes and
/// closes the backend, swallowing errors; call [`close`] to observe them.
///
/// [`close`]: File::close
pub struct File {
    backend: Box<dyn Backend>,
    buf: Option<BufferEngine>,
    blen: usize,
    flags: Opening,
    fd: Option<i32>,
    wide: WideEncoder,
    lock: Option<LockTarget>,
}

impl File {
    /// Wraps `backend` with the given flags and no buffer size preference.
    ///
    /// The flags are taken verbatim: a handle opened as plain
    /// `Opening::FOR_WRITE` is unbuffered. Pass `Opening::BUFFERED` (or a
    /// specific buffering bit) to buffer.
    pub fn new<B: Backend + 'static>(backend: B, flags: Opening) -> File {
        File::build(Box::new(backend), flags, 0)
    }

    /// Wraps `backend` with an explicit buffer length.
    ///
    /// Requesting a buffer implies buffering: a nonzero `blen` with no
    /// buffering bit in `flags` behaves as `Opening::BUFFERED`, resolved to
    /// full or line buffering at the first buffered operation.
    pub fn with_capacity<B: Backend + 'static>(backend: B, flags: Opening, blen: usize) -> File {
        let mut flags = flags;
        if blen != 0 && flags.buffering() == Buffering::None {
            flags |= Opening::BUFFERED;
        }
        File::build(Box::new(backend), flags, blen)
    }

    pub(crate) fn build(backend: Box<dyn Backend>, flags: Opening, blen: usize) -> File {
        let fd = backend.fd();
        File {
            backend,
            buf: None,
            blen,
            flags,
            fd,
            wide: WideEncoder::from_locale(),
            lock: None,
        }
    }

    // -----------------------------------------------------------------------
    // Predicates
    // -----------------------------------------------------------------------

    /// Whether the handle is open for reading.
    pub fn readable(&self) -> bool {
        self.flags.contains(Opening::FOR_READ)
    }

    /// Whether the handle is open for writing.
    pub fn writable(&self) -> bool {
        self.flags.contains(Opening::FOR_WRITE)
    }

    /// Whether the handle has been closed.
    pub fn closed(&self) -> bool {
        !self.flags.intersects(Opening::FOR_READ | Opening::FOR_WRITE)
    }

    /// Whether a read has hit end of file. Sticky until the direction
    /// toggles to writing.
    pub fn eof(&self) -> bool {
        self.flags.contains(Opening::REACHED_EOF)
    }

    /// Whether the backend descriptor is a terminal.
    pub fn isatty(&self) -> bool {
        self.fd.is_some_and(fd::is_tty)
    }

    /// The backend's OS descriptor, when there is one.
    pub fn fileno(&self) -> Option<i32> {
        self.fd
    }

    /// The buffering discipline currently in effect.
    pub fn buffering(&self) -> Buffering {
        self.flags.buffering()
    }

    /// Attaches or detaches the lock target, returning the previous one.
    ///
    /// While attached, every public operation locks the target on entry and
    /// unlocks on exit, serialising against C-stdio users of the same
    /// stream. The target is borrowed, never freed.
    pub fn locking(&mut self, target: Option<LockTarget>) -> Option<LockTarget> {
        std::mem::replace(&mut self.lock, target)
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Reads up to `out.len()` bytes.
    ///
    /// A short count with no error means end of file.
    pub fn read(&mut self, out: &mut [u8]) -> IoResult {
        let _guard = LockGuard::new(self.lock);
        self.read_nolock(out)
    }

    /// Reads one byte into `out`.
    pub fn read_byte(&mut self, out: &mut u8) -> IoResult {
        let _guard = LockGuard::new(self.lock);
        self.read_byte_nolock(out)
    }

    fn read_nolock(&mut self, out: &mut [u8]) -> IoResult {
        if out.is_empty() {
            return IoResult::done(0);
        }
        if !self.flags.contains(Opening::FOR_READ) {
            return IoResult::fail(0, Error::BadFileDescriptor);
        }
        if let Err(e) = self.prepare_to_read() {
            return IoResult::fail(0, e);
        }
        if self.flags.buffering() == Buffering::None {
            return self.sread(out);
        }

        let mut copied = 0;
        loop {
            if let Some(b) = self.buf.as_mut() {
                copied += b.copy_out(&mut out[copied..]);
            }
            if copied == out.len() {
                return IoResult::done(copied);
            }
            if self.flags.contains(Opening::REACHED_EOF) {
                return IoResult::short(copied);
            }
            match self.srefill() {
                Ok(true) => {}
                Ok(false) => return IoResult::short(copied),
                Err(e) => return IoResult::fail(copied, e),
            }
        }
    }

    fn read_byte_nolock(&mut self, out: &mut u8) -> IoResult {
        if !self.flags.contains(Opening::FOR_READ) {
            return IoResult::fail(0, Error::BadFileDescriptor);
        }
        if let Err(e) = self.prepare_to_read() {
            return IoResult::fail(0, e);
        }
        if let Some(c) = self.buf.as_mut().and_then(BufferEngine::take_byte) {
            *out = c;
            return IoResult::done(1);
        }
        if self.flags.buffering() == Buffering::None {
            return self.sread(std::slice::from_mut(out));
        }
        if self.flags.contains(Opening::REACHED_EOF) {
            return IoResult::short(0);
        }
        match self.srefill() {
            Ok(true) => match self.buf.as_mut().and_then(BufferEngine::take_byte) {
                Some(c) => {
                    *out = c;
                    IoResult::done(1)
                }
                None => IoResult::short(0),
            },
            Ok(false) => IoResult::short(0),
            Err(e) => IoResult::fail(0, e),
        }
    }

    /// Direct backend reads for unbuffered handles.
    fn sread(&mut self, out: &mut [u8]) -> IoResult {
        let mut copied = 0;
        while copied < out.len() {
            if self.flags.contains(Opening::REACHED_EOF) {
                return IoResult::short(copied);
            }
            match self.backend.read(&mut out[copied..]) {
                Ok(0) => {
                    self.flags.insert(Opening::REACHED_EOF);
                    return IoResult::short(copied);
                }
                Ok(n) => copied += n,
                Err(e) => return IoResult::fail(copied, e),
            }
        }
        IoResult::done(copied)
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Writes `buf`, honoring the buffering discipline.
    ///
    /// The count includes bytes accepted into the buffer: a buffered byte
    /// counts as written.
    pub fn write(&mut self, buf: &[u8]) -> IoResult {
        let _guard = LockGuard::new(self.lock);
        self.write_nolock(buf)
    }

    /// Writes one byte.
    pub fn write_byte(&mut self, c: u8) -> IoResult {
        let _guard = LockGuard::new(self.lock);
        self.write_byte_nolock(c)
    }

    /// Writes the UTF-8 bytes of `s` unchanged. Equivalent to
    /// `write(s.as_bytes())`.
    pub fn print(&mut self, s: &str) -> IoResult {
        self.write(s.as_bytes())
    }

    fn write_nolock(&mut self, buf: &[u8]) -> IoResult {
        if buf.is_empty() {
            return IoResult::done(0);
        }
        if !self.flags.contains(Opening::FOR_WRITE) {
            return IoResult::fail(0, Error::BadFileDescriptor);
        }
        self.prepare_to_write();

        let mut written = 0;
        let res = match self.flags.buffering() {
            Buffering::Full => self.swrite_b(buf, &mut written),
            Buffering::Line => self.swrite_line(buf, &mut written),
            _ => self.swrite(buf, &mut written),
        };
        match res {
            Ok(()) => IoResult::done(written),
            Err(e) => IoResult::fail(written, e),
        }
    }

    fn write_byte_nolock(&mut self, c: u8) -> IoResult {
        if !self.flags.contains(Opening::FOR_WRITE) {
            return IoResult::fail(0, Error::BadFileDescriptor);
        }
        self.prepare_to_write();

        if self.flags.buffering() == Buffering::None {
            let mut written = 0;
            return match self.swrite(&[c], &mut written) {
                Ok(()) => IoResult::done(written),
                Err(e) => IoResult::fail(written, e),
            };
        }
        if self.buf.as_ref().is_none_or(|b| b.space_left() == 0) {
            if let Err(e) = self.sflush() {
                return IoResult::fail(0, e);
            }
        }
        if let Some(b) = self.buf.as_mut() {
            b.copy_in(&[c]);
        }
        if c == b'\n' && self.flags.buffering() == Buffering::Line {
            if let Err(e) = self.sflush() {
                return IoResult::fail(1, e);
            }
        }
        IoResult::done(1)
    }

    /// Line-buffered write: everything up to and including the last newline
    /// must have left the backend by the time this returns; the tail after
    /// it can wait in the buffer.
    fn swrite_line(&mut self, buf: &[u8], written: &mut usize) -> Result<(), Error> {
        if self.buffer_is_clear() && buf[buf.len() - 1] == b'\n' {
            return self.swrite(buf, written);
        }
        match memchr::memrchr(b'\n', buf) {
            None => self.swrite_b(buf, written),
            Some(i) => {
                let d = i + 1;
                if !self.buffer_is_clear() && self.buffer_fits(d) {
                    self.copy_to_buffer(&buf[..d], written);
                    self.sflush()?;
                } else {
                    // not trying to fill the buffer
                    self.sflush()?;
                    self.swrite(&buf[..d], written)?;
                }
                self.swrite_b(&buf[d..], written)
            }
        }
    }

    /// Straight-through write with short-write handling. In append mode a
    /// seek to the end is attempted before each physical write; failure is
    /// ignored so seekless writers still append.
    fn swrite(&mut self, buf: &[u8], written: &mut usize) -> Result<(), Error> {
        let mut p = buf;
        while !p.is_empty() {
            if self.flags.contains(Opening::APPEND) {
                let _ = self.backend.seek(0, Whence::Ending);
            }
            match self.backend.write(p) {
                Ok(n) if n > 0 => {
                    p = &p[n..];
                    *written += n;
                }
                Ok(_) => return Err(Error::Os(errno::EIO)),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Fully-buffered write: copy what fits, flush when full, and pass
    /// full-buffer-sized chunks straight through when the buffer is empty.
    fn swrite_b(&mut self, buf: &[u8], written: &mut usize) -> Result<(), Error> {
        let blen = match self.buf.as_ref() {
            Some(b) => b.len(),
            None => return self.swrite(buf, written),
        };
        let mut p = buf;
        while !p.is_empty() {
            let m = self.buffer_space().min(p.len());
            if m == 0 {
                self.sflush()?;
            } else if m == blen {
                let (chunk, rest) = p.split_at(m);
                self.swrite(chunk, written)?;
                p = rest;
            } else {
                let (chunk, rest) = p.split_at(m);
                self.copy_to_buffer(chunk, written);
                p = rest;
            }
        }
        Ok(())
    }

    /// Pushes all pending buffered output through the backend.
    ///
    /// On failure the unwritten remainder stays at the buffer start so a
    /// later flush retries exactly the bytes that did not make it out.
    fn sflush(&mut self) -> Result<(), Error> {
        let Some(buf) = self.buf.as_mut() else {
            return Ok(());
        };
        let mut off = 0;
        while off < buf.bytes_used() {
            if self.flags.contains(Opening::APPEND) {
                let _ = self.backend.seek(0, Whence::Ending);
            }
            match self.backend.write(&buf.pending()[off..]) {
                Ok(n) if n > 0 => off += n,
                Ok(_) => {
                    buf.retain_unflushed(off);
                    return Err(Error::Os(errno::EIO));
                }
                Err(e) => {
                    buf.retain_unflushed(off);
                    return Err(e);
                }
            }
        }
        buf.mark_flushed();
        Ok(())
    }

    /// Refills the read buffer. `Ok(true)` means data arrived, `Ok(false)`
    /// means end of file (and sets the sticky flag).
    fn srefill(&mut self) -> Result<bool, Error> {
        let Some(buf) = self.buf.as_mut() else {
            return Ok(false);
        };
        match self.backend.read(buf.fill_target()) {
            Ok(0) => {
                self.flags.insert(Opening::REACHED_EOF);
                Ok(false)
            }
            Ok(n) => {
                buf.set_filled(n);
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    // -----------------------------------------------------------------------
    // Wide output
    // -----------------------------------------------------------------------

    /// Encodes one wide character through the handle's converter and writes
    /// the bytes.
    pub fn print_wide_char(&mut self, c: char) -> IoResult {
        let _guard = LockGuard::new(self.lock);
        self.print_wide_char_nolock(c)
    }

    /// Encodes `s` a character at a time through the handle's converter.
    ///
    /// On an unrepresentable character the result carries
    /// [`Error::IllegalByteSequence`] and the count of bytes already
    /// accepted.
    pub fn print_wide(&mut self, s: &str) -> IoResult {
        let _guard = LockGuard::new(self.lock);
        self.print_wide_nolock(s)
    }

    fn print_wide_char_nolock(&mut self, c: char) -> IoResult {
        if !self.flags.contains(Opening::FOR_WRITE) {
            return IoResult::fail(0, Error::BadFileDescriptor);
        }
        self.prepare_to_write();

        if self.flags.buffering() == Buffering::None {
            let mut scratch = [0u8; MB_LEN_MAX];
            let len = match self.wide.encode(c, &mut scratch) {
                Ok(len) => len,
                Err(e) => return IoResult::fail(0, e),
            };
            let mut written = 0;
            return match self.swrite(&scratch[..len], &mut written) {
                Ok(()) => IoResult::done(written),
                Err(e) => IoResult::fail(written, e),
            };
        }

        if !self.buffer_fits(MB_LEN_MAX) {
            if let Err(e) = self.sflush() {
                return IoResult::fail(0, e);
            }
        }
        let len = match self.encode_into_buffer(c) {
            Ok(len) => len,
            Err(e) => return IoResult::fail(0, e),
        };
        if c == '\n' && self.flags.buffering() == Buffering::Line {
            if let Err(e) = self.sflush() {
                return IoResult::fail(len, e);
            }
        }
        IoResult::done(len)
    }

    fn print_wide_nolock(&mut self, s: &str) -> IoResult {
        if s.is_empty() {
            return IoResult::done(0);
        }
        if !self.flags.contains(Opening::FOR_WRITE) {
            return IoResult::fail(0, Error::BadFileDescriptor);
        }
        self.prepare_to_write();

        let mut written = 0;
        let res = match self.flags.buffering() {
            Buffering::Full => self.swritew_b(s, &mut written),
            Buffering::Line => self.swritew_line(s, &mut written),
            _ => self.swritew_direct(s, &mut written),
        };
        match res {
            Ok(()) => IoResult::done(written),
            Err(e) => IoResult::fail(written, e),
        }
    }

    /// Buffered wide output: encode at the cursor, flushing when fewer than
    /// `MB_LEN_MAX` bytes of space remain.
    fn swritew_b(&mut self, s: &str, written: &mut usize) -> Result<(), Error> {
        for c in s.chars() {
            if !self.buffer_fits(MB_LEN_MAX) {
                self.sflush()?;
            }
            *written += self.encode_into_buffer(c)?;
        }
        Ok(())
    }

    /// Line-buffered wide output: the prefix through the last newline leaves
    /// the backend before the tail is buffered.
    fn swritew_line(&mut self, s: &str, written: &mut usize) -> Result<(), Error> {
        match s.rfind('\n') {
            None => self.swritew_b(s, written),
            Some(i) => {
                let d = i + 1;
                self.swritew_b(&s[..d], written)?;
                self.sflush()?;
                self.swritew_b(&s[d..], written)
            }
        }
    }

    /// Unbuffered wide output: encode into a stack scratch buffer and write
    /// whole encoded runs at a time.
    fn swritew_direct(&mut self, s: &str, written: &mut usize) -> Result<(), Error> {
        let mut scratch = [0u8; WIDE_SCRATCH];
        let mut filled = 0;
        for c in s.chars() {
            if WIDE_SCRATCH - filled < MB_LEN_MAX {
                self.swrite(&scratch[..filled], written)?;
                filled = 0;
            }
            match self.wide.encode(c, &mut scratch[filled..]) {
                Ok(len) => filled += len,
                Err(e) => {
                    if filled > 0 {
                        self.swrite(&scratch[..filled], written)?;
                    }
                    return Err(e);
                }
            }
        }
        if filled > 0 {
            self.swrite(&scratch[..filled], written)?;
        }
        Ok(())
    }

    fn encode_into_buffer(&mut self, c: char) -> Result<usize, Error> {
        let Some(buf) = self.buf.as_mut() else {
            return Err(Error::BadFileDescriptor);
        };
        let len = self.wide.encode(c, buf.tail_mut())?;
        buf.advance(len);
        Ok(len)
    }

    // -----------------------------------------------------------------------
    // Positioning and sizing
    // -----------------------------------------------------------------------

    /// Moves the backend position and returns the new offset.
    ///
    /// Buffering state is not reconciled: seeking while a buffered read or
    /// write is in flight gives unspecified stream contents. Flush first.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<i64, Error> {
        let _guard = LockGuard::new(self.lock);
        self.backend.seek(offset, whence)
    }

    /// The current backend position.
    pub fn tell(&mut self) -> Result<i64, Error> {
        self.seek(0, Whence::Current)
    }

    /// Repositions to the start of the stream.
    pub fn rewind(&mut self) -> Result<(), Error> {
        self.seek(0, Whence::Beginning).map(|_| ())
    }

    /// Truncates or extends the stream to `len` bytes.
    pub fn resize(&mut self, len: i64) -> Result<(), Error> {
        let _guard = LockGuard::new(self.lock);
        self.backend.resize(len)
    }

    /// Truncates the stream at the current position.
    ///
    /// If the position cannot be read, that error is reported and the
    /// stream is left untouched.
    pub fn truncate(&mut self) -> Result<(), Error> {
        let _guard = LockGuard::new(self.lock);
        let off = self.backend.seek(0, Whence::Current)?;
        self.backend.resize(off)
    }

    // -----------------------------------------------------------------------
    // Flushing and closing
    // -----------------------------------------------------------------------

    /// Pushes pending buffered output to the backend. Idempotent when the
    /// buffer is clear.
    pub fn flush(&mut self) -> Result<(), Error> {
        let _guard = LockGuard::new(self.lock);
        self.flush_nolock()
    }

    /// Flushes pending writes, releases the buffer, and closes the backend.
    ///
    /// Closing an already-closed handle succeeds. The backend is closed
    /// even when the flush fails; a close error is reported in preference
    /// to a flush error.
    pub fn close(&mut self) -> Result<(), Error> {
        let _guard = LockGuard::new(self.lock);
        self.close_nolock()
    }

    fn flush_nolock(&mut self) -> Result<(), Error> {
        if self.flags.contains(Opening::WRITING) {
            self.sflush()
        } else {
            Ok(())
        }
    }

    fn close_nolock(&mut self) -> Result<(), Error> {
        if self.closed() {
            return Ok(());
        }
        let flushed = self.flush_nolock();
        self.buf = None;
        self.flags.remove(
            Opening::FOR_READ | Opening::FOR_WRITE | Opening::READING | Opening::WRITING,
        );
        self.backend.close().and(flushed)
    }

    // -----------------------------------------------------------------------
    // Direction and buffer management
    // -----------------------------------------------------------------------

    fn prepare_to_read(&mut self) -> Result<(), Error> {
        if self.flags.contains(Opening::WRITING) {
            self.sflush()?;
            self.flags.remove(Opening::WRITING);
        }
        self.flags.insert(Opening::READING);
        if self.flags.buffering() != Buffering::None {
            self.prepare_buffer();
        }
        Ok(())
    }

    fn prepare_to_write(&mut self) {
        if self.flags.contains(Opening::READING) {
            self.flags.remove(Opening::READING | Opening::REACHED_EOF);
            if let Some(b) = self.buf.as_mut() {
                b.reset();
            }
        }
        self.flags.insert(Opening::WRITING);
        if self.flags.buffering() != Buffering::None {
            self.prepare_buffer();
        }
    }

    /// Allocates the buffer and resolves undecided buffering.
    ///
    /// With no requested length, the backend descriptor's preferred block
    /// size is used when available, else the platform default. Undecided
    /// buffering resolves to line-buffered on a character-device terminal
    /// and fully-buffered everywhere else.
    fn prepare_buffer(&mut self) {
        if self.buf.is_some() {
            return;
        }
        let mut blen = self.blen;
        if blen == 0 {
            blen = self
                .fd
                .and_then(fd::preferred_block_size)
                .unwrap_or(DEFAULT_BUFFER_SIZE);
        }
        if self.flags.buffering() == Buffering::Undecided {
            if self.fd.is_some_and(fd::is_char_tty) {
                self.flags.remove(Opening::FULLY_BUFFERED);
            } else {
                self.flags.remove(Opening::LINE_BUFFERED);
            }
        }
        self.buf = Some(BufferEngine::new(blen));
    }

    fn buffer_is_clear(&self) -> bool {
        self.buf.as_ref().is_none_or(BufferEngine::is_clear)
    }

    fn buffer_fits(&self, n: usize) -> bool {
        self.buf.as_ref().is_some_and(|b| b.fits(n))
    }

    fn buffer_space(&self) -> usize {
        self.buf.as_ref().map_or(0, BufferEngine::space_left)
    }

    fn copy_to_buffer(&mut self, src: &[u8], written: &mut usize) {
        if let Some(b) = self.buf.as_mut() {
            b.copy_in(src);
            *written += src.len();
        }
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("flags", &self.flags)
            .field("fd", &self.fd)
            .field("buffered", &self.buf.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for File {
    fn drop(&mut self) {
        let _guard = LockGuard::new(self.lock);
        let _ = self.close_nolock();
    }
}
