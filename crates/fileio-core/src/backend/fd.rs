//! Raw file-descriptor backend.
//!
//! Thin wrapper over the POSIX descriptor calls, retrying `EINTR` so callers
//! never see interruption. `close` treats `EINTR` as success: the descriptor
//! state is unspecified after an interrupted close and retrying could close
//! a descriptor reused by another thread.

use std::mem::MaybeUninit;

use crate::backend::{Backend, Whence};
use crate::error::{Error, errno};

/// Backend over a raw OS file descriptor.
///
/// The descriptor is owned: closing the handle closes the descriptor.
#[derive(Debug)]
pub struct FdStream {
    fd: i32,
}

impl FdStream {
    /// Wraps an already-open descriptor.
    pub fn new(fd: i32) -> FdStream {
        FdStream { fd }
    }
}

impl Backend for FdStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        loop {
            let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = Error::last_os();
            if err.errno() != errno::EINTR {
                return Err(err);
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        loop {
            let n = unsafe { libc::write(self.fd, buf.as_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = Error::last_os();
            if err.errno() != errno::EINTR {
                return Err(err);
            }
        }
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<i64, Error> {
        let off = unsafe { libc::lseek(self.fd, offset as libc::off_t, whence.as_raw()) };
        if off < 0 {
            return Err(Error::last_os());
        }
        Ok(off as i64)
    }

    fn resize(&mut self, len: i64) -> Result<(), Error> {
        loop {
            if unsafe { libc::ftruncate(self.fd, len as libc::off_t) } == 0 {
                return Ok(());
            }
            let err = Error::last_os();
            if err.errno() != errno::EINTR {
                return Err(err);
            }
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        if unsafe { libc::close(self.fd) } == 0 {
            return Ok(());
        }
        let err = Error::last_os();
        if err.errno() == errno::EINTR {
            return Ok(());
        }
        Err(err)
    }

    fn fd(&self) -> Option<i32> {
        Some(self.fd)
    }
}

/// The filesystem's preferred I/O block size for `fd`, when it reports one.
pub(crate) fn preferred_block_size(fd: i32) -> Option<usize> {
    let mut st = MaybeUninit::<libc::stat>::uninit();
    if unsafe { libc::fstat(fd, st.as_mut_ptr()) } != 0 {
        return None;
    }
    let st = unsafe { st.assume_init() };
    (st.st_blksize > 0).then_some(st.st_blksize as usize)
}

/// True when `fd` names a character device that is a terminal.
pub(crate) fn is_char_tty(fd: i32) -> bool {
    let mut st = MaybeUninit::<libc::stat>::uninit();
    if unsafe { libc::fstat(fd, st.as_mut_ptr()) } != 0 {
        return false;
    }
    let st = unsafe { st.assume_init() };
    (st.st_mode & libc::S_IFMT) == libc::S_IFCHR && is_tty(fd)
}

/// True when `fd` is a terminal.
pub(crate) fn is_tty(fd: i32) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}
