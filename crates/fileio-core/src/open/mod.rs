//! Path-to-handle factory.
//!
//! Parses C-style mode strings and opens a descriptor-backed, buffered
//! handle. The grammar:
//!
//! ```text
//! mode   := kind [suffix]
//! kind   := 'r' | 'w' | 'a' | 'x'
//! suffix := 'b' | '+' | 'b+' | '+b'
//! ```
//!
//! Anything else, including the Windows `,ccs=` encoding suffixes, is an
//! invalid argument on POSIX.

use std::ffi::CString;
use std::path::Path;

use crate::backend::FdStream;
use crate::error::Error;
use crate::file::File;
use crate::flags::Opening;

/// Opens `path` per `mode` with the default buffer-size policy.
///
/// Factory handles are always buffered; whether they are fully or line
/// buffered is decided at the first buffered operation from the descriptor's
/// device type.
pub fn open_file<P: AsRef<Path>>(path: P, mode: &str) -> Result<File, Error> {
    open_file_with_capacity(path, mode, 0)
}

/// Opens `path` per `mode` with an explicit buffer length.
pub fn open_file_with_capacity<P: AsRef<Path>>(
    path: P,
    mode: &str,
    blen: usize,
) -> Result<File, Error> {
    let (opts, oflag) = parse_mode(mode)?;
    let c_path = path
        .as_ref()
        .to_str()
        .and_then(|s| CString::new(s).ok())
        .ok_or(Error::InvalidArgument)?;

    let mut oflag = oflag | libc::O_CLOEXEC;
    #[cfg(target_os = "linux")]
    {
        oflag |= libc::O_LARGEFILE;
    }

    let fd = unsafe { libc::open(c_path.as_ptr(), oflag, 0o666 as libc::c_uint) };
    if fd < 0 {
        return Err(Error::last_os());
    }
    Ok(File::build(Box::new(FdStream::new(fd)), opts, blen))
}

/// Maps a mode string to handle flags plus `open(2)` flag bits.
pub fn parse_mode(mode: &str) -> Result<(Opening, i32), Error> {
    let bytes = mode.as_bytes();
    let mut opts = Opening::BUFFERED;
    let mut oflag = 0;

    let (kind, mut rest) = bytes.split_first().ok_or(Error::InvalidArgument)?;
    match kind {
        b'r' => {
            opts |= Opening::FOR_READ;
        }
        b'w' => {
            opts |= Opening::FOR_WRITE;
            oflag |= libc::O_CREAT | libc::O_TRUNC;
        }
        b'a' => {
            opts |= Opening::FOR_WRITE | Opening::APPEND;
            oflag |= libc::O_APPEND | libc::O_CREAT;
        }
        b'x' => {
            opts |= Opening::FOR_WRITE;
            oflag |= libc::O_CREAT | libc::O_EXCL;
        }
        _ => return Err(Error::InvalidArgument),
    }

    match rest {
        [b'b', b'+', tail @ ..] | [b'+', b'b', tail @ ..] => {
            opts |= Opening::FOR_READ | Opening::FOR_WRITE | Opening::BINARY;
            rest = tail;
        }
        [b'b', tail @ ..] => {
            opts |= Opening::BINARY;
            rest = tail;
        }
        [b'+', tail @ ..] => {
            opts |= Opening::FOR_READ | Opening::FOR_WRITE;
            rest = tail;
        }
        _ => {}
    }

    if !rest.is_empty() {
        return Err(Error::InvalidArgument);
    }

    oflag |= match (
        opts.contains(Opening::FOR_READ),
        opts.contains(Opening::FOR_WRITE),
    ) {
        (true, false) => libc::O_RDONLY,
        (false, true) => libc::O_WRONLY,
        _ => libc::O_RDWR,
    };

    Ok((opts, oflag))
}
