//! Error taxonomy and errno mapping.
//!
//! Backend failures, factory failures, and encoder failures all surface as
//! [`Error`]. Variants exist for the conditions callers dispatch on; anything
//! else travels as a raw `Os` errno.

use thiserror::Error;

/// Well-known errno constants used by this crate.
pub mod errno {
    /// Operation not permitted.
    pub const EPERM: i32 = 1;
    /// No such file or directory.
    pub const ENOENT: i32 = 2;
    /// Interrupted system call.
    pub const EINTR: i32 = 4;
    /// Input/output error.
    pub const EIO: i32 = 5;
    /// Bad file descriptor.
    pub const EBADF: i32 = 9;
    /// Permission denied.
    pub const EACCES: i32 = 13;
    /// File exists.
    pub const EEXIST: i32 = 17;
    /// Invalid argument.
    pub const EINVAL: i32 = 22;
    /// Illegal byte sequence.
    pub const EILSEQ: i32 = 84;
}

/// Failure reported by a handle, a backend, or the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The operation is not allowed by the handle's open flags, or the
    /// backend lacks the capability.
    #[error("bad file descriptor")]
    BadFileDescriptor,
    /// Malformed mode string or out-of-range argument.
    #[error("invalid argument")]
    InvalidArgument,
    /// The path does not name an existing file.
    #[error("no such file or directory")]
    NotFound,
    /// Exclusive creation of a file that already exists.
    #[error("file exists")]
    AlreadyExists,
    /// The OS denied access to the file.
    #[error("permission denied")]
    PermissionDenied,
    /// The wide-character encoder rejected its input.
    #[error("illegal byte sequence")]
    IllegalByteSequence,
    /// Any other OS failure, carried as a raw errno value.
    #[error("os error {0}")]
    Os(i32),
}

impl Error {
    /// Classifies a raw errno value.
    pub fn from_errno(eno: i32) -> Error {
        match eno {
            errno::EBADF => Error::BadFileDescriptor,
            errno::EINVAL => Error::InvalidArgument,
            errno::ENOENT => Error::NotFound,
            errno::EEXIST => Error::AlreadyExists,
            errno::EACCES => Error::PermissionDenied,
            errno::EILSEQ => Error::IllegalByteSequence,
            other => Error::Os(other),
        }
    }

    /// The errno value this error corresponds to.
    pub fn errno(&self) -> i32 {
        match *self {
            Error::BadFileDescriptor => errno::EBADF,
            Error::InvalidArgument => errno::EINVAL,
            Error::NotFound => errno::ENOENT,
            Error::AlreadyExists => errno::EEXIST,
            Error::PermissionDenied => errno::EACCES,
            Error::IllegalByteSequence => errno::EILSEQ,
            Error::Os(eno) => eno,
        }
    }

    /// Captures the calling thread's errno after a failed libc call.
    pub fn last_os() -> Error {
        match std::io::Error::last_os_error().raw_os_error() {
            Some(eno) => Error::from_errno(eno),
            None => Error::Os(errno::EIO),
        }
    }
}
