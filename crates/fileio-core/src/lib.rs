//! # fileio-core
//!
//! Buffered byte/text file I/O over pluggable stream backends.
//!
//! A [`File`] wraps any type implementing [`Backend`] — a raw descriptor, an
//! in-memory buffer, a test double — and layers POSIX-stdio-style buffering
//! on top: unbuffered, fully buffered, or line buffered, with append-mode
//! seeks, wide-character output through the process locale, and C-stdio
//! lock-target interop for the standard streams.
//!
//! Architecture:
//! - `backend` — the capability trait, the descriptor backend, `MemStream`
//! - `buffer` — the single-buffer engine shared by both I/O directions
//! - `flags` — open intent, buffering choice, and stream state bits
//! - `wide` — locale charset selection and the wide-character encoder
//! - `file` — the orchestrator: `File`, `IoResult`, the public operations
//! - `lock` — conditional lock-target guard
//! - `open` — mode-string factory over `open(2)`
//! - `stdio` — the process-global standard streams
//! - `error` — error taxonomy and errno mapping

pub mod backend;
pub mod buffer;
pub mod error;
pub mod file;
pub mod flags;
pub mod lock;
pub mod open;
pub mod stdio;
pub mod wide;

pub use backend::{Backend, FdStream, MemStream, Whence};
pub use buffer::{BufferEngine, DEFAULT_BUFFER_SIZE};
pub use error::Error;
pub use file::{File, IoResult};
pub use flags::{Buffering, Opening};
pub use lock::LockTarget;
pub use open::{open_file, open_file_with_capacity, parse_mode};
pub use wide::{Charset, MB_LEN_MAX, WideEncoder};
