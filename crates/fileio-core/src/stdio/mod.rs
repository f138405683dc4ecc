//! Process-global standard streams.
//!
//! Three lazily-initialised handles over descriptors 0, 1, and 2. Each one
//! borrows the C library's corresponding `FILE*` as its lock target, so code
//! mixing these handles with C stdio on the same stream stays serialised.
//! The globals sit behind a mutex to make shared access safe; lock the mutex,
//! then use the handle like any other.

use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::backend::FdStream;
use crate::file::File;
use crate::flags::Opening;
use crate::lock::LockTarget;

mod c {
    unsafe extern "C" {
        pub static stdin: *mut libc::FILE;
        pub static stdout: *mut libc::FILE;
        pub static stderr: *mut libc::FILE;
    }
}

fn make_std_stream(fd: i32, flags: Opening, target: *mut libc::FILE) -> Mutex<File> {
    let mut fh = File::new(FdStream::new(fd), flags);
    fh.locking(Some(unsafe { LockTarget::from_raw(target) }));
    Mutex::new(fh)
}

/// The process standard input: descriptor 0, buffered, read-only.
pub fn stdin() -> &'static Mutex<File> {
    static IN: OnceLock<Mutex<File>> = OnceLock::new();
    IN.get_or_init(|| {
        make_std_stream(0, Opening::FOR_READ | Opening::BUFFERED, unsafe {
            c::stdin
        })
    })
}

/// The process standard output: descriptor 1, buffered, write-only.
///
/// Resolves to line buffering on a terminal at the first write.
pub fn stdout() -> &'static Mutex<File> {
    static OUT: OnceLock<Mutex<File>> = OnceLock::new();
    OUT.get_or_init(|| {
        make_std_stream(1, Opening::FOR_WRITE | Opening::BUFFERED, unsafe {
            c::stdout
        })
    })
}

/// The process standard error: descriptor 2, write-only, unbuffered.
pub fn stderr() -> &'static Mutex<File> {
    static ERR: OnceLock<Mutex<File>> = OnceLock::new();
    ERR.get_or_init(|| make_std_stream(2, Opening::FOR_WRITE, unsafe { c::stderr }))
}
