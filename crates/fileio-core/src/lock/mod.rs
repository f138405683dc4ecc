//! Lock-target interop.
//!
//! A handle can borrow a C-stdio `FILE*` as its lock target so that its
//! operations serialise against C code using the same stream. The guard is
//! conditional: with no target attached, acquisition is a no-op. The target
//! is borrowed, never freed by the handle, and may outlive it.

// The `libc` crate does not expose these POSIX stdio locking functions for
// this target, so they are declared here directly.
unsafe extern "C" {
    fn flockfile(file: *mut libc::FILE);
    fn funlockfile(file: *mut libc::FILE);
}

/// Borrowed platform lock target: a C `FILE*` locked with
/// `flockfile`/`funlockfile`.
#[derive(Debug, Clone, Copy)]
pub struct LockTarget {
    raw: *mut libc::FILE,
}

// The pointer is only ever passed to flockfile/funlockfile, which are
// thread-safe by contract; the stream itself is never dereferenced here.
unsafe impl Send for LockTarget {}
unsafe impl Sync for LockTarget {}

impl LockTarget {
    /// Wraps a C stream pointer.
    ///
    /// # Safety
    ///
    /// `raw` must point to a valid open `FILE` that outlives every use of
    /// this target.
    pub unsafe fn from_raw(raw: *mut libc::FILE) -> LockTarget {
        LockTarget { raw }
    }

    pub(crate) fn acquire(self) {
        unsafe { flockfile(self.raw) }
    }

    pub(crate) fn release(self) {
        unsafe { funlockfile(self.raw) }
    }
}

/// Conditional guard: locks the target on entry, if any, and unlocks on all
/// exits.
pub(crate) struct LockGuard {
    target: Option<LockTarget>,
}

impl LockGuard {
    pub(crate) fn new(target: Option<LockTarget>) -> LockGuard {
        if let Some(t) = target {
            t.acquire();
        }
        LockGuard { target }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(t) = self.target {
            t.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_guard_is_a_no_op() {
        let _g = LockGuard::new(None);
    }
}
