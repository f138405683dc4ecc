//! Open-intent and stream-state flags.
//!
//! A handle's whole state machine lives in one flag word: the caller-chosen
//! open intent and buffering choice, plus the bits the handle flips as I/O
//! direction changes. "Closed" is both intent bits cleared.

use bitflags::bitflags;

bitflags! {
    /// Open flags and stream state for a file handle.
    ///
    /// The lower bits are set by callers at construction; `READING`,
    /// `WRITING`, and `REACHED_EOF` are managed by the handle itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Opening: u32 {
        /// Writes accumulate in the buffer until it is full.
        const FULLY_BUFFERED = 1 << 0;
        /// Writes flush on newline (and on a full buffer).
        const LINE_BUFFERED = 1 << 1;
        /// Buffered, full-vs-line decided at the first buffered I/O.
        const BUFFERED = (1 << 0) | (1 << 1);
        /// Open for reading; cleared on close.
        const FOR_READ = 1 << 2;
        /// Open for writing; cleared on close.
        const FOR_WRITE = 1 << 3;
        /// Every physical write is preceded by a seek to the end.
        const APPEND = 1 << 4;
        /// No text translation. Has no effect on POSIX.
        const BINARY = 1 << 5;
        /// Direction state: the buffer holds read-ahead data.
        const READING = 1 << 8;
        /// Direction state: the buffer holds pending writes.
        const WRITING = 1 << 9;
        /// Sticky: the backend reported end of file.
        const REACHED_EOF = 1 << 10;
    }
}

/// Buffering discipline derived from the flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffering {
    /// No internal buffer; every operation reaches the backend.
    None,
    /// Flush when the buffer fills.
    Full,
    /// Flush on newline or a full buffer.
    Line,
    /// Buffered, but full-vs-line not yet resolved.
    Undecided,
}

impl Opening {
    /// The buffering discipline currently encoded in the flags.
    pub fn buffering(self) -> Buffering {
        match (
            self.contains(Opening::FULLY_BUFFERED),
            self.contains(Opening::LINE_BUFFERED),
        ) {
            (true, true) => Buffering::Undecided,
            (true, false) => Buffering::Full,
            (false, true) => Buffering::Line,
            (false, false) => Buffering::None,
        }
    }
}
