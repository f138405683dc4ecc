//! Integration tests: wide-character printing.
//!
//! These stick to ASCII payloads, which every supported execution charset
//! encodes identically; charset-specific behavior (multibyte lengths,
//! unrepresentable characters) is covered by the unit tests next to the
//! encoder.

mod common;

use common::{CollectingWriter, SharedSink};
use fileio_core::{Error, File, Opening};

const S1: &str = "Is the Order a Rabbit?";

#[test]
fn not_opened_for_write() {
    let sink = SharedSink::new();
    let mut fh = File::new(CollectingWriter::new(&sink), Opening::FOR_READ);

    let r = fh.print_wide("");
    assert!(r.ok());
    assert_eq!(r.count(), 0);

    let r = fh.print_wide("x");
    assert!(!r.ok());
    assert_eq!(r.err(), Some(Error::BadFileDescriptor));

    let r = fh.print_wide_char('a');
    assert!(!r.ok());
    assert_eq!(r.err(), Some(Error::BadFileDescriptor));
}

#[test]
fn unbuffered_wide_chars() {
    let sink = SharedSink::new();
    let mut fh = File::new(CollectingWriter::new(&sink), Opening::FOR_WRITE);

    for c in S1.chars() {
        assert!(fh.print_wide_char(c).ok());
    }
    assert_eq!(sink.contents(), S1.as_bytes());
}

#[test]
fn fully_buffered_wide_chars() {
    let sink = SharedSink::new();
    let mut fh = File::new(
        CollectingWriter::new(&sink),
        Opening::FOR_WRITE | Opening::BUFFERED,
    );

    for c in S1.chars() {
        assert!(fh.print_wide_char(c).ok());
    }
    assert!(sink.is_empty());

    fh.flush().unwrap();
    assert_eq!(sink.contents(), S1.as_bytes());
}

#[test]
fn line_buffered_wide_chars_flush_on_newline() {
    let sink = SharedSink::new();
    let mut fh = File::new(
        CollectingWriter::new(&sink),
        Opening::FOR_WRITE | Opening::LINE_BUFFERED,
    );

    for c in S1.chars() {
        assert!(fh.print_wide_char(c).ok());
    }
    assert!(sink.is_empty());

    assert!(fh.print_wide_char('\n').ok());
    assert_eq!(sink.contents(), format!("{S1}\n").as_bytes());
}

#[test]
fn unbuffered_wide_string() {
    let sink = SharedSink::new();
    let mut fh = File::new(CollectingWriter::new(&sink), Opening::FOR_WRITE);

    let r = fh.print_wide(S1);
    assert!(r.ok());
    assert_eq!(r.count(), S1.len());
    assert_eq!(sink.contents(), S1.as_bytes());
}

#[test]
fn unbuffered_wide_string_larger_than_scratch() {
    // long enough to force several scratch-buffer drains
    let long: String = "abcdefgh".repeat(64);
    let sink = SharedSink::new();
    let mut fh = File::new(CollectingWriter::new(&sink), Opening::FOR_WRITE);

    let r = fh.print_wide(&long);
    assert!(r.ok());
    assert_eq!(r.count(), long.len());
    assert_eq!(sink.contents(), long.as_bytes());
}

#[test]
fn fully_buffered_wide_string() {
    let sink = SharedSink::new();
    let mut fh = File::with_capacity(CollectingWriter::new(&sink), Opening::FOR_WRITE, 8);

    let r = fh.print_wide(S1);
    assert!(r.ok());
    assert_eq!(r.count(), S1.len());
    // the encoder flushes whenever fewer than MB_LEN_MAX bytes remain, so
    // five characters land per 8-byte buffer round; two stay buffered
    assert_eq!(sink.contents(), S1.as_bytes()[..20].to_vec());

    fh.flush().unwrap();
    assert_eq!(sink.contents(), S1.as_bytes());
}

#[test]
fn line_buffered_wide_string_splits_at_last_newline() {
    let sink = SharedSink::new();
    let mut fh = File::new(
        CollectingWriter::new(&sink),
        Opening::FOR_WRITE | Opening::LINE_BUFFERED,
    );

    let r = fh.print_wide("first\nsecond\ntail");
    assert!(r.ok());
    assert_eq!(r.count(), "first\nsecond\ntail".len());
    assert_eq!(sink.contents(), b"first\nsecond\n");

    fh.flush().unwrap();
    assert_eq!(sink.contents(), b"first\nsecond\ntail");
}
