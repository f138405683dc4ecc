//! Integration tests: capability polymorphism.
//!
//! A backend implements only what it supports; the handle turns the missing
//! capabilities into clean failures instead of touching the backend.

mod common;

use common::ResizeProbe;
use fileio_core::{Backend, Error, File, MemStream, Opening, Whence};

struct FakeReader;

impl Backend for FakeReader {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Error> {
        Ok(0)
    }

    fn seek(&mut self, offset: i64, _whence: Whence) -> Result<i64, Error> {
        Ok(offset)
    }
}

struct FakeWriter;

impl Backend for FakeWriter {
    fn write(&mut self, _buf: &[u8]) -> Result<usize, Error> {
        Ok(0)
    }
}

#[test]
fn readable_and_seekable_backend() {
    let mut fh = File::new(FakeReader, Opening::FOR_READ | Opening::FOR_WRITE);
    let mut buf = [0u8; 80];

    let r = fh.read(&mut buf);
    assert!(!r.ok());
    assert_eq!(r.count(), 0);
    assert_eq!(r.err(), None);

    assert_eq!(fh.seek(3, Whence::Beginning), Ok(3));

    // the backend has no write capability
    let r = fh.write(b"x");
    assert!(!r.ok());
    assert_eq!(r.err(), Some(Error::BadFileDescriptor));
}

#[test]
fn writable_backend_that_accepts_nothing() {
    let mut fh = File::new(FakeWriter, Opening::FOR_WRITE);
    let buf = [0u8; 80];

    let r = fh.write(&buf);
    assert!(!r.ok());
    assert_eq!(r.count(), 0);
    assert!(r.err().is_some());
}

#[test]
fn read_only_backend_rejects_resize() {
    let mut fh = File::new(FakeReader, Opening::FOR_READ | Opening::FOR_WRITE);
    assert_eq!(fh.resize(10), Err(Error::BadFileDescriptor));
}

#[test]
fn truncate_cuts_at_the_current_position() {
    let mut fh = File::new(
        MemStream::with_contents(b"abcdef".to_vec()),
        Opening::FOR_READ | Opening::FOR_WRITE,
    );

    fh.seek(3, Whence::Beginning).unwrap();
    fh.truncate().unwrap();

    fh.rewind().unwrap();
    let mut buf = [0u8; 8];
    let r = fh.read(&mut buf);
    assert_eq!(r.count(), 3);
    assert_eq!(&buf[..3], b"abc");
}

#[test]
fn truncate_does_not_resize_when_tell_fails() {
    let probe = ResizeProbe::new();
    let mut fh = File::new(probe.clone(), Opening::FOR_READ | Opening::FOR_WRITE);

    // the backend is resizable but not seekable: tell's error surfaces
    assert_eq!(fh.truncate(), Err(Error::BadFileDescriptor));
    assert_eq!(probe.resized_to(), None);

    // resize itself still works
    fh.resize(7).unwrap();
    assert_eq!(probe.resized_to(), Some(7));
}

#[test]
fn tell_and_rewind_delegate_to_the_backend() {
    let mut fh = File::new(
        MemStream::with_contents(b"0123456789".to_vec()),
        Opening::FOR_READ,
    );
    assert_eq!(fh.tell(), Ok(0));
    assert_eq!(fh.seek(4, Whence::Current), Ok(4));
    assert_eq!(fh.tell(), Ok(4));
    assert_eq!(fh.seek(-2, Whence::Ending), Ok(8));
    fh.rewind().unwrap();
    assert_eq!(fh.tell(), Ok(0));
}
