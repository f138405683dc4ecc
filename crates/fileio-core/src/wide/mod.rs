//! Wide-character output encoding.
//!
//! Wide characters are Rust `char`s; on output they are translated to the
//! execution charset chosen from the process locale, the way `wcrtomb`
//! translates through `LC_CTYPE`. The encoder is conversion state owned by
//! a handle: one per stream, initialised at open.

use crate::error::Error;

/// Upper bound on the encoded length of one wide character.
pub const MB_LEN_MAX: usize = 4;

/// Execution charsets the encoder can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8 (multibyte, up to [`MB_LEN_MAX`] bytes per character).
    Utf8,
    /// ISO 8859-1: code points above U+00FF are unrepresentable.
    Latin1,
    /// The POSIX "C" charset: code points above U+007F are unrepresentable.
    Ascii,
}

impl Charset {
    /// Picks the charset from the process locale.
    ///
    /// Checks `LC_ALL`, `LC_CTYPE`, and `LANG` in that order, the POSIX
    /// category precedence. An unset or unrecognised locale falls back to
    /// the "C" charset.
    pub fn from_locale() -> Charset {
        for key in ["LC_ALL", "LC_CTYPE", "LANG"] {
            if let Ok(value) = std::env::var(key) {
                if !value.is_empty() {
                    return Charset::from_name(&value);
                }
            }
        }
        Charset::Ascii
    }

    /// Parses a locale name such as `en_US.UTF-8`, `C`, or a bare codeset.
    pub fn from_name(name: &str) -> Charset {
        let codeset = name.split('.').nth(1).unwrap_or(name);
        let mut canonical = String::with_capacity(codeset.len());
        for c in codeset.chars() {
            if matches!(c, '-' | '_' | ' ') {
                continue;
            }
            canonical.push(c.to_ascii_uppercase());
        }
        match canonical.as_str() {
            "UTF8" => Charset::Utf8,
            "ISO88591" | "LATIN1" => Charset::Latin1,
            _ => Charset::Ascii,
        }
    }
}

/// Stateful wide-to-multibyte conversion, bound to one stream.
#[derive(Debug, Clone, Copy)]
pub struct WideEncoder {
    charset: Charset,
}

impl WideEncoder {
    /// An encoder targeting an explicit charset, in the initial state.
    pub fn new(charset: Charset) -> WideEncoder {
        WideEncoder { charset }
    }

    /// An encoder targeting the process locale's charset.
    pub fn from_locale() -> WideEncoder {
        WideEncoder::new(Charset::from_locale())
    }

    /// The charset this encoder targets.
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Encodes one wide character into `out`, returning the byte length.
    ///
    /// `out` must hold at least [`MB_LEN_MAX`] bytes. An unrepresentable
    /// character fails with [`Error::IllegalByteSequence`] and writes
    /// nothing.
    pub fn encode(&mut self, c: char, out: &mut [u8]) -> Result<usize, Error> {
        debug_assert!(out.len() >= MB_LEN_MAX);
        match self.charset {
            Charset::Utf8 => Ok(c.encode_utf8(out).len()),
            Charset::Latin1 => {
                let cp = c as u32;
                if cp > 0xFF {
                    return Err(Error::IllegalByteSequence);
                }
                out[0] = cp as u8;
                Ok(1)
            }
            Charset::Ascii => {
                let cp = c as u32;
                if cp > 0x7F {
                    return Err(Error::IllegalByteSequence);
                }
                out[0] = cp as u8;
                Ok(1)
            }
        }
    }
}
