use std::io::{self, Read};
use std::str;

use log::trace;

/// A failure while pulling text from the source.
///
/// The reader turns this into an `Error` once it knows the current line.
#[derive(Debug)]
pub(crate) enum SourceError {
    Io(io::Error),
    Utf8 { byte: u64 },
}

impl From<io::Error> for SourceError {
    fn from(err: io::Error) -> SourceError {
        SourceError::Io(err)
    }
}

/// A chunked supply of text decoded from a byte reader.
///
/// Bytes are read into a staging buffer of fixed capacity and decoded as
/// UTF-8. A multi-byte character split by a read is carried over to the
/// next refill, so the text handed out always ends on a character boundary.
///
/// A CRLF pair may still be split between two chunks. The tokenizer keeps
/// the `\r` as pending state and swallows the `\n` on the next chunk.
#[derive(Debug)]
pub(crate) struct CharSource<R> {
    rdr: R,
    /// Undecoded bytes. Holds at most the tail of an incomplete character
    /// between refills.
    raw: Vec<u8>,
    read_size: usize,
    text: String,
    pos: usize,
    /// Characters in all chunks before the current one.
    chars_before: u64,
    /// Bytes in all chunks before the current one.
    bytes_before: u64,
    eof: bool,
}

impl CharSource<io::Empty> {
    /// A source over text that is already in memory. It never refills.
    pub fn from_string(text: String) -> CharSource<io::Empty> {
        CharSource {
            rdr: io::empty(),
            raw: vec![],
            read_size: 0,
            text,
            pos: 0,
            chars_before: 0,
            bytes_before: 0,
            eof: true,
        }
    }
}

impl<R: io::Read> CharSource<R> {
    /// A source reading at most `buffer_size` bytes at a time from `rdr`.
    ///
    /// A size of `0` reads one byte at a time.
    pub fn from_reader(rdr: R, buffer_size: usize) -> CharSource<R> {
        let read_size = buffer_size.max(1);
        CharSource {
            rdr,
            // Room for the tail of a split character.
            raw: Vec::with_capacity(read_size + 3),
            read_size,
            text: String::with_capacity(read_size + 3),
            pos: 0,
            chars_before: 0,
            bytes_before: 0,
            eof: false,
        }
    }

    /// Return the unread text of the current chunk, refilling it first if
    /// it is exhausted.
    ///
    /// An empty string means the input is exhausted.
    pub fn fill_buf(&mut self) -> Result<&str, SourceError> {
        if self.pos >= self.text.len() && !self.eof {
            self.refill()?;
        }
        Ok(&self.text[self.pos..])
    }

    /// Mark `n` bytes of the text returned by `fill_buf` as consumed.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.text.len());
        self.pos += n;
    }

    /// The number of characters consumed so far.
    pub fn position(&self) -> u64 {
        self.chars_before + self.text[..self.pos].chars().count() as u64
    }

    /// Unwrap the underlying reader. Unread text is lost.
    pub fn into_inner(self) -> R {
        self.rdr
    }

    fn refill(&mut self) -> Result<(), SourceError> {
        self.chars_before += self.text.chars().count() as u64;
        self.bytes_before += self.text.len() as u64;
        self.text.clear();
        self.pos = 0;
        while self.text.is_empty() {
            let start = self.raw.len();
            self.raw.resize(start + self.read_size, 0);
            let n = match read_retry(&mut self.rdr, &mut self.raw[start..]) {
                Ok(n) => n,
                Err(err) => {
                    self.raw.truncate(start);
                    return Err(err.into());
                }
            };
            self.raw.truncate(start + n);
            trace!("read {} bytes from source", n);
            if n == 0 {
                self.eof = true;
                if !self.raw.is_empty() {
                    // The input ends in the middle of a character.
                    return Err(SourceError::Utf8 { byte: self.bytes_before });
                }
                return Ok(());
            }
            let valid = match str::from_utf8(&self.raw) {
                Ok(s) => s.len(),
                // Hand out the valid prefix first. The invalid bytes stay in
                // `raw` and fail the next refill.
                Err(err) if err.valid_up_to() > 0 => err.valid_up_to(),
                Err(err) => {
                    if err.error_len().is_some() {
                        return Err(SourceError::Utf8 { byte: self.bytes_before });
                    }
                    0
                }
            };
            // SAFETY: `from_utf8` above verified `raw[..valid]`.
            let decoded = unsafe { str::from_utf8_unchecked(&self.raw[..valid]) };
            self.text.push_str(decoded);
            self.raw.drain(..valid);
        }
        Ok(())
    }
}

fn read_retry<R: io::Read>(rdr: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match rdr.read(buf) {
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
            res => return res,
        }
    }
}
