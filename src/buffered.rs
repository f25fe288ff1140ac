use std::fmt;
use std::io::{self, Write};

use log::trace;

use crate::config::DEFAULT_BUFFER_SIZE;
use crate::error::IntoInnerError;

/// A buffered writer for text.
///
/// Short writes accumulate in a buffer of fixed capacity that is written to
/// the sink once it cannot hold the next write. A write at least as long as
/// the free space left first flushes what is buffered and, if it is at
/// least as long as the whole capacity, then goes straight to the sink
/// without being copied. The order of writes is always preserved.
///
/// A capacity of `0` turns every write into a direct write to the sink.
///
/// Buffered text is flushed when the writer is dropped, but errors are
/// ignored there. Call `flush` or `close` to see them.
pub struct BufferedWriter<W: io::Write> {
    inner: Option<W>,
    buf: Vec<u8>,
    capacity: usize,
    /// Set while the sink is being written to, so a panic in the sink does
    /// not cause a second write from `drop`.
    panicked: bool,
}

impl<W: io::Write> BufferedWriter<W> {
    /// Wrap `inner` with the default capacity of 8 KiB.
    pub fn new(inner: W) -> BufferedWriter<W> {
        BufferedWriter::with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    /// Wrap `inner` with a buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize, inner: W) -> BufferedWriter<W> {
        BufferedWriter {
            inner: Some(inner),
            buf: Vec::with_capacity(capacity),
            capacity,
            panicked: false,
        }
    }

    /// The capacity of the buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The text buffered but not yet written to the sink.
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Write a single character.
    pub fn write_char(&mut self, ch: char) -> io::Result<()> {
        let mut utf8 = [0; 4];
        self.write_bytes(ch.encode_utf8(&mut utf8).as_bytes())
    }

    /// Write a string.
    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        if data.len() >= self.capacity - self.buf.len() {
            self.flush_buf()?;
            if data.len() >= self.capacity {
                trace!("writing {} bytes past the buffer", data.len());
                self.panicked = true;
                let result = self.get_mut().write_all(data);
                self.panicked = false;
                return result;
            }
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Write the buffered text to the sink without flushing the sink.
    pub fn flush_buf(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        trace!("flushing {} buffered bytes", self.buf.len());
        self.panicked = true;
        let result = self.inner.as_mut().unwrap().write_all(&self.buf);
        self.panicked = false;
        result?;
        self.buf.clear();
        Ok(())
    }

    /// Write the buffered text to the sink and flush the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.flush_buf()?;
        self.get_mut().flush()
    }

    /// Gets a reference to the sink.
    pub fn get_ref(&self) -> &W {
        self.inner.as_ref().unwrap()
    }

    /// Gets a mutable reference to the sink.
    ///
    /// Writing to the sink directly bypasses and reorders buffered text.
    pub fn get_mut(&mut self) -> &mut W {
        self.inner.as_mut().unwrap()
    }

    /// Flush and unwrap the sink.
    ///
    /// If flushing fails, the error is returned together with this writer.
    pub fn into_inner(
        mut self,
    ) -> Result<W, IntoInnerError<BufferedWriter<W>>> {
        match self.flush() {
            Ok(()) => Ok(self.inner.take().unwrap()),
            Err(err) => Err(IntoInnerError::new(self, err)),
        }
    }

    /// Flush and then close the sink by dropping it.
    ///
    /// The sink is released even if flushing fails.
    pub fn close(mut self) -> io::Result<()> {
        let result = self.flush();
        self.inner = None;
        result
    }
}

impl<W: io::Write> Drop for BufferedWriter<W> {
    fn drop(&mut self) {
        if self.inner.is_some() && !self.panicked {
            let _ = self.flush();
        }
    }
}

impl<W: io::Write> io::Write for BufferedWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.write_bytes(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        BufferedWriter::flush(self)
    }
}

impl<W: io::Write> fmt::Debug for BufferedWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BufferedWriter")
            .field("capacity", &self.capacity)
            .field("buffered", &self.buf.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::BufferedWriter;

    /// A sink recording the size of every write it receives.
    #[derive(Debug, Default)]
    struct Recorder {
        data: Vec<u8>,
        writes: Vec<usize>,
        flushes: usize,
    }

    impl io::Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            self.writes.push(buf.len());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "broken sink"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_writes_are_buffered() {
        let mut wtr = BufferedWriter::with_capacity(8, Recorder::default());
        wtr.write_str("abc").unwrap();
        wtr.write_char('d').unwrap();
        assert_eq!(wtr.buffer(), b"abcd");
        assert!(wtr.get_ref().writes.is_empty());

        // Does not fit into the 4 remaining bytes.
        wtr.write_str("efgh").unwrap();
        assert_eq!(wtr.get_ref().writes, vec![4]);
        assert_eq!(wtr.buffer(), b"efgh");

        let rec = wtr.into_inner().unwrap();
        assert_eq!(rec.data, b"abcdefgh");
        assert_eq!(rec.writes, vec![4, 4]);
        assert_eq!(rec.flushes, 1);
    }

    #[test]
    fn large_writes_bypass_buffer() {
        let mut wtr = BufferedWriter::with_capacity(4, Recorder::default());
        wtr.write_str("ab").unwrap();
        wtr.write_str("0123456789").unwrap();
        assert!(wtr.buffer().is_empty());
        assert_eq!(wtr.get_ref().writes, vec![2, 10]);
        assert_eq!(wtr.get_ref().data, b"ab0123456789");
    }

    #[test]
    fn zero_capacity_passes_through() {
        let mut wtr = BufferedWriter::with_capacity(0, Recorder::default());
        wtr.write_char('a').unwrap();
        wtr.write_char('é').unwrap();
        wtr.write_str("bc").unwrap();
        assert!(wtr.buffer().is_empty());
        assert_eq!(wtr.get_ref().writes, vec![1, 2, 2]);
        assert_eq!(wtr.get_ref().data, "aébc".as_bytes());
    }

    #[test]
    fn drop_flushes() {
        let mut out = vec![];
        {
            let mut wtr = BufferedWriter::with_capacity(64, &mut out);
            wtr.write_str("pending").unwrap();
        }
        assert_eq!(out, b"pending");
    }

    #[test]
    fn close_reports_flush_error() {
        let mut wtr = BufferedWriter::with_capacity(64, Broken);
        wtr.write_str("lost").unwrap();
        assert!(wtr.close().is_err());
    }

    #[test]
    fn into_inner_returns_writer_on_error() {
        let mut wtr = BufferedWriter::with_capacity(64, Broken);
        wtr.write_str("kept").unwrap();
        let err = wtr.into_inner().unwrap_err();
        assert_eq!(err.error().kind(), io::ErrorKind::Other);
        assert_eq!(err.into_inner().buffer(), b"kept");
    }
}
