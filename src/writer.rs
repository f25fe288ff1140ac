use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::result;

use fastcsv_core::Quoter;
use log::debug;

use crate::buffered::BufferedWriter;
use crate::config::WriterConfig;
use crate::error::{IntoInnerError, Result};

/// A writer of delimited text.
///
/// Fields are quoted according to the configured `QuoteStrategy`; inside a
/// quoted field every quote character is doubled and nothing else is
/// changed. Every row ends with the configured line delimiter.
///
/// A row made of one empty field is always written as two quote characters,
/// so that it reads back as a row instead of an empty line.
///
/// Output is buffered. Buffered text is flushed on drop, but errors are
/// only visible through `flush`, `close` or `into_inner`. `Writer::scope`
/// closes the writer on every exit path.
///
/// # Example
///
/// ```
/// use fastcsv::{LineDelimiter, Writer, WriterConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = WriterConfig {
///     line_delimiter: LineDelimiter::Lf,
///     ..WriterConfig::default()
/// };
/// let mut wtr = Writer::from_writer(config, vec![])?;
/// wtr.write_row(&["name", "quote"])?;
/// wtr.write_row(&["Ann", "said \"hi\", then left"])?;
///
/// let data = String::from_utf8(wtr.into_inner()?)?;
/// assert_eq!(data, "name,quote\nAnn,\"said \"\"hi\"\", then left\"\n");
/// # Ok(())
/// # }
/// ```
pub struct Writer<W: io::Write> {
    buf: BufferedWriter<W>,
    quoter: Quoter,
    line_delimiter: &'static str,
}

impl Writer<File> {
    /// Create a writer for the file at the given path.
    ///
    /// The file is created if it does not exist and truncated otherwise.
    /// The configuration is checked before the file is touched.
    pub fn from_path<P: AsRef<Path>>(
        config: WriterConfig,
        path: P,
    ) -> Result<Writer<File>> {
        config.validate()?;
        let file = File::create(path)?;
        Ok(Writer::new(&config, file))
    }
}

impl<W: io::Write> Writer<W> {
    /// Create a writer on top of any `io::Write`.
    ///
    /// The writer does its own buffering, so `wtr` does not need to be
    /// buffered.
    pub fn from_writer(config: WriterConfig, wtr: W) -> Result<Writer<W>> {
        config.validate()?;
        Ok(Writer::new(&config, wtr))
    }

    /// Create a writer, hand it to `f` and close it afterwards, whether or
    /// not `f` succeeded.
    ///
    /// If `f` fails and closing fails too, the error from `f` is returned
    /// with the close error attached (see `Error::close_error`).
    pub fn scope<T, F>(config: WriterConfig, wtr: W, f: F) -> Result<T>
    where
        F: FnOnce(&mut Writer<W>) -> Result<T>,
    {
        let mut wtr = Writer::from_writer(config, wtr)?;
        match f(&mut wtr) {
            Ok(value) => {
                wtr.close()?;
                Ok(value)
            }
            Err(err) => match wtr.close() {
                Ok(()) => Err(err),
                Err(close) => Err(err.with_close_error(close)),
            },
        }
    }

    fn new(config: &WriterConfig, wtr: W) -> Writer<W> {
        let line_delimiter = config.line_delimiter.resolve();
        debug!(
            "writer created: separator={:?} quote={:?} strategy={:?} \
             line delimiter={:?}",
            config.field_separator,
            config.quote_character,
            config.quote_strategy,
            line_delimiter,
        );
        Writer {
            buf: BufferedWriter::with_capacity(config.buffer_size, wtr),
            quoter: Quoter::new(config.dialect(), config.quote_strategy),
            line_delimiter: line_delimiter.as_str(),
        }
    }

    /// Write a single row.
    ///
    /// Rows may have any number of fields. A row without fields writes
    /// only the line delimiter.
    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let sep = self.quoter.dialect().field_separator;
        let mut count = 0;
        let mut bare_empty = false;
        for field in row {
            let field = field.as_ref();
            if count > 0 {
                self.buf.write_char(sep)?;
            }
            let quoted = self.write_field(field, count == 0)?;
            bare_empty = field.is_empty() && !quoted;
            count += 1;
        }
        if count == 1 && bare_empty {
            let quote = self.quoter.dialect().quote_character;
            self.buf.write_char(quote)?;
            self.buf.write_char(quote)?;
        }
        self.buf.write_str(self.line_delimiter)?;
        Ok(())
    }

    /// Write a comment row: the comment character, `text` and the line
    /// delimiter.
    ///
    /// `text` is written as is. It must not contain line terminators if
    /// the output is to be read back as a single comment.
    pub fn write_comment(&mut self, text: &str) -> Result<()> {
        self.buf.write_char(self.quoter.dialect().comment_character)?;
        self.buf.write_str(text)?;
        self.buf.write_str(self.line_delimiter)?;
        Ok(())
    }

    /// Returns true if the field was quoted.
    fn write_field(&mut self, field: &str, first: bool) -> io::Result<bool> {
        if !self.quoter.should_quote(field, first) {
            self.buf.write_str(field)?;
            return Ok(false);
        }
        let quote = self.quoter.dialect().quote_character;
        self.buf.write_char(quote)?;
        for piece in self.quoter.escape(field) {
            self.buf.write_str(piece)?;
        }
        self.buf.write_char(quote)?;
        Ok(true)
    }

    /// Flush buffered text and the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.buf.flush()?;
        Ok(())
    }

    /// Flush and release the underlying writer.
    ///
    /// The underlying writer is dropped even if flushing fails.
    pub fn close(self) -> Result<()> {
        debug!("closing writer");
        self.buf.close()?;
        Ok(())
    }

    /// Flush and unwrap the underlying writer.
    ///
    /// If flushing fails, the error is returned together with this writer.
    pub fn into_inner(
        self,
    ) -> result::Result<W, IntoInnerError<Writer<W>>> {
        let Writer { buf, quoter, line_delimiter } = self;
        buf.into_inner().map_err(|err| {
            let (buf, err) = err.into_parts();
            IntoInnerError::new(Writer { buf, quoter, line_delimiter }, err)
        })
    }

    /// Gets a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        self.buf.get_ref()
    }
}

impl<W: io::Write> fmt::Debug for Writer<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Writer")
            .field("buf", &self.buf)
            .field("quoter", &self.quoter)
            .field("line_delimiter", &self.line_delimiter)
            .finish()
    }
}
