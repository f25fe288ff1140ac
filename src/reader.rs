use std::fs::File;
use std::io;
use std::path::Path;

use fastcsv_core::{MalformedError, ReadFieldResult, Tokenizer};
use log::debug;

use crate::config::ReaderConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::row::{Row, RowBuilder};
use crate::source::{CharSource, SourceError};

/// A reader of delimited text.
///
/// A reader is a single pass, forward only sequence of rows. All ways of
/// consuming it (`read_row`, `rows`, `into_rows`, `read_all` and `visit`)
/// advance the same cursor, so rows handed out by one of them are never
/// seen by another.
///
/// Once the input is exhausted, or after any error, the sequence is
/// finished and yields no more rows. After `close`, every attempt to read
/// fails with `ErrorKind::Closed`.
///
/// # Example
///
/// ```
/// use fastcsv::{Reader, ReaderConfig};
///
/// # fn main() -> fastcsv::Result<()> {
/// let data = "city,pop\nBoston,4628910\n\"Concord, MA\",42695\n";
/// let mut rdr = Reader::from_string(ReaderConfig::default(), data)?;
/// let rows = rdr.read_all()?;
/// assert_eq!(rows.len(), 3);
/// assert_eq!(rows[2].fields(), &["Concord, MA", "42695"]);
/// assert_eq!(rows[2].line(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Reader<R> {
    core: Tokenizer,
    source: Option<CharSource<R>>,
    builder: RowBuilder,
    config: ReaderConfig,
    /// The field count of the first counted row.
    expected_len: Option<usize>,
    /// A row pulled by `has_next` and not yet handed out.
    peeked: Option<Row>,
    done: bool,
}

impl Reader<io::Empty> {
    /// Create a reader over text that is already in memory.
    ///
    /// The whole text is used as a single buffer, so the configured buffer
    /// size has no effect.
    pub fn from_string<S: Into<String>>(
        config: ReaderConfig,
        text: S,
    ) -> Result<Reader<io::Empty>> {
        config.validate()?;
        Ok(Reader::new(config, CharSource::from_string(text.into())))
    }
}

impl Reader<File> {
    /// Create a reader over the UTF-8 file at the given path.
    ///
    /// The configuration is checked before the file is opened.
    pub fn from_path<P: AsRef<Path>>(
        config: ReaderConfig,
        path: P,
    ) -> Result<Reader<File>> {
        config.validate()?;
        let file = File::open(path)?;
        Ok(Reader::from_reader_unchecked(config, file))
    }
}

impl<R: io::Read> Reader<R> {
    /// Create a reader over UTF-8 text from any `io::Read`.
    ///
    /// The reader does its own buffering, so `rdr` does not need to be
    /// buffered.
    pub fn from_reader(config: ReaderConfig, rdr: R) -> Result<Reader<R>> {
        config.validate()?;
        Ok(Reader::from_reader_unchecked(config, rdr))
    }

    fn from_reader_unchecked(config: ReaderConfig, rdr: R) -> Reader<R> {
        let source = CharSource::from_reader(rdr, config.buffer_size);
        Reader::new(config, source)
    }

    fn new(config: ReaderConfig, source: CharSource<R>) -> Reader<R> {
        let dialect = config.dialect();
        debug!(
            "reader created: separator={:?} quote={:?} comment={:?} ({:?}) \
             skip_empty_rows={} error_on_different_field_count={}",
            dialect.field_separator,
            dialect.quote_character,
            dialect.comment_character,
            config.comment_strategy,
            config.skip_empty_rows,
            config.error_on_different_field_count,
        );
        Reader {
            core: Tokenizer::new(dialect, config.comment_strategy),
            source: Some(source),
            builder: RowBuilder::new(),
            config,
            expected_len: None,
            peeked: None,
            done: false,
        }
    }

    /// Read the next row.
    ///
    /// Returns `None` once the input is exhausted or a previous call
    /// failed.
    ///
    /// # Errors
    ///
    /// Malformed input, rows of unequal length (if checking is enabled),
    /// invalid UTF-8 and I/O errors from the source are returned as they
    /// happen. Reading from a closed reader fails with `ErrorKind::Closed`.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        if self.source.is_none() {
            return Err(Error::new(ErrorKind::Closed));
        }
        if let Some(row) = self.peeked.take() {
            return Ok(Some(row));
        }
        if self.done {
            return Ok(None);
        }
        match self.read_counted_row() {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(err) => {
                self.done = true;
                self.builder.reset();
                Err(err)
            }
        }
    }

    /// Returns true if another row is available.
    ///
    /// The row is read ahead and kept for the next call to `read_row`. If
    /// reading it fails, the error is returned here.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        self.peeked = self.read_row()?;
        Ok(self.peeked.is_some())
    }

    /// Returns a borrowed iterator over the remaining rows.
    pub fn rows(&mut self) -> RowsIter<'_, R> {
        RowsIter { rdr: self }
    }

    /// Returns an owned iterator over the remaining rows.
    pub fn into_rows(self) -> RowsIntoIter<R> {
        RowsIntoIter { rdr: self }
    }

    /// Read all remaining rows into a vector, in input order.
    pub fn read_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = vec![];
        while let Some(row) = self.read_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Call `visit` with each remaining row, in input order.
    ///
    /// Stops at the first error.
    pub fn visit<F: FnMut(Row)>(&mut self, mut visit: F) -> Result<()> {
        while let Some(row) = self.read_row()? {
            visit(row);
        }
        Ok(())
    }

    /// The current line of the input. Line numbers start at `1`.
    pub fn line(&self) -> u64 {
        self.core.line()
    }

    /// The number of characters consumed from the input so far.
    ///
    /// This is `0` after the reader is closed.
    pub fn position(&self) -> u64 {
        self.source.as_ref().map_or(0, |src| src.position())
    }

    /// The configuration of this reader.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Returns true if no more rows will be produced.
    pub fn is_done(&self) -> bool {
        self.source.is_none() || (self.done && self.peeked.is_none())
    }

    /// Close this reader, releasing the underlying source.
    ///
    /// A row read ahead by `has_next` is discarded. Closing twice is a
    /// no-op.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("reader closed at line {}", self.core.line());
        }
        self.peeked = None;
        self.done = true;
    }

    /// Unwrap the underlying reader, or `None` if this reader was closed.
    ///
    /// Any text buffered but not yet parsed is lost.
    pub fn into_inner(self) -> Option<R> {
        self.source.map(|src| src.into_inner())
    }

    /// Apply the row level policies: empty rows and field counts.
    fn read_counted_row(&mut self) -> Result<Option<Row>> {
        loop {
            let row = match self.read_raw_row()? {
                None => return Ok(None),
                Some(row) => row,
            };
            let empty_line = self.core.is_empty_line();
            if empty_line && self.config.skip_empty_rows {
                continue;
            }
            if self.config.error_on_different_field_count
                && !empty_line
                && !row.is_comment()
            {
                match self.expected_len {
                    None => self.expected_len = Some(row.len()),
                    Some(expected_len) if expected_len != row.len() => {
                        debug!(
                            "line {}: found {} fields, expected {}",
                            row.line(),
                            row.len(),
                            expected_len
                        );
                        return Err(Error::new(ErrorKind::UnequalLengths {
                            line: row.line(),
                            expected_len,
                            len: row.len(),
                        }));
                    }
                    Some(_) => {}
                }
            }
            return Ok(Some(row));
        }
    }

    /// Drive the tokenizer until it finishes a row or the input ends.
    fn read_raw_row(&mut self) -> Result<Option<Row>> {
        let source = match self.source {
            Some(ref mut source) => source,
            None => return Err(Error::new(ErrorKind::Closed)),
        };
        loop {
            let (res, nin) = {
                let line = self.core.line();
                let input = match source.fill_buf() {
                    Ok(input) => input,
                    Err(err) => return Err(source_error(err, line)),
                };
                self.core
                    .read_field(input, self.builder.field_mut())
                    .map_err(malformed)?
            };
            source.consume(nin);
            match res {
                ReadFieldResult::InputEmpty => {}
                ReadFieldResult::Field { record_end } => {
                    self.builder.end_field();
                    if record_end {
                        let row = self
                            .builder
                            .end_row(self.core.row_line(), self.core.is_comment());
                        return Ok(Some(row));
                    }
                }
                ReadFieldResult::End => return Ok(None),
            }
        }
    }
}

fn malformed(err: MalformedError) -> Error {
    debug!("malformed input: {}", err);
    Error::from(err)
}

fn source_error(err: SourceError, line: u64) -> Error {
    match err {
        SourceError::Io(err) => Error::from(err),
        SourceError::Utf8 { byte } => {
            debug!("invalid UTF-8 at byte {} (line {})", byte, line);
            Error::new(ErrorKind::Utf8 { line, byte })
        }
    }
}

/// A borrowed iterator over the rows of a reader.
///
/// Created by `Reader::rows`.
pub struct RowsIter<'r, R> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: io::Read> RowsIter<'r, R> {
    /// Return a reference to the underlying reader.
    pub fn reader(&self) -> &Reader<R> {
        self.rdr
    }
}

impl<'r, R: io::Read> Iterator for RowsIter<'r, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        self.rdr.read_row().transpose()
    }
}

/// An owned iterator over the rows of a reader.
///
/// Created by `Reader::into_rows`.
pub struct RowsIntoIter<R> {
    rdr: Reader<R>,
}

impl<R: io::Read> RowsIntoIter<R> {
    /// Return a reference to the underlying reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    /// Drop this iterator and return the underlying reader.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: io::Read> Iterator for RowsIntoIter<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        self.rdr.read_row().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use fastcsv_core::{CommentStrategy, MalformedKind};

    use super::Reader;
    use crate::config::ReaderConfig;
    use crate::error::ErrorKind;

    fn reader(data: &str) -> Reader<io::Empty> {
        Reader::from_string(ReaderConfig::default(), data).unwrap()
    }

    fn fields(rdr: &mut Reader<io::Empty>) -> Vec<Vec<String>> {
        rdr.read_all().unwrap().into_iter().map(|r| r.into_fields()).collect()
    }

    #[test]
    fn has_next_does_not_lose_rows() {
        let mut rdr = reader("a\nb\n");
        assert!(rdr.has_next().unwrap());
        assert!(rdr.has_next().unwrap());
        assert_eq!(rdr.read_row().unwrap().unwrap().fields(), &["a"]);
        assert!(rdr.has_next().unwrap());
        assert_eq!(rdr.read_row().unwrap().unwrap().fields(), &["b"]);
        assert!(!rdr.has_next().unwrap());
        assert!(rdr.read_row().unwrap().is_none());
        assert!(rdr.is_done());
    }

    #[test]
    fn views_share_one_cursor() {
        let mut rdr = reader("1\n2\n3\n4\n");
        assert_eq!(rdr.rows().next().unwrap().unwrap().fields(), &["1"]);
        let mut seen = vec![];
        assert!(rdr.has_next().unwrap());
        assert_eq!(rdr.read_row().unwrap().unwrap().fields(), &["2"]);
        rdr.visit(|row| seen.push(row.into_fields())).unwrap();
        assert_eq!(seen, vec![vec!["3"], vec!["4"]]);
        assert!(rdr.read_all().unwrap().is_empty());
    }

    #[test]
    fn into_rows_iterates_all() {
        let rdr = reader("a,b\nc,d\n");
        let rows: Vec<Vec<String>> =
            rdr.into_rows().map(|r| r.unwrap().into_fields()).collect();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn read_after_close_fails() {
        let mut rdr = reader("a\nb\n");
        assert!(rdr.has_next().unwrap());
        rdr.close();
        rdr.close();
        match *rdr.read_row().unwrap_err().kind() {
            ErrorKind::Closed => {}
            ref kind => panic!("expected Closed, got {:?}", kind),
        }
        assert!(rdr.is_done());
        assert_eq!(rdr.position(), 0);
        assert!(rdr.into_inner().is_none());
    }

    #[test]
    fn sequence_ends_after_error() {
        let mut rdr = reader("a,\"b\"x\nc,d\n");
        let err = rdr.read_row().unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.line(), Some(1));
        match *err.kind() {
            ErrorKind::Malformed(ref err) => {
                assert_eq!(err.kind(), &MalformedKind::UnexpectedCharacter('x'))
            }
            ref kind => panic!("expected Malformed, got {:?}", kind),
        }
        assert!(rdr.read_row().unwrap().is_none());
        assert!(rdr.is_done());
    }

    #[test]
    fn unterminated_quote_reports_start_line() {
        let mut rdr = reader("a\n\"b\nc\n");
        assert_eq!(rdr.read_row().unwrap().unwrap().fields(), &["a"]);
        let err = rdr.read_row().unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn empty_rows_are_not_counted() {
        let config = ReaderConfig {
            skip_empty_rows: false,
            error_on_different_field_count: true,
            ..ReaderConfig::default()
        };
        let mut rdr = Reader::from_string(config, "a,b\n\nc,d\n").unwrap();
        let rows = rdr.read_all().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].fields(), &[""]);
        assert_eq!(rows[1].line(), 2);
        assert_eq!(rows[2].line(), 3);
    }

    #[test]
    fn comments_are_not_counted() {
        let config = ReaderConfig {
            comment_strategy: CommentStrategy::Read,
            error_on_different_field_count: true,
            ..ReaderConfig::default()
        };
        let mut rdr = Reader::from_string(config, "a,b\n#note\nc,d\n").unwrap();
        let rows = rdr.read_all().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_comment());
        assert_eq!(rows[1].fields(), &["note"]);
    }

    #[test]
    fn mixed_line_terminators() {
        let mut rdr = reader("a\rb\r\nc\nd");
        let rows = rdr.read_all().unwrap();
        let lines: Vec<u64> = rows.iter().map(|r| r.line()).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
        assert_eq!(rdr.line(), 4);
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(fields(&mut reader("")).is_empty());
        let config =
            ReaderConfig { skip_empty_rows: false, ..ReaderConfig::default() };
        let mut rdr = Reader::from_string(config, "a\n").unwrap();
        assert_eq!(rdr.read_all().unwrap().len(), 1);
    }

    #[test]
    fn position_counts_characters() {
        let mut rdr = reader("é,ü\nx\n");
        rdr.read_row().unwrap();
        assert_eq!(rdr.position(), 4);
        rdr.read_row().unwrap();
        assert_eq!(rdr.position(), 6);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ReaderConfig {
            quote_character: ',',
            ..ReaderConfig::default()
        };
        let err = Reader::from_string(config, "a").unwrap_err();
        match *err.kind() {
            ErrorKind::Config(_) => {}
            ref kind => panic!("expected Config, got {:?}", kind),
        }
    }

    #[test]
    fn invalid_utf8_from_reader() {
        let data: &[u8] = b"a,b\nc,\xFF\n";
        let mut rdr =
            Reader::from_reader(ReaderConfig::default(), data).unwrap();
        assert_eq!(rdr.read_row().unwrap().unwrap().fields(), &["a", "b"]);
        let err = rdr.read_row().unwrap_err();
        match *err.kind() {
            ErrorKind::Utf8 { line: 2, byte: 6 } => {}
            ref kind => panic!("expected Utf8, got {:?}", kind),
        }
    }

    #[test]
    fn missing_file() {
        let path = std::env::temp_dir().join("fastcsv-does-not-exist.csv");
        let err = Reader::from_path(ReaderConfig::default(), path).unwrap_err();
        assert!(err.is_io_error());
    }
}
