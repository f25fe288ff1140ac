use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use fastcsv_core::CommentStrategy;

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::reader::Reader;
use crate::row::Row;

#[derive(Debug)]
struct Headers {
    names: Vec<String>,
    /// Maps a name to the index of its first occurrence.
    index: HashMap<String, usize>,
}

impl Headers {
    fn new(names: Vec<String>) -> Headers {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Headers { names, index }
    }
}

/// A reader that gives access to fields by the name in a header row.
///
/// The first row of the input is the header. Every following row must have
/// as many fields as the header, so field count checking is always on.
/// Comment rows are skipped when comments are enabled, since they have no
/// named fields.
///
/// # Example
///
/// ```
/// use fastcsv::{NamedReader, ReaderConfig};
///
/// # fn main() -> fastcsv::Result<()> {
/// let data = "name,age\nAnn,42\nBob,7\n";
/// let mut rdr = NamedReader::from_string(ReaderConfig::default(), data)?;
/// assert_eq!(rdr.headers(), &["name", "age"]);
/// let row = rdr.read_row()?.unwrap();
/// assert_eq!(row.get("age"), Some("42"));
/// assert_eq!(row.get("height"), None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NamedReader<R> {
    rdr: Reader<R>,
    headers: Arc<Headers>,
}

impl NamedReader<io::Empty> {
    /// Create a reader over text that is already in memory.
    pub fn from_string<S: Into<String>>(
        config: ReaderConfig,
        text: S,
    ) -> Result<NamedReader<io::Empty>> {
        NamedReader::new(Reader::from_string(named_config(config), text)?)
    }
}

impl NamedReader<File> {
    /// Create a reader over the UTF-8 file at the given path.
    pub fn from_path<P: AsRef<Path>>(
        config: ReaderConfig,
        path: P,
    ) -> Result<NamedReader<File>> {
        NamedReader::new(Reader::from_path(named_config(config), path)?)
    }
}

impl<R: io::Read> NamedReader<R> {
    /// Create a reader over UTF-8 text from any `io::Read`.
    pub fn from_reader(config: ReaderConfig, rdr: R) -> Result<NamedReader<R>> {
        NamedReader::new(Reader::from_reader(named_config(config), rdr)?)
    }

    /// Read the header row. Empty input has no headers and no rows.
    fn new(mut rdr: Reader<R>) -> Result<NamedReader<R>> {
        let names = match rdr.read_row()? {
            Some(row) => row.into_fields(),
            None => vec![],
        };
        Ok(NamedReader { rdr, headers: Arc::new(Headers::new(names)) })
    }

    /// The names from the header row, in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers.names
    }

    /// Read the next row after the header.
    pub fn read_row(&mut self) -> Result<Option<NamedRow>> {
        Ok(self.rdr.read_row()?.map(|row| NamedRow {
            headers: Arc::clone(&self.headers),
            row,
        }))
    }

    /// Returns a borrowed iterator over the remaining rows.
    pub fn rows(&mut self) -> NamedRowsIter<'_, R> {
        NamedRowsIter { rdr: self }
    }

    /// Read all remaining rows into a vector, in input order.
    pub fn read_all(&mut self) -> Result<Vec<NamedRow>> {
        self.rows().collect()
    }

    /// Close this reader, releasing the underlying source.
    pub fn close(&mut self) {
        self.rdr.close();
    }

    /// Unwrap the row reader underneath.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

fn named_config(mut config: ReaderConfig) -> ReaderConfig {
    config.error_on_different_field_count = true;
    if config.comment_strategy == CommentStrategy::Read {
        config.comment_strategy = CommentStrategy::Skip;
    }
    config
}

/// A borrowed iterator over the rows of a `NamedReader`.
pub struct NamedRowsIter<'r, R> {
    rdr: &'r mut NamedReader<R>,
}

impl<'r, R: io::Read> Iterator for NamedRowsIter<'r, R> {
    type Item = Result<NamedRow>;

    fn next(&mut self) -> Option<Result<NamedRow>> {
        self.rdr.read_row().transpose()
    }
}

/// A row whose fields can be looked up by header name.
#[derive(Clone, Debug)]
pub struct NamedRow {
    headers: Arc<Headers>,
    row: Row,
}

impl NamedRow {
    /// The line on which this row started.
    pub fn line(&self) -> u64 {
        self.row.line()
    }

    /// Return the field under header `name`.
    ///
    /// If a name occurs more than once in the header, its first column is
    /// used.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.index.get(name).and_then(|&i| self.row.get(i))
    }

    /// Iterate over `(name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.names.iter().map(|n| &**n).zip(self.row.iter())
    }

    /// The names from the header row.
    pub fn headers(&self) -> &[String] {
        &self.headers.names
    }

    /// The row underneath, for positional access.
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Unwrap the row underneath.
    pub fn into_row(self) -> Row {
        self.row
    }
}

#[cfg(test)]
mod tests {
    use fastcsv_core::CommentStrategy;

    use super::NamedReader;
    use crate::config::ReaderConfig;

    #[test]
    fn lookup_by_name() {
        let data = "id,name,note\n1,ann,\n2,bob,\"x,y\"\n";
        let mut rdr =
            NamedReader::from_string(ReaderConfig::default(), data).unwrap();
        let rows = rdr.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some("ann"));
        assert_eq!(rows[0].get("note"), Some(""));
        assert_eq!(rows[1].get("note"), Some("x,y"));
        assert_eq!(rows[1].line(), 3);
        let pairs: Vec<(&str, &str)> = rows[1].iter().collect();
        assert_eq!(pairs, vec![("id", "2"), ("name", "bob"), ("note", "x,y")]);
    }

    #[test]
    fn duplicate_names_use_first_column() {
        let mut rdr =
            NamedReader::from_string(ReaderConfig::default(), "a,a\n1,2\n")
                .unwrap();
        let row = rdr.read_row().unwrap().unwrap();
        assert_eq!(row.get("a"), Some("1"));
        assert_eq!(row.row().get(1), Some("2"));
    }

    #[test]
    fn rows_must_match_header_length() {
        let mut rdr =
            NamedReader::from_string(ReaderConfig::default(), "a,b\n1\n")
                .unwrap();
        let err = rdr.read_row().unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn comments_are_skipped() {
        let config = ReaderConfig {
            comment_strategy: CommentStrategy::Read,
            ..ReaderConfig::default()
        };
        let data = "#header follows\na,b\n#note\n1,2\n";
        let mut rdr = NamedReader::from_string(config, data).unwrap();
        assert_eq!(rdr.headers(), &["a", "b"]);
        let rows = rdr.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("b"), Some("2"));
        assert_eq!(rows[0].line(), 4);
    }

    #[test]
    fn empty_input() {
        let mut rdr =
            NamedReader::from_string(ReaderConfig::default(), "").unwrap();
        assert!(rdr.headers().is_empty());
        assert!(rdr.read_row().unwrap().is_none());
    }
}
