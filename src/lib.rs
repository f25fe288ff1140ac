/*!
The `fastcsv` crate reads and writes delimited text, such as CSV, as a
stream of rows.

A dialect decides which characters separate fields, enclose quoted fields
and introduce comments. Reading turns text into owned `Row` values, each
remembering the line it started on. Writing quotes fields according to a
`QuoteStrategy` and ends every row with a configurable line delimiter.

The I/O free tokenizer and quoting engine live in the `fastcsv-core`
crate; this crate adds buffering, configuration and error handling on top.

# Reading

```
use fastcsv::{CommentStrategy, Reader, ReaderConfig};

# fn main() -> fastcsv::Result<()> {
let config = ReaderConfig {
    comment_strategy: CommentStrategy::Skip,
    ..ReaderConfig::default()
};
let data = "# cities\nBoston,\"4,628,910\"\r\nConcord,42695\n";
let mut rdr = Reader::from_string(config, data)?;
for result in rdr.rows() {
    let row = result?;
    println!("line {}: {:?}", row.line(), row.fields());
}
# Ok(())
# }
```

# Writing

```
use fastcsv::{QuoteStrategy, Writer, WriterConfig};

# fn main() -> fastcsv::Result<()> {
let config = WriterConfig {
    quote_strategy: QuoteStrategy::NonNumeric,
    ..WriterConfig::default()
};
let mut out = vec![];
Writer::scope(config, &mut out, |wtr| {
    wtr.write_comment(" generated")?;
    wtr.write_row(&["Boston", "4628910"])?;
    Ok(())
})?;
assert_eq!(out, b"# generated\r\n\"Boston\",4628910\r\n");
# Ok(())
# }
```

# Errors

Every fallible operation returns `fastcsv::Result`. Malformed input (a stray
character after a closing quote, an unterminated quoted field, or rows of
unequal length when that is checked) carries the line where it happened.
Invalid configurations are rejected before any I/O is done.

# Logging

This crate logs through the `log` facade: construction and closing of
readers and writers and malformed input at `debug` level, buffer refills
and flushes at `trace` level. No logger is installed.
*/

#![deny(missing_docs)]

pub use fastcsv_core::{
    is_plain_number, CommentStrategy, Dialect, DialectError, LineDelimiter,
    MalformedError, MalformedKind, QuoteStrategy,
};

pub use crate::buffered::BufferedWriter;
pub use crate::config::{ReaderConfig, WriterConfig, DEFAULT_BUFFER_SIZE};
pub use crate::error::{Error, ErrorKind, IntoInnerError, Result};
pub use crate::named::{NamedReader, NamedRow, NamedRowsIter};
pub use crate::reader::{Reader, RowsIntoIter, RowsIter};
pub use crate::row::{Row, RowIter};
pub use crate::writer::Writer;

mod buffered;
mod config;
mod error;
mod named;
mod reader;
mod row;
mod source;
mod writer;
