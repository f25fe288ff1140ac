/*!
`fastcsv-core` provides the I/O free parts of a delimited text codec: a push
based tokenizer that turns chunks of text into fields and rows, and a quoting
engine that decides how fields are written.

Most users want the `fastcsv` crate, which drives these with buffered I/O and
hands out owned rows.

# Example: counting fields

```
use fastcsv_core::{CommentStrategy, Dialect, ReadFieldResult, Tokenizer};

let mut data = "a,b\n\"c,d\",e\n";
let mut tok = Tokenizer::new(Dialect::default(), CommentStrategy::None);
let mut field = String::new();
let (mut fields, mut rows) = (0, 0);
loop {
    let (res, nin) = tok.read_field(data, &mut field).unwrap();
    data = &data[nin..];
    match res {
        ReadFieldResult::InputEmpty => {}
        ReadFieldResult::Field { record_end } => {
            fields += 1;
            if record_end {
                rows += 1;
            }
            field.clear();
        }
        ReadFieldResult::End => break,
    }
}
assert_eq!((fields, rows), (4, 2));
```
*/

#![deny(missing_docs)]

pub use crate::dialect::{
    CommentStrategy, Dialect, DialectError, LineDelimiter, QuoteStrategy,
};
pub use crate::reader::{
    MalformedError, MalformedKind, ReadFieldResult, Tokenizer,
};
pub use crate::writer::{is_plain_number, Escape, Quoter};

mod dialect;
mod reader;
mod writer;
