use std::ops;
use std::slice;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single row of delimited text.
///
/// A row is an owned, immutable snapshot: its fields are in the order they
/// appeared in the input, and it remembers the line on which it started.
/// Rows never share storage with the reader that produced them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Row {
    line: u64,
    fields: Vec<String>,
    comment: bool,
}

impl Row {
    /// Create a row from its parts.
    pub fn new(line: u64, fields: Vec<String>, comment: bool) -> Row {
        Row { line, fields, comment }
    }

    /// The 1-based line on which this row started.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The number of fields in this row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Return the field at index `i`, if it exists.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.fields.get(i).map(|f| &**f)
    }

    /// Returns an iterator over all fields in this row.
    pub fn iter(&self) -> RowIter<'_> {
        RowIter(self.fields.iter())
    }

    /// Whether this row is a comment. A comment row has a single field
    /// holding the text after the comment character.
    pub fn is_comment(&self) -> bool {
        self.comment
    }

    /// All fields of this row.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Unwrap the fields of this row.
    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

impl ops::Index<usize> for Row {
    type Output = str;

    #[inline]
    fn index(&self, i: usize) -> &str {
        &self.fields[i]
    }
}

impl<'a> IntoIterator for &'a Row {
    type IntoIter = RowIter<'a>;
    type Item = &'a str;

    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields of a row.
#[derive(Clone, Debug)]
pub struct RowIter<'a>(slice::Iter<'a, String>);

impl<'a> Iterator for RowIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.0.next().map(|f| &**f)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a> DoubleEndedIterator for RowIter<'a> {
    fn next_back(&mut self) -> Option<&'a str> {
        self.0.next_back().map(|f| &**f)
    }
}

impl<'a> ExactSizeIterator for RowIter<'a> {}

/// The accumulator for the row being parsed.
///
/// The builder is reused for every row of a reader. Finished fields are
/// copied out of the field buffer and finished rows take the field list
/// with them, so the buffers keep their capacity but never leak into a
/// returned `Row`.
#[derive(Debug, Default)]
pub(crate) struct RowBuilder {
    field: String,
    fields: Vec<String>,
}

impl RowBuilder {
    pub fn new() -> RowBuilder {
        RowBuilder::default()
    }

    /// The buffer of the field in progress.
    pub fn field_mut(&mut self) -> &mut String {
        &mut self.field
    }

    /// Finish the field in progress.
    pub fn end_field(&mut self) {
        self.fields.push(self.field.as_str().to_owned());
        self.field.clear();
    }

    /// Finish the current row and start a new one.
    pub fn end_row(&mut self, line: u64, comment: bool) -> Row {
        let fields = self.fields.drain(..).collect();
        self.field.clear();
        Row { line, fields, comment }
    }

    /// Throw away the row in progress.
    pub fn reset(&mut self) {
        self.field.clear();
        self.fields.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Row, RowBuilder};

    #[test]
    fn builder_rows_are_independent() {
        let mut b = RowBuilder::new();
        b.field_mut().push_str("foo");
        b.end_field();
        b.field_mut().push_str("bar");
        b.end_field();
        let first = b.end_row(1, false);

        b.field_mut().push_str("baz");
        b.end_field();
        let second = b.end_row(2, false);

        assert_eq!(first.fields(), &["foo", "bar"]);
        assert_eq!(first.line(), 1);
        assert_eq!(second.fields(), &["baz"]);
        assert_eq!(second.line(), 2);
    }

    #[test]
    fn reset_discards_partial_row() {
        let mut b = RowBuilder::new();
        b.field_mut().push_str("x");
        b.end_field();
        b.field_mut().push_str("half");
        b.reset();
        b.field_mut().push_str("y");
        b.end_field();
        assert_eq!(b.end_row(3, true), Row::new(3, vec!["y".into()], true));
    }

    #[test]
    fn accessors() {
        let row = Row::new(4, vec!["a".into(), "".into(), "c".into()], false);
        assert_eq!(row.len(), 3);
        assert!(!row.is_empty());
        assert_eq!(row.get(1), Some(""));
        assert_eq!(row.get(3), None);
        assert_eq!(&row[2], "c");
        assert_eq!(row.iter().rev().collect::<Vec<_>>(), vec!["c", "", "a"]);
        let joined: Vec<&str> = (&row).into_iter().collect();
        assert_eq!(joined, vec!["a", "", "c"]);
        assert!(!row.is_comment());
        assert_eq!(row.into_fields(), vec!["a", "", "c"]);
    }
}
