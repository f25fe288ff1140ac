use memchr::{memchr, memchr2};

use crate::dialect::{Dialect, QuoteStrategy};

/// Decides whether a field must be quoted, and escapes it if so.
///
/// A quoted field is written as the quote character, the field with every
/// quote character doubled, and the quote character again. Nothing else
/// about the field changes.
///
/// This type does no I/O. It hands out slices of the field (see `escape`)
/// so callers can write them wherever they like without an intermediate
/// allocation.
#[derive(Clone, Debug)]
pub struct Quoter {
    dialect: Dialect,
    strategy: QuoteStrategy,
    ascii: bool,
}

impl Quoter {
    /// Create a quoting engine for the given dialect and strategy.
    pub fn new(dialect: Dialect, strategy: QuoteStrategy) -> Quoter {
        Quoter {
            dialect,
            strategy,
            ascii: dialect.field_separator.is_ascii()
                && dialect.quote_character.is_ascii(),
        }
    }

    /// The dialect used by this engine.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// The quoting strategy used by this engine.
    pub fn strategy(&self) -> QuoteStrategy {
        self.strategy
    }

    /// Returns true if `field` must be enclosed in quotes.
    ///
    /// `first_field` is true when `field` is the first field of its row.
    pub fn should_quote(&self, field: &str, first_field: bool) -> bool {
        match self.strategy {
            QuoteStrategy::Always => true,
            QuoteStrategy::Required => self.is_required(field, first_field),
            QuoteStrategy::Empty => {
                field.is_empty() || self.is_required(field, first_field)
            }
            QuoteStrategy::NonNumeric => {
                !is_plain_number(field) || self.is_required(field, first_field)
            }
        }
    }

    /// Quoting that is necessary for the field to be read back unchanged.
    fn is_required(&self, field: &str, first_field: bool) -> bool {
        if first_field && field.starts_with(self.dialect.comment_character) {
            return true;
        }
        let (sep, quote) =
            (self.dialect.field_separator, self.dialect.quote_character);
        if self.ascii {
            let bytes = field.as_bytes();
            memchr2(b'\r', b'\n', bytes).is_some()
                || memchr2(sep as u8, quote as u8, bytes).is_some()
        } else {
            field.contains(|c| c == sep || c == quote || c == '\r' || c == '\n')
        }
    }

    /// Split `field` into the pieces of its escaped form, without the
    /// enclosing quotes.
    ///
    /// Concatenating the pieces yields `field` with every quote character
    /// doubled.
    pub fn escape<'a>(&self, field: &'a str) -> Escape<'a> {
        Escape {
            rest: field,
            quote: self.dialect.quote_character,
            pending: None,
        }
    }
}

/// An iterator over the pieces of an escaped field.
///
/// Created by `Quoter::escape`. Each quote character is yielded twice: once
/// at the end of the piece that contains it and once on its own.
#[derive(Clone, Debug)]
pub struct Escape<'a> {
    rest: &'a str,
    quote: char,
    pending: Option<&'a str>,
}

impl<'a> Iterator for Escape<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if let Some(quote) = self.pending.take() {
            return Some(quote);
        }
        if self.rest.is_empty() {
            return None;
        }
        let found = if self.quote.is_ascii() {
            memchr(self.quote as u8, self.rest.as_bytes())
        } else {
            self.rest.find(self.quote)
        };
        match found {
            None => {
                let piece = self.rest;
                self.rest = "";
                Some(piece)
            }
            Some(i) => {
                let end = i + self.quote.len_utf8();
                let piece = &self.rest[..end];
                self.pending = Some(&self.rest[i..end]);
                self.rest = &self.rest[end..];
                Some(piece)
            }
        }
    }
}

/// Returns true if `field` is a plain decimal number.
///
/// Accepted: an optional sign followed by digits with at most one decimal
/// point and at least one digit, e.g. `42`, `-1.5`, `+.5` or `3.`.
/// Exponents, thousands separators and whitespace are not accepted.
pub fn is_plain_number(field: &str) -> bool {
    let bytes = field.as_bytes();
    let digits = match bytes.first() {
        Some(b'+') | Some(b'-') => &bytes[1..],
        _ => bytes,
    };
    let mut seen_digit = false;
    let mut seen_point = false;
    for &b in digits {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    seen_digit
}
