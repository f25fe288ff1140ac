use core::fmt;

use memchr::{memchr2, memchr3};

use crate::dialect::{CommentStrategy, Dialect};

/// The result of parsing at most one field from delimited text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadFieldResult {
    /// The caller provided input was exhausted before the end of a field or
    /// row was found.
    InputEmpty,
    /// The end of a field was found.
    ///
    /// Note that when `record_end` is true, then the end of this field also
    /// corresponds to the end of a row. The metadata of that row (start
    /// line, comment flag, whether it was an empty line) is available from
    /// the tokenizer until the next call to `read_field`.
    Field {
        /// Whether this was the last field in a row or not.
        record_end: bool,
    },
    /// All data has been read.
    ///
    /// This state can only be returned when an empty input buffer is provided
    /// by the caller, or after a malformed-data failure.
    End,
}

/// Input that violates the grammar of delimited text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MalformedError {
    line: u64,
    kind: MalformedKind,
}

/// The specific way in which input was malformed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MalformedKind {
    /// A character other than a quote, the field separator or a line
    /// terminator directly followed a closing quote.
    UnexpectedCharacter(char),
    /// The input ended inside a quoted field.
    UnterminatedQuotedField,
}

impl MalformedError {
    /// The line on which the problem was detected.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// What went wrong.
    pub fn kind(&self) -> &MalformedKind {
        &self.kind
    }
}

impl fmt::Display for MalformedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            MalformedKind::UnexpectedCharacter(c) => write!(
                f,
                "line {}: unexpected character {:?} after closing quote",
                self.line, c
            ),
            MalformedKind::UnterminatedQuotedField => write!(
                f,
                "line {}: unterminated quoted field at end of input",
                self.line
            ),
        }
    }
}

impl std::error::Error for MalformedError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    RowStart,
    FieldStart,
    UnquotedField,
    QuotedField,
    AfterClosingQuote,
    CommentLine,
    /// A row just ended with `\r`; a directly following `\n` belongs to it.
    Crlf,
    End,
}

/// A push based tokenizer for delimited text.
///
/// The tokenizer is a state machine fed with `&str` chunks of arbitrary
/// size. Chunk boundaries may fall anywhere, including between the `\r` and
/// `\n` of a CRLF pair or inside a quoted field; all state needed to resume
/// is kept in the tokenizer. Callers signal the end of input by passing an
/// empty chunk and keep doing so until `ReadFieldResult::End` is returned.
///
/// Line terminators are `\n`, `\r` and `\r\n`, recognized interchangeably.
/// Each counts as one line. Line terminators inside quoted fields are copied
/// to the output verbatim and advance the line counter as well.
///
/// Unlike a lenient parser, this tokenizer rejects some input: a stray
/// character after a closing quote, and a quoted field that never ends.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    dialect: Dialect,
    comments: CommentStrategy,
    state: State,
    /// The running line counter.
    line: u64,
    /// The line on which the current (or last finished) row started.
    row_line: u64,
    comment: bool,
    empty_line: bool,
    /// Whether the last character copied in a quoted field was `\r`.
    quoted_cr: bool,
    /// Set when all of separator, quote and comment character are ASCII, so
    /// runs can be scanned bytewise.
    ascii: bool,
}

impl Tokenizer {
    /// Create a new tokenizer for the given dialect.
    ///
    /// The dialect should have been checked with `Dialect::validate`.
    pub fn new(dialect: Dialect, comments: CommentStrategy) -> Tokenizer {
        debug_assert!(dialect.validate().is_ok());
        Tokenizer {
            dialect,
            comments,
            state: State::RowStart,
            line: 1,
            row_line: 1,
            comment: false,
            empty_line: false,
            quoted_cr: false,
            ascii: dialect.field_separator.is_ascii()
                && dialect.quote_character.is_ascii()
                && dialect.comment_character.is_ascii(),
        }
    }

    /// The dialect this tokenizer was built with.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Return the current line number.
    ///
    /// Line numbers start at `1`.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The line on which the current or most recently finished row started.
    pub fn row_line(&self) -> u64 {
        self.row_line
    }

    /// Whether the current or most recently finished row is a comment row.
    pub fn is_comment(&self) -> bool {
        self.comment
    }

    /// Whether the most recently finished row was a zero-length line.
    pub fn is_empty_line(&self) -> bool {
        self.empty_line
    }

    /// Parse delimited text in `input` and append field data to `output`.
    ///
    /// Calling this routine parses at most a single field. On success it
    /// returns a `ReadFieldResult` telling the caller what to do next, and
    /// the number of bytes consumed from `input`. The field data appended to
    /// `output` has its quotes removed and doubled quotes unescaped.
    ///
    /// # Errors
    ///
    /// A `MalformedError` is returned for a character after a closing quote
    /// that is neither a quote, the separator nor a line terminator, and for
    /// a quoted field still open at the end of input. After an error the
    /// tokenizer only ever returns `ReadFieldResult::End`.
    pub fn read_field(
        &mut self,
        input: &str,
        output: &mut String,
    ) -> Result<(ReadFieldResult, usize), MalformedError> {
        if input.is_empty() {
            return self.read_field_final().map(|res| (res, 0));
        }
        let quote = self.dialect.quote_character;
        let sep = self.dialect.field_separator;
        let mut nin = 0;
        while nin < input.len() {
            let rest = &input[nin..];
            match self.state {
                State::End => return Ok((ReadFieldResult::End, nin)),
                State::Crlf => {
                    self.state = State::RowStart;
                    if rest.as_bytes()[0] == b'\n' {
                        nin += 1;
                    }
                }
                State::RowStart => {
                    let c = first_char(rest);
                    self.row_line = self.line;
                    self.comment = false;
                    self.empty_line = false;
                    if self.comments.is_enabled()
                        && c == self.dialect.comment_character
                    {
                        nin += c.len_utf8();
                        self.comment = true;
                        self.state = State::CommentLine;
                    } else if is_terminator(c) {
                        nin += 1;
                        self.empty_line = true;
                        return Ok((self.end_row(c), nin));
                    } else {
                        self.state = State::FieldStart;
                    }
                }
                State::FieldStart => {
                    let c = first_char(rest);
                    if c == quote {
                        nin += c.len_utf8();
                        self.quoted_cr = false;
                        self.state = State::QuotedField;
                    } else if c == sep {
                        nin += c.len_utf8();
                        return Ok((
                            ReadFieldResult::Field { record_end: false },
                            nin,
                        ));
                    } else if is_terminator(c) {
                        nin += 1;
                        return Ok((self.end_row(c), nin));
                    } else {
                        self.state = State::UnquotedField;
                    }
                }
                State::UnquotedField => match self.find_stop(rest, sep) {
                    None => {
                        output.push_str(rest);
                        nin = input.len();
                    }
                    Some(i) => {
                        output.push_str(&rest[..i]);
                        let c = first_char(&rest[i..]);
                        nin += i + c.len_utf8();
                        if c == sep {
                            self.state = State::FieldStart;
                            return Ok((
                                ReadFieldResult::Field { record_end: false },
                                nin,
                            ));
                        }
                        return Ok((self.end_row(c), nin));
                    }
                },
                State::QuotedField => match self.find_stop(rest, quote) {
                    None => {
                        output.push_str(rest);
                        self.quoted_cr = false;
                        nin = input.len();
                    }
                    Some(i) => {
                        output.push_str(&rest[..i]);
                        if i > 0 {
                            self.quoted_cr = false;
                        }
                        let c = first_char(&rest[i..]);
                        nin += i + c.len_utf8();
                        if c == quote {
                            self.quoted_cr = false;
                            self.state = State::AfterClosingQuote;
                        } else if c == '\r' {
                            output.push('\r');
                            self.line += 1;
                            self.quoted_cr = true;
                        } else {
                            output.push('\n');
                            if !self.quoted_cr {
                                self.line += 1;
                            }
                            self.quoted_cr = false;
                        }
                    }
                },
                State::AfterClosingQuote => {
                    let c = first_char(rest);
                    if c == quote {
                        nin += c.len_utf8();
                        output.push(quote);
                        self.state = State::QuotedField;
                    } else if c == sep {
                        nin += c.len_utf8();
                        self.state = State::FieldStart;
                        return Ok((
                            ReadFieldResult::Field { record_end: false },
                            nin,
                        ));
                    } else if is_terminator(c) {
                        nin += 1;
                        return Ok((self.end_row(c), nin));
                    } else {
                        self.state = State::End;
                        return Err(MalformedError {
                            line: self.line,
                            kind: MalformedKind::UnexpectedCharacter(c),
                        });
                    }
                }
                State::CommentLine => {
                    let keep = self.comments == CommentStrategy::Read;
                    match memchr2(b'\r', b'\n', rest.as_bytes()) {
                        None => {
                            if keep {
                                output.push_str(rest);
                            }
                            nin = input.len();
                        }
                        Some(i) => {
                            if keep {
                                output.push_str(&rest[..i]);
                            }
                            let c = rest.as_bytes()[i] as char;
                            nin += i + 1;
                            let res = self.end_row(c);
                            if keep {
                                return Ok((res, nin));
                            }
                        }
                    }
                }
            }
        }
        Ok((ReadFieldResult::InputEmpty, nin))
    }

    /// Transition on end of input.
    fn read_field_final(&mut self) -> Result<ReadFieldResult, MalformedError> {
        match self.state {
            State::End | State::RowStart | State::Crlf => {
                self.state = State::End;
                Ok(ReadFieldResult::End)
            }
            State::FieldStart
            | State::UnquotedField
            | State::AfterClosingQuote => {
                self.state = State::RowStart;
                Ok(ReadFieldResult::Field { record_end: true })
            }
            State::CommentLine => {
                if self.comments == CommentStrategy::Read {
                    self.state = State::RowStart;
                    Ok(ReadFieldResult::Field { record_end: true })
                } else {
                    self.state = State::End;
                    Ok(ReadFieldResult::End)
                }
            }
            State::QuotedField => {
                self.state = State::End;
                Err(MalformedError {
                    line: self.row_line,
                    kind: MalformedKind::UnterminatedQuotedField,
                })
            }
        }
    }

    /// Finish the current row on the line terminator `c`, which has already
    /// been consumed.
    #[inline(always)]
    fn end_row(&mut self, c: char) -> ReadFieldResult {
        self.line += 1;
        self.state = if c == '\r' { State::Crlf } else { State::RowStart };
        ReadFieldResult::Field { record_end: true }
    }

    /// Find the first occurrence of `stop`, `\r` or `\n` in `hay`.
    #[inline(always)]
    fn find_stop(&self, hay: &str, stop: char) -> Option<usize> {
        if self.ascii {
            memchr3(stop as u8, b'\r', b'\n', hay.as_bytes())
        } else {
            hay.find(|c| c == stop || c == '\r' || c == '\n')
        }
    }
}

#[inline(always)]
fn is_terminator(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// The first character of a non-empty string.
#[inline(always)]
fn first_char(s: &str) -> char {
    s.chars().next().unwrap_or('\0')
}
