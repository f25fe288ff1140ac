use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The characters that give delimited text its structure.
///
/// A dialect is shared by the tokenizer and the quoting engine. The three
/// characters must be pairwise distinct and none of them may be a line
/// terminator (`\r` or `\n`). Use `validate` to check this before handing a
/// dialect to anything that reads or writes data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dialect {
    /// The character separating fields. Default: `,`.
    pub field_separator: char,
    /// The character enclosing quoted fields. Default: `"`.
    pub quote_character: char,
    /// The character introducing a comment row. Default: `#`.
    pub comment_character: char,
}

impl Default for Dialect {
    fn default() -> Dialect {
        Dialect {
            field_separator: ',',
            quote_character: '"',
            comment_character: '#',
        }
    }
}

impl Dialect {
    /// Check that this dialect can be tokenized unambiguously.
    pub fn validate(&self) -> Result<(), DialectError> {
        let named = [
            ("field separator", self.field_separator),
            ("quote character", self.quote_character),
            ("comment character", self.comment_character),
        ];
        for &(name, c) in &named {
            if c == '\r' || c == '\n' {
                return Err(DialectError::LineTerminator { name, ch: c });
            }
        }
        if self.field_separator == self.quote_character
            || self.field_separator == self.comment_character
            || self.quote_character == self.comment_character
        {
            return Err(DialectError::NotDistinct {
                field_separator: self.field_separator,
                quote_character: self.quote_character,
                comment_character: self.comment_character,
            });
        }
        Ok(())
    }
}

/// An error describing why a dialect or a line delimiter is unusable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DialectError {
    /// Two or more of the control characters coincide.
    NotDistinct {
        /// The configured field separator.
        field_separator: char,
        /// The configured quote character.
        quote_character: char,
        /// The configured comment character.
        comment_character: char,
    },
    /// A control character is `\r` or `\n`.
    LineTerminator {
        /// Which control character is at fault.
        name: &'static str,
        /// The offending character.
        ch: char,
    },
    /// A line delimiter token that is not one of LF, CR, CRLF or PLATFORM.
    UnknownLineDelimiter(String),
}

impl fmt::Display for DialectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DialectError::NotDistinct {
                field_separator,
                quote_character,
                comment_character,
            } => write!(
                f,
                "control characters must differ (field separator={:?}, \
                 quote character={:?}, comment character={:?})",
                field_separator, quote_character, comment_character
            ),
            DialectError::LineTerminator { name, ch } => {
                write!(f, "{} must not be a newline character: {:?}", name, ch)
            }
            DialectError::UnknownLineDelimiter(ref token) => {
                write!(f, "unknown line delimiter: {:?}", token)
            }
        }
    }
}

impl std::error::Error for DialectError {}

/// How rows starting with the comment character are treated when reading.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CommentStrategy {
    /// Comments are not recognized. A leading comment character is data.
    None,
    /// Comment rows are surfaced with their text and the comment flag set.
    Read,
    /// Comment rows are silently discarded.
    Skip,
}

impl CommentStrategy {
    /// Whether comment rows are recognized at all.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        *self != CommentStrategy::None
    }
}

impl Default for CommentStrategy {
    fn default() -> CommentStrategy {
        CommentStrategy::None
    }
}

/// The policy deciding which fields get wrapped in quote characters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QuoteStrategy {
    /// Quote only fields that would otherwise be misread: those containing
    /// the separator, the quote character, `\r` or `\n`, and a first field
    /// starting with the comment character.
    ///
    /// This is the default.
    Required,
    /// Like `Required`, but empty fields are quoted too.
    Empty,
    /// Quote every field.
    Always,
    /// Like `Required`, but every field that is not a plain number is quoted
    /// too.
    NonNumeric,
}

impl Default for QuoteStrategy {
    fn default() -> QuoteStrategy {
        QuoteStrategy::Required
    }
}

/// The text written after the last field of every row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LineDelimiter {
    /// `\n`
    Lf,
    /// `\r`
    Cr,
    /// `\r\n`
    ///
    /// This is the default.
    Crlf,
    /// The line separator of the host platform.
    Platform,
}

impl LineDelimiter {
    /// Resolve this delimiter to a concrete one.
    ///
    /// Only `Platform` changes: it becomes `Crlf` on Windows and `Lf`
    /// everywhere else.
    pub fn resolve(self) -> LineDelimiter {
        match self {
            LineDelimiter::Platform => {
                if cfg!(windows) {
                    LineDelimiter::Crlf
                } else {
                    LineDelimiter::Lf
                }
            }
            other => other,
        }
    }

    /// The literal text of this delimiter.
    pub fn as_str(self) -> &'static str {
        match self.resolve() {
            LineDelimiter::Lf => "\n",
            LineDelimiter::Cr => "\r",
            LineDelimiter::Crlf | LineDelimiter::Platform => "\r\n",
        }
    }
}

impl Default for LineDelimiter {
    fn default() -> LineDelimiter {
        LineDelimiter::Crlf
    }
}

impl FromStr for LineDelimiter {
    type Err = DialectError;

    /// Parse either the literal delimiter text or its name.
    fn from_str(s: &str) -> Result<LineDelimiter, DialectError> {
        match s {
            "\n" | "LF" | "lf" => Ok(LineDelimiter::Lf),
            "\r" | "CR" | "cr" => Ok(LineDelimiter::Cr),
            "\r\n" | "CRLF" | "crlf" => Ok(LineDelimiter::Crlf),
            "PLATFORM" | "platform" => Ok(LineDelimiter::Platform),
            _ => Err(DialectError::UnknownLineDelimiter(s.to_string())),
        }
    }
}
