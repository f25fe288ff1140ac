use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

use fastcsv_core::{DialectError, MalformedError};

/// A type alias for `Result<T, fastcsv::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading or writing delimited text.
///
/// Besides its primary cause, an error may carry a secondary error that
/// happened while closing the underlying resource after the primary failure.
/// See `close_error`.
#[derive(Debug)]
pub struct Error(Box<Inner>);

#[derive(Debug)]
struct Inner {
    kind: ErrorKind,
    close: Option<Error>,
}

/// The specific type of an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// An I/O error from the underlying source or sink.
    Io(io::Error),
    /// The input bytes are not valid UTF-8.
    Utf8 {
        /// The line on which the invalid bytes were found.
        line: u64,
        /// The offset of the first invalid byte in the input.
        byte: u64,
    },
    /// The input violates the grammar of delimited text.
    Malformed(MalformedError),
    /// Two rows have a different number of fields. This only happens when
    /// `error_on_different_field_count` is enabled.
    UnequalLengths {
        /// The line on which the offending row started.
        line: u64,
        /// The number of fields in the first row.
        expected_len: usize,
        /// The number of fields in the offending row.
        len: usize,
    },
    /// The configuration is unusable. Raised before any I/O happens.
    Config(DialectError),
    /// Rows were requested from a reader that was already closed.
    Closed,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(Inner { kind, close: None }))
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        self.0.kind
    }

    /// Returns true if this error was caused by malformed input, including
    /// rows of unequal length.
    pub fn is_malformed(&self) -> bool {
        match self.0.kind {
            ErrorKind::Malformed(_) | ErrorKind::UnequalLengths { .. } => true,
            _ => false,
        }
    }

    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match self.0.kind {
            ErrorKind::Io(_) => true,
            _ => false,
        }
    }

    /// The line number associated with this error, if any.
    pub fn line(&self) -> Option<u64> {
        match self.0.kind {
            ErrorKind::Utf8 { line, .. } => Some(line),
            ErrorKind::Malformed(ref err) => Some(err.line()),
            ErrorKind::UnequalLengths { line, .. } => Some(line),
            _ => None,
        }
    }

    /// The error raised while closing the resource after this error, if
    /// closing failed too.
    pub fn close_error(&self) -> Option<&Error> {
        self.0.close.as_ref()
    }

    /// Attach a failure to close the resource to this error.
    ///
    /// This error stays the primary one.
    pub fn with_close_error(mut self, err: Error) -> Error {
        self.0.close = Some(err);
        self
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl From<MalformedError> for Error {
    fn from(err: MalformedError) -> Error {
        Error::new(ErrorKind::Malformed(err))
    }
}

impl From<DialectError> for Error {
    fn from(err: DialectError) -> Error {
        Error::new(ErrorKind::Config(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.0.kind {
            ErrorKind::Io(ref err) => Some(err),
            ErrorKind::Malformed(ref err) => Some(err),
            ErrorKind::Config(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.kind {
            ErrorKind::Io(ref err) => write!(f, "{}", err)?,
            ErrorKind::Utf8 { line, byte } => write!(
                f,
                "CSV parse error: line {} (byte {}): invalid UTF-8",
                line, byte
            )?,
            ErrorKind::Malformed(ref err) => {
                write!(f, "CSV parse error: {}", err)?
            }
            ErrorKind::UnequalLengths { line, expected_len, len } => write!(
                f,
                "CSV parse error: line {}: found row with {} fields, \
                 but the first row has {} fields",
                line, len, expected_len
            )?,
            ErrorKind::Config(ref err) => {
                write!(f, "CSV config error: {}", err)?
            }
            ErrorKind::Closed => write!(f, "CSV error: reader is closed")?,
        }
        if let Some(ref close) = self.0.close {
            write!(f, " (closing also failed: {})", close)?;
        }
        Ok(())
    }
}

/// `IntoInnerError` occurs when consuming a `Writer` fails.
///
/// Consuming the `Writer` causes a flush to happen. If the flush fails, then
/// this error is returned, which contains both the original `Writer` and
/// the error that occurred.
///
/// The type parameter `W` is the unconsumed writer.
pub struct IntoInnerError<W> {
    wtr: W,
    err: io::Error,
}

impl<W> IntoInnerError<W> {
    pub(crate) fn new(wtr: W, err: io::Error) -> IntoInnerError<W> {
        IntoInnerError { wtr, err }
    }

    pub(crate) fn into_parts(self) -> (W, io::Error) {
        (self.wtr, self.err)
    }

    /// Returns the error which caused the call to `into_inner` to fail.
    pub fn error(&self) -> &io::Error {
        &self.err
    }

    /// Returns the underlying writer which generated the error.
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: std::any::Any> StdError for IntoInnerError<W> {}

impl<W> fmt::Display for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl<W> fmt::Debug for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.err)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use fastcsv_core::DialectError;

    use super::{Error, ErrorKind};

    #[test]
    fn close_error_keeps_primary() {
        let primary = Error::new(ErrorKind::UnequalLengths {
            line: 2,
            expected_len: 2,
            len: 3,
        });
        let close = Error::from(io::Error::new(io::ErrorKind::Other, "boom"));
        let err = primary.with_close_error(close);

        assert!(err.is_malformed());
        assert_eq!(err.line(), Some(2));
        assert!(err.close_error().map_or(false, |e| e.is_io_error()));
        let msg = err.to_string();
        assert!(msg.starts_with("CSV parse error: line 2"), "{}", msg);
        assert!(msg.ends_with("(closing also failed: boom)"), "{}", msg);
    }

    #[test]
    fn config_error_is_not_malformed() {
        let err = Error::from(DialectError::UnknownLineDelimiter("x".into()));
        assert!(!err.is_malformed());
        assert_eq!(err.line(), None);
        match *err.kind() {
            ErrorKind::Config(_) => {}
            ref kind => panic!("expected config error, got {:?}", kind),
        }
    }
}
