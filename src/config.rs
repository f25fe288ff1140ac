use fastcsv_core::{CommentStrategy, Dialect, LineDelimiter, QuoteStrategy};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The default capacity, in bytes, of reader and writer buffers.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Options for reading delimited text.
///
/// A configuration is checked once, when a reader is built from it, and
/// never changes afterwards.
///
/// # Example
///
/// ```
/// use fastcsv::{CommentStrategy, ReaderConfig};
///
/// let config = ReaderConfig {
///     field_separator: ';',
///     comment_strategy: CommentStrategy::Skip,
///     ..ReaderConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderConfig {
    /// The character separating fields. Default: `,`.
    pub field_separator: char,
    /// The character enclosing quoted fields. Default: `"`.
    pub quote_character: char,
    /// The character introducing comment rows. Default: `#`.
    pub comment_character: char,
    /// What to do with comment rows. Default: not recognized.
    pub comment_strategy: CommentStrategy,
    /// Drop zero-length lines instead of returning them as a row with one
    /// empty field. Default: `true`.
    pub skip_empty_rows: bool,
    /// Fail when a row has a different number of fields than the first row.
    /// Default: `false`.
    pub error_on_different_field_count: bool,
    /// The size of the input buffer in bytes. `0` reads the input in the
    /// smallest possible steps. Default: 8 KiB.
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> ReaderConfig {
        let dialect = Dialect::default();
        ReaderConfig {
            field_separator: dialect.field_separator,
            quote_character: dialect.quote_character,
            comment_character: dialect.comment_character,
            comment_strategy: CommentStrategy::None,
            skip_empty_rows: true,
            error_on_different_field_count: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ReaderConfig {
    /// The control characters of this configuration.
    pub fn dialect(&self) -> Dialect {
        Dialect {
            field_separator: self.field_separator,
            quote_character: self.quote_character,
            comment_character: self.comment_character,
        }
    }

    /// Check that this configuration can be used for reading.
    pub fn validate(&self) -> Result<()> {
        self.dialect().validate()?;
        Ok(())
    }
}

/// Options for writing delimited text.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriterConfig {
    /// The character separating fields. Default: `,`.
    pub field_separator: char,
    /// The character enclosing quoted fields. Default: `"`.
    pub quote_character: char,
    /// The character written before comments, and quoted when it starts
    /// the first field of a row. Default: `#`.
    pub comment_character: char,
    /// Which fields get quoted. Default: only where required.
    pub quote_strategy: QuoteStrategy,
    /// The text ending every row. Default: `\r\n`.
    pub line_delimiter: LineDelimiter,
    /// The size of the output buffer in bytes. `0` disables buffering.
    /// Default: 8 KiB.
    pub buffer_size: usize,
}

impl Default for WriterConfig {
    fn default() -> WriterConfig {
        let dialect = Dialect::default();
        WriterConfig {
            field_separator: dialect.field_separator,
            quote_character: dialect.quote_character,
            comment_character: dialect.comment_character,
            quote_strategy: QuoteStrategy::Required,
            line_delimiter: LineDelimiter::Crlf,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl WriterConfig {
    /// The control characters of this configuration.
    pub fn dialect(&self) -> Dialect {
        Dialect {
            field_separator: self.field_separator,
            quote_character: self.quote_character,
            comment_character: self.comment_character,
        }
    }

    /// Check that this configuration can be used for writing.
    pub fn validate(&self) -> Result<()> {
        self.dialect().validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fastcsv_core::{CommentStrategy, LineDelimiter, QuoteStrategy};

    use super::{ReaderConfig, WriterConfig};

    #[test]
    fn reader_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.field_separator, ',');
        assert_eq!(config.quote_character, '"');
        assert_eq!(config.comment_character, '#');
        assert_eq!(config.comment_strategy, CommentStrategy::None);
        assert!(config.skip_empty_rows);
        assert!(!config.error_on_different_field_count);
        assert_eq!(config.buffer_size, 8192);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn writer_defaults() {
        let config = WriterConfig::default();
        assert_eq!(config.quote_strategy, QuoteStrategy::Required);
        assert_eq!(config.line_delimiter, LineDelimiter::Crlf);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn separator_equal_to_comment() {
        let config =
            ReaderConfig { field_separator: '#', ..ReaderConfig::default() };
        assert!(config.validate().is_err());

        let config =
            WriterConfig { quote_character: '#', ..WriterConfig::default() };
        assert!(config.validate().is_err());
    }
}
