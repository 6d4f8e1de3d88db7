//! Error types.

use std::ops::Range;
use thiserror::Error;

/// A stylesheet could not be parsed.
///
/// Declared-selector extraction is the only operation in this crate that
/// fails: callers need to tell "no selectors" apart from "cannot parse".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct StylesheetError {
    pub kind: StylesheetErrorKind,
    /// 1-based line.
    pub line: u32,
    /// 1-based column, in bytes.
    pub column: u32,
    /// Byte offset into the stylesheet text.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StylesheetErrorKind {
    #[error("unclosed block")]
    UnclosedBlock,

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("unterminated string")]
    UnterminatedString,

    #[error("malformed url()")]
    BadUrl,

    /// A `}`, `)` or `]` with nothing to close.
    #[error("unexpected '{0}'")]
    UnexpectedClose(char),

    /// A selector list that is never followed by a `{ ... }` block.
    #[error("selector `{0}` has no block")]
    MissingBlock(String),
}

/// An edit set could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edits {first:?} and {second:?} overlap")]
    Overlap { first: Range<usize>, second: Range<usize> },

    #[error("edit {range:?} is outside a text of {len} bytes")]
    OutOfBounds { range: Range<usize>, len: usize },
}
