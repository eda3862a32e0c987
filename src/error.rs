//! Error types surfaced by the ABNF parser and FSM export machinery.

use std::ops::Range;
use thiserror::Error;

/// The input did not conform to the grammar of ABNF, or trailing input remained after a top-level
/// `parse` call. Carries the byte-offset range where parsing gave up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to parse ABNF at bytes {range:?}: {message}")]
pub struct ParseError {
    pub range: Range<usize>,
    pub message: String,
}

impl ParseError {
    pub fn new(range: Range<usize>, message: impl Into<String>) -> Self {
        ParseError { range, message: message.into() }
    }
}

/// A prose-val appeared where an FSM was required, or a rulename was referenced without a
/// binding in the supplied dictionary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("rulename `{0}` is not bound in the supplied dictionary")]
    UnboundRule(String),
    #[error("prose-val `<{0}>` cannot be compiled to a finite-state machine")]
    ProseVal(String),
}

/// A numeric value range with `hi < lo`. Rejected at parse time, never constructed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid numeric range: high value {hi:#x} is less than low value {lo:#x}")]
pub struct NumValError {
    pub lo: u32,
    pub hi: u32,
}
