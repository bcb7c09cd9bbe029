use serde::Serialize;
use thiserror::Error;

/// Closed set of reasons a query string can be rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseErrorKind {
    #[error("query must contain at least 3 characters")]
    MinLength,
    #[error("search term expected")]
    TermExpected,
    #[error("'&&', '||' or end of query expected")]
    LinkExpected,
    #[error("closing bracket without matching opening bracket")]
    UnexpectedClosingBracket,
    #[error("end of quoted text not found")]
    EndOfTextNotFound,
    #[error("element type expected after '#'")]
    ModelTypeExpected,
    #[error("unknown element type abbreviation")]
    InvalidAbbreviation,
    #[error("element name expected after ':'")]
    ElementNameExpected,
    #[error("invalid comparison operator")]
    InvalidOperator,
    #[error("value is neither text, boolean, number nor date")]
    InvalidDateExpression,
    #[error("range bounds must be two values of the same type")]
    InvalidRangeExpression,
}

impl ParseErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::MinLength => "MIN_LENGTH",
            ParseErrorKind::TermExpected => "TERM_EXPECTED",
            ParseErrorKind::LinkExpected => "LINK_EXPECTED",
            ParseErrorKind::UnexpectedClosingBracket => "UNEXPECTED_CLOSING_BRACKET",
            ParseErrorKind::EndOfTextNotFound => "END_OF_TEXT_NOT_FOUND",
            ParseErrorKind::ModelTypeExpected => "MODEL_TYPE_EXPECTED",
            ParseErrorKind::InvalidAbbreviation => "INVALID_ABBREVIATION",
            ParseErrorKind::ElementNameExpected => "ELEMENT_NAME_EXPECTED",
            ParseErrorKind::InvalidOperator => "INVALID_OPERATOR",
            ParseErrorKind::InvalidDateExpression => "INVALID_DATE_EXPRESSION",
            ParseErrorKind::InvalidRangeExpression => "INVALID_RANGE_EXPRESSION",
        }
    }
}

/// A rejected query. `position` is a character (not byte) offset into the
/// input; `character` is the character found there, if any.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} at position {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
    pub character: Option<char>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: usize, character: Option<char>) -> Self {
        Self {
            kind,
            position,
            character,
        }
    }
}

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("document not found")]
    NotFound,
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("invalid query: {0}")]
    Query(#[from] ParseError),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
