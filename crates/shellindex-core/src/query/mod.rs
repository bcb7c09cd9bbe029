//! Search query language: free text and `#kind[:name][op value]` predicates
//! joined with `&&` / `||` and grouped with parentheses.

pub mod ast;
pub mod eval;
pub mod literal;
pub mod locale;
pub mod parser;

pub use ast::*;
pub use eval::{ElementMatcher, ValueMatcher};
pub use literal::parse_value;
pub use locale::Locale;

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};

/// Parses `text` using the number and date conventions of the locale tag
/// (`"en"`, `"de-DE"`, ...).
pub fn parse(text: &str, locale: &str) -> Result<Expression, ParseError> {
    parser::parse(text, &Locale::from_tag(locale))
}

/// Search parameters as accepted from callers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchRequest {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    // restricts the page to one endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl SearchRequest {
    /// Parses `q` if it holds anything besides whitespace.
    pub fn expression(&self, default_locale: &str) -> Result<Option<Expression>, ParseError> {
        match self.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let locale = self.locale.as_deref().unwrap_or(default_locale);
                parse(q, locale).map(Some)
            }
            _ => Ok(None),
        }
    }
}
