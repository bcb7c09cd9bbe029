//! Recursive descent parser for search queries.
//!
//! # Grammar
//!
//! ```text
//! expression := or_group ( '||' or_group )*
//! or_group   := term ( '&&' term )*
//! term       := '(' expression ')' | predicate | free_text
//! predicate  := '#' kind [ ':' name ] [ operator value ]
//! free_text  := quoted | run of characters other than ')', '&', '|'
//! ```
//!
//! Every function takes the position it starts at and returns the position
//! after what it consumed. Nesting depth is carried along so that `)` is
//! only accepted inside a group.

use super::ast::{Expression, Operator, OrGroup, Predicate, Term};
use super::literal::parse_value;
use super::locale::Locale;
use crate::errors::{ParseError, ParseErrorKind};
use crate::model::ElementKind;

const MIN_LENGTH: usize = 3;

type Parsed<T> = Result<(T, usize), ParseError>;

/// What ended an `or_group`.
enum GroupEnd {
    Or,
    Close,
    End,
}

enum Link {
    And,
    Or,
    Close,
    End,
}

pub fn parse(text: &str, locale: &Locale) -> Result<Expression, ParseError> {
    let parser = Parser {
        chars: text.chars().collect(),
        locale: *locale,
    };
    parser.run()
}

struct Parser {
    chars: Vec<char>,
    locale: Locale,
}

impl Parser {
    fn run(&self) -> Result<Expression, ParseError> {
        let first = self.skip_whitespace(0);
        let last = self
            .chars
            .iter()
            .rposition(|c| !c.is_whitespace())
            .map_or(first, |i| i + 1);
        if last.saturating_sub(first) < MIN_LENGTH {
            return Err(self.error(ParseErrorKind::MinLength, 0));
        }
        let (expression, _) = self.expression(0, 0)?;
        Ok(expression)
    }

    fn expression(&self, mut pos: usize, depth: usize) -> Parsed<Expression> {
        let mut groups = Vec::new();
        loop {
            let (group, next, end) = self.or_group(pos, depth)?;
            groups.push(group);
            pos = next;
            match end {
                GroupEnd::Or => continue,
                GroupEnd::Close => return Ok((Expression::new(groups), pos)),
                GroupEnd::End if depth > 0 => {
                    return Err(self.error(ParseErrorKind::TermExpected, pos));
                }
                GroupEnd::End => return Ok((Expression::new(groups), pos)),
            }
        }
    }

    fn or_group(&self, mut pos: usize, depth: usize) -> Result<(OrGroup, usize, GroupEnd), ParseError> {
        let mut terms = Vec::new();
        loop {
            let (term, next) = self.term(pos, depth)?;
            terms.push(term);
            let (link, next) = self.link(next, depth)?;
            pos = next;
            let end = match link {
                Link::And => continue,
                Link::Or => GroupEnd::Or,
                Link::Close => GroupEnd::Close,
                Link::End => GroupEnd::End,
            };
            return Ok((OrGroup { terms }, pos, end));
        }
    }

    fn term(&self, pos: usize, depth: usize) -> Parsed<Term> {
        let pos = self.skip_whitespace(pos);
        match self.chars.get(pos) {
            None => Err(self.error(ParseErrorKind::TermExpected, pos)),
            Some('(') => {
                let (inner, next) = self.expression(pos + 1, depth + 1)?;
                Ok((Term::Nested(inner), next))
            }
            Some('#') => self.predicate(pos + 1),
            Some(')') if depth == 0 => {
                Err(self.error(ParseErrorKind::UnexpectedClosingBracket, pos))
            }
            Some(')') | Some('&') | Some('|') => Err(self.error(ParseErrorKind::TermExpected, pos)),
            Some('"') | Some('\'') => {
                let (text, next) = self.quoted(pos)?;
                // an empty needle would match every document
                if text.is_empty() {
                    return Err(self.error(ParseErrorKind::TermExpected, pos));
                }
                Ok((Term::FreeText(text), next))
            }
            Some(_) => {
                let end = self.scan_until(pos, is_term_stop);
                let text: String = self.chars[pos..end].iter().collect();
                Ok((Term::FreeText(text.trim().to_string()), end))
            }
        }
    }

    fn link(&self, pos: usize, depth: usize) -> Parsed<Link> {
        let pos = self.skip_whitespace(pos);
        match (self.chars.get(pos), self.chars.get(pos + 1)) {
            (None, _) => Ok((Link::End, pos)),
            (Some('&'), Some('&')) => Ok((Link::And, pos + 2)),
            (Some('|'), Some('|')) => Ok((Link::Or, pos + 2)),
            (Some(')'), _) if depth > 0 => Ok((Link::Close, pos + 1)),
            (Some(')'), _) => Err(self.error(ParseErrorKind::UnexpectedClosingBracket, pos)),
            (Some(_), _) => Err(self.error(ParseErrorKind::LinkExpected, pos)),
        }
    }

    /// `pos` points just behind the `#`.
    fn predicate(&self, pos: usize) -> Parsed<Term> {
        let end = self.scan_until(pos, |c| !c.is_ascii_alphabetic());
        if end == pos {
            return Err(self.error(ParseErrorKind::ModelTypeExpected, pos));
        }
        let abbreviation: String = self.chars[pos..end].iter().collect();
        let kind = ElementKind::from_abbreviation(&abbreviation)
            .ok_or_else(|| self.error(ParseErrorKind::InvalidAbbreviation, pos))?;

        let mut pos = self.skip_whitespace(end);
        let mut name = None;
        if self.chars.get(pos) == Some(&':') {
            let (text, next) = self.element_name(pos + 1)?;
            name = Some(text);
            pos = self.skip_whitespace(next);
        }

        let mut operator = None;
        let mut value = None;
        if self.chars.get(pos).copied().is_some_and(is_operator_char) {
            let (op, next) = self.operator(pos)?;
            let (typed, next) = self.value(next)?;
            operator = Some(op);
            value = Some(typed);
            pos = next;
        }

        Ok((
            Term::Predicate(Predicate {
                kind,
                name,
                operator,
                value,
            }),
            pos,
        ))
    }

    fn element_name(&self, pos: usize) -> Parsed<String> {
        let pos = self.skip_whitespace(pos);
        let (name, next) = match self.chars.get(pos) {
            Some('"') | Some('\'') => self.quoted(pos)?,
            _ => {
                let end = self.scan_until(pos, |c| is_term_stop(c) || is_operator_char(c));
                let text: String = self.chars[pos..end].iter().collect();
                (text.trim().to_string(), end)
            }
        };
        if name.trim().is_empty() {
            return Err(self.error(ParseErrorKind::ElementNameExpected, pos));
        }
        Ok((name, next))
    }

    fn operator(&self, pos: usize) -> Parsed<Operator> {
        let rest = &self.chars[pos..];
        for op in Operator::SCAN_ORDER {
            let symbol: Vec<char> = op.as_str().chars().collect();
            if rest.starts_with(&symbol) {
                return Ok((op, pos + symbol.len()));
            }
        }
        Err(self.error(ParseErrorKind::InvalidOperator, pos))
    }

    fn value(&self, pos: usize) -> Parsed<super::ast::TypedValue> {
        let pos = self.skip_whitespace(pos);
        let end = match self.chars.get(pos) {
            None => return Err(self.error(ParseErrorKind::TermExpected, pos)),
            Some(c) if is_term_stop(*c) => {
                return Err(self.error(ParseErrorKind::TermExpected, pos));
            }
            Some('"') | Some('\'') => self.quoted(pos)?.1,
            Some(_) => self.scan_until(pos, is_term_stop),
        };
        let raw: String = self.chars[pos..end].iter().collect();
        let typed = parse_value(&raw, &self.locale, pos)?;
        Ok((typed, end))
    }

    /// Reads a string delimited by the quote character at `pos`; returns the
    /// inner text and the position after the closing quote.
    fn quoted(&self, pos: usize) -> Parsed<String> {
        let quote = self.chars[pos];
        match self.chars[pos + 1..].iter().position(|c| *c == quote) {
            Some(offset) => {
                let close = pos + 1 + offset;
                let text: String = self.chars[pos + 1..close].iter().collect();
                Ok((text, close + 1))
            }
            None => Err(self.error(ParseErrorKind::EndOfTextNotFound, self.chars.len())),
        }
    }

    fn skip_whitespace(&self, pos: usize) -> usize {
        self.scan_until(pos, |c| !c.is_whitespace())
    }

    fn scan_until(&self, pos: usize, stop: impl Fn(char) -> bool) -> usize {
        let mut end = pos;
        while end < self.chars.len() && !stop(self.chars[end]) {
            end += 1;
        }
        end
    }

    fn error(&self, kind: ParseErrorKind, pos: usize) -> ParseError {
        ParseError::new(kind, pos, self.chars.get(pos).copied())
    }
}

fn is_term_stop(c: char) -> bool {
    matches!(c, ')' | '&' | '|')
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '!')
}
