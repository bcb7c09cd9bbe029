use super::ast::{Expression, Operator, Predicate, Term, TypedValue};
use super::literal::parse_bigint;
use super::locale::parse_iso_datetime;
use crate::model::{Document, ElementKind, ElementRecord, ValueClass};
use crate::util::normalize_path;
use std::cmp::Ordering;
use tracing::trace;

/// Tolerance for `=` and `!=` on floating point values.
pub const EPSILON: f64 = 1e-6;

/// Decides whether one element record satisfies one predicate. Storage
/// backends with their own value encoding plug in here.
pub trait ElementMatcher {
    fn matches_record(&self, predicate: &Predicate, record: &ElementRecord) -> bool;
}

/// Matches records whose values are stored in their XML schema lexical form.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueMatcher;

impl Expression {
    /// Evaluates the expression with the default [`ValueMatcher`].
    pub fn matches(&self, document: &Document, elements: &[ElementRecord]) -> bool {
        self.matches_with(&ValueMatcher, document, elements)
    }

    pub fn matches_with<M>(&self, matcher: &M, document: &Document, elements: &[ElementRecord]) -> bool
    where
        M: ElementMatcher + ?Sized,
    {
        self.groups().iter().any(|group| {
            group
                .terms
                .iter()
                .all(|term| term.matches_with(matcher, document, elements))
        })
    }
}

impl Term {
    fn matches_with<M>(&self, matcher: &M, document: &Document, elements: &[ElementRecord]) -> bool
    where
        M: ElementMatcher + ?Sized,
    {
        match self {
            Term::FreeText(text) => matches_free_text(text, document),
            Term::Predicate(predicate) => elements
                .iter()
                .any(|record| matcher.matches_record(predicate, record)),
            Term::Nested(inner) => inner.matches_with(matcher, document, elements),
        }
    }
}

fn matches_free_text(text: &str, document: &Document) -> bool {
    let needle = text.to_lowercase();
    [
        document.key.endpoint.as_str(),
        document.key.id.as_str(),
        document.id_short.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A stored value decoded according to its declared type.
#[derive(Debug, Clone, PartialEq)]
enum StoredValue {
    Text(String),
    Bool(bool),
    Num(f64),
    BigInt(i128),
    // epoch milliseconds
    Date(i64),
}

impl StoredValue {
    fn decode(raw: &str, class: ValueClass) -> Option<Self> {
        let trimmed = raw.trim();
        match class {
            ValueClass::Text => Some(StoredValue::Text(raw.to_string())),
            ValueClass::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(StoredValue::Bool(true)),
                "false" | "0" => Some(StoredValue::Bool(false)),
                _ => None,
            },
            ValueClass::Number => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(StoredValue::Num),
            ValueClass::BigInt => trimmed
                .parse::<i128>()
                .ok()
                .or_else(|| parse_bigint(trimmed))
                .map(StoredValue::BigInt),
            ValueClass::Date => parse_iso_datetime(trimmed)
                .map(|dt| StoredValue::Date(dt.timestamp_millis())),
        }
    }
}

impl ElementMatcher for ValueMatcher {
    fn matches_record(&self, predicate: &Predicate, record: &ElementRecord) -> bool {
        if record.kind != predicate.kind {
            return false;
        }
        if let Some(name) = &predicate.name {
            if !contains_folded(&record.id_short, name) {
                return false;
            }
        }
        let Some(query) = &predicate.value else {
            return true;
        };
        let Some(raw) = record.value.as_deref() else {
            return false;
        };
        let class = record.value_type.map(|t| t.class()).unwrap_or(ValueClass::Text);
        let Some(stored) = StoredValue::decode(raw, class) else {
            trace!(document = %record.document, element = %record.id_short, "undecodable stored value");
            return false;
        };
        let operator = predicate.operator.unwrap_or(Operator::Eq);

        if record.kind == ElementKind::File {
            if let (StoredValue::Text(path), TypedValue::Str(wanted)) = (&stored, query) {
                return contains_folded(&normalize_path(path), &normalize_path(wanted));
            }
        }
        compare(&stored, operator, query)
    }
}

fn compare(stored: &StoredValue, operator: Operator, query: &TypedValue) -> bool {
    match stored {
        StoredValue::Bool(b) => match query {
            TypedValue::Bool(q) => match operator {
                Operator::Eq => b == q,
                Operator::Ne => b != q,
                Operator::Lt | Operator::Gt | Operator::Le | Operator::Ge => false,
            },
            TypedValue::Str(_)
            | TypedValue::Num(_)
            | TypedValue::BigInt(_)
            | TypedValue::Date(_)
            | TypedValue::NumRange(..)
            | TypedValue::BigIntRange(..)
            | TypedValue::DateRange(..) => false,
        },
        StoredValue::Text(s) => match query_text(query) {
            Some(q) => contains_folded(s, &q),
            None => false,
        },
        StoredValue::Num(x) => match query {
            TypedValue::Num(q) => compare_f64(*x, operator, *q),
            TypedValue::BigInt(q) => compare_f64(*x, operator, *q as f64),
            TypedValue::NumRange(min, max) => *min <= *x && *x <= *max,
            TypedValue::BigIntRange(min, max) => (*min as f64) <= *x && *x <= (*max as f64),
            TypedValue::Str(_)
            | TypedValue::Bool(_)
            | TypedValue::Date(_)
            | TypedValue::DateRange(..) => false,
        },
        StoredValue::BigInt(x) => match query {
            TypedValue::BigInt(q) => compare_ord(x, operator, q),
            TypedValue::Num(q) => compare_f64(*x as f64, operator, *q),
            TypedValue::BigIntRange(min, max) => min <= x && x <= max,
            TypedValue::NumRange(min, max) => {
                let x = *x as f64;
                *min <= x && x <= *max
            }
            TypedValue::Str(_)
            | TypedValue::Bool(_)
            | TypedValue::Date(_)
            | TypedValue::DateRange(..) => false,
        },
        StoredValue::Date(ms) => match query {
            TypedValue::Date(q) => compare_ord(ms, operator, &q.timestamp_millis()),
            TypedValue::DateRange(min, max) => {
                min.timestamp_millis() <= *ms && *ms <= max.timestamp_millis()
            }
            TypedValue::Str(_)
            | TypedValue::Bool(_)
            | TypedValue::Num(_)
            | TypedValue::BigInt(_)
            | TypedValue::NumRange(..)
            | TypedValue::BigIntRange(..) => false,
        },
    }
}

/// Textual form of a scalar query value for containment against text.
fn query_text(query: &TypedValue) -> Option<String> {
    match query {
        TypedValue::Str(s) => Some(s.clone()),
        TypedValue::Bool(b) => Some(b.to_string()),
        TypedValue::Num(n) => Some(n.to_string()),
        TypedValue::BigInt(n) => Some(n.to_string()),
        TypedValue::Date(_)
        | TypedValue::NumRange(..)
        | TypedValue::BigIntRange(..)
        | TypedValue::DateRange(..) => None,
    }
}

fn compare_f64(x: f64, operator: Operator, q: f64) -> bool {
    let equal = (x - q).abs() <= EPSILON;
    match operator {
        Operator::Eq => equal,
        Operator::Ne => !equal,
        Operator::Lt => x < q,
        Operator::Gt => x > q,
        Operator::Le => x <= q,
        Operator::Ge => x >= q,
    }
}

fn compare_ord<T: Ord>(x: &T, operator: Operator, q: &T) -> bool {
    let ordering = x.cmp(q);
    match operator {
        Operator::Eq => ordering == Ordering::Equal,
        Operator::Ne => ordering != Ordering::Equal,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Le => ordering != Ordering::Greater,
        Operator::Ge => ordering != Ordering::Less,
    }
}
