use crate::model::ElementKind;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Disjunction of [`OrGroup`]s. A document matches if any group matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    groups: Vec<OrGroup>,
    #[serde(skip)]
    structural: bool,
}

impl Expression {
    pub fn new(groups: Vec<OrGroup>) -> Self {
        let structural = groups
            .iter()
            .flat_map(|g| g.terms.iter())
            .any(|t| match t {
                Term::Predicate(_) => true,
                Term::Nested(inner) => inner.structural,
                Term::FreeText(_) => false,
            });
        Self { groups, structural }
    }

    pub fn groups(&self) -> &[OrGroup] {
        &self.groups
    }

    /// True if any term, at any depth, is a structural predicate. Callers
    /// use this to decide whether element records must be loaded at all.
    pub fn has_structural_predicates(&self) -> bool {
        self.structural
    }
}

/// Conjunction of terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrGroup {
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Term {
    FreeText(String),
    Predicate(Predicate),
    Nested(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub kind: ElementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<TypedValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "!=")]
    Ne,
}

impl Operator {
    /// Two-character operators come before their one-character prefixes.
    pub const SCAN_ORDER: [Operator; 6] = [
        Operator::Le,
        Operator::Ge,
        Operator::Ne,
        Operator::Eq,
        Operator::Gt,
        Operator::Lt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Ne => "!=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal from the query, already typed. Ranges are `(min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum TypedValue {
    Str(String),
    Bool(bool),
    Num(f64),
    #[serde(serialize_with = "decimal")]
    BigInt(i128),
    Date(DateTime<Utc>),
    NumRange(f64, f64),
    #[serde(serialize_with = "decimal_range")]
    BigIntRange(i128, i128),
    DateRange(DateTime<Utc>, DateTime<Utc>),
}

// i128 has no JSON number form outside the 64 bit range
fn decimal<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn decimal_range<S: Serializer>(min: &i128, max: &i128, serializer: S) -> Result<S::Ok, S::Error> {
    (min.to_string(), max.to_string()).serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn big_integers_serialize_as_decimal_text() {
        let huge = 170_141_183_460_469_231_731_687_303_715_884_105_000_i128;
        let value = serde_json::to_value(TypedValue::BigInt(huge)).unwrap();
        assert_eq!(
            value,
            json!({"type": "bigInt", "value": "170141183460469231731687303715884105000"})
        );
        let value = serde_json::to_value(TypedValue::BigIntRange(-huge, 5)).unwrap();
        assert_eq!(
            value["value"],
            json!(["-170141183460469231731687303715884105000", "5"])
        );
    }
}
