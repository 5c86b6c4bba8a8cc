/*
[INPUT]:  Predicate kinds used by the query builder
[OUTPUT]: Key suffixes appended to field names
[POS]:    Query layer - typed predicate operators
[UPDATE]: When the service adds operators
*/

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Predicate applied to a field
///
/// Serialized as a `_suffix` on the field name, e.g. `age_gte=18`.
/// Equality has no suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    IsNull,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
    ];

    /// Wire suffix, `None` for equality
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Operator::Eq => None,
            Operator::Ne => Some("ne"),
            Operator::Gt => Some("gt"),
            Operator::Gte => Some("gte"),
            Operator::Lt => Some("lt"),
            Operator::Lte => Some("lte"),
            Operator::Contains => Some("contains"),
            Operator::StartsWith => Some("startswith"),
            Operator::EndsWith => Some("endswith"),
            Operator::In => Some("in"),
            Operator::NotIn => Some("notin"),
            Operator::IsNull => Some("isnull"),
        }
    }

    /// Query key for `field` under this operator
    pub fn key(self, field: &str) -> String {
        match self.suffix() {
            Some(suffix) => format!("{field}_{suffix}"),
            None => field.to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix().unwrap_or("eq"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown query operator: {0}")]
pub struct ParseOperatorError(pub String);

impl FromStr for Operator {
    type Err = ParseOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "");
        match normalized.as_str() {
            "" | "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "contains" => Ok(Operator::Contains),
            "startswith" => Ok(Operator::StartsWith),
            "endswith" => Ok(Operator::EndsWith),
            "in" => Ok(Operator::In),
            "notin" => Ok(Operator::NotIn),
            "isnull" => Ok(Operator::IsNull),
            _ => Err(ParseOperatorError(s.to_string())),
        }
    }
}
