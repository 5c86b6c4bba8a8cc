/*
[INPUT]:  `field[:op]=value` strings from the command line
[OUTPUT]: Typed filter conditions for the query builder
[POS]:    CLI argument parsing - list filters
[UPDATE]: When filter syntax changes
*/

use std::str::FromStr;

use cocobase::{Operator, OrBuilder, QueryBuilder};

/// One `--filter` / `--or` argument
#[derive(Debug, Clone, PartialEq)]
pub struct FilterArg {
    pub field: String,
    pub op: Operator,
    pub value: String,
}

impl FilterArg {
    pub fn apply(&self, query: QueryBuilder) -> QueryBuilder {
        query.condition(&self.field, self.op, &self.value)
    }

    pub fn apply_or(&self, group: OrBuilder) -> OrBuilder {
        group.condition(&self.field, self.op, &self.value)
    }
}

impl FromStr for FilterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lhs, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected field[:op]=value, got '{s}'"))?;
        let (field, op) = match lhs.split_once(':') {
            Some((field, op)) => (field, op.parse::<Operator>().map_err(|e| e.to_string())?),
            None => (lhs, Operator::Eq),
        };
        let field = field.trim();
        if field.is_empty() {
            return Err(format!("missing field name in '{s}'"));
        }
        Ok(Self {
            field: field.to_string(),
            op,
            value: value.to_string(),
        })
    }
}
