/*
[INPUT]:  Chained predicate, pagination and sort calls
[OUTPUT]: Form-urlencoded query string
[POS]:    Query layer - fluent builder used by list_documents
[UPDATE]: When adding builder methods or changing key encoding
*/

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

use super::operator::Operator;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Fluent builder for document list queries
///
/// Plain predicates are ANDed together; a key set twice keeps the last value.
/// Predicates added through [`QueryBuilder::or`] / [`QueryBuilder::or_group`]
/// are ORed within their group.
///
/// # Example
/// ```
/// use cocobase::QueryBuilder;
///
/// let query = QueryBuilder::new()
///     .eq("status", "active")
///     .gte("age", 18)
///     .or()
///     .eq("isPremium", true)
///     .eq("isVerified", true)
///     .done()
///     .order_by_desc("created_at")
///     .limit(10)
///     .build();
///
/// assert_eq!(
///     query,
///     "%5Bor%5DisPremium=true&%5Bor%5DisVerified=true&age_gte=18&limit=10&order=desc&sort=created_at&status=active"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    filters: BTreeMap<String, String>,
    or_filters: Vec<(String, String)>,
    limit: Option<u32>,
    offset: Option<u32>,
    sort: Option<String>,
    order: Option<SortOrder>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate with an explicit operator
    pub fn condition(mut self, field: &str, op: Operator, value: impl fmt::Display) -> Self {
        self.filters.insert(op.key(field), value.to_string());
        self
    }

    // ### Comparison

    /// `field = value`
    pub fn eq(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Eq, value)
    }

    /// Alias for [`QueryBuilder::eq`]
    pub fn equals(self, field: &str, value: impl fmt::Display) -> Self {
        self.eq(field, value)
    }

    pub fn ne(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Ne, value)
    }

    pub fn gt(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Gt, value)
    }

    pub fn gte(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Gte, value)
    }

    pub fn lt(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Lt, value)
    }

    pub fn lte(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Lte, value)
    }

    /// `min <= field <= max`
    pub fn between(self, field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        self.gte(field, min).lte(field, max)
    }

    // ### String matching

    /// Case-insensitive substring match
    pub fn contains(self, field: &str, substring: &str) -> Self {
        self.condition(field, Operator::Contains, substring)
    }

    pub fn starts_with(self, field: &str, prefix: &str) -> Self {
        self.condition(field, Operator::StartsWith, prefix)
    }

    pub fn ends_with(self, field: &str, suffix: &str) -> Self {
        self.condition(field, Operator::EndsWith, suffix)
    }

    /// Substring match on any of `fields`
    pub fn search<I, S>(mut self, term: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: Vec<String> = fields
            .into_iter()
            .map(|field| field.as_ref().to_string())
            .collect();
        let key = Operator::Contains.key(&fields.join("__or__"));
        self.filters.insert(key, term.to_string());
        self
    }

    // ### Set membership

    pub fn is_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        self.condition(field, Operator::In, join_values(values))
    }

    pub fn not_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        self.condition(field, Operator::NotIn, join_values(values))
    }

    // ### Null checks

    pub fn is_null(self, field: &str) -> Self {
        self.condition(field, Operator::IsNull, true)
    }

    pub fn is_not_null(self, field: &str) -> Self {
        self.condition(field, Operator::IsNull, false)
    }

    // ### OR groups

    /// Start the default OR group
    pub fn or(self) -> OrBuilder {
        OrBuilder {
            query: self,
            group: None,
        }
    }

    /// Start a named OR group; separate groups are ANDed with each other
    pub fn or_group(self, name: impl Into<String>) -> OrBuilder {
        OrBuilder {
            query: self,
            group: Some(name.into()),
        }
    }

    // ### Pagination

    /// Maximum number of results; zero means server default
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Number of results to skip
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// 1-based page; page 0 is treated as page 1
    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        let page = page.max(1);
        self.limit = Some(per_page);
        self.offset = Some((page - 1).saturating_mul(per_page));
        self
    }

    // ### Sorting

    /// Sort by `field`, ascending
    pub fn order_by(self, field: impl Into<String>) -> Self {
        self.order_by_asc(field)
    }

    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(field.into());
        self.order = Some(SortOrder::Asc);
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(field.into());
        self.order = Some(SortOrder::Desc);
        self
    }

    pub fn asc(mut self) -> Self {
        self.order = Some(SortOrder::Asc);
        self
    }

    pub fn desc(mut self) -> Self {
        self.order = Some(SortOrder::Desc);
        self
    }

    // ### Shortcuts

    /// Records not soft-deleted
    pub fn active(self) -> Self {
        self.is_null("deletedAt")
    }

    /// Soft-deleted records
    pub fn deleted(self) -> Self {
        self.is_not_null("deletedAt")
    }

    /// Newest first
    pub fn recent(self) -> Self {
        self.order_by_desc("created_at")
    }

    /// Oldest first
    pub fn oldest(self) -> Self {
        self.order_by_asc("created_at")
    }

    pub fn is_empty(&self) -> bool {
        self.build().is_empty()
    }

    /// Encode as a query string (without the leading `?`)
    ///
    /// Keys are emitted in ascending order; repeated keys keep insertion order.
    pub fn build(&self) -> String {
        let mut params: BTreeMap<&str, Vec<String>> = BTreeMap::new();

        for (key, value) in &self.filters {
            params.entry(key.as_str()).or_default().push(value.clone());
        }
        for (key, value) in &self.or_filters {
            params.entry(key.as_str()).or_default().push(value.clone());
        }

        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            params.entry("limit").or_default().push(limit.to_string());
        }
        if let Some(offset) = self.offset.filter(|offset| *offset > 0) {
            params.entry("offset").or_default().push(offset.to_string());
        }
        if let Some(sort) = &self.sort {
            params.entry("sort").or_default().push(sort.clone());
            if let Some(order) = self.order {
                params.entry("order").or_default().push(order.to_string());
            }
        }

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &params {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Builder for a group of ORed predicates
///
/// Every condition is stored under `[or]key` (default group) or
/// `[or:name]key` (named group). Call [`OrBuilder::done`] to return to the
/// parent query.
#[derive(Debug, Clone)]
pub struct OrBuilder {
    query: QueryBuilder,
    group: Option<String>,
}

impl OrBuilder {
    /// Add a predicate with an explicit operator
    pub fn condition(mut self, field: &str, op: Operator, value: impl fmt::Display) -> Self {
        let prefix = match &self.group {
            Some(name) => format!("[or:{name}]"),
            None => "[or]".to_string(),
        };
        let key = format!("{prefix}{}", op.key(field));
        self.query.or_filters.push((key, value.to_string()));
        self
    }

    pub fn eq(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Eq, value)
    }

    /// Alias for [`OrBuilder::eq`]
    pub fn equals(self, field: &str, value: impl fmt::Display) -> Self {
        self.eq(field, value)
    }

    pub fn ne(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Ne, value)
    }

    pub fn gt(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Gt, value)
    }

    pub fn gte(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Gte, value)
    }

    pub fn lt(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Lt, value)
    }

    pub fn lte(self, field: &str, value: impl fmt::Display) -> Self {
        self.condition(field, Operator::Lte, value)
    }

    pub fn contains(self, field: &str, substring: &str) -> Self {
        self.condition(field, Operator::Contains, substring)
    }

    pub fn starts_with(self, field: &str, prefix: &str) -> Self {
        self.condition(field, Operator::StartsWith, prefix)
    }

    pub fn ends_with(self, field: &str, suffix: &str) -> Self {
        self.condition(field, Operator::EndsWith, suffix)
    }

    pub fn is_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        self.condition(field, Operator::In, join_values(values))
    }

    pub fn not_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        self.condition(field, Operator::NotIn, join_values(values))
    }

    pub fn is_null(self, field: &str) -> Self {
        self.condition(field, Operator::IsNull, true)
    }

    pub fn is_not_null(self, field: &str) -> Self {
        self.condition(field, Operator::IsNull, false)
    }

    /// Close the group and return the parent query
    pub fn done(self) -> QueryBuilder {
        self.query
    }
}

fn join_values<I, V>(values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: fmt::Display,
{
    values
        .into_iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
