/*
[INPUT]:  Field names, predicate operators and values
[OUTPUT]: URL query strings understood by the documents endpoint
[POS]:    Query layer - fluent filter/sort/pagination builder
[UPDATE]: When the service adds operators or query parameters
*/

pub mod builder;
pub mod operator;

pub use builder::{OrBuilder, QueryBuilder, SortOrder};
pub use operator::{Operator, ParseOperatorError};
