//! The product query descriptor.
//!
//! Turns the flat string map of request query parameters into an immutable
//! description of a catalog query: an optional name-search term, a list of
//! comparison conditions, and a pagination window. The descriptor knows
//! nothing about HTTP or the database; the storefront's repository layer
//! renders it into SQL with every value bound as a parameter.
//!
//! The three stages mirror the request surface:
//!
//! - [`QueryDescriptor::search`] - `?search=hood` becomes a
//!   case-insensitive substring predicate on the product name.
//! - [`QueryDescriptor::filter`] - every remaining key becomes one
//!   comparison clause. Operators are spelled in the key, never the value:
//!   `price[gte]=199` is "price >= 199". Keys are tokenized structurally
//!   (`field`, `[`, operator, `]`) against a whitelist, so a value that
//!   happens to contain the text "gte" or "lt" is never touched.
//! - [`QueryDescriptor::paginate`] - `?page=3` with a per-page size turns
//!   into a limit/skip window; a missing or malformed page means page 1.
//!
//! Stages consume `self` and return a new descriptor, so any combination
//! composes, and the result is always the logical AND of the active
//! stages. An empty parameter map leaves the descriptor at its default,
//! which renders as the unfiltered base query.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;

/// Parameter keys consumed by the search and pagination stages; the filter
/// stage ignores them.
const RESERVED_KEYS: [&str; 3] = ["search", "page", "limit"];

/// Errors produced while interpreting filter parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A bracketed key used a token outside the operator whitelist.
    #[error("unknown filter operator `{operator}` on field `{field}`")]
    UnknownOperator {
        /// Field name before the bracket.
        field: String,
        /// The unrecognized token inside the bracket.
        operator: String,
    },

    /// An operator clause carried a value that does not parse as a number.
    #[error("filter `{field}[{operator}]` requires a numeric value, got `{value}`")]
    InvalidOperand {
        /// Field name before the bracket.
        field: String,
        /// Operator token inside the bracket.
        operator: String,
        /// The offending value, verbatim.
        value: String,
    },

    /// A bracketed key had nothing before the bracket.
    #[error("filter key `{key}` has an empty field name")]
    EmptyField {
        /// The offending key, verbatim.
        key: String,
    },
}

/// A comparison operator in a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// Map a bracketed operator token to a comparison.
    ///
    /// Returns `None` for tokens outside the whitelist; callers decide
    /// whether that is an error. Equality has no token - it is the absence
    /// of a bracket.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }
}

/// A filter operand: numeric when it parses as a decimal, text otherwise.
///
/// Operator clauses require the numeric form; equality accepts both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Number(Decimal),
    Text(String),
}

/// One field-comparison clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Field name, passed through to the storage layer unvalidated.
    pub field: String,
    /// The comparison to apply.
    pub op: Comparison,
    /// The operand.
    pub value: FilterValue,
}

/// Result ordering. The catalog always pages in a deterministic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    /// Insertion order (ascending id).
    #[default]
    Oldest,
    /// Reverse insertion order.
    Newest,
}

/// An immutable catalog query: predicate, sort, and pagination window.
///
/// Built by value through the stage methods; execution happens once, in the
/// repository layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryDescriptor {
    /// Case-insensitive substring to match against the product name.
    pub search: Option<String>,
    /// Comparison clauses, ANDed together.
    pub conditions: Vec<Condition>,
    /// Result ordering.
    pub sort: Sort,
    /// Maximum number of rows, when paginated.
    pub limit: Option<i64>,
    /// Number of rows to skip, when paginated.
    pub skip: i64,
}

impl QueryDescriptor {
    /// Build the search and filter stages from a parameter map.
    ///
    /// Pagination is applied separately via [`Self::paginate`] so callers
    /// can count the filtered set before windowing it.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when a filter key or operand is malformed.
    pub fn build(params: &BTreeMap<String, String>) -> Result<Self, QueryError> {
        Self::default().search(params).filter(params)
    }

    /// Apply the name-search stage.
    ///
    /// A missing or empty `search` parameter is a no-op, not an empty-set
    /// filter.
    #[must_use]
    pub fn search(mut self, params: &BTreeMap<String, String>) -> Self {
        if let Some(term) = params.get("search")
            && !term.is_empty()
        {
            self.search = Some(term.clone());
        }
        self
    }

    /// Apply the comparison-filter stage.
    ///
    /// Every key except `search`, `page`, and `limit` becomes one condition.
    /// Field names are not validated against the schema; unknown fields
    /// surface as storage errors.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownOperator`] for a bracket token outside
    /// `gt`/`gte`/`lt`/`lte`, [`QueryError::InvalidOperand`] for an operator
    /// value that is not a number, and [`QueryError::EmptyField`] for a key
    /// that starts with a bracket.
    pub fn filter(mut self, params: &BTreeMap<String, String>) -> Result<Self, QueryError> {
        for (key, value) in params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }

            let condition = match parse_key(key)? {
                (field, Some(op)) => {
                    let number = value.parse::<Decimal>().map_err(|_| {
                        QueryError::InvalidOperand {
                            field: field.clone(),
                            operator: token_of(op).to_owned(),
                            value: value.clone(),
                        }
                    })?;
                    Condition {
                        field,
                        op,
                        value: FilterValue::Number(number),
                    }
                }
                (field, None) => Condition {
                    field,
                    op: Comparison::Eq,
                    value: value.parse::<Decimal>().map_or_else(
                        |_| FilterValue::Text(value.clone()),
                        FilterValue::Number,
                    ),
                },
            };

            self.conditions.push(condition);
        }

        Ok(self)
    }

    /// Apply the pagination stage.
    ///
    /// `page` defaults to 1 when absent or non-numeric and is clamped to at
    /// least 1; the skip is `per_page * (page - 1)`.
    #[must_use]
    pub fn paginate(mut self, per_page: u32, params: &BTreeMap<String, String>) -> Self {
        let page = params
            .get("page")
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);

        self.limit = Some(i64::from(per_page));
        self.skip = i64::from(per_page) * (i64::from(page) - 1);
        self
    }

    /// Whether any predicate stage is active.
    #[must_use]
    pub fn has_predicate(&self) -> bool {
        self.search.is_some() || !self.conditions.is_empty()
    }
}

/// Split a filter key into its field name and optional operator token.
///
/// Only the key is tokenized; values are never inspected for operator
/// text. A key without a well-formed `[token]` suffix is a literal field
/// name for an equality clause.
fn parse_key(key: &str) -> Result<(String, Option<Comparison>), QueryError> {
    let Some((field, rest)) = key.split_once('[') else {
        return Ok((key.to_owned(), None));
    };

    if field.is_empty() {
        return Err(QueryError::EmptyField {
            key: key.to_owned(),
        });
    }

    let Some(token) = rest.strip_suffix(']') else {
        // No closing bracket: treat the whole key as a literal field name.
        return Ok((key.to_owned(), None));
    };

    match Comparison::from_token(token) {
        Some(op) => Ok((field.to_owned(), Some(op))),
        None => Err(QueryError::UnknownOperator {
            field: field.to_owned(),
            operator: token.to_owned(),
        }),
    }
}

/// The wire token of an operator, for error messages.
const fn token_of(op: Comparison) -> &'static str {
    match op {
        Comparison::Eq => "eq",
        Comparison::Gt => "gt",
        Comparison::Gte => "gte",
        Comparison::Lt => "lt",
        Comparison::Lte => "lte",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn empty_params_leave_the_base_query_unchanged() {
        let query = QueryDescriptor::build(&params(&[])).expect("build");
        assert_eq!(query, QueryDescriptor::default());
        assert!(!query.has_predicate());
        assert_eq!(query.limit, None);
        assert_eq!(query.skip, 0);
    }

    #[test]
    fn search_sets_the_term_and_nothing_else() {
        let query = QueryDescriptor::build(&params(&[("search", "coder")])).expect("build");
        assert_eq!(query.search.as_deref(), Some("coder"));
        assert!(query.conditions.is_empty());
    }

    #[test]
    fn empty_search_is_a_no_op() {
        let query = QueryDescriptor::build(&params(&[("search", "")])).expect("build");
        assert_eq!(query.search, None);
    }

    #[test]
    fn filter_skips_reserved_keys() {
        let query = QueryDescriptor::build(&params(&[
            ("search", "coder"),
            ("page", "2"),
            ("limit", "5"),
            ("category", "hoodies"),
        ]))
        .expect("build");

        assert_eq!(query.conditions.len(), 1);
        let condition = query.conditions.first().expect("one condition");
        assert_eq!(condition.field, "category");
        assert_eq!(condition.op, Comparison::Eq);
        assert_eq!(
            condition.value,
            FilterValue::Text("hoodies".to_owned())
        );
    }

    #[test]
    fn one_condition_per_non_reserved_key() {
        let query = QueryDescriptor::build(&params(&[
            ("category", "shortsleeves"),
            ("price[gte]", "199"),
            ("price[lte]", "999"),
            ("rating[gte]", "4"),
        ]))
        .expect("build");

        // BTreeMap iteration: category, price[gte], price[lte], rating[gte]
        assert_eq!(query.conditions.len(), 4);
        let ops: Vec<Comparison> = query.conditions.iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![
                Comparison::Eq,
                Comparison::Gte,
                Comparison::Lte,
                Comparison::Gte
            ]
        );
    }

    #[test]
    fn operator_tokens_map_to_comparisons() {
        for (token, expected) in [
            ("gt", Comparison::Gt),
            ("gte", Comparison::Gte),
            ("lt", Comparison::Lt),
            ("lte", Comparison::Lte),
        ] {
            let key = format!("price[{token}]");
            let query =
                QueryDescriptor::build(&params(&[(key.as_str(), "10")])).expect("build");
            let condition = query.conditions.first().expect("condition");
            assert_eq!(condition.op, expected);
            assert_eq!(
                condition.value,
                FilterValue::Number(Decimal::from(10))
            );
        }
    }

    #[test]
    fn values_containing_operator_text_survive_verbatim() {
        // The regression the key-tokenizer exists to prevent: operator
        // words inside a *value* are plain text, not syntax.
        let query = QueryDescriptor::build(&params(&[
            ("brand", "voltage-gte-99"),
            ("name", "lt. dan supply co"),
        ]))
        .expect("build");

        let brand = query
            .conditions
            .iter()
            .find(|c| c.field == "brand")
            .expect("brand condition");
        assert_eq!(
            brand.value,
            FilterValue::Text("voltage-gte-99".to_owned())
        );

        let name = query
            .conditions
            .iter()
            .find(|c| c.field == "name")
            .expect("name condition");
        assert_eq!(
            name.value,
            FilterValue::Text("lt. dan supply co".to_owned())
        );
    }

    #[test]
    fn numeric_equality_values_bind_as_numbers() {
        let query = QueryDescriptor::build(&params(&[("stock", "12")])).expect("build");
        let condition = query.conditions.first().expect("condition");
        assert_eq!(condition.op, Comparison::Eq);
        assert_eq!(condition.value, FilterValue::Number(Decimal::from(12)));
    }

    #[test]
    fn malformed_operator_operand_is_a_validation_error() {
        let err = QueryDescriptor::build(&params(&[("price[gte]", "cheap")]))
            .expect_err("non-numeric operand");
        assert_eq!(
            err,
            QueryError::InvalidOperand {
                field: "price".to_owned(),
                operator: "gte".to_owned(),
                value: "cheap".to_owned(),
            }
        );
    }

    #[test]
    fn unknown_operator_token_is_rejected() {
        let err = QueryDescriptor::build(&params(&[("price[within]", "10")]))
            .expect_err("unknown operator");
        assert!(matches!(err, QueryError::UnknownOperator { .. }));
    }

    #[test]
    fn bracket_without_field_is_rejected() {
        let err =
            QueryDescriptor::build(&params(&[("[gte]", "10")])).expect_err("empty field");
        assert!(matches!(err, QueryError::EmptyField { .. }));
    }

    #[test]
    fn unclosed_bracket_is_a_literal_field_name() {
        let query = QueryDescriptor::build(&params(&[("price[gte", "10")])).expect("build");
        let condition = query.conditions.first().expect("condition");
        assert_eq!(condition.field, "price[gte");
        assert_eq!(condition.op, Comparison::Eq);
    }

    #[test]
    fn paginate_computes_the_window() {
        let query = QueryDescriptor::default().paginate(6, &params(&[("page", "3")]));
        assert_eq!(query.limit, Some(6));
        // page 3 at 6 per page covers items 13-18
        assert_eq!(query.skip, 12);
    }

    #[test]
    fn page_defaults_to_one_when_absent_or_malformed() {
        for p in [params(&[]), params(&[("page", "two")]), params(&[("page", "0")])] {
            let query = QueryDescriptor::default().paginate(6, &p);
            assert_eq!(query.limit, Some(6));
            assert_eq!(query.skip, 0);
        }
    }

    #[test]
    fn stages_compose_in_any_combination() {
        let p = params(&[("search", "tee"), ("price[lt]", "50"), ("page", "2")]);

        let searched = QueryDescriptor::default().search(&p);
        assert!(searched.conditions.is_empty());

        let filtered = QueryDescriptor::default().filter(&p).expect("filter");
        assert_eq!(filtered.search, None);
        assert_eq!(filtered.conditions.len(), 1);

        let combined = QueryDescriptor::build(&p).expect("build").paginate(6, &p);
        assert_eq!(combined.search.as_deref(), Some("tee"));
        assert_eq!(combined.conditions.len(), 1);
        assert_eq!(combined.limit, Some(6));
        assert_eq!(combined.skip, 6);
    }
}
