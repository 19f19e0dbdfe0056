//! SQL rendering for the core query descriptor.
//!
//! The descriptor is pure data; this module is the single place it meets
//! SQL. Two rules keep dynamic filtering safe:
//!
//! - every operand is bound as a query parameter, never interpolated;
//! - field names (the only part that cannot be bound) are rendered as
//!   quoted identifiers with embedded quotes doubled, so a hostile field
//!   name cannot break out of identifier position.
//!
//! Field names are still not validated against the schema: an unknown
//! field becomes a quoted identifier Postgres will reject at execution.

use sqlx::{Postgres, QueryBuilder};

use loomline_core::query::{Comparison, FilterValue, QueryDescriptor, Sort};

/// Render the predicate stages (search + filters) as a WHERE clause.
///
/// Emits nothing when no predicate stage is active, leaving the base query
/// unchanged.
pub fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, query: &QueryDescriptor) {
    let mut separator = " WHERE ";

    if let Some(term) = &query.search {
        builder.push(separator);
        builder.push("name ILIKE ");
        builder.push_bind(like_pattern(term));
        separator = " AND ";
    }

    for condition in &query.conditions {
        builder.push(separator);
        separator = " AND ";

        builder.push(quote_ident(&condition.field));
        builder.push(comparison_sql(condition.op));
        match &condition.value {
            FilterValue::Number(number) => builder.push_bind(*number),
            FilterValue::Text(text) => builder.push_bind(text.clone()),
        };
    }
}

/// Render the ordering and pagination window.
///
/// Kept separate from [`push_predicate`] so COUNT queries can reuse the
/// predicate without an ORDER BY.
pub fn push_window(builder: &mut QueryBuilder<'_, Postgres>, query: &QueryDescriptor) {
    match query.sort {
        Sort::Oldest => builder.push(" ORDER BY id"),
        Sort::Newest => builder.push(" ORDER BY id DESC"),
    };

    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.skip);
    }
}

/// SQL operator for a comparison, with surrounding spaces.
const fn comparison_sql(op: Comparison) -> &'static str {
    match op {
        Comparison::Eq => " = ",
        Comparison::Gt => " > ",
        Comparison::Gte => " >= ",
        Comparison::Lt => " < ",
        Comparison::Lte => " <= ",
    }
}

/// Quote a field name as a `PostgreSQL` identifier.
fn quote_ident(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Turn a search term into a substring LIKE pattern, with the LIKE
/// metacharacters in the term escaped so they match literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn render(query: &QueryDescriptor) -> String {
        let mut builder = QueryBuilder::new("SELECT * FROM product");
        push_predicate(&mut builder, query);
        push_window(&mut builder, query);
        builder.sql().to_owned()
    }

    #[test]
    fn empty_descriptor_renders_the_base_query() {
        let query = QueryDescriptor::default();
        assert_eq!(render(&query), "SELECT * FROM product ORDER BY id");
    }

    #[test]
    fn all_stages_render_as_anded_clauses_with_bound_values() {
        let p = params(&[
            ("search", "coder"),
            ("category", "hoodies"),
            ("price[gte]", "199"),
            ("page", "3"),
        ]);
        let query = QueryDescriptor::build(&p).expect("build").paginate(6, &p);

        assert_eq!(
            render(&query),
            "SELECT * FROM product WHERE name ILIKE $1 \
             AND \"category\" = $2 AND \"price\" >= $3 \
             ORDER BY id LIMIT $4 OFFSET $5"
        );
    }

    #[test]
    fn every_comparison_renders_its_operator() {
        let p = params(&[
            ("price[gt]", "1"),
            ("rating[gte]", "2"),
            ("stock[lt]", "3"),
            ("weight[lte]", "4"),
        ]);
        let query = QueryDescriptor::build(&p).expect("build");
        let sql = render(&query);

        assert!(sql.contains("\"price\" > $1"));
        assert!(sql.contains("\"rating\" >= $2"));
        assert!(sql.contains("\"stock\" < $3"));
        assert!(sql.contains("\"weight\" <= $4"));
    }

    #[test]
    fn hostile_field_names_stay_inside_identifier_quotes() {
        let p = params(&[("price\" OR 1=1 --", "10")]);
        let query = QueryDescriptor::build(&p).expect("build");

        assert_eq!(
            render(&query),
            "SELECT * FROM product WHERE \"price\"\" OR 1=1 --\" = $1 ORDER BY id"
        );
    }

    #[test]
    fn search_values_are_bound_not_interpolated() {
        let p = params(&[("search", "'; DROP TABLE product; --")]);
        let query = QueryDescriptor::build(&p).expect("build");

        // The value lands in a bind parameter; the SQL text contains no
        // trace of it.
        assert_eq!(
            render(&query),
            "SELECT * FROM product WHERE name ILIKE $1 ORDER BY id"
        );
    }

    #[test]
    fn like_metacharacters_in_search_terms_match_literally() {
        assert_eq!(like_pattern("100%_cotton"), "%100\\%\\_cotton%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
        assert_eq!(like_pattern("hood"), "%hood%");
    }

    #[test]
    fn count_queries_reuse_the_predicate_without_a_window() {
        let p = params(&[("brand", "loomline"), ("page", "2")]);
        let query = QueryDescriptor::build(&p).expect("build").paginate(6, &p);

        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM product");
        push_predicate(&mut builder, &query);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM product WHERE \"brand\" = $1"
        );
    }
}
