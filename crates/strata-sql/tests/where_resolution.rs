//! Tests for where clause argument resolution and connectives.

mod common;
use common::*;

use strata_sql::prelude::*;
use strata_sql::{
    raw, RawQuery, SelectQueryBuilder, SqlError, SqlValue, WhereArg, WhereValue,
};

fn posts() -> SelectQueryBuilder {
    SelectQueryBuilder::new("posts").unwrap()
}

#[test]
fn boolean_literal() {
    let mut q = posts();
    q.where_args(true).unwrap();
    assert_eq!(sql(&q), "SELECT * FROM \"posts\" WHERE TRUE");
}

#[test]
fn raw_condition_keeps_its_bindings() {
    let mut q = posts();
    q.where_args(RawQuery::with_bindings("score BETWEEN ? AND ?", [1, 5]))
        .unwrap();
    let compiled = compile(&q);
    assert_eq!(
        compiled.expression,
        "SELECT * FROM \"posts\" WHERE score BETWEEN ? AND ?"
    );
    assert_eq!(compiled.bindings, vec![SqlValue::Int(1), SqlValue::Int(5)]);
}

#[test]
fn two_and_three_argument_forms_agree() {
    let mut pair = posts();
    pair.where_args(("title", "hello")).unwrap();
    let mut triple = posts();
    triple.where_args(("title", "=", "hello")).unwrap();
    assert_eq!(compile(&pair), compile(&triple));
}

#[test]
fn null_value_resolves_to_is_null() {
    let mut q = posts();
    q.where_("deleted_at", SqlValue::Null)
        .unwrap()
        .where_op("published_at", "<", SqlValue::Null)
        .unwrap()
        .where_op("author_id", "IS NOT NULL", SqlValue::Null)
        .unwrap();
    let compiled = compile(&q);
    assert_eq!(
        compiled.expression,
        "SELECT * FROM \"posts\" WHERE \"deleted_at\" IS NULL AND \"published_at\" IS NULL \
         AND \"author_id\" IS NOT NULL"
    );
    assert!(compiled.bindings.is_empty());
}

#[test]
fn operator_checked_before_null_handling() {
    let mut q = posts();
    assert!(matches!(
        q.where_op("deleted_at", "IS MAYBE", SqlValue::Null),
        Err(SqlError::InvalidArgument(_))
    ));
}

#[test]
fn nested_group_is_parenthesized() {
    let mut q = posts();
    q.where_("published", true)
        .unwrap()
        .where_nested(|w| {
            w.where_op("views", ">", 100)?.or_where(("featured", true))?;
            Ok(())
        })
        .unwrap();
    let compiled = compile(&q);
    assert_eq!(
        compiled.expression,
        "SELECT * FROM \"posts\" WHERE \"published\" = ? AND (\"views\" > ? OR \"featured\" = ?)"
    );
    assert_eq!(
        compiled.bindings,
        vec![SqlValue::Bool(true), SqlValue::Int(100), SqlValue::Bool(true)]
    );
}

#[test]
fn nested_group_starts_with_and() {
    let mut q = posts();
    q.where_("a", 1)
        .unwrap()
        .or_where(WhereArg::nested(|w| {
            w.where_("b", 2)?.where_("c", 3)?;
            Ok(())
        }))
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT * FROM \"posts\" WHERE \"a\" = ? OR (\"b\" = ? AND \"c\" = ?)"
    );
}

#[test]
fn nested_error_propagates() {
    let mut q = posts();
    let err = q
        .where_nested(|w| {
            w.where_op("a", "??", 1)?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgument(_)));
}

#[test]
fn mapping_expands_in_order() {
    let mut q = posts();
    q.where_map([("status", text("draft")), ("author_id", SqlValue::Int(7))])
        .unwrap();
    let compiled = compile(&q);
    assert_eq!(
        compiled.expression,
        "SELECT * FROM \"posts\" WHERE \"status\" = ? AND \"author_id\" = ?"
    );
    assert_eq!(compiled.bindings, vec![text("draft"), SqlValue::Int(7)]);
}

#[test]
fn or_applies_to_next_statement_only() {
    let mut q = posts();
    q.where_("a", 1)
        .unwrap()
        .or_where(("b", 2))
        .unwrap()
        .where_("c", 3)
        .unwrap()
        .and_where(("d", 4))
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT * FROM \"posts\" WHERE \"a\" = ? OR \"b\" = ? AND \"c\" = ? AND \"d\" = ?"
    );
}

#[test]
fn raw_where_value() {
    let mut q = posts();
    q.where_op("published_at", "<=", raw("CURRENT_TIMESTAMP"))
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT * FROM \"posts\" WHERE \"published_at\" <= CURRENT_TIMESTAMP"
    );
    assert!(matches!(
        WhereValue::from(raw("x")),
        WhereValue::Raw(_)
    ));
}

#[test]
fn negated_forms() {
    let mut q = posts();
    q.where_not_in("id", [4, 5])
        .unwrap()
        .where_not_between("score", 1, 2)
        .unwrap()
        .where_not_null("title")
        .unwrap()
        .where_not_in_set("tags", ["spam"])
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT * FROM \"posts\" WHERE \"id\" NOT IN (?, ?) AND \"score\" NOT BETWEEN ? AND ? \
         AND \"title\" IS NOT NULL AND NOT ((',' || \"tags\" || ',') LIKE ?)"
    );
}

#[test]
fn empty_in_lists() {
    let mut q = posts();
    q.where_in("id", Vec::<i64>::new())
        .unwrap()
        .or_where(WhereArg::Bool(false))
        .unwrap()
        .where_not_in("id", Vec::<i64>::new())
        .unwrap();
    let compiled = compile(&q);
    assert_eq!(
        compiled.expression,
        "SELECT * FROM \"posts\" WHERE 1 = 0 OR FALSE AND 1 = 1"
    );
    assert!(compiled.bindings.is_empty());
}

#[test]
fn clear_where_resets() {
    let mut q = posts();
    q.where_("a", 1).unwrap().clear_where();
    assert_eq!(sql(&q), "SELECT * FROM \"posts\"");
}
