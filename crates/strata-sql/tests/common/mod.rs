#![allow(dead_code)]

use strata_sql::{CompiledQuery, GenericCompiler, QueryBuilder, SqlError, SqlValue};

pub fn compile(query: &impl QueryBuilder) -> CompiledQuery {
    query
        .compile(&GenericCompiler::new())
        .unwrap_or_else(|e| panic!("Failed to compile: {e:?}"))
}

pub fn compile_err(query: &impl QueryBuilder) -> SqlError {
    query
        .compile(&GenericCompiler::new())
        .expect_err("Expected a compile error")
}

pub fn sql(query: &impl QueryBuilder) -> String {
    compile(query).expression
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(String::from(s))
}

/// Counts `?` placeholders outside quoted identifiers and string literals.
pub fn placeholder_count(expression: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    for c in expression.chars() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '?') => count += 1,
            _ => {}
        }
    }
    count
}
