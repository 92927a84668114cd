//! Tests for INSERT, UPDATE, DELETE, table and index compilation.

mod common;
use common::*;

use serde_json::json;
use strata_sql::builder::ForeignKeyAction;
use strata_sql::prelude::*;
use strata_sql::{
    Compiler, DeleteQueryBuilder, GenericCompiler, IndexQueryBuilder, InsertQueryBuilder,
    QueryContext, SqlError, SqlValue, TableQueryBuilder, UpdateQueryBuilder,
};

#[test]
fn insert_union_of_keys() {
    let mut insert = InsertQueryBuilder::new("users").unwrap();
    insert
        .values_many([
            vec![("name", json!("ann")), ("age", json!(31))],
            vec![("email", json!("bob@example.com")), ("name", json!("bob"))],
        ])
        .unwrap();
    let compiled = compile(&insert);
    assert_eq!(
        compiled.expression,
        "INSERT INTO \"users\" (\"name\", \"age\", \"email\") VALUES (?, ?, ?), (?, ?, ?)"
    );
    assert_eq!(
        compiled.bindings,
        vec![
            text("ann"),
            SqlValue::Int(31),
            SqlValue::Null,
            text("bob"),
            SqlValue::Null,
            text("bob@example.com"),
        ]
    );
}

#[test]
fn insert_from_json_object() {
    let record = json!({"name": "cy", "tags": ["a", "b"]});
    let mut insert = InsertQueryBuilder::new("users").unwrap();
    insert
        .values(record.as_object().cloned().unwrap_or_default())
        .unwrap();
    let compiled = compile(&insert);
    assert_eq!(compiled.bindings.len(), 2);
    assert!(compiled.bindings.contains(&text("[\"a\",\"b\"]")));
}

#[test]
fn insert_upsert() {
    let mut insert = InsertQueryBuilder::new("settings").unwrap();
    insert
        .values([("key", "theme"), ("value", "dark")])
        .unwrap()
        .on_conflict(["key"])
        .unwrap()
        .do_update(["value"])
        .unwrap();
    assert_eq!(
        sql(&insert),
        "INSERT INTO \"settings\" (\"key\", \"value\") VALUES (?, ?) \
         ON CONFLICT (\"key\") DO UPDATE SET \"value\" = excluded.\"value\""
    );
}

#[test]
fn insert_or_ignore() {
    let mut insert = InsertQueryBuilder::new("tags").unwrap();
    insert.values([("name", "rust")]).unwrap().or_ignore();
    assert_eq!(
        sql(&insert),
        "INSERT OR IGNORE INTO \"tags\" (\"name\") VALUES (?)"
    );
}

#[test]
fn insert_without_records_fails() {
    let insert = InsertQueryBuilder::new("users").unwrap();
    assert!(matches!(
        compile_err(&insert),
        SqlError::InvalidOperation(_)
    ));
}

#[test]
fn update_with_where() {
    let mut update = UpdateQueryBuilder::new("users").unwrap();
    update
        .set("name", "ann")
        .unwrap()
        .set("age", 32)
        .unwrap()
        .where_("id", 1)
        .unwrap();
    let compiled = compile(&update);
    assert_eq!(
        compiled.expression,
        "UPDATE \"users\" SET \"name\" = ?, \"age\" = ? WHERE \"id\" = ?"
    );
    assert_eq!(
        compiled.bindings,
        vec![text("ann"), SqlValue::Int(32), SqlValue::Int(1)]
    );
}

#[test]
fn update_without_assignments_fails() {
    let mut update = UpdateQueryBuilder::new("users").unwrap();
    update.where_("id", 1).unwrap();
    assert!(matches!(
        compile_err(&update),
        SqlError::InvalidOperation(_)
    ));
}

#[test]
fn delete_with_where() {
    let mut delete = DeleteQueryBuilder::new("sessions").unwrap();
    delete.where_op("expires_at", "<", 1_700_000_000_i64).unwrap();
    assert_eq!(
        sql(&delete),
        "DELETE FROM \"sessions\" WHERE \"expires_at\" < ?"
    );
    assert_eq!(delete.context(), QueryContext::Delete);
}

#[test]
fn create_table_every_family() {
    let mut table = TableQueryBuilder::create("samples").unwrap();
    table.big_int("id").unwrap().primary_key().auto_increment();
    table.tiny_int("tiny").unwrap();
    table.small_int("small").unwrap();
    table.medium_int("medium").unwrap().unsigned();
    table.tiny_text("tt").unwrap();
    table.medium_text("mt").unwrap();
    table.long_text("lt").unwrap().charset("utf8mb4");
    table.float("f").unwrap();
    table.double("d").unwrap();
    table.decimal("price", 10, 2).unwrap().default(0);
    table.boolean("active").unwrap().not_null().default(true);
    table.date("day").unwrap();
    table.time("at").unwrap();
    table.date_time("dt").unwrap();
    table.timestamp("ts").unwrap().default_raw("CURRENT_TIMESTAMP");
    table.json("meta").unwrap();

    assert_eq!(
        sql(&table),
        "CREATE TABLE \"samples\" (\"id\" BIGINT PRIMARY KEY AUTOINCREMENT NOT NULL, \
         \"tiny\" TINYINT, \"small\" SMALLINT, \"medium\" MEDIUMINT, \"tt\" TINYTEXT, \
         \"mt\" MEDIUMTEXT, \"lt\" LONGTEXT, \"f\" FLOAT, \"d\" DOUBLE, \
         \"price\" DECIMAL(10, 2) DEFAULT 0, \"active\" BOOLEAN NOT NULL DEFAULT TRUE, \
         \"day\" DATE, \"at\" TIME, \"dt\" DATETIME, \
         \"ts\" TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \"meta\" JSON)"
    );
}

#[test]
fn create_temporary_table_with_foreign_key() {
    let mut table = TableQueryBuilder::create("post_tags").unwrap();
    table.temporary();
    table.int("post_id").unwrap().not_null();
    table.int("tag_id").unwrap().not_null();
    table
        .foreign_key("post_id")
        .unwrap()
        .references("posts", "id")
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::Restrict);
    assert_eq!(
        sql(&table),
        "CREATE TEMPORARY TABLE \"post_tags\" (\"post_id\" INTEGER NOT NULL, \
         \"tag_id\" INTEGER NOT NULL, FOREIGN KEY (\"post_id\") REFERENCES \"posts\"(\"id\") \
         ON DELETE CASCADE ON UPDATE RESTRICT)"
    );
}

#[test]
fn create_table_without_columns_fails() {
    let table = TableQueryBuilder::create("empty").unwrap();
    assert!(matches!(
        compile_err(&table),
        SqlError::InvalidOperation(_)
    ));
}

#[test]
fn index_validation_happens_at_compile() {
    let mut index = IndexQueryBuilder::new();
    index.table("users").columns(["email"]);
    assert!(matches!(
        compile_err(&index),
        SqlError::InvalidArgument(_)
    ));

    index.name("idx_users_email").if_not_exists();
    assert_eq!(
        sql(&index),
        "CREATE INDEX IF NOT EXISTS \"idx_users_email\" ON \"users\" (\"email\")"
    );
}

struct SelectOnly(GenericCompiler);

impl Compiler for SelectOnly {
    fn dialect(&self) -> &dyn strata_sql::Dialect {
        self.0.dialect()
    }

    fn compile_select(
        &self,
        query: &strata_sql::SelectQueryBuilder,
    ) -> strata_sql::Result<strata_sql::CompiledQuery> {
        self.0.compile_select(query)
    }
}

#[test]
fn unsupported_kinds_report_not_implemented() {
    let compiler = SelectOnly(GenericCompiler::new());
    let delete = DeleteQueryBuilder::new("users").unwrap();
    assert!(matches!(
        delete.compile(&compiler),
        Err(SqlError::NotImplemented(_))
    ));
    let select = strata_sql::SelectQueryBuilder::new("users").unwrap();
    assert!(select.compile(&compiler).is_ok());
}
