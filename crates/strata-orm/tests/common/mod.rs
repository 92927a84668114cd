#![allow(dead_code)]

use std::any::Any;
use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use strata_orm::{
    DiscriminationMap, Driver, JunctionDescriptor, Model, ModelDescriptor, ModelRegistry,
    OrmError, QueryContext, QueryOutput, RelationDescriptor, Relations, Result, Row, SqlValue,
};

/// One expression seen by the mock driver.
#[derive(Debug, Clone)]
pub struct Executed {
    pub expression: String,
    pub bindings: Vec<SqlValue>,
}

enum Response {
    Rows(Vec<Row>),
    Fail(String),
}

#[derive(Default)]
struct MockState {
    responses: Vec<(String, Response)>,
    executed: Vec<Executed>,
}

/// Replays canned rows for expressions containing a registered fragment.
///
/// Fragments are tried in registration order; unmatched expressions return
/// no rows.
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, fragment: &str, rows: Vec<Value>) -> &Self {
        let rows = rows.into_iter().map(row).collect();
        self.state
            .lock()
            .unwrap()
            .responses
            .push((String::from(fragment), Response::Rows(rows)));
        self
    }

    pub fn fail_on(&self, fragment: &str, message: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push((String::from(fragment), Response::Fail(String::from(message))));
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn expressions(&self) -> Vec<String> {
        self.executed()
            .into_iter()
            .map(|executed| executed.expression)
            .collect()
    }

    /// Returns the one executed expression containing `fragment`.
    pub fn find(&self, fragment: &str) -> Executed {
        let matching: Vec<Executed> = self
            .executed()
            .into_iter()
            .filter(|executed| executed.expression.contains(fragment))
            .collect();
        assert_eq!(
            matching.len(),
            1,
            "expected one expression containing {fragment}, got {matching:#?}"
        );
        matching.into_iter().next().unwrap()
    }
}

impl Driver for MockDriver {
    fn execute<'a>(
        &'a self,
        expression: &'a str,
        bindings: &'a [SqlValue],
        _context: QueryContext,
    ) -> BoxFuture<'a, Result<QueryOutput>> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(Executed {
            expression: String::from(expression),
            bindings: bindings.to_vec(),
        });
        let output = match state
            .responses
            .iter()
            .find(|(fragment, _)| expression.contains(fragment.as_str()))
        {
            Some((_, Response::Rows(rows))) => Ok(QueryOutput::Rows(rows.clone())),
            Some((_, Response::Fail(message))) => Err(OrmError::Driver(message.clone())),
            None => Ok(QueryOutput::Rows(Vec::new())),
        };
        future::ready(output).boxed()
    }
}

/// Routes pipeline traces to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(row) => row,
        other => panic!("Expected a JSON object, got {other}"),
    }
}

/// Subtype of `Item` picked by discrimination.
#[derive(Debug, Clone, Default)]
pub struct SubtypeA {
    pub fields: Row,
    pub relations: Relations,
}

impl Model for SubtypeA {
    fn model_name(&self) -> &str {
        "SubtypeA"
    }

    fn hydrate(&mut self, row: Row) -> Result<()> {
        self.fields.extend(row);
        Ok(())
    }

    fn dehydrate(&self) -> Row {
        self.fields.clone()
    }

    fn get(&self, field: &str) -> Option<Value> {
        self.fields.get(field).cloned()
    }

    fn relations(&self) -> &Relations {
        &self.relations
    }

    fn relations_mut(&mut self) -> &mut Relations {
        &mut self.relations
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn boxed_clone(&self) -> Box<dyn Model> {
        Box::new(self.clone())
    }
}

/// Users, companies, posts, comments, tags, categories and items.
pub fn blog_registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry
        .register(
            ModelDescriptor::new("User", "users")
                .columns(["id", "name", "company_id"])
                .relation(RelationDescriptor::belongs_to(
                    "company", "User", "Company", "company_id", "id",
                ))
                .relation(RelationDescriptor::one_to_many(
                    "posts", "User", "Post", "user_id", "id",
                )),
        )
        .unwrap()
        .register(ModelDescriptor::new("Company", "companies").columns(["id", "name"]))
        .unwrap()
        .register(
            ModelDescriptor::new("Post", "posts")
                .columns(["id", "user_id", "title"])
                .relation(RelationDescriptor::belongs_to(
                    "author", "Post", "User", "user_id", "id",
                ))
                .relation(RelationDescriptor::one_to_many(
                    "comments", "Post", "Comment", "post_id", "id",
                ))
                .relation(RelationDescriptor::many_to_many(
                    "tags",
                    "Post",
                    "Tag",
                    JunctionDescriptor {
                        table: String::from("post_tags"),
                        source_key: String::from("post_id"),
                        target_key: String::from("tag_id"),
                    },
                )),
        )
        .unwrap()
        .register(ModelDescriptor::new("Comment", "comments").columns(["id", "post_id", "body"]))
        .unwrap()
        .register(ModelDescriptor::new("Tag", "tags").columns(["id", "label"]))
        .unwrap()
        .register(
            ModelDescriptor::new("Category", "categories")
                .columns(["id", "parent_id", "name"])
                .relation(
                    RelationDescriptor::belongs_to(
                        "parent", "Category", "Category", "parent_id", "id",
                    )
                    .recursive()
                    .unwrap(),
                ),
        )
        .unwrap()
        .register(
            ModelDescriptor::new("Item", "items")
                .columns(["id", "type"])
                .discriminated(DiscriminationMap::new("type").variant("one", "SubtypeA")),
        )
        .unwrap()
        .register_subtype("SubtypeA", || Box::new(SubtypeA::default()));
    registry
}

/// Values of `field` across `models`, in order.
pub fn field_values(models: &[Box<dyn Model>], field: &str) -> Vec<Value> {
    models
        .iter()
        .map(|model| model.get(field).unwrap_or(Value::Null))
        .collect()
}
