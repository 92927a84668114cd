//! Model trait and the dynamic entity.
//!
//! Rows come back from drivers as JSON maps. A [`Model`] receives its row
//! through [`Model::hydrate`] and carries the relations spliced onto it
//! afterwards. [`Entity`] is the model every registered descriptor gets
//! unless a factory for a dedicated type is supplied.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::Result;

/// One result row, keyed by output column name.
pub type Row = Map<String, Value>;

/// A materialized row.
///
/// Implementations must be cheap to clone: relation values are cloned when
/// one related model is attached to several owners.
///
/// # Example
///
/// ```rust
/// use std::any::Any;
///
/// use serde_json::Value;
/// use strata_orm::{Model, Relations, Result, Row};
///
/// #[derive(Debug, Clone, Default)]
/// struct Admin {
///     fields: Row,
///     relations: Relations,
/// }
///
/// impl Model for Admin {
///     fn model_name(&self) -> &str {
///         "Admin"
///     }
///
///     fn hydrate(&mut self, row: Row) -> Result<()> {
///         self.fields.extend(row);
///         Ok(())
///     }
///
///     fn dehydrate(&self) -> Row {
///         self.fields.clone()
///     }
///
///     fn get(&self, field: &str) -> Option<Value> {
///         self.fields.get(field).cloned()
///     }
///
///     fn relations(&self) -> &Relations {
///         &self.relations
///     }
///
///     fn relations_mut(&mut self) -> &mut Relations {
///         &mut self.relations
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
///
///     fn boxed_clone(&self) -> Box<dyn Model> {
///         Box::new(self.clone())
///     }
/// }
/// ```
pub trait Model: fmt::Debug + Send + Sync + 'static {
    /// Returns the registered name of the model.
    fn model_name(&self) -> &str;

    /// Fills the model from a row.
    fn hydrate(&mut self, row: Row) -> Result<()>;

    /// Returns the model's own fields as a row, relations excluded.
    fn dehydrate(&self) -> Row;

    /// Returns the value of one field.
    fn get(&self, field: &str) -> Option<Value>;

    /// Returns the populated relations.
    fn relations(&self) -> &Relations;

    /// Returns the populated relations mutably.
    fn relations_mut(&mut self) -> &mut Relations;

    /// Returns the model as `Any`, for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Clones the model behind a new box.
    fn boxed_clone(&self) -> Box<dyn Model>;
}

impl Clone for Box<dyn Model> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

impl dyn Model {
    /// Downcasts to a concrete model type.
    #[must_use]
    pub fn downcast_ref<T: Model>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns whether the model is of type `T`.
    #[must_use]
    pub fn is<T: Model>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Renders the model and its relations as one JSON object.
    ///
    /// Relations are nested under their names; an empty single relation is
    /// `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = self.dehydrate();
        for (name, value) in self.relations().iter() {
            let rendered = match value {
                RelationValue::One(Some(model)) => model.to_json(),
                RelationValue::One(None) => Value::Null,
                RelationValue::Many(models) => {
                    Value::Array(models.iter().map(|model| model.to_json()).collect())
                }
            };
            object.insert(name.clone(), rendered);
        }
        Value::Object(object)
    }
}

/// The value of one populated relation.
#[derive(Debug, Clone)]
pub enum RelationValue {
    /// A single related model, `None` when nothing matched.
    One(Option<Box<dyn Model>>),
    /// Every related model.
    Many(Vec<Box<dyn Model>>),
}

/// Populated relations of a model, by relation name.
#[derive(Debug, Clone, Default)]
pub struct Relations {
    values: BTreeMap<String, RelationValue>,
}

impl Relations {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a relation, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: RelationValue) {
        self.values.insert(name.into(), value);
    }

    /// Returns a relation value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RelationValue> {
        self.values.get(name)
    }

    /// Removes a relation.
    pub fn remove(&mut self, name: &str) -> Option<RelationValue> {
        self.values.remove(name)
    }

    /// Returns the model of a single relation.
    #[must_use]
    pub fn one(&self, name: &str) -> Option<&(dyn Model + 'static)> {
        match self.values.get(name) {
            Some(RelationValue::One(Some(model))) => Some(model.as_ref()),
            _ => None,
        }
    }

    /// Returns the model of a single relation mutably.
    pub fn one_mut(&mut self, name: &str) -> Option<&mut (dyn Model + 'static)> {
        match self.values.get_mut(name) {
            Some(RelationValue::One(Some(model))) => Some(model.as_mut()),
            _ => None,
        }
    }

    /// Returns the models of a list relation.
    #[must_use]
    pub fn many(&self, name: &str) -> Option<&[Box<dyn Model>]> {
        match self.values.get(name) {
            Some(RelationValue::Many(models)) => Some(models),
            _ => None,
        }
    }

    /// Returns whether a relation with this name was set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns whether no relation was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates relations in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RelationValue)> {
        self.values.iter()
    }
}

/// Schemaless model backed by its row.
#[derive(Debug, Clone, Default)]
pub struct Entity {
    model: String,
    fields: Row,
    relations: Relations,
}

impl Entity {
    /// Creates an empty entity of the named model.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            fields: Row::new(),
            relations: Relations::new(),
        }
    }

    /// Returns the hydrated fields.
    #[must_use]
    pub fn fields(&self) -> &Row {
        &self.fields
    }
}

impl Model for Entity {
    fn model_name(&self) -> &str {
        &self.model
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

/// Normalizes a key value for matching rows across queries.
///
/// `NULL` never matches anything. Numbers and strings compare by their text,
/// so an integer key matches the same integer read back as text.
pub(crate) fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(model: &str, row: Value) -> Box<dyn Model> {
        let mut entity = Entity::new(model);
        if let Value::Object(row) = row {
            entity.hydrate(row).unwrap();
        }
        Box::new(entity)
    }

    #[test]
    fn test_entity_hydrate_and_get() {
        let model = entity("User", json!({"id": 1, "name": "ann"}));
        assert_eq!(model.model_name(), "User");
        assert_eq!(model.get("name"), Some(json!("ann")));
        assert_eq!(model.get("missing"), None);
        assert!(model.is::<Entity>());
    }

    #[test]
    fn test_to_json_nests_relations() {
        let mut post = entity("Post", json!({"id": 7}));
        post.relations_mut().set(
            "author",
            RelationValue::One(Some(entity("User", json!({"id": 1})))),
        );
        post.relations_mut().set("editor", RelationValue::One(None));
        post.relations_mut().set(
            "comments",
            RelationValue::Many(vec![entity("Comment", json!({"id": 3}))]),
        );
        assert_eq!(
            post.to_json(),
            json!({
                "id": 7,
                "author": {"id": 1},
                "editor": null,
                "comments": [{"id": 3}],
            })
        );
    }

    #[test]
    fn test_one_mut_reaches_nested_model() {
        let mut post = entity("Post", json!({"id": 7}));
        post.relations_mut().set(
            "author",
            RelationValue::One(Some(entity("User", json!({"id": 1})))),
        );
        let author = post.relations_mut().one_mut("author").unwrap();
        author
            .relations_mut()
            .set("posts", RelationValue::Many(Vec::new()));
        assert_eq!(
            post.relations()
                .one("author")
                .and_then(|a| a.relations().many("posts"))
                .map(<[_]>::len),
            Some(0)
        );
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(key_of(&json!(1)), Some(String::from("1")));
        assert_eq!(key_of(&json!("1")), Some(String::from("1")));
        assert_eq!(key_of(&Value::Null), None);
    }
}
