//! Model and relation descriptors.
//!
//! Descriptors are plain data, usually deserialized from configuration.
//! They are checked once when registered.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{OrmError, Result};
use crate::model::{key_of, Row};

fn default_primary_key() -> String {
    String::from("id")
}

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The source row points at one target row.
    One,
    /// Target rows point at the source row.
    Many,
    /// Source and target rows are linked through a junction table.
    ManyToMany,
}

/// The junction table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionDescriptor {
    /// Junction table name.
    pub table: String,
    /// Junction column holding the source key.
    pub source_key: String,
    /// Junction column holding the target key.
    pub target_key: String,
}

/// A declared association between two models.
///
/// Key meaning depends on the kind:
/// - `One`: `source.foreign_key` references `target.primary_key`.
/// - `Many`: `target.foreign_key` references `source.primary_key`.
/// - `ManyToMany`: `junction.source_key` references `source.primary_key` and
///   `junction.target_key` references `target.foreign_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Relation name, unique per source model.
    pub name: String,
    /// Cardinality.
    pub kind: RelationKind,
    /// Follows the relation repeatedly through the same table.
    #[serde(default)]
    pub recursive: bool,
    /// Source model name.
    pub source: String,
    /// Target model name.
    pub target: String,
    /// Foreign key column.
    pub foreign_key: String,
    /// Primary key column.
    pub primary_key: String,
    /// Junction table, many-to-many only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junction: Option<JunctionDescriptor>,
}

impl RelationDescriptor {
    /// Creates a `One` relation.
    #[must_use]
    pub fn belongs_to(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::One,
            recursive: false,
            source: source.into(),
            target: target.into(),
            foreign_key: foreign_key.into(),
            primary_key: primary_key.into(),
            junction: None,
        }
    }

    /// Creates a `Many` relation.
    #[must_use]
    pub fn one_to_many(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::Many,
            ..Self::belongs_to(name, source, target, foreign_key, primary_key)
        }
    }

    /// Creates a `ManyToMany` relation.
    #[must_use]
    pub fn many_to_many(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        junction: JunctionDescriptor,
    ) -> Self {
        Self {
            kind: RelationKind::ManyToMany,
            junction: Some(junction),
            ..Self::belongs_to(name, source, target, "id", "id")
        }
    }

    /// Sets the target key matched by the junction (many-to-many) or the
    /// foreign key column.
    #[must_use]
    pub fn with_foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = foreign_key.into();
        self
    }

    /// Sets the primary key column.
    #[must_use]
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Flags the relation as recursive.
    ///
    /// Only `One` relations can be followed recursively.
    pub fn recursive(mut self) -> Result<Self> {
        if self.kind != RelationKind::One {
            return Err(OrmError::InvalidOperation(format!(
                "relation {} is {:?}; only One relations can be recursive",
                self.name, self.kind
            )));
        }
        self.recursive = true;
        Ok(self)
    }

    /// Checks the descriptor for inconsistencies.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(OrmError::InvalidDescriptor(format!(
                "relation {}: {reason}",
                self.name
            )))
        };

        if self.name.trim().is_empty() {
            return Err(OrmError::InvalidDescriptor(String::from(
                "relation name is empty",
            )));
        }
        if self.foreign_key.trim().is_empty() || self.primary_key.trim().is_empty() {
            return invalid("keys must not be empty");
        }
        if self.recursive && self.kind != RelationKind::One {
            return invalid("only One relations can be recursive");
        }
        if self.recursive && self.source != self.target {
            return invalid("a recursive relation must target its own model");
        }
        match (&self.kind, &self.junction) {
            (RelationKind::ManyToMany, None) => invalid("many-to-many needs a junction"),
            (RelationKind::ManyToMany, Some(junction))
                if junction.table.trim().is_empty()
                    || junction.source_key.trim().is_empty()
                    || junction.target_key.trim().is_empty() =>
            {
                invalid("junction table and keys must not be empty")
            }
            (RelationKind::One | RelationKind::Many, Some(_)) => {
                invalid("only many-to-many relations have a junction")
            }
            _ => Ok(()),
        }
    }
}

/// Maps values of one field to the model each row materializes as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscriminationMap {
    /// Field holding the discriminating value.
    pub field: String,
    /// Field value to model name.
    pub variants: BTreeMap<String, String>,
}

impl DiscriminationMap {
    /// Creates an empty map over `field`.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            variants: BTreeMap::new(),
        }
    }

    /// Maps `value` to the model named `model`.
    #[must_use]
    pub fn variant(mut self, value: impl Into<String>, model: impl Into<String>) -> Self {
        self.variants.insert(value.into(), model.into());
        self
    }

    /// Returns the model name registered for the row's field value.
    #[must_use]
    pub fn resolve(&self, row: &Row) -> Option<&str> {
        let value = key_of(row.get(&self.field)?)?;
        self.variants.get(&value).map(String::as_str)
    }
}

/// Static description of a model: its table, columns and relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model name.
    pub name: String,
    /// Table name.
    pub table: String,
    /// Primary key column.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Column names, used when the model is joined into another query.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Relations declared on the model.
    #[serde(default)]
    pub relations: Vec<RelationDescriptor>,
    /// Subtype selection by field value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrimination: Option<DiscriminationMap>,
}

impl ModelDescriptor {
    /// Creates a descriptor with an `id` primary key.
    #[must_use]
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: default_primary_key(),
            columns: Vec::new(),
            relations: Vec::new(),
            discrimination: None,
        }
    }

    /// Sets the primary key column.
    #[must_use]
    pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Sets the column list.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Declares a relation. Its source is set to this model.
    #[must_use]
    pub fn relation(mut self, mut relation: RelationDescriptor) -> Self {
        relation.source.clone_from(&self.name);
        self.relations.push(relation);
        self
    }

    /// Sets the discrimination map.
    #[must_use]
    pub fn discriminated(mut self, map: DiscriminationMap) -> Self {
        self.discrimination = Some(map);
        self
    }

    /// Looks up a relation by name.
    #[must_use]
    pub fn find_relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    /// Checks the descriptor and all its relations.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.table.trim().is_empty() {
            return Err(OrmError::InvalidDescriptor(String::from(
                "model name and table must not be empty",
            )));
        }
        if self.primary_key.trim().is_empty() {
            return Err(OrmError::InvalidDescriptor(format!(
                "model {} has an empty primary key",
                self.name
            )));
        }

        let mut names = BTreeSet::new();
        for relation in &self.relations {
            relation.validate()?;
            if relation.source != self.name {
                return Err(OrmError::InvalidDescriptor(format!(
                    "relation {} is declared on {} but has source {}",
                    relation.name, self.name, relation.source
                )));
            }
            if !names.insert(relation.name.as_str()) {
                return Err(OrmError::InvalidDescriptor(format!(
                    "model {} declares relation {} twice",
                    self.name, relation.name
                )));
            }
        }

        if let Some(map) = &self.discrimination {
            if map.field.trim().is_empty() {
                return Err(OrmError::InvalidDescriptor(format!(
                    "model {} discriminates on an empty field",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recursive_requires_one() {
        let many = RelationDescriptor::one_to_many("posts", "User", "Post", "user_id", "id");
        assert!(matches!(
            many.recursive(),
            Err(OrmError::InvalidOperation(_))
        ));

        let parent = RelationDescriptor::belongs_to(
            "parent",
            "Category",
            "Category",
            "parent_id",
            "id",
        )
        .recursive()
        .unwrap();
        assert!(parent.recursive);
        assert!(parent.validate().is_ok());
    }

    #[test]
    fn test_duplicate_relation_rejected() {
        let descriptor = ModelDescriptor::new("Post", "posts")
            .relation(RelationDescriptor::belongs_to(
                "author", "", "User", "author_id", "id",
            ))
            .relation(RelationDescriptor::belongs_to(
                "author", "", "User", "editor_id", "id",
            ));
        assert!(matches!(
            descriptor.validate(),
            Err(OrmError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_many_to_many_needs_junction() {
        let mut relation = RelationDescriptor::many_to_many(
            "tags",
            "Post",
            "Tag",
            JunctionDescriptor {
                table: String::from("post_tags"),
                source_key: String::from("post_id"),
                target_key: String::from("tag_id"),
            },
        );
        assert!(relation.validate().is_ok());
        relation.junction = None;
        assert!(relation.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let descriptor: ModelDescriptor = serde_json::from_value(json!({
            "name": "Category",
            "table": "categories",
            "columns": ["id", "name", "parent_id"],
            "relations": [{
                "name": "parent",
                "kind": "one",
                "recursive": true,
                "source": "Category",
                "target": "Category",
                "foreign_key": "parent_id",
                "primary_key": "id"
            }],
            "discrimination": {"field": "kind", "variants": {"root": "RootCategory"}}
        }))
        .unwrap();
        assert_eq!(descriptor.primary_key, "id");
        assert!(descriptor.validate().is_ok());
        assert!(descriptor.find_relation("parent").unwrap().recursive);
    }

    #[test]
    fn test_discrimination_resolves_numbers_and_strings() {
        let map = DiscriminationMap::new("kind")
            .variant("one", "A")
            .variant("2", "B");
        let row = |value: serde_json::Value| json!({ "kind": value }).as_object().cloned().unwrap();
        assert_eq!(map.resolve(&row(json!("one"))), Some("A"));
        assert_eq!(map.resolve(&row(json!(2))), Some("B"));
        assert_eq!(map.resolve(&row(json!("zzz"))), None);
        assert_eq!(map.resolve(&Row::new()), None);
    }
}
