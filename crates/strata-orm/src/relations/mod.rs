//! Relation objects.
//!
//! Populating a relation builds a relation query for the target model,
//! lets the caller refine it, then attaches it to the owning query: a
//! BelongsTo is joined into the owner, the other kinds register a hydration
//! middleware that runs the relation query once the owners are known.

mod belongs_to;
mod many_to_many;
mod one_to_many;
mod recursive;

use std::fmt;

use serde_json::Value;
use strata_sql::builder::ColumnsClause;

use crate::descriptor::{RelationDescriptor, RelationKind};
use crate::error::Result;
use crate::model::Row;
use crate::query::ModelQuery;

pub(crate) use belongs_to::BelongsTo;
pub(crate) use many_to_many::ManyToMany;
pub(crate) use one_to_many::OneToMany;
pub(crate) use recursive::BelongsToRecursive;

/// Alias of a root query that needs one to qualify its columns.
pub const ROOT_ALIAS: &str = "$Source$";

/// Field carrying the junction row of a many-to-many target.
pub const JUNCTION_MODEL: &str = "JunctionModel";

/// Position of a relation query below the root query, as relation names.
///
/// Renders as `$author$.$company$`; the root renders as [`ROOT_ALIAS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AliasPath {
    segments: Vec<String>,
}

impl AliasPath {
    /// The root query's path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// The path of relation `name` below this one.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(String::from(name));
        Self { segments }
    }

    /// Returns the relation names, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns whether this is the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for AliasPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(ROOT_ALIAS);
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            write!(f, "${segment}$")?;
        }
        Ok(())
    }
}

/// Where one flat output column of a joined relation goes.
///
/// `path` is relative to the query that runs the join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Output column name, e.g. `$author$.name`.
    pub key: String,
    /// Relation names leading to the nested object.
    pub path: Vec<String>,
    /// Field name inside the nested object.
    pub field: String,
}

impl ColumnMapping {
    pub(crate) fn new(key: String, path: Vec<String>, field: String) -> Self {
        Self { key, path, field }
    }

    /// Moves the mapping one relation deeper.
    pub(crate) fn prefixed(mut self, segment: &str) -> Self {
        self.path.insert(0, String::from(segment));
        self
    }
}

/// A joined relation materialized as a nested model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedModel {
    /// Relation name, also the nested object's field.
    pub name: String,
    /// Target model name.
    pub model: String,
    /// Relations joined below this one.
    pub children: Vec<NestedModel>,
}

/// The synthetic field holding the junction row, taken off each target row
/// before it is materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pivot {
    pub field: String,
    pub key: String,
}

impl Pivot {
    /// Removes the junction object and returns its key.
    pub fn take(&self, row: &mut Row) -> Option<Value> {
        match row.remove(&self.field) {
            Some(Value::Object(mut junction)) => junction.remove(&self.key),
            _ => None,
        }
    }
}

/// One populated relation, ready to be attached to its owning query.
pub(crate) enum OrmRelation {
    BelongsTo(BelongsTo),
    BelongsToRecursive(BelongsToRecursive),
    OneToMany(OneToMany),
    ManyToMany(ManyToMany),
}

impl OrmRelation {
    pub fn new(descriptor: RelationDescriptor, query: ModelQuery) -> Self {
        match descriptor.kind {
            RelationKind::One if descriptor.recursive => {
                Self::BelongsToRecursive(BelongsToRecursive::new(descriptor, query))
            }
            RelationKind::One => Self::BelongsTo(BelongsTo::new(descriptor, query)),
            RelationKind::Many => Self::OneToMany(OneToMany::new(descriptor, query)),
            RelationKind::ManyToMany => Self::ManyToMany(ManyToMany::new(descriptor, query)),
        }
    }

    pub fn attach(self, owner: &mut ModelQuery) -> Result<()> {
        match self {
            Self::BelongsTo(relation) => relation.attach(owner),
            Self::BelongsToRecursive(relation) => relation.attach(owner),
            Self::OneToMany(relation) => relation.attach(owner),
            Self::ManyToMany(relation) => relation.attach(owner),
        }
    }
}

/// Selects the relation's own wildcard when nothing was selected, and makes
/// sure `key` is part of an explicit column list.
fn ensure_columns(query: &mut ModelQuery, key: &str) -> Result<()> {
    let columns = query.builder.columns_builder();
    let empty = columns.statements().is_empty();
    let missing_key = !columns.statements().iter().any(|statement| {
        statement.is_wildcard()
            || statement
                .as_column()
                .is_some_and(|column| column.column() == key)
    });

    if empty {
        query.builder.select("*")?;
    } else if missing_key {
        query.builder.select(key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alias_path_rendering() {
        let root = AliasPath::root();
        assert_eq!(root.to_string(), "$Source$");
        let company = root.child("author").child("company");
        assert_eq!(company.to_string(), "$author$.$company$");
        assert_eq!(company.segments(), &["author", "company"]);
        assert!(!company.is_root());
    }

    #[test]
    fn test_pivot_take_removes_field() {
        let pivot = Pivot {
            field: String::from(JUNCTION_MODEL),
            key: String::from("post_id"),
        };
        let mut row = json!({"id": 10, "JunctionModel": {"post_id": 1, "tag_id": 10}})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(pivot.take(&mut row), Some(json!(1)));
        assert!(!row.contains_key(JUNCTION_MODEL));
    }

    #[test]
    fn test_mapping_prefix() {
        let mapping = ColumnMapping::new(
            String::from("$author$.$company$.name"),
            vec![String::from("company")],
            String::from("name"),
        )
        .prefixed("author");
        assert_eq!(mapping.path, vec!["author", "company"]);
    }
}
