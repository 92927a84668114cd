//! Hydration middlewares.
//!
//! Every executed query runs its rows through an ordered middleware list:
//! `after_data` rewrites the raw rows, `model_creation` may pick the
//! instance a row becomes, and `after_hydration` runs once the models exist,
//! returning a [`Splice`] applied to each of them.
//!
//! The built-in list is discrimination first, then the join transform, then
//! one middleware per populated relation in populate order.

mod discrimination;
mod join_transform;
mod many_to_many;
mod one_to_many;
mod recursive;
mod scoped;

use std::collections::{HashMap, HashSet};

use futures::future::{self, BoxFuture, FutureExt};
use strata_sql::{SqlValue, ToSqlValue};

use crate::error::Result;
use crate::model::{key_of, Model, RelationValue, Row};
use crate::orm::Orm;

pub use discrimination::DiscriminationMiddleware;
pub use join_transform::JoinTransformMiddleware;
pub(crate) use many_to_many::ManyToManyMiddleware;
pub(crate) use one_to_many::OneToManyMiddleware;
pub(crate) use recursive::RecursiveMiddleware;
pub(crate) use scoped::ScopedMiddleware;

/// Applies hydration results to one model.
pub type Splice = Box<dyn Fn(&mut dyn Model) -> Result<()> + Send>;

/// One stage of the hydration pipeline. Every hook defaults to a no-op.
pub trait Middleware: Send + Sync {
    /// Short name used in traces.
    fn name(&self) -> &'static str;

    /// Rewrites the raw rows before any model exists.
    fn after_data(&self, rows: Vec<Row>) -> Result<Vec<Row>> {
        Ok(rows)
    }

    /// Returns the instance a row materializes as. The first middleware
    /// returning one wins; otherwise the declared model is created.
    fn model_creation(&self, row: &Row) -> Option<Box<dyn Model>> {
        let _ = row;
        None
    }

    /// Resolves data for the hydrated `owners`.
    ///
    /// The returned splice is applied to every owner after all middlewares
    /// of the query completed.
    fn after_hydration<'a>(
        self: Box<Self>,
        orm: &'a Orm,
        owners: &[&dyn Model],
    ) -> BoxFuture<'a, Result<Option<Splice>>> {
        let _ = (orm, owners);
        future::ready(Ok(None)).boxed()
    }
}

/// Distinct non-null values of `field` across `owners`, as bindings.
pub(crate) fn owner_keys(owners: &[&dyn Model], field: &str) -> Vec<SqlValue> {
    let mut seen = HashSet::new();
    owners
        .iter()
        .filter_map(|owner| owner.get(field))
        .filter(|value| key_of(value).is_some_and(|key| seen.insert(key)))
        .map(|value| value.to_sql_value())
        .collect()
}

/// Sets relation `name` on every owner to the models grouped under its
/// `primary_key`; owners without a group get an empty list.
pub(crate) fn grouped_splice(
    relation: String,
    primary_key: String,
    groups: HashMap<String, Vec<Box<dyn Model>>>,
) -> Splice {
    Box::new(move |owner: &mut dyn Model| {
        let related = owner
            .get(&primary_key)
            .as_ref()
            .and_then(key_of)
            .and_then(|key| groups.get(&key))
            .cloned()
            .unwrap_or_default();
        owner
            .relations_mut()
            .set(relation.clone(), RelationValue::Many(related));
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entity;
    use serde_json::json;

    #[test]
    fn test_owner_keys_are_distinct_and_non_null() {
        let owners: Vec<Box<dyn Model>> = [
            json!({"id": 1}),
            json!({"id": null}),
            json!({"id": 1}),
            json!({"id": 2}),
            json!({}),
        ]
        .into_iter()
        .map(|row| {
            let mut entity = Entity::new("User");
            entity.hydrate(row.as_object().cloned().unwrap()).unwrap();
            Box::new(entity) as Box<dyn Model>
        })
        .collect();
        let refs: Vec<&dyn Model> = owners.iter().map(|owner| &**owner).collect();
        assert_eq!(
            owner_keys(&refs, "id"),
            vec![SqlValue::Int(1), SqlValue::Int(2)]
        );
    }
}
