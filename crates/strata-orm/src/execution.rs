//! The execution pipeline of model queries.
//!
//! 1. compile and run the select
//! 2. `after_data` of every middleware, in order
//! 3. materialize one model per row, joined relations included
//! 4. `after_hydration` of every middleware, concurrently
//! 5. apply the returned splices to every model, in middleware order
//!
//! Relation middlewares call back into this pipeline for their own queries.

use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::Value;
use strata_sql::builder::ResultArity;
use strata_sql::QueryContext;
use tracing::trace;

use crate::error::{OrmError, Result};
use crate::middleware::{DiscriminationMiddleware, JoinTransformMiddleware, Middleware};
use crate::model::{Model, RelationValue, Row};
use crate::orm::Orm;
use crate::query::ModelQuery;
use crate::registry::ModelRegistry;
use crate::relations::NestedModel;

/// Result of an executed query, shaped by its `first` / `first_or_fail`
/// setting.
#[derive(Debug, Clone)]
pub enum Fetched<T = Box<dyn Model>> {
    /// Every result.
    All(Vec<T>),
    /// The first result, if any.
    First(Option<T>),
}

impl<T> Fetched<T> {
    pub(crate) fn from_arity(arity: ResultArity, items: Vec<T>) -> Result<Self> {
        match arity {
            ResultArity::Many => Ok(Self::All(items)),
            ResultArity::First => Ok(Self::First(items.into_iter().next())),
            ResultArity::FirstOrFail => items
                .into_iter()
                .next()
                .map(|item| Self::First(Some(item)))
                .ok_or(OrmError::EmptyResult),
        }
    }

    /// Returns every result; a first result becomes a list of at most one.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::All(items) => items,
            Self::First(item) => item.into_iter().collect(),
        }
    }

    /// Returns the first result.
    #[must_use]
    pub fn into_first(self) -> Option<T> {
        match self {
            Self::All(items) => items.into_iter().next(),
            Self::First(item) => item,
        }
    }

    /// Returns the number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::All(items) => items.len(),
            Self::First(item) => usize::from(item.is_some()),
        }
    }

    /// Returns whether nothing was fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Materialized models of one query, with the junction key of each model
/// when the query targets a many-to-many relation.
pub(crate) struct Batch {
    pub models: Vec<Box<dyn Model>>,
    pub pivots: Vec<Option<Value>>,
}

pub(crate) fn run(query: ModelQuery, orm: &Orm) -> BoxFuture<'_, Result<Batch>> {
    async move {
        let compiled = query.compile(orm.compiler())?;
        let mut rows = orm
            .run(&compiled, QueryContext::Select)
            .await?
            .into_rows()?;

        let ModelQuery {
            registry,
            descriptor,
            mappings,
            nested,
            middlewares: relations,
            pivot,
            ..
        } = query;

        let mut middlewares: Vec<Box<dyn Middleware>> = Vec::new();
        if descriptor.discrimination.is_some() {
            middlewares.push(Box::new(DiscriminationMiddleware::new(
                Arc::clone(&registry),
                descriptor.name.clone(),
            )));
        }
        if !mappings.is_empty() {
            middlewares.push(Box::new(JoinTransformMiddleware::new(mappings)));
        }
        middlewares.extend(relations);

        for middleware in &middlewares {
            trace!(middleware = middleware.name(), rows = rows.len(), "after data");
            rows = middleware.after_data(rows)?;
        }

        let pivots: Vec<Option<Value>> = match &pivot {
            Some(pivot) => rows.iter_mut().map(|row| pivot.take(row)).collect(),
            None => Vec::new(),
        };

        let mut models = Vec::with_capacity(rows.len());
        for row in rows {
            models.push(materialize(
                &registry,
                &descriptor.name,
                row,
                &nested,
                &middlewares,
            )?);
        }

        let pending: Vec<_> = {
            let owners: Vec<&dyn Model> = models.iter().map(|model| &**model).collect();
            middlewares
                .into_iter()
                .map(|middleware| middleware.after_hydration(orm, &owners))
                .collect()
        };
        // Every branch must succeed before any model is touched.
        let splices = try_join_all(pending).await?;
        for splice in splices.into_iter().flatten() {
            for model in &mut models {
                splice(model.as_mut())?;
            }
        }

        trace!(model = %descriptor.name, models = models.len(), "hydrated");
        Ok(Batch { models, pivots })
    }
    .boxed()
}

fn materialize(
    registry: &ModelRegistry,
    model: &str,
    mut row: Row,
    nested: &[NestedModel],
    middlewares: &[Box<dyn Middleware>],
) -> Result<Box<dyn Model>> {
    let relations = take_nested(registry, &mut row, nested)?;
    let mut instance = match middlewares
        .iter()
        .find_map(|middleware| middleware.model_creation(&row))
    {
        Some(instance) => instance,
        None => registry.create(model)?,
    };
    instance.hydrate(row)?;
    for (name, value) in relations {
        instance.relations_mut().set(name, value);
    }
    Ok(instance)
}

fn take_nested(
    registry: &ModelRegistry,
    row: &mut Row,
    nested: &[NestedModel],
) -> Result<Vec<(String, RelationValue)>> {
    let mut relations = Vec::with_capacity(nested.len());
    for shape in nested {
        let related = match row.remove(&shape.name) {
            Some(Value::Object(object)) => materialize_joined(registry, object, shape)?,
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(OrmError::Hydration(format!(
                    "relation {} holds {other} instead of an object",
                    shape.name
                )))
            }
        };
        relations.push((shape.name.clone(), RelationValue::One(related)));
    }
    Ok(relations)
}

fn materialize_joined(
    registry: &ModelRegistry,
    mut row: Row,
    shape: &NestedModel,
) -> Result<Option<Box<dyn Model>>> {
    let relations = take_nested(registry, &mut row, &shape.children)?;
    // A LEFT JOIN without a match yields nothing but NULLs.
    let missed = row.values().all(Value::is_null)
        && relations
            .iter()
            .all(|(_, value)| matches!(value, RelationValue::One(None)));
    if missed {
        return Ok(None);
    }
    let mut instance = registry.instantiate(&shape.model, &row)?;
    instance.hydrate(row)?;
    for (name, value) in relations {
        instance.relations_mut().set(name, value);
    }
    Ok(Some(instance))
}
