use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use strata_sql::ast::{InStatement, Statement};
use tracing::trace;

use super::{grouped_splice, owner_keys, Middleware, Splice};
use crate::error::Result;
use crate::execution;
use crate::model::{key_of, Model};
use crate::orm::Orm;
use crate::query::ModelQuery;

/// Loads the targets of a `ManyToMany` relation through the junction table
/// and groups them by the junction's source key.
pub(crate) struct ManyToManyMiddleware {
    relation: String,
    primary_key: String,
    junction_alias: String,
    source_key: String,
    query: ModelQuery,
}

impl ManyToManyMiddleware {
    pub fn new(
        relation: String,
        primary_key: String,
        junction_alias: String,
        source_key: String,
        query: ModelQuery,
    ) -> Self {
        Self {
            relation,
            primary_key,
            junction_alias,
            source_key,
            query,
        }
    }
}

impl Middleware for ManyToManyMiddleware {
    fn name(&self) -> &'static str {
        "many_to_many"
    }

    fn after_hydration<'a>(
        self: Box<Self>,
        orm: &'a Orm,
        owners: &[&dyn Model],
    ) -> BoxFuture<'a, Result<Option<Splice>>> {
        let keys = owner_keys(owners, &self.primary_key);
        let Self {
            relation,
            primary_key,
            junction_alias,
            source_key,
            mut query,
        } = *self;

        async move {
            let mut groups: HashMap<String, Vec<Box<dyn Model>>> = HashMap::new();
            if keys.is_empty() {
                trace!(relation = %relation, "no owner keys, skipping query");
            } else {
                query.restrict(Statement::In(InStatement {
                    column: source_key,
                    table_alias: Some(junction_alias),
                    values: keys,
                    negated: false,
                }))?;
                let batch = execution::run(query, orm).await?;
                trace!(relation = %relation, targets = batch.models.len(), "many-to-many loaded");
                // A target linked to several owners comes back once per link.
                for (model, pivot) in batch.models.into_iter().zip(batch.pivots) {
                    if let Some(key) = pivot.as_ref().and_then(key_of) {
                        groups.entry(key).or_default().push(model);
                    }
                }
            }
            Ok(Some(grouped_splice(relation, primary_key, groups)))
        }
        .boxed()
    }
}
