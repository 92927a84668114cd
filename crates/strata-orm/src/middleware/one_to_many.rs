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

/// Loads the targets of a `Many` relation with one `IN` query over the
/// owners' keys and groups them by foreign key.
pub(crate) struct OneToManyMiddleware {
    relation: String,
    foreign_key: String,
    primary_key: String,
    query: ModelQuery,
}

impl OneToManyMiddleware {
    pub fn new(
        relation: String,
        foreign_key: String,
        primary_key: String,
        query: ModelQuery,
    ) -> Self {
        Self {
            relation,
            foreign_key,
            primary_key,
            query,
        }
    }
}

impl Middleware for OneToManyMiddleware {
    fn name(&self) -> &'static str {
        "one_to_many"
    }

    fn after_hydration<'a>(
        self: Box<Self>,
        orm: &'a Orm,
        owners: &[&dyn Model],
    ) -> BoxFuture<'a, Result<Option<Splice>>> {
        let keys = owner_keys(owners, &self.primary_key);
        let Self {
            relation,
            foreign_key,
            primary_key,
            mut query,
        } = *self;

        async move {
            let mut groups: HashMap<String, Vec<Box<dyn Model>>> = HashMap::new();
            if keys.is_empty() {
                trace!(relation = %relation, "no owner keys, skipping query");
            } else {
                let table_alias = query.builder.alias().map(String::from);
                query.restrict(Statement::In(InStatement {
                    column: foreign_key.clone(),
                    table_alias,
                    values: keys,
                    negated: false,
                }))?;
                let batch = execution::run(query, orm).await?;
                trace!(relation = %relation, targets = batch.models.len(), "one-to-many loaded");
                for model in batch.models {
                    if let Some(key) = model.get(&foreign_key).as_ref().and_then(key_of) {
                        groups.entry(key).or_default().push(model);
                    }
                }
            }
            Ok(Some(grouped_splice(relation, primary_key, groups)))
        }
        .boxed()
    }
}
