use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use strata_sql::ast::{InStatement, Statement};
use tracing::trace;

use super::{owner_keys, Middleware, Splice};
use crate::error::Result;
use crate::execution;
use crate::model::{key_of, Model, RelationValue};
use crate::orm::Orm;
use crate::query::ModelQuery;

/// Loads every ancestor of the owners with one recursive select, then links
/// each owner to its chain of parents.
pub(crate) struct RecursiveMiddleware {
    relation: String,
    foreign_key: String,
    primary_key: String,
    query: ModelQuery,
}

impl RecursiveMiddleware {
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

/// A key that points at a parent: `NULL` and `0` mark a root.
fn parent_key(value: &Value) -> Option<String> {
    if value.as_i64() == Some(0) {
        return None;
    }
    key_of(value)
}

struct Chains {
    relation: String,
    foreign_key: String,
    nodes: HashMap<String, Box<dyn Model>>,
    depth: usize,
}

impl Chains {
    /// Builds the chain starting at `start`, nearest ancestor first.
    ///
    /// Stops at a root, at a key with no loaded row, or after `depth`
    /// nodes; the last node gets an empty relation.
    fn build(&self, start: Option<Value>) -> Option<Box<dyn Model>> {
        let mut keys = Vec::new();
        let mut current = start;
        while let Some(key) = current.as_ref().and_then(parent_key) {
            if keys.len() >= self.depth {
                break;
            }
            let Some(node) = self.nodes.get(&key) else {
                break;
            };
            current = node.get(&self.foreign_key);
            keys.push(key);
        }

        let mut parent: Option<Box<dyn Model>> = None;
        for key in keys.iter().rev() {
            if let Some(node) = self.nodes.get(key) {
                let mut node = node.boxed_clone();
                node.relations_mut()
                    .set(self.relation.clone(), RelationValue::One(parent.take()));
                parent = Some(node);
            }
        }
        parent
    }
}

impl Middleware for RecursiveMiddleware {
    fn name(&self) -> &'static str {
        "recursive"
    }

    fn after_hydration<'a>(
        self: Box<Self>,
        orm: &'a Orm,
        owners: &[&dyn Model],
    ) -> BoxFuture<'a, Result<Option<Splice>>> {
        let keys = owner_keys(owners, &self.primary_key);
        let limit = orm.options().recursion_limit;
        let Self {
            relation,
            foreign_key,
            primary_key,
            mut query,
        } = *self;

        async move {
            let mut nodes = HashMap::new();
            if !keys.is_empty() {
                let table_alias = query.builder.alias().map(String::from);
                query.restrict(Statement::In(InStatement {
                    column: primary_key.clone(),
                    table_alias,
                    values: keys,
                    negated: false,
                }))?;
                let batch = execution::run(query, orm).await?;
                for model in batch.models {
                    if let Some(key) = model.get(&primary_key).as_ref().and_then(key_of) {
                        nodes.insert(key, model);
                    }
                }
            }
            // Cycles cannot outgrow the rows that were loaded.
            let depth = limit.map_or(nodes.len(), |limit| limit.min(nodes.len()));
            trace!(relation = %relation, nodes = nodes.len(), depth, "recursive chain loaded");

            let chains = Chains {
                relation,
                foreign_key,
                nodes,
                depth,
            };
            let splice: Splice = Box::new(move |owner: &mut dyn Model| {
                let start = owner
                    .get(&primary_key)
                    .as_ref()
                    .and_then(key_of)
                    .and_then(|key| chains.nodes.get(&key))
                    .and_then(|node| node.get(&chains.foreign_key))
                    .or_else(|| owner.get(&chains.foreign_key));
                let parent = chains.build(start);
                owner
                    .relations_mut()
                    .set(chains.relation.clone(), RelationValue::One(parent));
                Ok(())
            });
            Ok(Some(splice))
        }
        .boxed()
    }
}
