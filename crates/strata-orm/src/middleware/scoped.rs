use futures::future::{BoxFuture, FutureExt};

use super::{Middleware, Splice};
use crate::error::Result;
use crate::model::Model;
use crate::orm::Orm;

/// Runs a middleware of a joined relation against the nested models.
///
/// Owners are descended along `path`; owners whose relation is empty are
/// skipped.
pub(crate) struct ScopedMiddleware {
    path: Vec<String>,
    inner: Box<dyn Middleware>,
}

impl ScopedMiddleware {
    pub fn new(path: Vec<String>, inner: Box<dyn Middleware>) -> Self {
        Self { path, inner }
    }
}

fn descend<'m>(model: &'m dyn Model, path: &[String]) -> Option<&'m dyn Model> {
    let mut current = model;
    for segment in path {
        current = current.relations().one(segment)?;
    }
    Some(current)
}

fn descend_mut<'m>(model: &'m mut dyn Model, path: &[String]) -> Option<&'m mut dyn Model> {
    let mut current = model;
    for segment in path {
        current = current.relations_mut().one_mut(segment)?;
    }
    Some(current)
}

impl Middleware for ScopedMiddleware {
    fn name(&self) -> &'static str {
        "scoped"
    }

    fn after_hydration<'a>(
        self: Box<Self>,
        orm: &'a Orm,
        owners: &[&dyn Model],
    ) -> BoxFuture<'a, Result<Option<Splice>>> {
        let Self { path, inner } = *self;
        let nested: Vec<&dyn Model> = owners
            .iter()
            .filter_map(|owner| descend(*owner, &path))
            .collect();
        let pending = inner.after_hydration(orm, &nested);

        async move {
            let Some(splice) = pending.await? else {
                return Ok(None);
            };
            let scoped: Splice = Box::new(move |model: &mut dyn Model| {
                match descend_mut(model, &path) {
                    Some(target) => splice(target),
                    None => Ok(()),
                }
            });
            Ok(Some(scoped))
        }
        .boxed()
    }
}
