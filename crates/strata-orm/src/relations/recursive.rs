use crate::descriptor::RelationDescriptor;
use crate::error::Result;
use crate::middleware::RecursiveMiddleware;
use crate::query::ModelQuery;

/// A recursive `One` relation: one recursive select collects every ancestor
/// of the owners, and the chains are rebuilt in memory.
pub(crate) struct BelongsToRecursive {
    descriptor: RelationDescriptor,
    query: ModelQuery,
}

impl BelongsToRecursive {
    pub fn new(descriptor: RelationDescriptor, query: ModelQuery) -> Self {
        Self { descriptor, query }
    }

    pub fn attach(self, owner: &mut ModelQuery) -> Result<()> {
        let Self {
            descriptor,
            mut query,
        } = self;
        query
            .builder
            .recursive(&descriptor.foreign_key, &descriptor.primary_key)?;
        owner.middlewares.push(Box::new(RecursiveMiddleware::new(
            descriptor.name,
            descriptor.foreign_key,
            descriptor.primary_key,
            query,
        )));
        Ok(())
    }
}
