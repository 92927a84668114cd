use super::ensure_columns;
use crate::descriptor::RelationDescriptor;
use crate::error::Result;
use crate::middleware::OneToManyMiddleware;
use crate::query::ModelQuery;

/// A `Many` relation, resolved by a second query once the owners are known.
pub(crate) struct OneToMany {
    descriptor: RelationDescriptor,
    query: ModelQuery,
}

impl OneToMany {
    pub fn new(descriptor: RelationDescriptor, query: ModelQuery) -> Self {
        Self { descriptor, query }
    }

    pub fn attach(self, owner: &mut ModelQuery) -> Result<()> {
        let Self {
            descriptor,
            mut query,
        } = self;
        // Grouping reads the foreign key off every target.
        ensure_columns(&mut query, &descriptor.foreign_key)?;
        owner.middlewares.push(Box::new(OneToManyMiddleware::new(
            descriptor.name,
            descriptor.foreign_key,
            descriptor.primary_key,
            query,
        )));
        Ok(())
    }
}
