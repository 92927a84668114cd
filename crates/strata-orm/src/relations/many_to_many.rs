use strata_sql::ast::{ColumnStatement, JoinMethod, Statement};
use strata_sql::builder::{ColumnsClause, JoinClause};

use super::{ensure_columns, ColumnMapping, Pivot, JUNCTION_MODEL};
use crate::descriptor::RelationDescriptor;
use crate::error::{OrmError, Result};
use crate::middleware::ManyToManyMiddleware;
use crate::query::ModelQuery;

/// A `ManyToMany` relation: the target query joins the junction table and
/// carries the junction row of every target back to the owners.
pub(crate) struct ManyToMany {
    descriptor: RelationDescriptor,
    query: ModelQuery,
}

impl ManyToMany {
    pub fn new(descriptor: RelationDescriptor, query: ModelQuery) -> Self {
        Self { descriptor, query }
    }

    pub fn attach(self, owner: &mut ModelQuery) -> Result<()> {
        let Self {
            descriptor,
            mut query,
        } = self;
        let junction = descriptor.junction.clone().ok_or_else(|| {
            OrmError::InvalidDescriptor(format!(
                "relation {} has no junction table",
                descriptor.name
            ))
        })?;

        let junction_alias = query.scope.child(JUNCTION_MODEL).to_string();
        query.builder.join(
            JoinMethod::Inner,
            &junction.table,
            Some(&junction_alias),
            &descriptor.foreign_key,
            &junction.target_key,
        )?;
        ensure_columns(&mut query, &descriptor.foreign_key)?;

        for column in [&junction.source_key, &junction.target_key] {
            let key = format!("{junction_alias}.{column}");
            query
                .builder
                .columns_builder_mut()
                .push(Statement::Column(
                    ColumnStatement::new(column.clone())
                        .with_alias(key.clone())
                        .with_table_alias(Some(junction_alias.clone())),
                ));
            query.mappings.push(ColumnMapping::new(
                key,
                vec![String::from(JUNCTION_MODEL)],
                column.clone(),
            ));
        }
        query.pivot = Some(Pivot {
            field: String::from(JUNCTION_MODEL),
            key: junction.source_key.clone(),
        });

        owner.middlewares.push(Box::new(ManyToManyMiddleware::new(
            descriptor.name,
            descriptor.primary_key,
            junction_alias,
            junction.source_key,
            query,
        )));
        Ok(())
    }
}
