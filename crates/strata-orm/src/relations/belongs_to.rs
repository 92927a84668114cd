use strata_sql::ast::{ColumnStatement, JoinMethod, Statement, WhereGroupStatement};
use strata_sql::builder::{ColumnsClause, JoinClause, WhereClause};

use super::{ColumnMapping, NestedModel, ROOT_ALIAS};
use crate::descriptor::RelationDescriptor;
use crate::error::{OrmError, Result};
use crate::middleware::{Middleware, ScopedMiddleware};
use crate::query::ModelQuery;

/// A `One` relation, resolved by a LEFT JOIN in the owner's own query.
pub(crate) struct BelongsTo {
    descriptor: RelationDescriptor,
    query: ModelQuery,
}

impl BelongsTo {
    pub fn new(descriptor: RelationDescriptor, query: ModelQuery) -> Self {
        Self { descriptor, query }
    }

    pub fn attach(self, owner: &mut ModelQuery) -> Result<()> {
        let Self { descriptor, query } = self;
        let name = descriptor.name.as_str();

        if !owner.joined {
            if owner.builder.alias().is_none() {
                owner.builder.set_alias(ROOT_ALIAS)?;
            }
            if owner.builder.columns_builder().statements().is_empty() {
                owner.builder.select("*")?;
            }
        }

        let alias = query.scope.to_string();
        owner.builder.join(
            JoinMethod::Left,
            query.builder.table(),
            Some(&alias),
            &descriptor.foreign_key,
            &descriptor.primary_key,
        )?;

        let selected: Vec<String> = query
            .builder
            .columns_builder()
            .statements()
            .iter()
            .filter_map(Statement::as_column)
            .filter(|column| !column.is_wildcard())
            .map(|column| String::from(column.column()))
            .collect();
        let columns = if selected.is_empty() {
            query.descriptor.columns.clone()
        } else {
            selected
        };
        if columns.is_empty() {
            return Err(OrmError::InvalidDescriptor(format!(
                "model {} declares no columns, relation {name} cannot be joined",
                query.descriptor.name
            )));
        }

        for column in columns {
            let key = format!("{alias}.{column}");
            owner.push_joined_column(Statement::Column(
                ColumnStatement::new(column.clone())
                    .with_alias(key.clone())
                    .with_table_alias(Some(alias.clone())),
            ));
            owner
                .mappings
                .push(ColumnMapping::new(key, vec![String::from(name)], column));
        }

        // Whatever the relation query joined or filtered moves to the owner.
        let ModelQuery {
            descriptor: target,
            builder,
            joined_columns,
            mappings,
            nested,
            middlewares,
            ..
        } = query;

        for column in joined_columns {
            owner.push_joined_column(column);
        }
        for join in builder.join_builder().statements() {
            owner.builder.join_statement(join.clone());
        }
        let conditions = builder.where_builder().conditions().to_vec();
        if !conditions.is_empty() {
            owner.restrict(Statement::WhereGroup(WhereGroupStatement { conditions }))?;
        }

        owner
            .mappings
            .extend(mappings.into_iter().map(|mapping| mapping.prefixed(name)));
        owner.nested.push(NestedModel {
            name: String::from(name),
            model: target.name.clone(),
            children: nested,
        });
        owner
            .middlewares
            .extend(middlewares.into_iter().map(|middleware| {
                Box::new(ScopedMiddleware::new(vec![String::from(name)], middleware))
                    as Box<dyn Middleware>
            }));
        Ok(())
    }
}
