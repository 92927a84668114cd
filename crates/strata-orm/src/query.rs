//! Model queries.
//!
//! A [`ModelQuery`] is a select builder bound to a registered model. Clause
//! operations forward to the embedded builder; `populate` attaches relations
//! and `execute` runs the hydration pipeline.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use strata_sql::ast::{Statement, WhereGroupStatement};
use strata_sql::builder::{
    ColumnsBuilder, ColumnsClause, JoinBuilder, JoinClause, LimitBuilder, LimitClause,
    OrderByBuilder, OrderByClause, WhereBuilder, WhereClause,
};
use strata_sql::{CompiledQuery, Compiler, QueryBuilder, SelectQueryBuilder};

use crate::descriptor::{ModelDescriptor, RelationDescriptor, RelationKind};
use crate::error::{OrmError, Result};
use crate::execution::{self, Fetched};
use crate::middleware::Middleware;
use crate::orm::Orm;
use crate::registry::ModelRegistry;
use crate::relations::{AliasPath, ColumnMapping, NestedModel, OrmRelation, Pivot};

/// A select over one model, with its populated relations.
///
/// # Example
///
/// ```ignore
/// let mut query = orm.query("Post")?;
/// query
///     .where_("published", true)?
///     .populate("author")?
///     .populate_with("comments", |comments| {
///         comments.order_by_descending("id")?;
///         Ok(())
///     })?;
/// let posts = query.execute(&orm).await?.into_vec();
/// ```
pub struct ModelQuery {
    pub(crate) registry: Arc<ModelRegistry>,
    pub(crate) descriptor: Arc<ModelDescriptor>,
    pub(crate) builder: SelectQueryBuilder,
    pub(crate) scope: AliasPath,
    /// Joined into its owner rather than run on its own.
    pub(crate) joined: bool,
    pub(crate) recursive: bool,
    /// Columns a joined query hands to its owner.
    pub(crate) joined_columns: Vec<Statement>,
    pub(crate) mappings: Vec<ColumnMapping>,
    pub(crate) nested: Vec<NestedModel>,
    pub(crate) middlewares: Vec<Box<dyn Middleware>>,
    pub(crate) pivot: Option<Pivot>,
    populated: BTreeSet<String>,
}

impl fmt::Debug for ModelQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelQuery")
            .field("model", &self.descriptor.name)
            .field("scope", &self.scope.to_string())
            .field("builder", &self.builder)
            .field("populated", &self.populated)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

impl ModelQuery {
    pub(crate) fn new(registry: Arc<ModelRegistry>, model: &str) -> Result<Self> {
        let descriptor = Arc::clone(registry.descriptor(model)?);
        let builder = SelectQueryBuilder::new(descriptor.table.clone())?;
        Ok(Self {
            registry,
            descriptor,
            builder,
            scope: AliasPath::root(),
            joined: false,
            recursive: false,
            joined_columns: Vec::new(),
            mappings: Vec::new(),
            nested: Vec::new(),
            middlewares: Vec::new(),
            pivot: None,
            populated: BTreeSet::new(),
        })
    }

    /// Returns the model descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    /// Returns the position of this query below the root query.
    #[must_use]
    pub fn scope(&self) -> &AliasPath {
        &self.scope
    }

    /// Returns the embedded select builder.
    #[must_use]
    pub fn builder(&self) -> &SelectQueryBuilder {
        &self.builder
    }

    /// Returns the embedded select builder mutably, for operations without a
    /// forwarded counterpart such as grouping.
    pub fn builder_mut(&mut self) -> &mut SelectQueryBuilder {
        &mut self.builder
    }

    /// Populates a relation with its default query.
    pub fn populate(&mut self, relation: &str) -> Result<&mut Self> {
        self.populate_with(relation, |_| Ok(()))
    }

    /// Populates a relation, refining its query first.
    ///
    /// The callback may filter, select columns or populate further
    /// relations of the target model.
    pub fn populate_with<F>(&mut self, relation: &str, refine: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ModelQuery) -> Result<()>,
    {
        if self.recursive {
            return Err(OrmError::InvalidOperation(format!(
                "cannot populate {relation} inside the recursive relation {}",
                self.scope
            )));
        }
        let descriptor = self
            .descriptor
            .find_relation(relation)
            .cloned()
            .ok_or_else(|| OrmError::UnknownRelation {
                model: self.descriptor.name.clone(),
                relation: String::from(relation),
            })?;
        if !self.populated.insert(String::from(relation)) {
            return Err(OrmError::InvalidOperation(format!(
                "relation {relation} is already populated on {}",
                self.descriptor.name
            )));
        }

        let mut query = self.relation_query(&descriptor)?;
        refine(&mut query)?;
        OrmRelation::new(descriptor, query).attach(self)?;
        Ok(self)
    }

    fn relation_query(&self, relation: &RelationDescriptor) -> Result<Self> {
        let mut query = Self::new(Arc::clone(&self.registry), &relation.target)?;
        query.scope = self.scope.child(&relation.name);
        query.builder.set_alias(query.scope.to_string())?;
        query.joined = relation.kind == RelationKind::One && !relation.recursive;
        query.recursive = relation.recursive;
        Ok(query)
    }

    /// Adds a column the owner of a joined query must select.
    pub(crate) fn push_joined_column(&mut self, column: Statement) {
        if self.joined {
            self.joined_columns.push(column);
        } else {
            self.builder.columns_builder_mut().push(column);
        }
    }

    /// ANDs `statement` with the existing where clause as a whole.
    pub(crate) fn restrict(&mut self, statement: Statement) -> Result<()> {
        let existing = self.builder.where_builder().conditions().to_vec();
        if !existing.is_empty() {
            self.builder.clear_where();
            self.builder
                .where_statement(Statement::WhereGroup(WhereGroupStatement {
                    conditions: existing,
                }))?;
        }
        self.builder.where_statement(statement)?;
        Ok(())
    }

    /// Compiles the select, joined relations included.
    pub fn compile(&self, compiler: &dyn Compiler) -> Result<CompiledQuery> {
        Ok(self.builder.compile(compiler)?)
    }

    /// Runs the query and every populated relation.
    pub async fn execute(self, orm: &Orm) -> Result<Fetched> {
        let arity = self.builder.limit_builder().arity();
        let batch = execution::run(self, orm).await?;
        Fetched::from_arity(arity, batch.models)
    }
}

impl WhereClause for ModelQuery {
    fn where_builder(&self) -> &WhereBuilder {
        self.builder.where_builder()
    }

    fn where_builder_mut(&mut self) -> &mut WhereBuilder {
        self.builder.where_builder_mut()
    }
}

impl ColumnsClause for ModelQuery {
    fn columns_builder(&self) -> &ColumnsBuilder {
        self.builder.columns_builder()
    }

    fn columns_builder_mut(&mut self) -> &mut ColumnsBuilder {
        self.builder.columns_builder_mut()
    }
}

impl JoinClause for ModelQuery {
    fn join_builder(&self) -> &JoinBuilder {
        self.builder.join_builder()
    }

    fn join_builder_mut(&mut self) -> &mut JoinBuilder {
        self.builder.join_builder_mut()
    }
}

impl OrderByClause for ModelQuery {
    fn order_builder(&self) -> &OrderByBuilder {
        self.builder.order_builder()
    }

    fn order_builder_mut(&mut self) -> &mut OrderByBuilder {
        self.builder.order_builder_mut()
    }
}

impl LimitClause for ModelQuery {
    fn limit_builder(&self) -> &LimitBuilder {
        self.builder.limit_builder()
    }

    fn limit_builder_mut(&mut self) -> &mut LimitBuilder {
        self.builder.limit_builder_mut()
    }
}
