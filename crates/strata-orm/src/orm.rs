//! The ORM handle: driver, compiler, registry and options.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use strata_sql::builder::LimitClause;
use strata_sql::{
    CompiledQuery, Compiler, GenericCompiler, QueryBuilder, QueryContext, SelectQueryBuilder,
};
use tracing::debug;

use crate::driver::{Driver, QueryOutput};
use crate::error::Result;
use crate::execution::Fetched;
use crate::model::Row;
use crate::query::ModelQuery;
use crate::registry::ModelRegistry;

/// Runtime options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrmOptions {
    /// Log bindings next to every executed expression.
    pub log_bindings: bool,
    /// Maximum number of ancestors followed by recursive relations.
    pub recursion_limit: Option<usize>,
}

/// Entry point for building and running queries.
///
/// # Example
///
/// ```ignore
/// let mut registry = ModelRegistry::new();
/// registry.register(ModelDescriptor::new("User", "users"))?;
///
/// let orm = Orm::new(SqliteDriver::connect("sqlite::memory:").await?, registry);
/// let mut query = orm.query("User")?;
/// query.where_("active", true)?.populate("posts")?;
/// let users = query.execute(&orm).await?.into_vec();
/// ```
#[derive(Clone)]
pub struct Orm {
    driver: Arc<dyn Driver>,
    compiler: Arc<dyn Compiler>,
    registry: Arc<ModelRegistry>,
    options: OrmOptions,
}

impl fmt::Debug for Orm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orm")
            .field("compiler", &self.compiler.dialect().name())
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Orm {
    /// Creates an ORM using the generic compiler and default options.
    pub fn new(driver: impl Driver + 'static, registry: ModelRegistry) -> Self {
        Self {
            driver: Arc::new(driver),
            compiler: Arc::new(GenericCompiler::new()),
            registry: Arc::new(registry),
            options: OrmOptions::default(),
        }
    }

    /// Replaces the compiler.
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl Compiler + 'static) -> Self {
        self.compiler = Arc::new(compiler);
        self
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: OrmOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the compiler.
    #[must_use]
    pub fn compiler(&self) -> &dyn Compiler {
        self.compiler.as_ref()
    }

    /// Returns the driver.
    #[must_use]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &OrmOptions {
        &self.options
    }

    /// Starts a select on a registered model.
    pub fn query(&self, model: &str) -> Result<ModelQuery> {
        ModelQuery::new(Arc::clone(&self.registry), model)
    }

    /// Compiles and runs a builder, returning the driver output as is.
    pub async fn execute<Q: QueryBuilder>(&self, query: Q) -> Result<QueryOutput> {
        let context = query.context();
        let compiled = query.compile(self.compiler())?;
        self.run(&compiled, context).await
    }

    /// Runs a select and applies its `first` / `first_or_fail` arity to the
    /// raw rows.
    pub async fn fetch(&self, query: SelectQueryBuilder) -> Result<Fetched<Row>> {
        let arity = query.limit_builder().arity();
        let rows = self.execute(query).await?.into_rows()?;
        Fetched::from_arity(arity, rows)
    }

    pub(crate) async fn run(
        &self,
        compiled: &CompiledQuery,
        context: QueryContext,
    ) -> Result<QueryOutput> {
        if self.options.log_bindings {
            debug!(
                sql = %compiled.expression,
                bindings = ?compiled.bindings,
                ?context,
                "Executing SQL"
            );
        } else {
            debug!(sql = %compiled.expression, ?context, "Executing SQL");
        }
        self.driver
            .execute(&compiled.expression, &compiled.bindings, context)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: OrmOptions = serde_json::from_str(r#"{"recursion_limit": 8}"#).unwrap();
        assert_eq!(
            options,
            OrmOptions {
                log_bindings: false,
                recursion_limit: Some(8),
            }
        );
    }
}
