//! # strata-orm
//!
//! Relation population and model hydration on top of `strata-sql`.
//!
//! This crate provides:
//! - Descriptors declaring models, their relations and discrimination maps
//! - `ModelQuery`, a select builder bound to a model, with `populate`
//! - BelongsTo (joined), recursive BelongsTo, OneToMany and ManyToMany
//!   relations
//! - A middleware pipeline turning rows into models and splicing relations
//!   onto them
//! - A `Driver` contract and a SQLite driver built on `sqlx`
//!
//! ## Quick Start
//!
//! ```ignore
//! use strata_orm::prelude::*;
//! use strata_orm::{ModelDescriptor, ModelRegistry, Orm, RelationDescriptor, SqliteDriver};
//!
//! async fn example() -> strata_orm::Result<()> {
//!     let mut registry = ModelRegistry::new();
//!     registry
//!         .register(
//!             ModelDescriptor::new("Post", "posts")
//!                 .columns(["id", "title", "user_id"])
//!                 .relation(RelationDescriptor::belongs_to(
//!                     "author", "Post", "User", "user_id", "id",
//!                 )),
//!         )?
//!         .register(ModelDescriptor::new("User", "users").columns(["id", "name"]))?;
//!
//!     let orm = Orm::new(SqliteDriver::connect("sqlite::memory:").await?, registry);
//!
//!     let mut query = orm.query("Post")?;
//!     query.where_op("id", ">", 10)?.populate("author")?;
//!     for post in query.execute(&orm).await?.into_vec() {
//!         println!("{}", post.to_json());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Relations
//!
//! A BelongsTo relation is LEFT JOINed into its owner's select; its columns
//! come back as `"$author$.name"` and are nested before hydration. The other
//! kinds run one extra query per relation once the owners are hydrated:
//!
//! ```ignore
//! let mut query = orm.query("User")?;
//! query.populate_with("posts", |posts| {
//!     posts.where_("published", true)?.populate("tags")?;
//!     Ok(())
//! })?;
//! ```

mod descriptor;
mod driver;
mod error;
mod execution;
pub mod middleware;
mod model;
mod orm;
mod query;
pub mod relations;
mod registry;
mod sqlite;

pub use descriptor::{
    DiscriminationMap, JunctionDescriptor, ModelDescriptor, RelationDescriptor, RelationKind,
};
pub use driver::{Driver, QueryOutput};
pub use error::{OrmError, Result};
pub use execution::Fetched;
pub use middleware::{Middleware, Splice};
pub use model::{Entity, Model, RelationValue, Relations, Row};
pub use orm::{Orm, OrmOptions};
pub use query::ModelQuery;
pub use registry::{ModelFactory, ModelRegistry};
pub use sqlite::SqliteDriver;

// Re-export commonly used types from strata-sql
pub use strata_sql::{QueryContext, SqlValue, ToSqlValue};

/// Clause traits, needed in scope to refine model queries.
pub mod prelude {
    pub use strata_sql::prelude::*;
}
