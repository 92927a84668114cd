//! Model registry.
//!
//! Maps model names to their descriptors and factories. Discrimination
//! resolves a row to a model name through the descriptor's map, then to a
//! factory here.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::ModelDescriptor;
use crate::error::{OrmError, Result};
use crate::model::{Entity, Model, Row};

/// Creates an empty model instance.
pub type ModelFactory = Arc<dyn Fn() -> Box<dyn Model> + Send + Sync>;

struct RegisteredModel {
    descriptor: Arc<ModelDescriptor>,
    factory: ModelFactory,
}

/// Registered models and subtypes.
#[derive(Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, RegisteredModel>,
    subtypes: BTreeMap<String, ModelFactory>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("subtypes", &self.subtypes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model materialized as [`Entity`].
    pub fn register(&mut self, descriptor: ModelDescriptor) -> Result<&mut Self> {
        let name = descriptor.name.clone();
        self.register_with(descriptor, move || Box::new(Entity::new(name.clone())))
    }

    /// Registers a model materialized through `factory`.
    pub fn register_with<F>(&mut self, descriptor: ModelDescriptor, factory: F) -> Result<&mut Self>
    where
        F: Fn() -> Box<dyn Model> + Send + Sync + 'static,
    {
        descriptor.validate()?;
        if self.models.contains_key(&descriptor.name) {
            return Err(OrmError::InvalidDescriptor(format!(
                "model {} is already registered",
                descriptor.name
            )));
        }
        self.models.insert(
            descriptor.name.clone(),
            RegisteredModel {
                descriptor: Arc::new(descriptor),
                factory: Arc::new(factory),
            },
        );
        Ok(self)
    }

    /// Registers a subtype only reachable through discrimination.
    pub fn register_subtype<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Model> + Send + Sync + 'static,
    {
        self.subtypes.insert(name.into(), Arc::new(factory));
        self
    }

    /// Returns the descriptor of a model.
    pub fn descriptor(&self, model: &str) -> Result<&Arc<ModelDescriptor>> {
        self.models
            .get(model)
            .map(|registered| &registered.descriptor)
            .ok_or_else(|| OrmError::UnknownModel(String::from(model)))
    }

    /// Returns whether a model or subtype is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name) || self.subtypes.contains_key(name)
    }

    fn factory(&self, name: &str) -> Option<&ModelFactory> {
        self.models
            .get(name)
            .map(|registered| &registered.factory)
            .or_else(|| self.subtypes.get(name))
    }

    /// Creates an empty instance of a model or subtype.
    pub fn create(&self, name: &str) -> Result<Box<dyn Model>> {
        self.factory(name)
            .map(|factory| factory())
            .ok_or_else(|| OrmError::UnknownModel(String::from(name)))
    }

    /// Creates the subtype a row discriminates to, if any.
    ///
    /// Returns `None` when the model has no discrimination map, the row has
    /// no matching value, or the mapped subtype is not registered.
    pub fn discriminate(&self, model: &str, row: &Row) -> Option<Box<dyn Model>> {
        let map = self.models.get(model)?.descriptor.discrimination.as_ref()?;
        let Some(subtype) = map.resolve(row) else {
            debug!(model, field = %map.field, "no discrimination match, using declared model");
            return None;
        };
        match self.factory(subtype) {
            Some(factory) => Some(factory()),
            None => {
                debug!(model, subtype, "discriminated subtype is not registered");
                None
            }
        }
    }

    /// Creates the instance a row materializes as: its discriminated
    /// subtype, or else the declared model.
    pub fn instantiate(&self, model: &str, row: &Row) -> Result<Box<dyn Model>> {
        match self.discriminate(model, row) {
            Some(instance) => Ok(instance),
            None => self.create(model),
        }
    }
}
