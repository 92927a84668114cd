use std::sync::Arc;

use super::Middleware;
use crate::model::{Model, Row};
use crate::registry::ModelRegistry;

/// Creates each row as the subtype its discriminating field maps to.
///
/// Rows without a match are left to the declared model.
#[derive(Debug)]
pub struct DiscriminationMiddleware {
    registry: Arc<ModelRegistry>,
    model: String,
}

impl DiscriminationMiddleware {
    /// Discriminates rows of `model`.
    #[must_use]
    pub fn new(registry: Arc<ModelRegistry>, model: impl Into<String>) -> Self {
        Self {
            registry,
            model: model.into(),
        }
    }
}

impl Middleware for DiscriminationMiddleware {
    fn name(&self) -> &'static str {
        "discrimination"
    }

    fn model_creation(&self, row: &Row) -> Option<Box<dyn Model>> {
        self.registry.discriminate(&self.model, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DiscriminationMap, ModelDescriptor};
    use crate::model::Entity;
    use serde_json::json;

    #[test]
    fn test_creates_mapped_subtype_only() {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new("Base", "items")
                    .discriminated(DiscriminationMap::new("type").variant("one", "SubtypeA")),
            )
            .unwrap()
            .register_subtype("SubtypeA", || Box::new(Entity::new("SubtypeA")));
        let middleware = DiscriminationMiddleware::new(Arc::new(registry), "Base");

        let row = json!({"type": "one"}).as_object().cloned().unwrap();
        let created = middleware.model_creation(&row).unwrap();
        assert_eq!(created.model_name(), "SubtypeA");

        let row = json!({"type": "zzz"}).as_object().cloned().unwrap();
        assert!(middleware.model_creation(&row).is_none());
    }
}
