use serde_json::Value;

use super::Middleware;
use crate::error::{OrmError, Result};
use crate::model::Row;
use crate::relations::ColumnMapping;

/// Moves the flat columns of joined relations into nested objects.
///
/// `{"id": 1, "$author$.name": "ann"}` becomes
/// `{"id": 1, "author": {"name": "ann"}}`.
#[derive(Debug)]
pub struct JoinTransformMiddleware {
    mappings: Vec<ColumnMapping>,
}

impl JoinTransformMiddleware {
    /// Transforms rows according to `mappings`.
    #[must_use]
    pub fn new(mappings: Vec<ColumnMapping>) -> Self {
        Self { mappings }
    }

    fn transform(&self, mut row: Row) -> Result<Row> {
        for mapping in &self.mappings {
            let Some(value) = row.remove(&mapping.key) else {
                continue;
            };
            nested_object(&mut row, &mapping.path)?.insert(mapping.field.clone(), value);
        }
        Ok(row)
    }
}

fn nested_object<'r>(row: &'r mut Row, path: &[String]) -> Result<&'r mut Row> {
    let mut current = row;
    for segment in path {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Row::new()));
        let Value::Object(object) = entry else {
            return Err(OrmError::Hydration(format!(
                "field {segment} collides with a joined relation"
            )));
        };
        current = object;
    }
    Ok(current)
}

impl Middleware for JoinTransformMiddleware {
    fn name(&self) -> &'static str {
        "join_transform"
    }

    fn after_data(&self, rows: Vec<Row>) -> Result<Vec<Row>> {
        rows.into_iter().map(|row| self.transform(row)).collect()
    }
}
