//! Templates: a mapping tree plus the operations bound to its keys
//!
//! Templates are built in code with [`Template::new`], or parsed from the
//! untyped form (a JSON or YAML document with `mappings` and `operations`).
//! Template files name their operations; the functions themselves come from
//! an [`OperationCatalog`].

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{MapperError, json_type_name};
use crate::mapping::Mappings;
use crate::operation::{FnOperation, Operation, OperationCatalog, Operations};

/// Operation entry as written in a template file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRef {
    /// Destination key the operation applies to
    #[serde(alias = "on")]
    pub key: String,

    /// Name of the catalog function to run
    pub run: String,
}

/// A transformation template
#[derive(Clone, Default)]
pub struct Template {
    mappings: Mappings,
    operations: Vec<Arc<dyn Operation>>,
}

impl Template {
    /// Create a template without operations
    pub fn new(mappings: Mappings) -> Self {
        Self {
            mappings,
            operations: Vec::new(),
        }
    }

    /// Append an operation
    pub fn with_operation(mut self, operation: impl Operation + 'static) -> Self {
        self.operations.push(Arc::new(operation));
        self
    }

    /// Append a closure-backed operation on `key`
    pub fn with_fn<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        self.with_operation(FnOperation::new(key, f))
    }

    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    /// Operations in registration order
    pub fn operations(&self) -> &[Arc<dyn Operation>] {
        &self.operations
    }

    /// Lookup table for the mapper
    pub(crate) fn index_operations(&self) -> Operations {
        if self.operations.is_empty() {
            Operations::none()
        } else {
            Operations::index(&self.operations)
        }
    }

    /// Parse the untyped form, with no operation functions available
    pub fn from_value(value: &Value) -> Result<Self, MapperError> {
        Self::from_value_with(value, &OperationCatalog::new())
    }

    /// Parse the untyped form, binding named operations from `catalog`.
    ///
    /// `mappings` must be a non-empty object. `operations` may be absent,
    /// null, `{}` or `[]`; otherwise it is a list of `{ key, run }` entries.
    pub fn from_value_with(value: &Value, catalog: &OperationCatalog) -> Result<Self, MapperError> {
        let Value::Object(fields) = value else {
            return Err(MapperError::TemplateMissingOrInvalid);
        };

        let mappings = match fields.get("mappings") {
            Some(Value::Object(map)) if !map.is_empty() => Mappings::from_json_map(map)?,
            _ => return Err(MapperError::TemplateMissingOrInvalid),
        };

        let mut template = Template::new(mappings);
        for entry in parse_operation_refs(fields.get("operations"))? {
            template = template.with_operation(catalog.bind(&entry.key, &entry.run)?);
        }

        debug!(
            fields = template.mappings.len(),
            operations = template.operations.len(),
            "Parsed template"
        );
        Ok(template)
    }

    /// Parse a YAML (or JSON) template document
    pub fn from_yaml_str(content: &str, catalog: &OperationCatalog) -> Result<Self, MapperError> {
        let value: Value = serde_yaml::from_str(content)?;
        Self::from_value_with(&value, catalog)
    }

    /// Parse a JSON template document
    pub fn from_json_str(content: &str, catalog: &OperationCatalog) -> Result<Self, MapperError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value_with(&value, catalog)
    }

    /// Load a template file; `.json` files are parsed as JSON, anything
    /// else as YAML
    pub fn load(path: &Path, catalog: &OperationCatalog) -> Result<Self, MapperError> {
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loading template");

        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        if is_json {
            Self::from_json_str(&content, catalog)
        } else {
            Self::from_yaml_str(&content, catalog)
        }
    }
}

fn parse_operation_refs(value: Option<&Value>) -> Result<Vec<OperationRef>, MapperError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) if map.is_empty() => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                OperationRef::deserialize(item).map_err(|e| MapperError::InvalidOperation(e.to_string()))
            })
            .collect(),
        Some(other) => Err(MapperError::InvalidOperation(format!(
            "expected a list of operations, found {}",
            json_type_name(other)
        ))),
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.operations.iter().map(|op| op.key()).collect();
        f.debug_struct("Template")
            .field("mappings", &self.mappings)
            .field("operations", &keys)
            .finish()
    }
}
