//! Per-field operations
//!
//! An operation is bound to one destination key. When the mapper fills that
//! key it hands the raw extracted value (or `None` when the path did not
//! resolve) to the operation and stores whatever comes back.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::MapperError;

/// Error returned by a fallible operation
pub type OperationError = Box<dyn std::error::Error + Send + Sync>;

/// Result of running an operation
pub type OperationResult = Result<Value, OperationError>;

type OperationFn = dyn Fn(Option<&Value>) -> OperationResult + Send + Sync;

/// A transform applied to the value extracted for one destination key
pub trait Operation: Send + Sync {
    /// Destination key this operation applies to
    fn key(&self) -> &str;

    /// Transform the raw extracted value
    fn run(&self, value: Option<&Value>) -> OperationResult;
}

/// Closure-backed operation
#[derive(Clone)]
pub struct FnOperation {
    key: String,
    func: Arc<OperationFn>,
}

impl FnOperation {
    /// Create an operation from an infallible closure
    pub fn new<F>(key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            func: Arc::new(move |value: Option<&Value>| -> OperationResult { Ok(f(value)) }),
        }
    }

    /// Create an operation from a closure that can fail
    pub fn fallible<F>(key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Value>) -> OperationResult + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            func: Arc::new(f),
        }
    }

    fn from_shared(key: impl Into<String>, func: Arc<OperationFn>) -> Self {
        Self { key: key.into(), func }
    }
}

impl Operation for FnOperation {
    fn key(&self) -> &str {
        &self.key
    }

    fn run(&self, value: Option<&Value>) -> OperationResult {
        (self.func)(value)
    }
}

impl std::fmt::Debug for FnOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOperation").field("key", &self.key).finish_non_exhaustive()
    }
}

/// Operations indexed by destination key, built once per transformation
pub struct Operations {
    by_key: HashMap<String, Arc<dyn Operation>>,
}

impl Operations {
    /// Index an ordered operation list. The first operation registered for a
    /// key wins; later ones are ignored.
    pub fn index(operations: &[Arc<dyn Operation>]) -> Self {
        let mut by_key: HashMap<String, Arc<dyn Operation>> = HashMap::with_capacity(operations.len());

        for op in operations {
            match by_key.entry(op.key().to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(Arc::clone(op));
                }
                Entry::Occupied(slot) => {
                    warn!(key = %slot.key(), "Duplicate operation key, keeping the first one");
                }
            }
        }

        debug!(count = by_key.len(), "Indexed operations");
        Self { by_key }
    }

    /// An empty index
    pub fn none() -> Self {
        Self { by_key: HashMap::new() }
    }

    /// Find the operation bound to a destination key
    pub fn get(&self, key: &str) -> Option<&dyn Operation> {
        self.by_key.get(key).map(|op| op.as_ref())
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Named operation functions that template files can refer to.
///
/// A template file cannot carry code, so its `operations` entries name a
/// function (`run: latest_job`) that the application registered here.
#[derive(Clone, Default)]
pub struct OperationCatalog {
    functions: HashMap<String, Arc<OperationFn>>,
}

impl OperationCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an infallible function under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        self.functions
            .insert(name.into(), Arc::new(move |value: Option<&Value>| -> OperationResult { Ok(f(value)) }));
        self
    }

    /// Register a fallible function under `name`
    pub fn register_fallible<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Option<&Value>) -> OperationResult + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    /// Bind the function `name` to destination `key`
    pub fn bind(&self, key: &str, name: &str) -> Result<FnOperation, MapperError> {
        self.functions
            .get(name)
            .map(|func| FnOperation::from_shared(key, Arc::clone(func)))
            .ok_or_else(|| MapperError::UnknownOperation { name: name.to_string() })
    }

    /// Check if a function is registered
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered function names, sorted
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for OperationCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationCatalog")
            .field("functions", &self.function_names())
            .finish()
    }
}
