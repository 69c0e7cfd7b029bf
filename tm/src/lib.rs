//! TemplateMap - declarative object reshaping
//!
//! A template describes the shape of the output: destination field names,
//! the path each one is read from in the source object, and optional
//! operations that post-process individual fields. Applying a template to
//! one object yields one object; applying it to an array yields an array.
//!
//! # Modules
//!
//! - [`path`] - dotted/bracketed field paths and their resolution
//! - [`mapping`] - the mapping tree
//! - [`operation`] - per-field operations and the named catalog
//! - [`template`] - templates, parsing and loading
//! - [`mapper`] - the transformation itself
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use templatemap::{Mappings, Template, transform};
//!
//! let template = Template::new(
//!     Mappings::new()
//!         .field("id", "identity.id")
//!         .nested("address", Mappings::new().field("streetLine", "identity.address.streetLine")),
//! );
//! let data = json!({"identity": {"id": "1", "address": {"streetLine": "Main St"}}});
//!
//! let result = transform(Some(&template), Some(&data)).unwrap();
//! assert_eq!(result, json!({"id": "1", "address": {"streetLine": "Main St"}}));
//! ```

pub mod error;
pub mod mapper;
pub mod mapping;
pub mod operation;
pub mod path;
pub mod template;

pub use error::MapperError;
pub use mapper::{Mapper, transform};
pub use mapping::{MappingNode, Mappings};
pub use operation::{FnOperation, Operation, OperationCatalog, OperationError, OperationResult, Operations};
pub use path::FieldPath;
pub use template::{OperationRef, Template};
