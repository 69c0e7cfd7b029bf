//! The mapper: walks a mapping tree against source data

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::MapperError;
use crate::mapping::{MappingNode, Mappings};
use crate::operation::Operations;
use crate::template::Template;

/// Transform `data` according to `template`.
///
/// An array of inputs yields an array holding one result per non-empty
/// object or array element, in order; nulls, scalars and empty containers
/// are dropped. A single object yields a single result.
///
/// The template is checked before the data, and the first failing check is
/// reported.
pub fn transform(template: Option<&Template>, data: Option<&Value>) -> Result<Value, MapperError> {
    let template = check_template(template)?;
    let data = check_data(data)?;
    let operations = template.index_operations();
    transform_data(template.mappings(), &operations, data)
}

/// A validated template that can be applied to many inputs
pub struct Mapper {
    template: Template,
    operations: Operations,
}

impl Mapper {
    /// Validate `template` and index its operations
    pub fn new(template: Template) -> Result<Self, MapperError> {
        check_template(Some(&template))?;
        let operations = template.index_operations();
        debug!(
            fields = template.mappings().len(),
            operations = operations.len(),
            "Created mapper"
        );
        Ok(Self { template, operations })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Transform one input, with the same data checks as [`transform`]
    pub fn apply(&self, data: &Value) -> Result<Value, MapperError> {
        let data = check_data(Some(data))?;
        transform_data(self.template.mappings(), &self.operations, data)
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper").field("template", &self.template).finish()
    }
}

fn check_template(template: Option<&Template>) -> Result<&Template, MapperError> {
    match template {
        Some(template) if !template.mappings().is_empty() => Ok(template),
        _ => Err(MapperError::TemplateMissingOrInvalid),
    }
}

/// Empty arrays pass; null, scalars and empty objects do not
fn check_data(data: Option<&Value>) -> Result<&Value, MapperError> {
    match data {
        Some(value @ Value::Array(_)) => Ok(value),
        Some(value @ Value::Object(map)) if !map.is_empty() => Ok(value),
        _ => Err(MapperError::DataMissingOrInvalid),
    }
}

/// Non-empty containers; an array element is read by index (`0.label`)
fn is_mappable(item: &Value) -> bool {
    match item {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

/// Dispatch on the shape of the data
pub(crate) fn transform_data(mappings: &Mappings, operations: &Operations, data: &Value) -> Result<Value, MapperError> {
    match data {
        Value::Array(items) => {
            let mut results = Vec::with_capacity(items.len());
            for item in items.iter().filter(|item| is_mappable(item)) {
                results.push(transform_one(mappings, operations, item)?);
            }
            debug!(
                total = items.len(),
                mapped = results.len(),
                skipped = items.len() - results.len(),
                "Transformed array"
            );
            Ok(Value::Array(results))
        }
        _ => transform_one(mappings, operations, data),
    }
}

/// Build one output object from one source object
pub(crate) fn transform_one(
    mappings: &Mappings,
    operations: &Operations,
    source: &Value,
) -> Result<Value, MapperError> {
    let mut output = Map::with_capacity(mappings.len());

    for (field, node) in mappings.iter() {
        let value = match node {
            MappingNode::SubTree(sub) => transform_one(sub, operations, source)?,
            MappingNode::Leaf(path) => {
                let raw = path.resolve(source);
                match operations.get(field) {
                    Some(op) => op.run(raw.as_deref()).map_err(|err| MapperError::Operation {
                        key: field.to_string(),
                        source: err,
                    })?,
                    // Unresolved paths are an explicit null, never a missing key
                    None => raw.map(Cow::into_owned).unwrap_or(Value::Null),
                }
            }
        };
        output.insert(field.to_string(), value);
    }

    Ok(Value::Object(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_template() -> Template {
        Template::new(
            Mappings::new()
                .field("id", "identity.id")
                .field("missingField", "identity.doesnotexist")
                .nested(
                    "address",
                    Mappings::new().field("streetLine", "identity.address.streetLine"),
                ),
        )
    }

    #[test]
    fn test_transform_nested() {
        let data = json!({"identity": {"id": "1", "address": {"streetLine": "Main St"}}});
        let result = transform(Some(&person_template()), Some(&data)).unwrap();
        assert_eq!(
            result,
            json!({"id": "1", "missingField": null, "address": {"streetLine": "Main St"}})
        );
    }

    #[test]
    fn test_missing_path_is_null() {
        let template = Template::new(Mappings::new().field("missingField", "identity.doesnotexist"));
        let result = transform(Some(&template), Some(&json!({"identity": {}}))).unwrap();
        assert_eq!(result, json!({"missingField": null}));
    }

    #[test]
    fn test_output_keeps_declared_order() {
        let template = Template::new(Mappings::new().field("z", "a").field("a", "z"));
        let result = transform(Some(&template), Some(&json!({"a": 1, "z": 2}))).unwrap();
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_operation_receives_absent_value() {
        let template = Template::new(Mappings::new().field("flag", "identity.nothing"))
            .with_fn("flag", |value| json!(value.is_none()));
        let result = transform(Some(&template), Some(&json!({"identity": {}}))).unwrap();
        assert_eq!(result, json!({"flag": true}));
    }

    #[test]
    fn test_operation_applies_to_nested_key() {
        let template = Template::new(
            Mappings::new().nested("address", Mappings::new().field("zip", "identity.zip")),
        )
        .with_fn("zip", |value| {
            json!(value.and_then(Value::as_str).map(|s| s.len()))
        });
        let result = transform(Some(&template), Some(&json!({"identity": {"zip": "59000"}}))).unwrap();
        assert_eq!(result, json!({"address": {"zip": 5}}));
    }

    #[test]
    fn test_operation_error_propagates() {
        let template = Template::new(Mappings::new().field("age", "identity.age")).with_operation(
            crate::operation::FnOperation::fallible("age", |_| Err("cannot compute age".into())),
        );
        let err = transform(Some(&template), Some(&json!({"identity": {"age": 3}}))).unwrap_err();
        match err {
            MapperError::Operation { key, source } => {
                assert_eq!(key, "age");
                assert_eq!(source.to_string(), "cannot compute age");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_array_filters_non_containers() {
        let template = Template::new(Mappings::new().field("id", "id"));
        let data = json!([{"id": 1}, null, 1, "notAnObject", {}, [], {"id": 2}]);
        let result = transform(Some(&template), Some(&data)).unwrap();
        assert_eq!(result, json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn test_array_elements_that_are_arrays_are_mapped() {
        let template = Template::new(Mappings::new().field("first", "0"));
        let data = json!([[7, 8], {"0": 1}]);
        let result = transform(Some(&template), Some(&data)).unwrap();
        assert_eq!(result, json!([{"first": 7}, {"first": 1}]));
    }

    #[test]
    fn test_string_steps_in_paths() {
        let template = Template::new(
            Mappings::new()
                .field("initial", "identity.lastname.0")
                .field("length", "identity.lastname.length"),
        )
        .with_fn("initial", |value| json!(value.and_then(Value::as_str).map(str::to_lowercase)));
        let result = transform(Some(&template), Some(&json!({"identity": {"lastname": "Bon"}}))).unwrap();
        assert_eq!(result, json!({"initial": "b", "length": 3}));
    }

    #[test]
    fn test_empty_array_is_accepted() {
        let result = transform(Some(&person_template()), Some(&json!([]))).unwrap();
        assert_eq!(result, json!([]));
    }

    #[test]
    fn test_data_checks() {
        let template = person_template();
        for data in [None, Some(json!(null)), Some(json!({})), Some(json!(5)), Some(json!("text"))] {
            let err = transform(Some(&template), data.as_ref()).unwrap_err();
            assert_eq!(err.to_string(), "Data not provided");
        }
    }

    #[test]
    fn test_template_checked_first() {
        let err = transform(None, None).unwrap_err();
        assert!(matches!(err, MapperError::TemplateMissingOrInvalid));

        let empty = Template::new(Mappings::new());
        let err = transform(Some(&empty), Some(&json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "Template not provided");
    }

    #[test]
    fn test_mapper_reuse() {
        let mapper = Mapper::new(person_template()).unwrap();
        let first = mapper.apply(&json!({"identity": {"id": "1"}})).unwrap();
        let second = mapper.apply(&json!({"identity": {"id": "2"}})).unwrap();
        assert_eq!(first["id"], json!("1"));
        assert_eq!(second["id"], json!("2"));
        assert_eq!(first["address"], json!({"streetLine": null}));

        assert!(matches!(mapper.apply(&json!({})), Err(MapperError::DataMissingOrInvalid)));
    }

    #[test]
    fn test_mapper_rejects_empty_template() {
        let err = Mapper::new(Template::default()).unwrap_err();
        assert!(matches!(err, MapperError::TemplateMissingOrInvalid));
    }

    #[test]
    fn test_does_not_mutate_inputs() {
        let template = person_template();
        let data = json!({"identity": {"id": "1"}});
        let before = data.clone();
        transform(Some(&template), Some(&data)).unwrap();
        assert_eq!(data, before);
    }
}
