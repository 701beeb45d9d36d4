//! Structured-output schemas.
//!
//! Response types describe themselves through [`schemars::JsonSchema`] and
//! add semantic checks through [`StructuredOutput::validate`]. The only
//! place that knows the provider's JSON-schema dialect is
//! [`to_wire_schema`], so the schema generator can be replaced without
//! touching the request client.

use std::marker::PhantomData;

use schemars::gen::SchemaSettings;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::ProviderError;

/// A type the provider can be asked to produce as JSON.
pub trait StructuredOutput: DeserializeOwned + JsonSchema {
    /// Checks constraints that deserialization alone does not enforce.
    ///
    /// Returns a human-readable description of the first violation.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Named schema handed to the client with each request.
#[derive(Debug)]
pub struct ResponseSchema<T> {
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResponseSchema<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: StructuredOutput> ResponseSchema<T> {
    /// Creates a schema with the name the provider will see.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _marker: PhantomData,
        }
    }

    /// Schema name carried into `response_format.json_schema.name`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider wire representation of the schema.
    #[must_use]
    pub fn wire_schema(&self) -> Value {
        let settings = SchemaSettings::draft07().with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        });
        let root = settings.into_generator().into_root_schema_for::<T>();
        to_wire_schema(&root)
    }

    /// Parses and validates an arbitrary JSON value.
    pub fn parse(&self, value: Value) -> Result<T, ProviderError> {
        let parsed: T = serde_json::from_value(value).map_err(|e| {
            ProviderError::ValidationFailed(format!("{} does not match schema: {e}", self.name))
        })?;
        parsed
            .validate()
            .map_err(|reason| ProviderError::ValidationFailed(format!("{}: {reason}", self.name)))?;
        Ok(parsed)
    }
}

/// Converts a generated schema into the provider's strict JSON-schema format.
///
/// Drops generator metadata and forces `additionalProperties: false` on
/// every object schema.
#[must_use]
pub fn to_wire_schema(root: &RootSchema) -> Value {
    let mut value = serde_json::to_value(root).unwrap_or(Value::Object(Map::new()));
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("title");
        if map.get("definitions").is_some_and(|d| d.as_object().is_some_and(Map::is_empty)) {
            map.remove("definitions");
        }
    }
    forbid_additional_properties(&mut value);
    value
}

fn forbid_additional_properties(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let is_object_schema = map.get("type").and_then(Value::as_str) == Some("object")
                || map.contains_key("properties");
            if is_object_schema {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for (key, child) in map.iter_mut() {
                if key != "additionalProperties" {
                    forbid_additional_properties(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(forbid_additional_properties),
        _ => {}
    }
}
