//! Tool descriptors and argument validation.
//!
//! A [`ToolDescriptor`] is the immutable, registered description of a tool:
//! its name, what it does, and the ordered list of parameters it accepts.
//! The same descriptor drives both the advertised JSON Schema (`tools/list`)
//! and the validation applied to every incoming call.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::ToolError;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// JSON Schema type keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Check whether a JSON value has this type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// Name of the JSON type of a value, for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One parameter in a tool's input schema.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub param_type: ParamType,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required parameter.
    pub fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            param_type,
            description,
            required: true,
            default: None,
        }
    }

    /// An optional parameter, filled with `default` when absent.
    pub fn optional(
        name: &'static str,
        param_type: ParamType,
        description: &'static str,
        default: Option<Value>,
    ) -> Self {
        Self {
            name,
            param_type,
            description,
            required: false,
            default,
        }
    }
}

/// Immutable description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub output_schema: Option<Arc<JsonObject>>,
}

impl ToolDescriptor {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            params: Vec::new(),
            output_schema: None,
        }
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_output_schema(mut self, schema: Arc<JsonObject>) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Render the input schema as a JSON Schema object.
    pub fn input_schema(&self) -> JsonObject {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::from(param.param_type.as_str()));
            prop.insert("description".into(), Value::from(param.description));
            if let Some(default) = &param.default {
                prop.insert("default".into(), default.clone());
            }
            properties.insert(param.name.to_string(), Value::Object(prop));

            if param.required {
                required.push(Value::from(param.name));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), Value::from("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        schema.insert("additionalProperties".into(), Value::Bool(false));
        schema
    }

    /// Create a Tool model for this descriptor (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.into(),
            description: Some(self.description.into()),
            input_schema: Arc::new(self.input_schema()),
            annotations: None,
            output_schema: self.output_schema.clone(),
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Validate raw call arguments against the parameter list.
    ///
    /// `null` values are treated as absent, missing optional parameters are
    /// filled from their defaults, and arguments not named by any parameter
    /// are rejected.
    pub fn validate(&self, arguments: Option<JsonObject>) -> Result<ToolArguments, ToolError> {
        let mut raw = arguments.unwrap_or_default();

        if let Some(unexpected) = raw
            .keys()
            .find(|key| !self.params.iter().any(|p| p.name == key.as_str()))
        {
            return Err(ToolError::invalid_argument(
                unexpected.clone(),
                "unexpected argument",
            ));
        }

        let mut validated = Map::new();
        for param in &self.params {
            match raw.remove(param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    if !param.param_type.matches(&value) {
                        return Err(ToolError::invalid_argument(
                            param.name,
                            format!(
                                "expected {}, got {}",
                                param.param_type.as_str(),
                                json_type_name(&value)
                            ),
                        ));
                    }
                    validated.insert(param.name.to_string(), value);
                }
                None if param.required => {
                    return Err(ToolError::invalid_argument(
                        param.name,
                        "missing required argument",
                    ));
                }
                None => {
                    if let Some(default) = &param.default {
                        validated.insert(param.name.to_string(), default.clone());
                    }
                }
            }
        }

        Ok(ToolArguments(validated))
    }
}

/// Arguments that passed validation against a [`ToolDescriptor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(JsonObject);

impl ToolArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Deserialize into a typed parameter struct.
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|e| ToolError::invalid_argument("arguments", e.to_string()))
    }

    pub fn into_inner(self) -> JsonObject {
        self.0
    }
}
