//! Swagger 2.0 document types, serialised as-is by the documentation routes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of every reference into the `definitions` table.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";
/// Media type consumed and produced by documented operations.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Root of the produced document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Swagger {
    /// Always `"2.0"`.
    pub swagger: String,
    /// Title, version and description.
    pub info: Info,
    /// Host serving the API, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Prefix of every path.
    pub base_path: String,
    /// Transfer protocols, such as `https`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,
    /// Path template → lowercase method → operation.
    pub paths: IndexMap<String, IndexMap<String, Operation>>,
    /// Named schemas referenced through `#/definitions/`.
    pub definitions: IndexMap<String, SchemaObject>,
}

impl Swagger {
    /// Names referenced anywhere in the document, paths and definitions alike.
    pub fn references(&self) -> Vec<String> {
        let mut names = Vec::new();
        for operation in self.paths.values().flat_map(|methods| methods.values()) {
            operation.collect_references(&mut names);
        }
        for definition in self.definitions.values() {
            definition.collect_references(&mut names);
        }
        names.sort();
        names.dedup();
        names
    }

    /// Referenced names with no matching entry in `definitions`.
    pub fn dangling_references(&self) -> Vec<String> {
        self.references()
            .into_iter()
            .filter(|name| !self.definitions.contains_key(name))
            .collect()
    }
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    pub title: String,
    /// API version, free form.
    pub version: String,
    /// Markdown description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Info {
    /// Metadata with a title and version.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Default for Info {
    fn default() -> Self {
        Self::new("API", "1.0.0")
    }
}

/// One documented HTTP method on one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Operation {
    /// Short summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Accepted request media types; empty without a body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    /// Response media types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    /// Body first, then path, query and header parameters.
    pub parameters: Vec<Parameter>,
    /// Status code → response, in declaration order.
    pub responses: IndexMap<String, Response>,
}

impl Operation {
    fn collect_references(&self, names: &mut Vec<String>) {
        for parameter in &self.parameters {
            if let Some(schema) = &parameter.schema {
                schema.collect_references(names);
            }
            if let Some(items) = &parameter.items {
                items.collect_references(names);
            }
        }
        for response in self.responses.values() {
            if let Some(schema) = &response.schema {
                schema.collect_references(names);
            }
        }
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// `{name}` placeholder of the path template.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Request body.
    Body,
}

/// Operation parameter.
///
/// Body parameters carry a `schema`; every other location carries `type`/`format`
/// (plus `items` for arrays and `enum` for enumerations).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Parameter name; `body` for the request body.
    pub name: String,
    /// Where the value is read from.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// Human readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Primitive type of non-body parameters.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// Format refining `type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Element schema of array parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Allowed values of enumerations.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    /// Schema of body parameters and object-typed fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Parameter {
    /// Parameter with no type information yet.
    pub fn new(name: impl Into<String>, location: ParameterIn, required: bool) -> Self {
        Self {
            name: name.into(),
            location,
            description: None,
            required,
            schema_type: None,
            format: None,
            items: None,
            enum_values: Vec::new(),
            schema: None,
        }
    }

    /// The request body parameter.
    pub fn body(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
            ..Self::new("body", ParameterIn::Body, true)
        }
    }
}

/// Response entry of an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Required by Swagger; the status reason phrase.
    pub description: String,
    /// Absent for "no content" responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Response {
    /// Response without a body.
    pub fn no_content(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            schema: None,
        }
    }

    /// Response carrying `schema`.
    pub fn with_schema(description: impl Into<String>, schema: Schema) -> Self {
        Self {
            description: description.into(),
            schema: Some(schema),
        }
    }
}

/// Swagger `type` keyword values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// Schema fragment: a reference, a primitive, an array or an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    /// `#/definitions/<name>` reference.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// `type` keyword.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// `format` keyword, e.g. `int64` or `date-time`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Human readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Element schema of arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Allowed values of enumerations.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    /// Object properties in declaration order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Names of non-nullable properties.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl Schema {
    /// Bare `$ref` to the definition `name`.
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{DEFINITIONS_PREFIX}{name}")),
            ..Self::default()
        }
    }

    /// Schema with only a `type`.
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// Array whose elements follow `items`.
    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type(SchemaType::Array)
        }
    }

    /// Definition name this schema points at, when it is a reference.
    pub fn referenced_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|reference| reference.strip_prefix(DEFINITIONS_PREFIX))
    }

    /// Every definition name referenced by the schema or its children.
    pub fn references(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references(&self, names: &mut Vec<String>) {
        if let Some(name) = self.referenced_name() {
            names.push(name.to_string());
        }
        if let Some(items) = &self.items {
            items.collect_references(names);
        }
        for property in self.properties.values() {
            property.collect_references(names);
        }
    }
}

/// Entry of the `definitions` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaObject {
    /// Derived from a reflected type.
    Derived(Schema),
    /// Supplied verbatim by the caller.
    Explicit(Value),
}

impl SchemaObject {
    /// Every definition name referenced from this entry.
    pub fn references(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references(&self, names: &mut Vec<String>) {
        match self {
            SchemaObject::Derived(schema) => schema.collect_references(names),
            SchemaObject::Explicit(value) => collect_value_references(value, names),
        }
    }
}

fn collect_value_references(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", Value::String(reference)) => {
                        if let Some(name) = reference.strip_prefix(DEFINITIONS_PREFIX) {
                            names.push(name.to_string());
                        }
                    }
                    _ => collect_value_references(child, names),
                }
            }
        }
        Value::Array(values) => {
            for child in values {
                collect_value_references(child, names);
            }
        }
        _ => {}
    }
}
