//! Route metadata and the synthesis of one [`Operation`] from it.

use axum::http::{Method, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::{
    document::ApiDocument,
    error::{SwaggerError, SwaggerResult},
    introspect,
    model::{JSON_MEDIA_TYPE, Operation, Parameter, ParameterIn, Response, Schema},
    params,
    reflect::{Reflect, TypeRef},
};

/// Methods that never carry a request body.
const BODYLESS_METHODS: [Method; 3] = [Method::GET, Method::DELETE, Method::HEAD];

/// Source of the request body schema.
#[derive(Debug, Clone, PartialEq)]
pub enum BodySpec {
    /// Derive the schema from a reflected type; `()` means "no body".
    FromType(TypeRef),
    /// Use a caller-supplied schema registered under `name`.
    FromExplicitSchema {
        /// Definition name.
        name: String,
        /// Schema stored verbatim.
        schema: Value,
    },
}

impl BodySpec {
    /// Body described by `T`.
    pub fn of<T: Reflect>() -> Self {
        BodySpec::FromType(T::type_ref())
    }

    /// Whether this amounts to "no body".
    pub fn is_absent(&self) -> bool {
        match self {
            BodySpec::FromType(ty) => ty.is_absent(),
            BodySpec::FromExplicitSchema { schema, .. } => schema.is_null(),
        }
    }
}

/// Source of one response schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSpec {
    /// Derive the schema from a reflected type; `()` means "no content".
    FromType(TypeRef),
    /// Use a caller-supplied schema registered under `name`.
    FromExplicitSchema {
        /// Definition name.
        name: String,
        /// Schema stored verbatim.
        schema: Value,
    },
}

impl ResponseSpec {
    /// Response described by `T`.
    pub fn of<T: Reflect>() -> Self {
        ResponseSpec::FromType(T::type_ref())
    }

    /// Response without content.
    pub fn empty() -> Self {
        Self::of::<()>()
    }

    /// Response using an explicit schema.
    pub fn explicit(name: impl Into<String>, schema: Value) -> Self {
        ResponseSpec::FromExplicitSchema {
            name: name.into(),
            schema,
        }
    }
}

/// `200 OK` returning `T`.
pub fn ok<T: Reflect>() -> (StatusCode, ResponseSpec) {
    (StatusCode::OK, ResponseSpec::of::<T>())
}

/// `201 Created` returning `T`.
pub fn created<T: Reflect>() -> (StatusCode, ResponseSpec) {
    (StatusCode::CREATED, ResponseSpec::of::<T>())
}

/// `204 No Content`.
pub fn no_content() -> (StatusCode, ResponseSpec) {
    (StatusCode::NO_CONTENT, ResponseSpec::empty())
}

/// `404 Not Found` without content.
pub fn not_found() -> (StatusCode, ResponseSpec) {
    (StatusCode::NOT_FOUND, ResponseSpec::empty())
}

#[derive(Debug, Clone, PartialEq)]
struct ExplicitBody {
    name: Option<String>,
    schema: Value,
}

/// Documentation metadata attached to a route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSpec {
    summary: Option<String>,
    description: Option<String>,
    responses: IndexMap<StatusCode, ResponseSpec>,
    parameters: Option<TypeRef>,
    headers: Option<TypeRef>,
    body_schema: Option<ExplicitBody>,
}

impl OperationSpec {
    /// Metadata with no responses yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata with a summary and its responses.
    pub fn responds(
        summary: impl Into<String>,
        responses: impl IntoIterator<Item = (StatusCode, ResponseSpec)>,
    ) -> Self {
        Self::new().with_summary(summary).with_responses(responses)
    }

    /// Metadata with responses and no summary.
    pub fn responses(responses: impl IntoIterator<Item = (StatusCode, ResponseSpec)>) -> Self {
        Self::new().with_responses(responses)
    }

    /// Short summary shown next to the operation.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Longer description of the operation.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add responses; a status declared twice keeps the last one.
    pub fn with_responses(
        mut self,
        responses: impl IntoIterator<Item = (StatusCode, ResponseSpec)>,
    ) -> Self {
        self.responses.extend(responses);
        self
    }

    /// Add or replace the response for `status`.
    pub fn with_response(mut self, status: StatusCode, response: ResponseSpec) -> Self {
        self.responses.insert(status, response);
        self
    }

    /// Document every field of `H` as a header parameter.
    pub fn header<H: Reflect>(mut self) -> Self {
        self.headers = Some(H::type_ref());
        self
    }

    /// Document every field of `Q` as an extra query parameter.
    pub fn parameter<Q: Reflect>(mut self) -> Self {
        self.parameters = Some(Q::type_ref());
        self
    }

    /// Describe the body with an explicit schema instead of the body type. Without a
    /// name the definition is named after the body type.
    pub fn with_body_schema(mut self, name: Option<&str>, schema: Value) -> Self {
        self.body_schema = Some(ExplicitBody {
            name: name.map(str::to_string),
            schema,
        });
        self
    }

    /// Summary, if one was set.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Body specification for a route whose handler receives `body_type`.
    pub fn body_spec(&self, body_type: TypeRef) -> BodySpec {
        match &self.body_schema {
            Some(explicit) => BodySpec::FromExplicitSchema {
                name: explicit
                    .name
                    .clone()
                    .unwrap_or_else(|| body_type.info().name.into_owned()),
                schema: explicit.schema.clone(),
            },
            None => BodySpec::FromType(body_type),
        }
    }
}

/// Path template, grouping tags and structure of a route's location type.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDescriptor {
    /// Path template with `{name}` placeholders.
    pub path: String,
    /// Tags grouping the location's operations.
    pub tags: Vec<String>,
    /// Type whose fields are bound to path and query parameters.
    pub ty: TypeRef,
}

impl LocationDescriptor {
    /// Location at `path` described by `T`.
    pub fn new<T: Reflect>(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tags: Vec::new(),
            ty: T::type_ref(),
        }
    }

    /// Location at `path` without path or query fields.
    pub fn bare(path: impl Into<String>) -> Self {
        Self::new::<()>(path)
    }

    /// Replace the tags.
    pub fn with_tags<I, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Types that stand for a route location.
///
/// The path template uses `{name}` placeholders; fields of the type named after a
/// placeholder are path parameters, the others are query parameters. Every
/// placeholder must have a matching field.
pub trait Location: Reflect {
    /// Path template of the route.
    const PATH: &'static str;
    /// Tags grouping the route's operations.
    const TAGS: &'static [&'static str] = &[];

    /// Descriptor used by the synthesizer.
    fn descriptor() -> LocationDescriptor {
        LocationDescriptor {
            path: Self::PATH.to_string(),
            tags: Self::TAGS.iter().map(|tag| tag.to_string()).collect(),
            ty: Self::type_ref(),
        }
    }
}

/// Whether requests with `method` may carry a body.
pub fn method_allows_body(method: &Method) -> bool {
    !BODYLESS_METHODS.contains(method)
}

/// Build the operation for `method` on `location`, register every definition it
/// references and store it in `document`, replacing any operation already stored for
/// the same path and method.
pub fn synthesize(
    document: &ApiDocument,
    method: &Method,
    location: &LocationDescriptor,
    spec: &OperationSpec,
    body: BodySpec,
) -> SwaggerResult<Operation> {
    if !method_allows_body(method) && !body.is_absent() {
        return Err(SwaggerError::InvalidOperationSpec(format!(
            "method {method} on {} does not support a body parameter",
            location.path
        )));
    }

    let registry = document.registry();
    let mut parameters = Vec::new();

    if !body.is_absent() {
        match body {
            BodySpec::FromExplicitSchema { name, schema } => {
                registry.register_explicit(&name, schema)?;
                parameters.push(Parameter::body(Schema::reference(&name)));
            }
            BodySpec::FromType(ty) => {
                if let Some(described) = introspect::fragment(&ty) {
                    registry.register_all(described.referenced)?;
                    parameters.push(Parameter::body(described.schema));
                }
            }
        }
    }
    let has_body = !parameters.is_empty();

    let sources = [
        (Some(location.ty), None),
        (spec.parameters, Some(ParameterIn::Query)),
        (spec.headers, Some(ParameterIn::Header)),
    ];
    for (ty, origin) in sources {
        let Some(ty) = ty else {
            continue;
        };
        for bound in params::bind_all(&ty, &location.path, origin) {
            registry.register_all(bound.referenced)?;
            parameters.push(bound.parameter);
        }
    }

    let mut responses = IndexMap::new();
    for (status, response) in &spec.responses {
        let description = status.canonical_reason().unwrap_or_default();
        let response = match response {
            ResponseSpec::FromType(ty) => match introspect::fragment(ty) {
                Some(described) => {
                    registry.register_all(described.referenced)?;
                    Response::with_schema(description, described.schema)
                }
                None => Response::no_content(description),
            },
            ResponseSpec::FromExplicitSchema { name, schema } => {
                registry.register_explicit(name, schema.clone())?;
                Response::with_schema(description, Schema::reference(name))
            }
        };
        responses.insert(status.as_str().to_string(), response);
    }

    let operation = Operation {
        summary: spec.summary.clone(),
        description: spec.description.clone(),
        tags: location.tags.clone(),
        consumes: if has_body {
            vec![JSON_MEDIA_TYPE.to_string()]
        } else {
            Vec::new()
        },
        produces: vec![JSON_MEDIA_TYPE.to_string()],
        parameters,
        responses,
    };

    debug!(
        path = %location.path,
        method = %method,
        parameters = operation.parameters.len(),
        responses = operation.responses.len(),
        "synthesized operation"
    );
    document.insert_operation(&location.path, method, operation.clone());
    Ok(operation)
}
