//! Swagger 2.0 documentation synthesized from declared routes, served next to the
//! application together with a bundled Swagger UI.

pub mod config;
pub mod document;
/// Registration and documentation route errors.
pub mod error;
pub mod introspect;
pub mod model;
pub mod operation;
pub mod params;
pub mod playground;
pub mod reflect;
pub mod registry;
/// HTTP routes mounted by [`SwaggerSupport::routes`].
pub mod routes;
mod support;

pub use config::SwaggerConfig;
pub use document::ApiDocument;
pub use error::{DocsError, SwaggerError, SwaggerResult};
pub use operation::{
    BodySpec, Location, LocationDescriptor, OperationSpec, ResponseSpec, created, no_content,
    not_found, ok,
};
pub use reflect::{FieldInfo, Primitive, Reflect, Shape, TypeInfo, TypeRef};
pub use registry::{CollisionPolicy, DefinitionRegistry};
pub use support::{DocumentedRouter, SwaggerSupport};
