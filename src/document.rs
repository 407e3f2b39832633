//! The document under construction: metadata, path table and definitions.

use std::sync::{PoisonError, RwLock};

use axum::http::Method;
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    config::SwaggerConfig,
    model::{Info, Operation, Swagger},
    registry::{CollisionPolicy, DefinitionRegistry},
};

const SWAGGER_VERSION: &str = "2.0";

type PathTable = IndexMap<String, IndexMap<String, Operation>>;

/// Root aggregate written by the synthesizer and read by the documentation routes.
///
/// Writes happen while routes are registered; once the application serves traffic the
/// document is only read through [`ApiDocument::snapshot`].
pub struct ApiDocument {
    info: Info,
    base_path: String,
    host: Option<String>,
    schemes: Vec<String>,
    paths: RwLock<PathTable>,
    registry: DefinitionRegistry,
}

impl ApiDocument {
    /// Empty document.
    pub fn new(info: Info, base_path: impl Into<String>, policy: CollisionPolicy) -> Self {
        Self {
            info,
            base_path: base_path.into(),
            host: None,
            schemes: Vec::new(),
            paths: RwLock::new(IndexMap::new()),
            registry: DefinitionRegistry::new(policy),
        }
    }

    /// Empty document carrying the metadata of `config`.
    pub fn from_config(config: &SwaggerConfig) -> Self {
        Self {
            host: config.host.clone(),
            schemes: config.schemes.clone(),
            ..Self::new(
                config.info.clone(),
                config.base_path.clone(),
                config.collision_policy,
            )
        }
    }

    /// Document metadata.
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Definitions table shared by every operation of the document.
    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    /// Whether a definition named `name` exists.
    pub fn is_known_definition(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Store `operation` at `[path][lowercase method]`, returning the operation it
    /// replaces, if any.
    pub fn insert_operation(
        &self,
        path: &str,
        method: &Method,
        operation: Operation,
    ) -> Option<Operation> {
        let method = method.as_str().to_lowercase();
        let mut paths = self.paths.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = paths
            .entry(path.to_string())
            .or_default()
            .insert(method.clone(), operation);

        if replaced.is_some() {
            debug!(path, method = %method, "operation replaced by a later registration");
        }
        replaced
    }

    /// Operation registered at `path` for `method`.
    pub fn operation(&self, path: &str, method: &Method) -> Option<Operation> {
        let paths = self.paths.read().unwrap_or_else(PoisonError::into_inner);
        paths
            .get(path)
            .and_then(|methods| methods.get(&method.as_str().to_lowercase()))
            .cloned()
    }

    /// Number of distinct path templates.
    pub fn path_count(&self) -> usize {
        self.paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Serialisable copy of the current document.
    pub fn snapshot(&self) -> Swagger {
        let paths = self
            .paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Swagger {
            swagger: SWAGGER_VERSION.to_string(),
            info: self.info.clone(),
            host: self.host.clone(),
            base_path: self.base_path.clone(),
            schemes: self.schemes.clone(),
            paths,
            definitions: self.registry.definitions(),
        }
    }

    /// References in the current document that no definition satisfies.
    pub fn dangling_references(&self) -> Vec<String> {
        self.snapshot().dangling_references()
    }
}

impl Default for ApiDocument {
    fn default() -> Self {
        Self::from_config(&SwaggerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Response;

    fn operation(summary: &str) -> Operation {
        Operation {
            summary: Some(summary.to_string()),
            responses: IndexMap::from([("200".to_string(), Response::no_content("OK"))]),
            ..Operation::default()
        }
    }

    #[test]
    fn operations_are_keyed_by_lowercase_method() {
        let document = ApiDocument::default();
        document.insert_operation("/items", &Method::GET, operation("list"));

        let swagger = document.snapshot();
        assert!(swagger.paths["/items"].contains_key("get"));
        assert_eq!(document.path_count(), 1);
    }

    #[test]
    fn last_registration_for_a_slot_wins() {
        let document = ApiDocument::default();
        assert!(
            document
                .insert_operation("/items", &Method::POST, operation("first"))
                .is_none()
        );
        let replaced = document.insert_operation("/items", &Method::POST, operation("second"));

        assert_eq!(replaced.and_then(|op| op.summary).as_deref(), Some("first"));
        let current = document.operation("/items", &Method::POST).unwrap();
        assert_eq!(current.summary.as_deref(), Some("second"));
    }

    #[test]
    fn snapshot_carries_configured_metadata() {
        let config = SwaggerConfig::default()
            .with_info(Info::new("Pets", "3.0.0").with_description("Pet store"))
            .with_base_path("/api");
        let document = ApiDocument::from_config(&config);

        let value = serde_json::to_value(document.snapshot()).unwrap();
        assert_eq!(value["swagger"], "2.0");
        assert_eq!(value["info"]["title"], "Pets");
        assert_eq!(value["info"]["description"], "Pet store");
        assert_eq!(value["basePath"], "/api");
    }
}
