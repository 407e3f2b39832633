//! The installed documentation feature and the route-declaration helpers built on it.

use std::sync::Arc;

use axum::{
    Router,
    handler::Handler,
    http::Method,
    routing::{self, MethodRouter},
};
use tracing::{info, warn};

use crate::{
    config::SwaggerConfig,
    document::ApiDocument,
    error::{SwaggerError, SwaggerResult},
    model::Operation,
    operation::{self, Location, LocationDescriptor, OperationSpec},
    reflect::{Reflect, TypeRef},
    routes,
};

/// Document plus UI settings, shared by every route registration of an application.
#[derive(Clone)]
pub struct SwaggerSupport {
    config: Arc<SwaggerConfig>,
    document: Arc<ApiDocument>,
}

impl SwaggerSupport {
    /// Create the feature with an empty document built from `config`.
    pub fn install(config: SwaggerConfig) -> Self {
        let document = Arc::new(ApiDocument::from_config(&config));
        info!(
            docs_path = %config.path,
            forward_root = config.forward_root,
            provide_ui = config.provide_ui,
            "installed swagger support"
        );
        Self {
            config: Arc::new(config),
            document,
        }
    }

    /// Settings the feature was installed with.
    pub fn config(&self) -> &SwaggerConfig {
        &self.config
    }

    /// Document every registration writes into.
    pub fn document(&self) -> &Arc<ApiDocument> {
        &self.document
    }

    /// Document `method` on location `L`, whose handler receives a body of type `B`
    /// (`()` for none).
    pub fn register<L: Location, B: Reflect>(
        &self,
        method: Method,
        spec: &OperationSpec,
    ) -> SwaggerResult<Operation> {
        self.register_location(method, &L::descriptor(), spec, B::type_ref())
    }

    /// Document `method` on an explicitly described location.
    pub fn register_location(
        &self,
        method: Method,
        location: &LocationDescriptor,
        spec: &OperationSpec,
        body_type: TypeRef,
    ) -> SwaggerResult<Operation> {
        let body = spec.body_spec(body_type);
        operation::synthesize(&self.document, &method, location, spec, body)
    }

    /// Routes serving the document and the UI.
    pub fn routes<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let dangling = self.document.dangling_references();
        if !dangling.is_empty() {
            warn!(?dangling, "document references undefined definitions");
        }
        routes::docs::router(self)
    }
}

/// Router wrapper that documents every route it mounts.
///
/// Location types double as path templates: axum and Swagger share the `{name}`
/// placeholder syntax, so `L::PATH` is mounted verbatim.
pub struct DocumentedRouter<S = ()> {
    router: Router<S>,
    support: SwaggerSupport,
}

impl<S> DocumentedRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Empty router documenting into `support`.
    pub fn new(support: SwaggerSupport) -> Self {
        Self {
            router: Router::new(),
            support,
        }
    }

    /// Feature the routes are documented into.
    pub fn support(&self) -> &SwaggerSupport {
        &self.support
    }

    /// `GET` on `L`.
    pub fn get<L, H, T>(self, spec: OperationSpec, handler: H) -> SwaggerResult<Self>
    where
        L: Location,
        H: Handler<T, S>,
        T: 'static,
    {
        self.documented::<L, ()>(Method::GET, &spec, routing::get(handler))
    }

    /// `DELETE` on `L`.
    pub fn delete<L, H, T>(self, spec: OperationSpec, handler: H) -> SwaggerResult<Self>
    where
        L: Location,
        H: Handler<T, S>,
        T: 'static,
    {
        self.documented::<L, ()>(Method::DELETE, &spec, routing::delete(handler))
    }

    /// `POST` on `L` with a body of type `B`.
    pub fn post<L, B, H, T>(self, spec: OperationSpec, handler: H) -> SwaggerResult<Self>
    where
        L: Location,
        B: Reflect,
        H: Handler<T, S>,
        T: 'static,
    {
        self.documented::<L, B>(Method::POST, &spec, routing::post(handler))
    }

    /// `PUT` on `L` with a body of type `B`.
    pub fn put<L, B, H, T>(self, spec: OperationSpec, handler: H) -> SwaggerResult<Self>
    where
        L: Location,
        B: Reflect,
        H: Handler<T, S>,
        T: 'static,
    {
        self.documented::<L, B>(Method::PUT, &spec, routing::put(handler))
    }

    /// Each path and method pair may be mounted once; a second declaration fails with
    /// [`SwaggerError::InvalidOperationSpec`] and leaves the document untouched.
    fn documented<L: Location, B: Reflect>(
        mut self,
        method: Method,
        spec: &OperationSpec,
        method_router: MethodRouter<S>,
    ) -> SwaggerResult<Self> {
        if self.support.document.operation(L::PATH, &method).is_some() {
            return Err(SwaggerError::InvalidOperationSpec(format!(
                "method {method} on {} is already routed",
                L::PATH
            )));
        }
        self.support.register::<L, B>(method, spec)?;
        self.router = self.router.route(L::PATH, method_router);
        Ok(self)
    }

    /// Application routes merged with the documentation routes.
    pub fn into_router(self) -> Router<S> {
        let docs = self.support.routes();
        self.router.merge(docs)
    }
}
