use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::debug;
use utoipa_swagger_ui::Config;

use crate::{document::ApiDocument, error::DocsError, support::SwaggerSupport};

/// File name under which the document is served.
pub const SWAGGER_JSON: &str = "swagger.json";

#[derive(Clone)]
struct DocsState {
    document: Arc<ApiDocument>,
    ui: Option<Arc<Config<'static>>>,
    location: Arc<str>,
}

/// Serve the document, the bundled Swagger UI and the redirects leading to it.
pub fn router<S>(support: &SwaggerSupport) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let config = support.config();
    let path = config.mount_path();
    let ui = config
        .provide_ui
        .then(|| Arc::new(Config::new([SWAGGER_JSON]).query_config_enabled(true)));
    let state = DocsState {
        document: support.document().clone(),
        ui,
        location: format!("/{path}/index.html?url={SWAGGER_JSON}").into(),
    };

    let mut router = Router::new()
        .route(&format!("/{path}"), get(redirect))
        .route(&format!("/{path}/"), get(redirect))
        .route(&format!("/{path}/{{file_name}}"), get(serve_file));
    if config.forward_root {
        router = router.route("/", get(redirect));
    }

    router.with_state(state)
}

/// Send the browser to the UI entry point, pointing it at the document.
async fn redirect(State(state): State<DocsState>) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, state.location.to_string())],
    )
        .into_response()
}

/// Serve the document or one of the UI's static files.
async fn serve_file(
    State(state): State<DocsState>,
    Path(file_name): Path<String>,
) -> Result<Response, DocsError> {
    if file_name == SWAGGER_JSON {
        return Ok(Json(state.document.snapshot()).into_response());
    }

    let Some(ui) = state.ui else {
        debug!(file = %file_name, "swagger ui disabled");
        return Err(DocsError::UnknownStaticAsset(file_name));
    };

    match utoipa_swagger_ui::serve(&file_name, ui) {
        Ok(Some(file)) => Ok((
            [(header::CONTENT_TYPE, file.content_type)],
            file.bytes.into_owned(),
        )
            .into_response()),
        Ok(None) => Err(DocsError::UnknownStaticAsset(file_name)),
        Err(err) => Err(DocsError::Internal(err.to_string())),
    }
}
