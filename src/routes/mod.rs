/// Swagger document, redirects and bundled UI.
pub mod docs;
