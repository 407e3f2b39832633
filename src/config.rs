//! Configuration of the documentation feature: where it is mounted, whether the UI is
//! served, and the metadata of the produced document.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{model::Info, registry::CollisionPolicy};

/// Default location on disk where the configuration file is looked up.
const DEFAULT_CONFIG_PATH: &str = "config/swagger.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SWAGGER_SUPPORT_CONFIG_PATH";
/// Path segment the documentation is mounted under by default.
pub const DEFAULT_DOCS_PATH: &str = "apidocs";

#[derive(Debug, Clone, PartialEq)]
/// Settings of an installed [`crate::SwaggerSupport`].
pub struct SwaggerConfig {
    /// Mounted path segment, without slashes.
    pub path: String,
    /// Whether `GET /` redirects to the documentation.
    pub forward_root: bool,
    /// Whether the bundled Swagger UI is served.
    pub provide_ui: bool,
    /// Document metadata.
    pub info: Info,
    /// `basePath` of the document.
    pub base_path: String,
    /// `host` of the document.
    pub host: Option<String>,
    /// `schemes` of the document.
    pub schemes: Vec<String>,
    /// Behaviour when two sources claim one definition name.
    pub collision_policy: CollisionPolicy,
}

impl Default for SwaggerConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DOCS_PATH.to_string(),
            forward_root: false,
            provide_ui: true,
            info: Info::default(),
            base_path: "/".to_string(),
            host: None,
            schemes: Vec::new(),
            collision_policy: CollisionPolicy::default(),
        }
    }
}

impl SwaggerConfig {
    /// Load the configuration from disk, falling back to the defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path())
    }

    /// Load the configuration from `path`, falling back to the defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        docs_path = %config.path,
                        "loaded swagger configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse swagger configuration; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "swagger configuration not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read swagger configuration; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Mount the documentation under `path`. Surrounding slashes are dropped; an empty
    /// path falls back to [`DEFAULT_DOCS_PATH`].
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = normalize_path(path);
        self
    }

    /// Path segment the routes are mounted under, normalized even when
    /// [`SwaggerConfig::path`] was assigned directly.
    pub fn mount_path(&self) -> String {
        normalize_path(&self.path)
    }

    /// Redirect `GET /` to the documentation.
    pub fn with_forward_root(mut self, forward_root: bool) -> Self {
        self.forward_root = forward_root;
        self
    }

    /// Serve or hide the bundled UI.
    pub fn with_provide_ui(mut self, provide_ui: bool) -> Self {
        self.provide_ui = provide_ui;
        self
    }

    /// Replace the document metadata.
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    /// Set the document's `basePath`.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.to_string();
        self
    }

    /// Choose how definition name collisions are handled.
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file.
struct RawConfig {
    path: Option<String>,
    forward_root: Option<bool>,
    provide_ui: Option<bool>,
    info: Option<Info>,
    base_path: Option<String>,
    host: Option<String>,
    schemes: Option<Vec<String>>,
    collision_policy: Option<CollisionPolicy>,
}

impl From<RawConfig> for SwaggerConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            path: value
                .path
                .map(|path| normalize_path(&path))
                .unwrap_or(defaults.path),
            forward_root: value.forward_root.unwrap_or(defaults.forward_root),
            provide_ui: value.provide_ui.unwrap_or(defaults.provide_ui),
            info: value.info.unwrap_or(defaults.info),
            base_path: value.base_path.unwrap_or(defaults.base_path),
            host: value.host,
            schemes: value.schemes.unwrap_or(defaults.schemes),
            collision_policy: value.collision_policy.unwrap_or(defaults.collision_policy),
        }
    }
}

/// Drop surrounding slashes; an empty result would collide with the application root.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        warn!(
            requested = path,
            fallback = DEFAULT_DOCS_PATH,
            "empty documentation mount path; using the default"
        );
        return DEFAULT_DOCS_PATH.to_string();
    }
    trimmed.to_string()
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn write_temp(contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("swagger-config-{}.json", Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = SwaggerConfig::default();
        assert_eq!(config.path, "apidocs");
        assert!(!config.forward_root);
        assert!(config.provide_ui);
        assert_eq!(config.collision_policy, CollisionPolicy::Reject);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = env::temp_dir().join(format!("missing-{}.json", Uuid::new_v4()));
        assert_eq!(SwaggerConfig::load_from(&path), SwaggerConfig::default());
    }

    #[test]
    fn file_overrides_selected_fields() {
        let path = write_temp(
            r#"{
                "path": "/docs/",
                "forwardRoot": true,
                "info": { "title": "Pets", "version": "2.1.0" },
                "collisionPolicy": "first_wins"
            }"#,
        );
        let config = SwaggerConfig::load_from(&path);
        fs::remove_file(&path).ok();

        assert_eq!(config.path, "docs");
        assert!(config.forward_root);
        assert!(config.provide_ui);
        assert_eq!(config.info, Info::new("Pets", "2.1.0"));
        assert_eq!(config.collision_policy, CollisionPolicy::FirstWins);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let path = write_temp("{ not json");
        let config = SwaggerConfig::load_from(&path);
        fs::remove_file(&path).ok();

        assert_eq!(config, SwaggerConfig::default());
    }

    #[test]
    fn builder_normalizes_the_mount_path() {
        let config = SwaggerConfig::default().with_path("/reference/");
        assert_eq!(config.path, "reference");
    }

    #[test]
    fn empty_mount_path_falls_back_to_default() {
        for path in ["", "/", "//"] {
            assert_eq!(SwaggerConfig::default().with_path(path).path, DEFAULT_DOCS_PATH);
        }

        let config = SwaggerConfig {
            path: "/".to_string(),
            ..SwaggerConfig::default()
        };
        assert_eq!(config.mount_path(), DEFAULT_DOCS_PATH);
    }

    #[test]
    fn root_path_in_file_falls_back_to_default() {
        let path = write_temp(r#"{ "path": "/", "forwardRoot": true }"#);
        let config = SwaggerConfig::load_from(&path);
        fs::remove_file(&path).ok();

        assert_eq!(config.path, DEFAULT_DOCS_PATH);
        assert!(config.forward_root);
    }
}
