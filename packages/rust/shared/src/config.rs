//! Application configuration for VariantScope.
//!
//! User config lives at `~/.variantscope/variantscope.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, VariantScopeError};
use crate::types::DEFAULT_MODEL;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "variantscope.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".variantscope";

// ---------------------------------------------------------------------------
// Config structs (matching variantscope.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Content API settings.
    #[serde(default)]
    pub content_api: ContentApiConfig,
}

/// `[content_api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentApiConfig {
    /// Origin of the content API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout for content fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Model used when a content reference names none.
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for ContentApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            default_model: default_model(),
        }
    }
}

fn default_base_url() -> String {
    "https://cdn.builder.io".into()
}
fn default_api_key_env() -> String {
    "CONTENT_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_model() -> String {
    DEFAULT_MODEL.into()
}

impl ContentApiConfig {
    /// Parse `base_url`, rejecting anything that cannot carry a path.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            VariantScopeError::config(format!("invalid base_url {:?}: {e}", self.base_url))
        })?;
        if url.cannot_be_a_base() {
            return Err(VariantScopeError::config(format!(
                "base_url {:?} cannot be used as a base URL",
                self.base_url
            )));
        }
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.variantscope/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| VariantScopeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.variantscope/variantscope.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| VariantScopeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        VariantScopeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| VariantScopeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| VariantScopeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| VariantScopeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the content API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.content_api.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(VariantScopeError::config(format!(
            "content API key not found. Set the {var_name} environment variable \
             or pass --api-key."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("CONTENT_API_KEY"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[content_api]
base_url = "http://localhost:4000"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.content_api.base_url, "http://localhost:4000");
        assert_eq!(config.content_api.timeout_secs, 30);
        assert_eq!(config.content_api.default_model, "page");
    }

    #[test]
    fn config_fixture_loads() {
        let config = load_config_from(Path::new("../../../fixtures/config/variantscope.toml"))
            .expect("load fixture config");
        assert_eq!(config.content_api.api_key_env, "STAGING_CONTENT_KEY");
        assert_eq!(config.content_api.timeout_secs, 5);
        assert_eq!(config.content_api.default_model, "landing-page");
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/variantscope.toml")).unwrap_err();
        assert!(matches!(err, VariantScopeError::Io { .. }));
    }

    #[test]
    fn base_url_validation() {
        let mut api = ContentApiConfig::default();
        assert_eq!(api.base_url().expect("default parses").host_str(), Some("cdn.builder.io"));

        api.base_url = "not a url".into();
        assert!(api.base_url().is_err());

        api.base_url = "mailto:someone@example.com".into();
        assert!(api.base_url().is_err());
    }

    #[test]
    fn api_key_resolution() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.content_api.api_key_env = "VS_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
