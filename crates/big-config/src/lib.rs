//! Configuration management for Big.
//!
//! Parses `big.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.home_url`
//! - `site.base_path`
//! - `storage.data_file`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the home URL prefixed onto relative asset paths.
    pub home_url: Option<String>,
    /// Override the JSON dataset file.
    pub data_file: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "big.toml";

/// Label of the "no explicit template" entry in template lists.
const DEFAULT_TEMPLATE_TEXT: &str = "- Use default template -";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site URLs and page assembly.
    pub site: SiteConfig,
    /// Menu manager behaviour.
    pub menus: MenusConfig,
    /// Template manager behaviour.
    pub templates: TemplatesConfig,
    /// Storage configuration (paths are relative strings from TOML).
    storage: StorageConfigRaw,

    /// Resolved storage configuration (set after loading).
    #[serde(skip)]
    pub storage_resolved: StorageConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[site]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Prefix for relative `src`, `href` and `poster` values. Empty disables it.
    pub home_url: String,
    /// Public path of the default menu item.
    pub base_path: String,
    /// Appended to SEO URLs, e.g. `.html`.
    pub url_suffix: String,
    /// Query parameter carrying the route in dynamic URLs.
    pub route_param: String,
    /// Whether include statements are substituted at all.
    pub dynamic_content: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            home_url: String::new(),
            base_path: "/".to_owned(),
            url_suffix: String::new(),
            route_param: "r".to_owned(),
            dynamic_content: true,
        }
    }
}

/// `[menus]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MenusConfig {
    /// Load every menu tree on first use instead of querying per lookup.
    pub auto_load: bool,
    /// Route requests without a path to the default menu item.
    pub set_default_route: bool,
}

impl Default for MenusConfig {
    fn default() -> Self {
        Self {
            auto_load: true,
            set_default_route: false,
        }
    }
}

/// `[templates]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Label of the id 0 entry in template drop-down lists.
    pub default_text: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            default_text: DEFAULT_TEMPLATE_TEXT.to_owned(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorageConfigRaw {
    data_file: Option<String>,
}

/// Resolved storage configuration with absolute paths.
#[derive(Debug, Default)]
pub struct StorageConfig {
    /// JSON dataset with menus, categories, templates and blocks.
    pub data_file: Option<PathBuf>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.home_url`").
        field: String,
        /// Error message (e.g., "${`BIG_HOME`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `big.toml` in current directory and parents,
    /// falling back to defaults.
    ///
    /// CLI settings are applied after loading and path resolution.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(home_url) = &settings.home_url {
            self.site.home_url.clone_from(home_url);
        }
        if let Some(data_file) = &settings.data_file {
            self.storage_resolved.data_file = Some(data_file.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let site = &self.site;

        require_non_empty(&site.route_param, "site.route_param")?;
        if !site
            .route_param
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::Validation(
                "site.route_param may only contain letters, digits and underscores".to_owned(),
            ));
        }

        if !site.base_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "site.base_path must start with /".to_owned(),
            ));
        }

        if site.url_suffix.contains('/') {
            return Err(ConfigError::Validation(
                "site.url_suffix cannot contain /".to_owned(),
            ));
        }

        if !site.home_url.is_empty()
            && !site.home_url.starts_with("http://")
            && !site.home_url.starts_with("https://")
            && !site.home_url.starts_with('/')
        {
            return Err(ConfigError::Validation(
                "site.home_url must be an http(s) URL or start with /".to_owned(),
            ));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.home_url = expand::expand_env(&self.site.home_url, "site.home_url")?;
        self.site.base_path = expand::expand_env(&self.site.base_path, "site.base_path")?;
        if let Some(ref data_file) = self.storage.data_file {
            self.storage.data_file = Some(expand::expand_env(data_file, "storage.data_file")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.storage_resolved = StorageConfig {
            data_file: self.storage.data_file.as_deref().map(|f| config_dir.join(f)),
        };
    }
}
