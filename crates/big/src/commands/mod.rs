//! CLI command implementations.

pub(crate) mod categories;
pub(crate) mod menus;
pub(crate) mod positions;
pub(crate) mod render;
pub(crate) mod route;
pub(crate) mod search;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use big_config::{CliSettings, Config};
use big_parser::ParserError;
use big_site::{Site, SiteError, SiteSettings};
use big_storage::MemoryStorage;
use big_tree::MenuOptions;
use clap::Args;

use crate::error::CliError;
use crate::output::Output;

pub(crate) use categories::CategoriesArgs;
pub(crate) use positions::PositionsArgs;
pub(crate) use render::RenderArgs;
pub(crate) use route::RouteArgs;
pub(crate) use search::SearchArgs;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover big.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON dataset with menus, categories, templates and blocks (overrides config).
    #[arg(short, long, global = true, env = "BIG_DATA")]
    data: Option<PathBuf>,

    /// Home URL prefixed onto relative asset paths (overrides config).
    #[arg(long, global = true)]
    home_url: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load the configuration with CLI overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            home_url: self.home_url.clone(),
            data_file: self.data.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    /// Build an initialized site over the configured dataset.
    pub(crate) fn load_site(&self) -> Result<Site, CliError> {
        let config = self.load_config()?;
        let storage = load_storage(config.storage_resolved.data_file.as_deref())?;
        let site = Site::new(Arc::new(storage), site_settings(&config));
        site.initialize()?;
        Ok(site)
    }
}

fn load_storage(data_file: Option<&Path>) -> Result<MemoryStorage, CliError> {
    match data_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading dataset");
            Ok(MemoryStorage::from_json_file(path)?)
        }
        None => {
            Output::new().warning("No data file configured, using an empty dataset");
            Ok(MemoryStorage::new())
        }
    }
}

/// Map configuration sections onto site settings.
fn site_settings(config: &Config) -> SiteSettings {
    SiteSettings {
        home_url: config.site.home_url.clone(),
        base_path: config.site.base_path.clone(),
        url_suffix: config.site.url_suffix.clone(),
        route_param: config.site.route_param.clone(),
        dynamic_content: config.site.dynamic_content,
        menus: MenuOptions {
            auto_load: config.menus.auto_load,
            set_default_route: config.menus.set_default_route,
        },
        default_template_text: config.templates.default_text.clone(),
    }
}

/// Read a layout file as raw bytes.
fn read_layout(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })
}

/// Layout file as text, rejecting invalid UTF-8 the way rendering does.
fn read_layout_text(path: &Path) -> Result<String, CliError> {
    let bytes = read_layout(path)?;
    let text = std::str::from_utf8(&bytes)
        .map_err(ParserError::from)
        .map_err(SiteError::from)?;
    Ok(text.to_owned())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const DATASET: &str = r#"{
        "menus": [
            {"id": 1, "tree": 1, "lft": 1, "rgt": 4, "depth": 0, "title": "Main"},
            {"id": 2, "tree": 1, "lft": 2, "rgt": 3, "depth": 1, "title": "Home",
             "alias": "home", "route": "site/index", "is_default": 1}
        ]
    }"#;

    #[test]
    fn test_site_settings_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.toml");
        std::fs::write(
            &path,
            "[site]\nurl_suffix = \".html\"\n[menus]\nauto_load = false\n[templates]\ndefault_text = \"(inherit)\"\n",
        )
        .unwrap();
        let config = Config::load(Some(&path), None).unwrap();

        let settings = site_settings(&config);

        assert_eq!(settings.url_suffix, ".html");
        assert!(!settings.menus.auto_load);
        assert_eq!(settings.default_template_text, "(inherit)");
        assert_eq!(settings.route_param, "r");
    }

    #[test]
    fn test_load_storage_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(&path, DATASET).unwrap();
        let storage = Arc::new(load_storage(Some(&path)).unwrap());

        let site = Site::new(storage, SiteSettings::default());
        site.initialize().unwrap();

        assert_eq!(site.menus().get_default().unwrap().data.alias, "home");
    }

    #[test]
    fn test_read_layout_missing_file_names_path() {
        let err = read_layout(Path::new("/nonexistent/layout.html")).unwrap_err();

        assert!(err.to_string().contains("/nonexistent/layout.html"));
    }

    #[test]
    fn test_read_layout_text_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.html");
        std::fs::write(&path, [0x3c, 0xff, 0x3e]).unwrap();

        let err = read_layout_text(&path).unwrap_err();

        assert!(matches!(
            err,
            CliError::Site(SiteError::Parser(ParserError::InvalidInput(_)))
        ));
    }
}
