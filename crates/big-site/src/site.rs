//! Page assembly.
//!
//! [`Site`] wires the managers together and runs the assembly pipeline for
//! one rendered layout:
//!
//! 1. select the template (explicit id, or the default)
//! 2. find the positions the layout asks for
//! 3. look up the blocks the template assigns to them
//! 4. render those blocks and substitute them into the layout
//!
//! # Thread Safety
//!
//! Every manager is `Send + Sync`, so one `Site` can be shared behind an
//! `Arc`. The active template and active menu item are shared state: a
//! render selects them for the whole site.

use std::sync::Arc;

use big_parser::{Parser, ParserError};
use big_router::{DEFAULT_ROUTE_PARAM, Route, UrlRouter, dynamic_url};
use big_storage::{BlockSource, CategoryData, MenuData, TemplateSource, TreeSource};
use big_template::{DEFAULT_TEXT, Template, TemplateError, TemplateManager};
use big_tree::{CategoryManager, MenuManager, MenuOptions, SearchItem};

use crate::blocks::BlockRegistry;
use crate::error::SiteError;
use crate::router::MenuRouter;

/// Configuration for [`Site`].
#[derive(Clone, Debug)]
pub struct SiteSettings {
    /// Prefix for relative asset URLs. Empty disables prefixing.
    pub home_url: String,
    /// Public path of the default menu item.
    pub base_path: String,
    /// Appended to menu item paths.
    pub url_suffix: String,
    /// Query parameter carrying the route in internal links.
    pub route_param: String,
    /// When off, layouts are returned as given.
    pub dynamic_content: bool,
    pub menus: MenuOptions,
    /// Label of the id 0 entry in template lists.
    pub default_template_text: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            home_url: String::new(),
            base_path: "/".to_owned(),
            url_suffix: String::new(),
            route_param: DEFAULT_ROUTE_PARAM.to_owned(),
            dynamic_content: true,
            menus: MenuOptions::default(),
            default_template_text: DEFAULT_TEXT.to_owned(),
        }
    }
}

/// Result of [`Site::render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPage {
    /// Assembled markup.
    pub html: String,
    /// Template the blocks came from, 0 when none applied.
    pub template_id: i64,
    /// Positions the layout asks for, in document order.
    pub positions: Vec<String>,
    /// Meta title, or title, of the active menu item.
    pub title: Option<String>,
}

/// Menus, categories, templates and blocks behind one page assembly API.
pub struct Site {
    menus: Arc<MenuManager>,
    categories: CategoryManager,
    templates: TemplateManager,
    blocks: Arc<dyn BlockSource>,
    router: Arc<MenuRouter>,
    parser: Parser,
    settings: SiteSettings,
}

impl Site {
    /// Create a site over one storage backend serving every table.
    pub fn new<S>(storage: Arc<S>, settings: SiteSettings) -> Self
    where
        S: TreeSource<MenuData> + TreeSource<CategoryData> + TemplateSource + BlockSource + 'static,
    {
        let menu_source: Arc<dyn TreeSource<MenuData>> = Arc::<S>::clone(&storage);
        let category_source: Arc<dyn TreeSource<CategoryData>> = Arc::<S>::clone(&storage);
        let template_source: Arc<dyn TemplateSource> = Arc::<S>::clone(&storage);
        let blocks: Arc<dyn BlockSource> = storage;

        let menus = Arc::new(MenuManager::new(menu_source, settings.menus));
        let router = Arc::new(MenuRouter::new(
            Arc::clone(&menus),
            &settings.base_path,
            settings.url_suffix.as_str(),
        ));
        let url_router: Arc<dyn UrlRouter> = Arc::<MenuRouter>::clone(&router);
        let parser = Parser::new(settings.home_url.as_str())
            .with_route_param(settings.route_param.as_str())
            .with_router(url_router);

        Self {
            menus,
            categories: CategoryManager::new(category_source),
            templates: TemplateManager::new(template_source)
                .with_default_text(settings.default_template_text.as_str()),
            blocks,
            router,
            parser,
            settings,
        }
    }

    /// Apply the menu options: preload menus, activate the default item.
    pub fn initialize(&self) -> Result<(), SiteError> {
        self.menus.initialize()?;
        Ok(())
    }

    pub fn menus(&self) -> &MenuManager {
        &self.menus
    }

    pub fn categories(&self) -> &CategoryManager {
        &self.categories
    }

    pub fn templates(&self) -> &TemplateManager {
        &self.templates
    }

    pub fn router(&self) -> &MenuRouter {
        &self.router
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    /// Assemble `layout` with the blocks of template `template_id`.
    ///
    /// Id 0 uses the default template. Without a default template the
    /// include statements are removed and no blocks are rendered.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] for an unknown explicit id, and
    /// storage errors from block rendering.
    pub fn render(&self, layout: &str, template_id: i64) -> Result<RenderedPage, SiteError> {
        let title = self.page_title()?;

        if !self.settings.dynamic_content {
            tracing::debug!("Dynamic content disabled, returning layout as is");
            return Ok(RenderedPage {
                html: layout.to_owned(),
                template_id: 0,
                positions: Vec::new(),
                title,
            });
        }

        let template = self.select_template(template_id)?;
        let positions = Parser::find_positions(layout);
        let assigned = template.get_positions(&positions);

        let mut registry = BlockRegistry::new();
        registry.register_positions(&assigned, self.blocks.as_ref())?;
        let html = self.parser.run(layout, registry.blocks());

        tracing::info!(
            template_id = template.id,
            positions = positions.len(),
            filled = registry.blocks().len(),
            "Rendered page"
        );
        Ok(RenderedPage {
            html,
            template_id: template.id,
            positions,
            title,
        })
    }

    /// Like [`render`](Self::render) for a layout read as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::InvalidInput`] when `layout` is not UTF-8.
    pub fn render_bytes(&self, layout: &[u8], template_id: i64) -> Result<RenderedPage, SiteError> {
        let layout = std::str::from_utf8(layout).map_err(ParserError::from)?;
        self.render(layout, template_id)
    }

    /// Whether the current template assigns blocks to `position`.
    pub fn is_position_active(&self, position: &str) -> Result<bool, SiteError> {
        match self.templates.load(0) {
            Ok(template) => Ok(!template.position(position).is_empty()),
            Err(TemplateError::NoDefault) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Internal route for a public request path. Marks the matching menu
    /// item active.
    pub fn resolve(&self, path: &str) -> Option<Route> {
        self.router.parse_request(path)
    }

    /// Public URL for an internal route.
    pub fn create_url(&self, route: &Route) -> Option<String> {
        self.router.create_url(route)
    }

    /// Every menu item as a search result.
    ///
    /// Routes are given in dynamic `index.php?r=...` form when
    /// `dynamic_urls` is set, which the parser later turns into public URLs.
    pub fn search_index(&self, dynamic_urls: bool) -> Result<Vec<SearchItem>, SiteError> {
        let mut items = self.menus.search_index()?;
        if dynamic_urls {
            for item in &mut items {
                item.route = dynamic_url(&item.route, &self.settings.route_param);
            }
        }
        Ok(items)
    }

    /// Make `template_id` active and return the template to render with.
    fn select_template(&self, template_id: i64) -> Result<Arc<Template>, SiteError> {
        self.templates.set_active(template_id)?;
        match self.templates.load(0) {
            Ok(template) => Ok(template),
            Err(TemplateError::NoDefault) => {
                tracing::warn!("No default template, rendering without blocks");
                Ok(Arc::new(Template::empty()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn page_title(&self) -> Result<Option<String>, SiteError> {
        Ok(self.menus.active()?.map(|item| {
            item.data
                .meta_title
                .filter(|t| !t.is_empty())
                .unwrap_or(item.data.title)
        }))
    }
}
