//! `big render` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{GlobalArgs, read_layout};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Layout file containing include statements.
    layout: PathBuf,

    /// Template id (default: the default template).
    #[arg(short, long, default_value_t = 0)]
    template: i64,

    /// Public request path selecting the active menu item.
    #[arg(short, long)]
    path: Option<String>,
}

impl RenderArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = global.load_site()?;

        if let Some(path) = &self.path
            && site.resolve(path).is_none()
        {
            output.warning(&format!("No menu item for {path}"));
        }

        let layout = read_layout(&self.layout)?;
        let page = site.render_bytes(&layout, self.template)?;

        if let Some(title) = &page.title {
            output.info(&format!("Title: {title}"));
        }
        output.info(&format!(
            "Template: {}, positions: {}",
            page.template_id,
            page.positions.join(", ")
        ));
        output.print(&page.html);
        Ok(())
    }
}
