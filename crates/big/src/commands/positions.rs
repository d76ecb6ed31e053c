//! `big positions` command implementation.

use std::path::PathBuf;

use big_parser::Parser;
use clap::Args;

use super::{GlobalArgs, read_layout_text};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the positions command.
#[derive(Args)]
pub(crate) struct PositionsArgs {
    /// Layout file containing include statements.
    layout: PathBuf,

    /// Check against this template instead of the default one.
    #[arg(short, long)]
    template: Option<i64>,
}

impl PositionsArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = global.load_site()?;

        if let Some(id) = self.template {
            site.templates()
                .set_active(id)
                .map_err(big_site::SiteError::from)?;
        }

        let layout = read_layout_text(&self.layout)?;

        let positions = Parser::find_positions(&layout);
        if positions.is_empty() {
            output.warning("No include statements found");
            return Ok(());
        }
        for position in positions {
            let state = if site.is_position_active(&position)? {
                "active"
            } else {
                "inactive"
            };
            output.print(&format!("{position}\t{}", output.dim(state)));
        }
        Ok(())
    }
}
