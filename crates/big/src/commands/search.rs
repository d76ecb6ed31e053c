//! `big search` command implementation.

use clap::Args;

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the search command.
#[derive(Args)]
pub(crate) struct SearchArgs {
    /// Print routes as `index.php?r=...` URLs.
    #[arg(long)]
    dynamic_urls: bool,
}

impl SearchArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = global.load_site()?;

        for item in site.search_index(self.dynamic_urls)? {
            output.print(&format!("{}\t{}\t{}", item.section, item.title, item.route));
        }
        Ok(())
    }
}
