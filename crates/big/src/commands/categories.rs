//! `big categories` command implementation.

use clap::Args;

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the categories command.
#[derive(Args)]
pub(crate) struct CategoriesArgs {
    /// Module owning the category tree.
    module: String,

    /// Prefix repeated once per nesting level.
    #[arg(long, default_value = "- ")]
    indenter: String,
}

impl CategoriesArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = global.load_site()?;

        let options = site
            .categories()
            .drop_down_list(&self.module, None, &self.indenter)?;
        if options.is_empty() {
            output.warning(&format!("No categories for module {}", self.module));
        }
        for (id, label) in options {
            output.print(&format!("{id}\t{label}"));
        }
        Ok(())
    }
}
