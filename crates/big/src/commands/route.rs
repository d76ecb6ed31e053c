//! `big route` command implementation.

use clap::Args;

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the route command.
#[derive(Args)]
pub(crate) struct RouteArgs {
    /// Public request path, e.g. `/about/team.html`.
    path: String,
}

impl RouteArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = global.load_site()?;

        let route = site
            .resolve(&self.path)
            .ok_or_else(|| CliError::Validation(format!("No route for {}", self.path)))?;

        output.print(&route.to_internal());
        output.info(&route.to_dynamic_url(&site.settings().route_param));
        Ok(())
    }
}
