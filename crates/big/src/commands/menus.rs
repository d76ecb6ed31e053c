//! `big menus` command implementation.

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

pub(crate) fn execute(global: &GlobalArgs) -> Result<(), CliError> {
    let output = Output::new();
    let site = global.load_site()?;
    let menus = site.menus();

    let roots = menus.get_menus(false)?;
    if roots.is_empty() {
        output.warning("No menus found");
        return Ok(());
    }

    for root in roots {
        output.highlight(root.title());
        for item in menus.get_menu_items(root.id)? {
            let indent = "  ".repeat(usize::try_from(item.depth).unwrap_or(1));
            let marker = if item.is_default() { " *" } else { "" };
            let url = site.create_url(&item.route()).unwrap_or_default();
            output.print(&format!(
                "{indent}{}{marker} {}",
                item.title(),
                output.dim(&format!("[{}] {url}", item.data.route))
            ));
        }
    }
    Ok(())
}
