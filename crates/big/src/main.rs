//! Big CLI - content engine.
//!
//! Provides commands for:
//! - `render`: Assemble a layout with its template's blocks
//! - `positions`: List the positions a layout uses
//! - `menus`: Print every menu tree
//! - `categories`: Print the category list of a module
//! - `route`: Resolve a public path to its internal route
//! - `search`: Print the menu search index

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CategoriesArgs, GlobalArgs, PositionsArgs, RenderArgs, RouteArgs, SearchArgs};
use output::Output;

/// Big - content engine.
#[derive(Parser)]
#[command(name = "big", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a layout file and print the page.
    Render(RenderArgs),
    /// List positions used by a layout file.
    Positions(PositionsArgs),
    /// Print every menu tree.
    Menus,
    /// Print the category list of a module.
    Categories(CategoriesArgs),
    /// Resolve a public path to its internal route.
    Route(RouteArgs),
    /// Print the menu search index.
    Search(SearchArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(&cli.global),
        Commands::Positions(args) => args.execute(&cli.global),
        Commands::Menus => commands::menus::execute(&cli.global),
        Commands::Categories(args) => args.execute(&cli.global),
        Commands::Route(args) => args.execute(&cli.global),
        Commands::Search(args) => args.execute(&cli.global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
