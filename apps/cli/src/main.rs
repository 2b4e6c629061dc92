//! componentgen CLI: generate integration components from an app's
//! existing source tree.
//!
//! Assembles the app's shared modules into a context document and hands
//! it, with the instructions and template for the requested component
//! type, to the external generation pipeline.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
