mod app;
mod config;
mod field;
mod grid;
mod input;
mod render;
mod spatial;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    // stderr only; the field owns the alternate screen
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = config::Args::parse();
    let settings = config::Settings::from_args(args)?;
    app::run(settings)
}
