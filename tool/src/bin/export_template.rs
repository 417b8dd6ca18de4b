//! Writes the built-in procedural hand as a template directory
//! (`template.safetensors` + `template.meta.json`) loadable by `load_model`.

use std::path::PathBuf;

use anyhow::Result;
use chira_hand::data::template::write_template;
use chira_hand::{HandModel, Model, procedural};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "export_template")]
#[command(about = "Export the procedural hand template", long_about = None)]
struct Cli {
    /// Output directory (created if missing)
    #[arg(long, default_value = "assets/hand_template")]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    // Round through HandModel so the exported bundle is one the loader accepts.
    let model = HandModel::from_template(procedural::hand_template())?;
    write_template(&model.to_template(), &cli.out)?;
    tracing::info!(
        out = %cli.out.display(),
        bones = model.names().len(),
        vertices = model.n_vertices(),
        "wrote hand template"
    );
    Ok(())
}
