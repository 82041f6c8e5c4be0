//! Runs every built-in scenario headlessly and keeps the dumps and rendered
//! screens as evidence.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

#[allow(dead_code)]
#[path = "../host/mod.rs"]
mod host;

use host::scenario::{BUILTIN, Scenario};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory receiving one sub-directory per scenario
    #[arg(short, long, default_value = "evidence")]
    evidence_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    for (name, text) in BUILTIN {
        let scenario = Scenario::from_yaml(text)?;
        let dir = args.evidence_dir.join(name);
        let capture = host::capture(&scenario, &dir)?;

        fs::write(dir.join("screen.txt"), &capture.screen)
            .with_context(|| format!("Failed to write screen for {name}"))?;
        fs::write(dir.join("code.txt"), &capture.code_screen)
            .with_context(|| format!("Failed to write code for {name}"))?;
        info!(
            scenario = name,
            persisted = ?capture.persisted,
            visual_code = capture.visual_code.is_ok(),
            truncated = capture.report.is_truncated(),
            "captured"
        );
    }
    Ok(())
}
