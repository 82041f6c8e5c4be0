mod host;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crashdump_core::driver::{Devices, handle_fault};
use crashdump_core::writer::Report;
use tracing::info;

use host::display::TerminalDisplay;
use host::input::KeyboardInput;
use host::power::HostPower;
use host::scenario::{BUILTIN, Scenario};
use host::storage::HostStorage;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Built-in scenario name or path to a scenario file (YAML)
    #[arg(short, long, default_value = "stack_fault")]
    scenario: String,

    /// Directory standing in for the SD card
    #[arg(short, long, default_value = "sdcard")]
    output_dir: PathBuf,

    /// Print the screens instead of taking over the terminal
    #[arg(long)]
    headless: bool,

    /// List the built-in scenarios and exit
    #[arg(long)]
    list: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    if args.list {
        for (name, _) in BUILTIN {
            println!("{name}");
        }
        return Ok(());
    }

    let scenario = Scenario::load(&args.scenario)?;

    if args.headless {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();
        return run_headless(&scenario, &args.output_dir);
    }

    // The terminal belongs to the crash screens, so logs go to a file.
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let log = File::create(args.output_dir.join("emulator.log"))
        .context("Failed to create emulator log")?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(log))
        .init();
    run_interactive(&scenario, &args.output_dir)
}

fn run_headless(scenario: &Scenario, output_dir: &Path) -> Result<()> {
    let capture = host::capture(scenario, output_dir)?;
    print!("{}", capture.screen);
    println!();
    print!("{}", capture.code_screen);
    if let Err(err) = capture.visual_code {
        println!("visual code skipped: {err}");
    }
    if let Some(path) = capture.dump_file {
        println!("{:?} -> {}", capture.persisted, path.display());
    }
    Ok(())
}

fn run_interactive(scenario: &Scenario, output_dir: &Path) -> Result<()> {
    let config = scenario.handler_config(host::build_identity())?;
    let memory = scenario.memory()?;
    let context = scenario.context()?;
    let mut clock = host::scenario_clock(scenario)?;
    let storage = HostStorage::new(output_dir).with_failures(scenario.storage_failures);

    info!(scenario = %scenario.name, "raising {}", scenario.vector());
    let display = TerminalDisplay::enter().context("Failed to take over the terminal")?;
    let mut report: Report = Report::new();
    handle_fault(
        config,
        scenario.vector(),
        context,
        &mut clock,
        &memory,
        Devices {
            display,
            encoder: scenario.encoder(),
            storage,
            input: KeyboardInput,
            power: HostPower::terminal(),
        },
        &mut report,
    )
}
