//! Host implementations of the handler's collaborators and the scenario
//! runner shared by the emulator binaries.

pub mod clock;
pub mod display;
pub mod input;
pub mod memory;
pub mod power;
pub mod scenario;
pub mod storage;

use std::path::Path;

use anyhow::Result;
use crashdump_core::config::BuildIdentity;
use crashdump_core::driver::{Devices, PersistOutcome, SnapshotDriver, dump_path};
use crashdump_core::platform::EncodeError;
use crashdump_core::writer::Report;
use tracing::{info, warn};

use clock::HostClock;
use display::CanvasDisplay;
use input::HeadlessInput;
use power::HostPower;
use scenario::Scenario;
use storage::HostStorage;

pub fn build_identity() -> BuildIdentity {
    BuildIdentity::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

pub fn scenario_clock(scenario: &Scenario) -> Result<HostClock> {
    Ok(match scenario.timestamp()? {
        Some(timestamp) => HostClock::fixed(timestamp),
        None => HostClock::system(),
    })
}

/// Result of running a scenario up to, but not including, power-off.
pub struct Capture {
    pub report: Report,
    pub visual_code: Result<(), EncodeError>,
    pub persisted: PersistOutcome,
    pub dump_file: Option<std::path::PathBuf>,
    pub screen: String,
    pub code_screen: String,
}

/// Runs every non-terminal stage of the handler for `scenario`, with
/// `storage_root` standing in for the card.
pub fn capture(scenario: &Scenario, storage_root: &Path) -> Result<Capture> {
    let config = scenario.handler_config(build_identity())?;
    let memory = scenario.memory()?;
    let context = scenario.context()?;
    let mut clock = scenario_clock(scenario)?;

    let storage = HostStorage::new(storage_root).with_failures(scenario.storage_failures);
    let mut driver = SnapshotDriver::new(
        config,
        Devices {
            display: CanvasDisplay::new(),
            encoder: scenario.encoder(),
            storage,
            input: HeadlessInput::default(),
            power: HostPower::headless(),
        },
    );

    let snapshot = driver.capture(&mut clock, scenario.vector(), context);
    info!(
        scenario = %scenario.name,
        vector = %snapshot.vector,
        stack = snapshot.stack.is_some(),
        code = snapshot.code.is_some(),
        "fault captured"
    );

    let mut report = Report::new();
    driver.compose(&snapshot, &memory, &mut report);
    if report.is_truncated() {
        warn!(scenario = %scenario.name, "report truncated");
    }

    driver.show_summary(&report);
    let visual_code = driver.show_visual_code(&report);
    if let Err(err) = visual_code {
        warn!(scenario = %scenario.name, "visual code skipped: {err}");
    }
    let persisted = driver.persist_report(&snapshot.timestamp, &report);

    let devices = driver.devices();
    let dump_file = dump_path(config.output_dir, &snapshot.timestamp)
        .map(|path| devices.storage.resolve(&path))
        .transpose()?;

    Ok(Capture {
        visual_code,
        persisted,
        dump_file,
        screen: devices.display.primary().render(),
        code_screen: devices.display.secondary().render(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run(name: &str) -> (Capture, std::path::PathBuf) {
        let root = std::env::temp_dir().join(format!("crashdump-capture-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let scenario = Scenario::load(name).expect("builtin");
        (capture(&scenario, &root).expect("capture"), root)
    }

    #[test]
    fn stack_fault_persists_the_full_report() {
        let (capture, root) = run("stack_fault");
        assert_eq!(capture.persisted, PersistOutcome::Written);
        assert_eq!(capture.visual_code, Ok(()));
        let path = capture.dump_file.as_ref().expect("path");
        assert!(path.ends_with("dumps/exception_dump_250314150926.txt"));
        assert_eq!(fs::read_to_string(path).expect("dump"), capture.report.as_str());
        assert!(capture.screen.contains("Exception: Data Abort (4)"));
        assert!(capture.screen.contains("Press POWER") || capture.screen.contains("Dumping"));
        assert!(capture.code_screen.contains('█'));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn code_edge_omits_code_and_survives_missing_card() {
        let (capture, root) = run("code_edge");
        assert_eq!(capture.persisted, PersistOutcome::Written);
        assert!(!capture.report.as_str().contains("Code:"));
        assert!(capture.report.as_str().contains("Stack:"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn thumb_uses_half_words() {
        let (capture, root) = run("thumb");
        let text = capture.report.as_str();
        assert!(text.contains("xPSR: 01000003"));
        assert!(text.contains("080003F0: BF00 BF00 BF00 DE00 4770 4770 B510 BD10 \n"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn oversize_skips_the_code_but_still_persists() {
        let (capture, root) = run("oversize");
        assert_eq!(capture.visual_code, Err(EncodeError::DataTooLong));
        assert!(!capture.code_screen.contains('█'));
        assert_eq!(capture.persisted, PersistOutcome::Written);
        let _ = fs::remove_dir_all(&root);
    }
}
