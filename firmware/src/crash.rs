//! Wires the board's collaborators into the snapshot driver.

use crashdump_core::config::{ArchProfile, BuildIdentity, HandlerConfig};
use crashdump_core::context::FaultContext;
use crashdump_core::driver::{Devices, handle_fault};
use crashdump_core::kind::ExceptionVector;
use crashdump_core::qr::QrEncoder;
use crashdump_core::timestamp::Timestamp;
use crashdump_core::writer::Report;
use defmt::{info, warn};
use static_cell::ConstStaticCell;

use crate::console::RttConsole;
use crate::hw::button::PowerButton;
use crate::hw::flash::FlashStore;
use crate::hw::power::DeepSleep;
use crate::memory::{LiveMemory, linker_bounds};

const BUILD: BuildIdentity = BuildIdentity::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

static REPORT: ConstStaticCell<Report> = ConstStaticCell::new(Report::new());
static ENCODER: ConstStaticCell<QrEncoder> = ConstStaticCell::new(QrEncoder::new());

pub fn handler_config() -> HandlerConfig {
    HandlerConfig::new(linker_bounds(), ArchProfile::CORTEX_M, BUILD)
}

/// Logs the regions the handler will accept, so a bad link is visible at boot.
pub fn log_config() {
    let config = handler_config();
    info!("crash: handler {=str} {=str}", BUILD.flavor, BUILD.version);
    info!("crash: bounds {}", config.bounds);
    if let Err(err) = config.bounds.validate() {
        warn!("crash: region bounds rejected: {}", err);
    }
}

/// Runs the handler. Must be entered at most once, with the timestamp read
/// straight after the register bank.
pub fn run(vector: ExceptionVector, context: FaultContext, mut timestamp: Timestamp) -> ! {
    info!("crash: {} at pc={=u32:#010x}", vector.kind(), context.program_counter());
    let report = REPORT.take();
    let encoder = ENCODER.take();
    // SAFETY: the application is never resumed, so nothing else owns these
    // peripherals any more.
    let (storage, input) = unsafe { (FlashStore::steal(), PowerButton::steal()) };

    handle_fault(
        handler_config(),
        vector,
        context,
        &mut timestamp,
        &LiveMemory,
        Devices {
            display: RttConsole,
            encoder,
            storage,
            input,
            power: DeepSleep,
        },
        report,
    )
}
