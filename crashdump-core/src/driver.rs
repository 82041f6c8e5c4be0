//! Snapshot driver: the terminal sequence run once per fault.
//!
//! The driver validates, composes and then hands the report to each sink in
//! turn. Sinks are best-effort; nothing they report can stop the sequence,
//! which always ends in [`Power::power_off`].

use core::fmt::Write as _;
use core::time::Duration;

use heapless::String;

use crate::config::HandlerConfig;
use crate::context::FaultContext;
use crate::dump::MemorySource;
use crate::kind::ExceptionVector;
use crate::platform::{
    Buttons, Clock, CodeEncoder, Color, Display, EncodeError, Input, Power, Storage, Surface,
};
use crate::report::{ReportComposer, Snapshot};
use crate::timestamp::Timestamp;
use crate::writer::Report;

/// Width status messages are padded and clipped to.
pub const STATUS_COLUMNS: usize = 29;
/// How long each storage retry waits for the operator to cancel.
pub const STORAGE_RETRY_POLL: Duration = Duration::from_secs(1);
/// Capacity of the dump path.
pub const DUMP_PATH_LEN: usize = 64;

pub const MSG_GENERATING_QR: &str = "Generating QR code...";
pub const MSG_REINIT_STORAGE: &str = "Reinitializing SD card...";
pub const MSG_DUMPING: &str = "Dumping state to SD card...";
pub const MSG_PRESS_POWER: &str = "Press POWER to turn off";

/// Path the report is persisted under.
pub type DumpPath = String<DUMP_PATH_LEN>;

/// Builds `<output_dir>/exception_dump_<YYMMDDHHMMSS>.txt`.
///
/// Returns `None` when the directory is too long for [`DUMP_PATH_LEN`].
#[must_use]
pub fn dump_path(output_dir: &str, timestamp: &Timestamp) -> Option<DumpPath> {
    let mut path = DumpPath::new();
    write!(path, "{output_dir}/exception_dump_{}.txt", timestamp.compact()).ok()?;
    Some(path)
}

/// Collaborators the driver presents and persists through.
pub struct Devices<D, E, S, I, P> {
    pub display: D,
    pub encoder: E,
    pub storage: S,
    pub input: I,
    pub power: P,
}

/// Position of the status line under the summary block.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusLine {
    pub x: u32,
    pub y: u32,
}

/// Result of the persistence stage.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistOutcome {
    Written,
    WriteFailed,
    PathTooLong,
}

/// Runs the fault sequence against a set of collaborators.
pub struct SnapshotDriver<D, E, S, I, P> {
    config: HandlerConfig,
    devices: Devices<D, E, S, I, P>,
    status: StatusLine,
}

impl<D, E, S, I, P> SnapshotDriver<D, E, S, I, P>
where
    D: Display,
    E: CodeEncoder,
    S: Storage,
    I: Input,
    P: Power,
{
    #[must_use]
    pub const fn new(config: HandlerConfig, devices: Devices<D, E, S, I, P>) -> Self {
        Self {
            config,
            devices,
            status: StatusLine { x: 0, y: 0 },
        }
    }

    #[must_use]
    pub const fn config(&self) -> &HandlerConfig {
        &self.config
    }

    #[must_use]
    pub const fn devices(&self) -> &Devices<D, E, S, I, P> {
        &self.devices
    }

    #[must_use]
    pub const fn status_line(&self) -> StatusLine {
        self.status
    }

    /// Reads the clock and validates the dump windows.
    pub fn capture<C>(&self, clock: &mut C, vector: ExceptionVector, context: FaultContext) -> Snapshot
    where
        C: Clock + ?Sized,
    {
        let timestamp = clock.now();
        Snapshot::capture(&self.config, vector, context, timestamp)
    }

    /// Renders the report for `snapshot` into `report`.
    pub fn compose<M, const N: usize>(&self, snapshot: &Snapshot, memory: &M, report: &mut Report<N>)
    where
        M: MemorySource + ?Sized,
    {
        ReportComposer::from_config(&self.config).compose_into(report, snapshot, memory);
    }

    /// Draws the header and registers centred on the primary surface.
    pub fn show_summary<const N: usize>(&mut self, report: &Report<N>) {
        let display = &mut self.devices.display;
        let summary = report.summary();
        let screen = display.surface_size(Surface::Primary);
        let text = display.measure_text(summary);
        let line = display.measure_text(" ").height;

        let x = screen.width.saturating_sub(text.width) / 2;
        let y = screen.height.saturating_sub(text.height) / 2;
        self.status = StatusLine {
            x,
            y: y.saturating_add(text.height).saturating_sub(line),
        };

        display.clear(Surface::Primary, Color::BACKGROUND);
        display.draw_text(
            Surface::Primary,
            x,
            y,
            Color::FOREGROUND,
            Color::BACKGROUND,
            format_args!("{summary}"),
        );
    }

    /// Replaces the status line under the summary.
    pub fn set_status(&mut self, message: &str) {
        let StatusLine { x, y } = self.status;
        self.devices.display.draw_text(
            Surface::Primary,
            x,
            y,
            Color::FOREGROUND,
            Color::BACKGROUND,
            format_args!("{message:<STATUS_COLUMNS$.STATUS_COLUMNS$}"),
        );
    }

    /// Encodes the full report and draws it on the secondary surface.
    ///
    /// # Errors
    ///
    /// Returns the encoder error; the secondary surface is left untouched.
    pub fn show_visual_code<const N: usize>(&mut self, report: &Report<N>) -> Result<(), EncodeError> {
        self.set_status(MSG_GENERATING_QR);
        let Devices {
            display, encoder, ..
        } = &mut self.devices;
        let code = encoder.encode(report.as_str())?;
        display.clear(Surface::Secondary, Color::WHITE);
        display.draw_code(Surface::Secondary, &code);
        Ok(())
    }

    /// Mounts storage, writes the report and unmounts again.
    ///
    /// Mounting is retried until it succeeds; holding POWER during a retry
    /// abandons persistence and powers the device off.
    pub fn persist_report<const N: usize>(&mut self, timestamp: &Timestamp, report: &Report<N>) -> PersistOutcome {
        self.set_status(MSG_REINIT_STORAGE);
        self.mount_storage();

        let outcome = match dump_path(self.config.output_dir, timestamp) {
            Some(path) => {
                self.set_status(MSG_DUMPING);
                match self
                    .devices
                    .storage
                    .write_file(&path, report.as_bytes(), 0, true)
                {
                    Ok(()) => PersistOutcome::Written,
                    Err(_) => PersistOutcome::WriteFailed,
                }
            }
            None => PersistOutcome::PathTooLong,
        };

        self.devices.storage.deinit();
        outcome
    }

    fn mount_storage(&mut self) {
        let Devices {
            storage,
            input,
            power,
            ..
        } = &mut self.devices;
        while storage.init().is_err() {
            if input.poll(Some(STORAGE_RETRY_POLL)).contains(Buttons::POWER) {
                power.power_off();
            }
            storage.deinit();
        }
    }

    /// Shows the final prompt and powers off once POWER is pressed.
    pub fn await_power_off(&mut self) -> ! {
        self.set_status(MSG_PRESS_POWER);
        while !self.devices.input.poll(None).contains(Buttons::POWER) {}
        self.devices.power.power_off()
    }

    /// Runs the whole sequence. Never returns.
    pub fn run<C, M, const N: usize>(
        mut self,
        clock: &mut C,
        memory: &M,
        vector: ExceptionVector,
        context: FaultContext,
        report: &mut Report<N>,
    ) -> !
    where
        C: Clock + ?Sized,
        M: MemorySource + ?Sized,
    {
        let snapshot = self.capture(clock, vector, context);
        self.compose(&snapshot, memory, report);
        self.show_summary(report);
        // A report that cannot be encoded still reaches storage.
        let _ = self.show_visual_code(report);
        self.persist_report(&snapshot.timestamp, report);
        self.await_power_off()
    }
}

/// Handles a fault end to end. Never returns.
pub fn handle_fault<C, M, D, E, S, I, P, const N: usize>(
    config: HandlerConfig,
    vector: ExceptionVector,
    context: FaultContext,
    clock: &mut C,
    memory: &M,
    devices: Devices<D, E, S, I, P>,
    report: &mut Report<N>,
) -> !
where
    C: Clock + ?Sized,
    M: MemorySource + ?Sized,
    D: Display,
    E: CodeEncoder,
    S: Storage,
    I: Input,
    P: Power,
{
    SnapshotDriver::new(config, devices).run(clock, memory, vector, context, report)
}
