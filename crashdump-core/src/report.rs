//! Report composition.
//!
//! The report layout is fixed: header, register bank, then the optional
//! stack and code dumps. The header and registers double as the on-screen
//! summary, so their end offset is recorded on the [`Report`].

use core::fmt::Write as _;

use crate::config::{BuildIdentity, HandlerConfig};
use crate::context::{FaultContext, GENERAL_REGISTERS};
use crate::dump::{HexDump, MemorySource, WordSize};
use crate::kind::ExceptionVector;
use crate::region::MemoryWindow;
use crate::timestamp::Timestamp;
use crate::writer::{Append, Report};

/// Everything known about a fault once the windows have been validated.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub vector: ExceptionVector,
    pub context: FaultContext,
    pub timestamp: Timestamp,
    pub stack: Option<MemoryWindow>,
    pub code: Option<MemoryWindow>,
    pub code_width: WordSize,
}

impl Snapshot {
    /// Validates the stack and code windows for a freshly captured fault.
    ///
    /// Nothing here touches memory; a window is simply absent when its
    /// register points outside the configured regions.
    #[must_use]
    pub fn capture(
        config: &HandlerConfig,
        vector: ExceptionVector,
        context: FaultContext,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            vector,
            context,
            timestamp,
            stack: config.bounds.stack_window(context.stack_pointer()),
            code: config.bounds.code_window(context.program_counter()),
            code_width: WordSize::for_code(context.is_thumb(config.arch.thumb_mask)),
        }
    }

    /// Dump of the stack window, if one was validated.
    #[must_use]
    pub fn stack_dump(&self) -> Option<HexDump> {
        self.stack.map(|window| HexDump::new(window, WordSize::Byte))
    }

    /// Dump of the code window, if one was validated.
    #[must_use]
    pub fn code_dump(&self) -> Option<HexDump> {
        self.code.map(|window| HexDump::new(window, self.code_width))
    }
}

/// Renders snapshots into report text.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReportComposer {
    build: BuildIdentity,
    status_label: &'static str,
}

impl ReportComposer {
    #[must_use]
    pub const fn new(build: BuildIdentity, status_label: &'static str) -> Self {
        Self {
            build,
            status_label,
        }
    }

    #[must_use]
    pub const fn from_config(config: &HandlerConfig) -> Self {
        Self::new(config.build, config.arch.status_label)
    }

    /// Composes a fresh report for `snapshot`.
    pub fn compose<M, const N: usize>(&self, snapshot: &Snapshot, memory: &M) -> Report<N>
    where
        M: MemorySource + ?Sized,
    {
        let mut report = Report::new();
        self.compose_into(&mut report, snapshot, memory);
        report
    }

    /// Composes into an existing buffer, clearing it first.
    pub fn compose_into<M, const N: usize>(
        &self,
        report: &mut Report<N>,
        snapshot: &Snapshot,
        memory: &M,
    ) where
        M: MemorySource + ?Sized,
    {
        report.clear();
        self.write_header(report, snapshot);
        self.write_registers(report, &snapshot.context);
        report.mark_summary_end();

        if let Some(dump) = snapshot.stack_dump() {
            write_section(report, "Stack:", &dump, memory, true);
        }
        if let Some(dump) = snapshot.code_dump() {
            write_section(report, "Code:", &dump, memory, false);
        }
    }

    fn write_header<const N: usize>(&self, report: &mut Report<N>, snapshot: &Snapshot) {
        let vector = snapshot.vector;
        report.append_fmt(format_args!(
            "Exception: {} ({})\n",
            vector.kind(),
            vector.raw()
        ));
        report.append_fmt(format_args!(
            "{} {}\n",
            self.build.flavor, self.build.version
        ));
        report.append_fmt(format_args!("{}\n \n", snapshot.timestamp));
    }

    fn write_registers<const N: usize>(&self, report: &mut Report<N>, context: &FaultContext) {
        let words = context.words();
        for (pair, chunk) in words[..GENERAL_REGISTERS].chunks_exact(2).enumerate() {
            let index = pair * 2;
            report.append_fmt(format_args!(
                "R{:02}: {:08X} | R{:02}: {:08X}\n",
                index,
                chunk[0],
                index + 1,
                chunk[1]
            ));
        }
        report.append_fmt(format_args!(
            "{}: {:08X}\n\n",
            self.status_label,
            context.status()
        ));
    }
}

/// Writes a labelled dump, stopping at the first row that does not fit.
///
/// The label travels with the first row so a full buffer never leaves a
/// heading without data underneath it.
fn write_section<M, const N: usize>(
    report: &mut Report<N>,
    label: &str,
    dump: &HexDump,
    memory: &M,
    trailing_blank: bool,
) where
    M: MemorySource + ?Sized,
{
    let mut rows = dump.row_starts();
    let first = rows.next();
    let opened = report.append_with(|text| {
        writeln!(text, "{label}")?;
        match first {
            Some(start) => dump.write_row(text, memory, start),
            None => Ok(()),
        }
    });
    if opened == Append::Rejected {
        return;
    }
    for start in rows {
        if report.append_with(|text| dump.write_row(text, memory, start)) == Append::Rejected {
            return;
        }
    }
    if trailing_blank {
        report.append_str("\n");
    }
}
