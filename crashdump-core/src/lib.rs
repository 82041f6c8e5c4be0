#![cfg_attr(not(test), no_std)]

// Shared logic for the exception dump handler.
//
// This crate stays portable across the MCU firmware and host tooling by
// avoiding the Rust standard library. Everything that touches real hardware
// (memory reads, screens, storage, buttons, power) sits behind the traits in
// [`platform`] so the capture and formatting engine can be exercised on the
// host with synthetic memory images.

pub mod config;
pub mod context;
pub mod driver;
pub mod dump;
pub mod kind;
pub mod platform;
pub mod qr;
pub mod region;
pub mod report;
pub mod timestamp;
pub mod writer;

pub use config::{ArchProfile, BuildIdentity, HandlerConfig};
pub use context::FaultContext;
pub use driver::{Devices, PersistOutcome, SnapshotDriver, dump_path, handle_fault};
pub use dump::{HexDump, MemorySource, WordSize};
pub use kind::{ExceptionKind, ExceptionVector};
pub use platform::{
    Buttons, Clock, CodeEncoder, CodeMatrix, CodePlacement, Color, Display, EncodeError, Extent,
    Input, Power, Storage, Surface,
};
pub use qr::QrEncoder;
pub use region::{MemoryWindow, RegionBounds};
pub use report::{ReportComposer, Snapshot};
pub use timestamp::Timestamp;
pub use writer::{REPORT_CAPACITY, Report};
