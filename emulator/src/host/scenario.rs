//! YAML fault scenarios.

use std::path::Path;

use anyhow::{Context, Result, bail};
use crashdump_core::config::{ArchProfile, BuildIdentity, HandlerConfig};
use crashdump_core::context::{FaultContext, GENERAL_REGISTERS, LR_INDEX, PC_INDEX, SP_INDEX};
use crashdump_core::kind::ExceptionVector;
use crashdump_core::qr::QrEncoder;
use crashdump_core::region::{BoundsError, RegionBounds};
use crashdump_core::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::clock::parse_timestamp;
use super::memory::SyntheticMemory;

/// Scenarios shipped with the emulator.
pub const BUILTIN: &[(&str, &str)] = &[
    ("stack_fault", include_str!("../../scenarios/stack_fault.yaml")),
    ("code_edge", include_str!("../../scenarios/code_edge.yaml")),
    ("thumb", include_str!("../../scenarios/thumb.yaml")),
    ("oversize", include_str!("../../scenarios/oversize.yaml")),
];

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    #[default]
    Arm9,
    CortexM,
}

impl Arch {
    pub fn profile(self) -> ArchProfile {
        match self {
            Arch::Arm9 => ArchProfile::ARM9,
            Arch::CortexM => ArchProfile::CORTEX_M,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    pub stack_top: u32,
    pub stack_len: u32,
    pub code_start: u32,
    pub code_end: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registers {
    /// R0 upwards; missing registers read as zero.
    #[serde(default)]
    pub r: Vec<u32>,
    pub sp: u32,
    #[serde(default)]
    pub lr: Option<u32>,
    pub pc: u32,
    pub status: u32,
}

/// Words written over the synthetic image before the fault is taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryPatch {
    pub address: u32,
    pub words: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub vector: u32,
    #[serde(default)]
    pub arch: Arch,
    /// `YYYY-MM-DD HH:MM:SS`; the host clock is used when absent.
    #[serde(default)]
    pub timestamp: Option<String>,
    pub bounds: Bounds,
    pub registers: Registers,
    #[serde(default)]
    pub memory: Vec<MemoryPatch>,
    /// Highest QR version the display accepts.
    #[serde(default)]
    pub qr_max_version: Option<u8>,
    /// Storage mounts that fail before one succeeds.
    #[serde(default)]
    pub storage_failures: u32,
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("Failed to open scenario {}", path.display()))?;
        serde_yaml::from_reader(f).context("Failed to parse scenario")
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse scenario")
    }

    /// Resolves a built-in scenario name, falling back to a file path.
    pub fn load(name_or_path: &str) -> Result<Self> {
        match BUILTIN.iter().find(|(name, _)| *name == name_or_path) {
            Some((_, text)) => Self::from_yaml(text),
            None => Self::from_file(name_or_path),
        }
    }

    pub fn vector(&self) -> ExceptionVector {
        ExceptionVector(self.vector)
    }

    pub fn bounds(&self) -> RegionBounds {
        let Bounds {
            stack_top,
            stack_len,
            code_start,
            code_end,
        } = self.bounds;
        RegionBounds::new(stack_top, stack_len, code_start, code_end)
    }

    pub fn handler_config(&self, build: BuildIdentity) -> Result<HandlerConfig> {
        let bounds = self.bounds();
        match bounds.validate() {
            Ok(()) => {}
            Err(BoundsError::Misaligned) => {
                warn!(scenario = %self.name, "region bounds are not row aligned");
            }
            Err(err) => bail!("scenario {}: {err}", self.name),
        }
        Ok(HandlerConfig::new(bounds, self.arch.profile(), build))
    }

    pub fn context(&self) -> Result<FaultContext> {
        let regs = &self.registers;
        if regs.r.len() > SP_INDEX {
            bail!(
                "scenario {}: `r` lists {} registers, at most {SP_INDEX} (R0-R12) are allowed",
                self.name,
                regs.r.len()
            );
        }

        let mut general = [0u32; GENERAL_REGISTERS];
        general[..regs.r.len()].copy_from_slice(&regs.r);
        general[SP_INDEX] = regs.sp;
        general[LR_INDEX] = regs.lr.unwrap_or(0);
        general[PC_INDEX] = regs.pc;
        Ok(FaultContext::from_parts(general, regs.status))
    }

    pub fn timestamp(&self) -> Result<Option<Timestamp>> {
        self.timestamp.as_deref().map(parse_timestamp).transpose()
    }

    pub fn encoder(&self) -> QrEncoder {
        let encoder = QrEncoder::new();
        match self.qr_max_version {
            Some(version) => encoder.with_max_version(version),
            None => encoder,
        }
    }

    /// Synthetic memory for the scenario's regions with its patches applied.
    pub fn memory(&self) -> Result<SyntheticMemory> {
        let mut memory = SyntheticMemory::for_bounds(&self.bounds());
        for patch in &self.memory {
            memory
                .patch_words(patch.address, &patch.words)
                .with_context(|| format!("scenario {}: bad memory patch", self.name))?;
        }
        Ok(memory)
    }
}
