//! Static configuration injected into the handler.

use crate::region::RegionBounds;

/// Directory dumps are written into when the board does not override it.
pub const DEFAULT_OUTPUT_DIR: &str = "0:/dumps";

/// Build identity printed on the second header line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BuildIdentity {
    pub flavor: &'static str,
    pub version: &'static str,
}

impl BuildIdentity {
    #[must_use]
    pub const fn new(flavor: &'static str, version: &'static str) -> Self {
        Self { flavor, version }
    }
}

/// Per-architecture details of the status word.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArchProfile {
    /// Label printed in front of the status word.
    pub status_label: &'static str,
    /// Status bit set while the core executes Thumb code.
    pub thumb_mask: u32,
}

impl ArchProfile {
    /// Classic ARM cores (ARMv4T/ARMv5): CPSR with the T bit at position 5.
    pub const ARM9: Self = Self {
        status_label: "CPSR",
        thumb_mask: 1 << 5,
    };

    /// Cortex-M cores (ARMv6-M and ARMv7-M): xPSR with the T bit at
    /// position 24.
    pub const CORTEX_M: Self = Self {
        status_label: "xPSR",
        thumb_mask: 1 << 24,
    };
}

impl Default for ArchProfile {
    fn default() -> Self {
        Self::ARM9
    }
}

/// Everything the handler needs to know about the board it runs on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandlerConfig {
    pub bounds: RegionBounds,
    pub arch: ArchProfile,
    pub build: BuildIdentity,
    pub output_dir: &'static str,
}

impl HandlerConfig {
    #[must_use]
    pub const fn new(bounds: RegionBounds, arch: ArchProfile, build: BuildIdentity) -> Self {
        Self {
            bounds,
            arch,
            build,
            output_dir: DEFAULT_OUTPUT_DIR,
        }
    }

    /// Overrides the directory dumps are written into.
    #[must_use]
    pub const fn with_output_dir(mut self, output_dir: &'static str) -> Self {
        self.output_dir = output_dir;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_label_their_status_register() {
        assert_eq!(ArchProfile::default(), ArchProfile::ARM9);
        assert_eq!(ArchProfile::ARM9.status_label, "CPSR");
        assert_eq!(ArchProfile::CORTEX_M.status_label, "xPSR");
        assert_eq!(ArchProfile::CORTEX_M.thumb_mask, 0x0100_0000);
    }
}
