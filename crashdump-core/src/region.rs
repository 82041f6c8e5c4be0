//! Range validation for the stack and code dumps.
//!
//! A crash handler cannot probe an address to find out whether it is mapped:
//! the probe itself would fault. Every decision here is made by comparing the
//! candidate against link-time bounds, and the resulting [`MemoryWindow`] is
//! the only way the dumper learns which addresses it may read.

use core::fmt;

/// Bytes of stack dumped upward from the stack pointer.
pub const STACK_DUMP_LEN: u32 = 0x80;
/// Bytes of code dumped on either side of the program counter.
pub const CODE_DUMP_RADIUS: u32 = 0x10;
/// Width of one dump row; candidate addresses are masked down to it.
pub const ROW_BYTES: u32 = 16;

const ROW_MASK: u32 = !(ROW_BYTES - 1);

/// Half-open address range `[lower, upper)` proven safe to read.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryWindow {
    lower: u32,
    upper: u32,
}

impl MemoryWindow {
    #[must_use]
    pub const fn lower(&self) -> u32 {
        self.lower
    }

    #[must_use]
    pub const fn upper(&self) -> u32 {
        self.upper
    }

    /// Number of bytes covered by the window.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.upper - self.lower
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.upper == self.lower
    }

    /// Returns `true` when `address` falls inside the window.
    #[must_use]
    pub const fn contains(&self, address: u32) -> bool {
        self.lower <= address && address < self.upper
    }
}

/// Reasons a set of region bounds cannot describe a usable layout.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoundsError {
    /// The stack length is zero or reaches below address zero.
    EmptyStack,
    /// The code end does not lie above the code start.
    InvertedCode,
    /// A bound is not aligned to a dump row.
    Misaligned,
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoundsError::EmptyStack => "stack region is empty or underflows",
            BoundsError::InvertedCode => "code region end precedes start",
            BoundsError::Misaligned => "region bound is not 16-byte aligned",
        })
    }
}

/// Link-time bounds of the regions the handler may dump.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegionBounds {
    /// One past the highest stack address (the initial stack pointer).
    pub stack_top: u32,
    /// Size of the stack region growing down from `stack_top`.
    pub stack_len: u32,
    /// First address of the executable image.
    pub code_start: u32,
    /// One past the last address of the executable image.
    pub code_end: u32,
}

impl RegionBounds {
    #[must_use]
    pub const fn new(stack_top: u32, stack_len: u32, code_start: u32, code_end: u32) -> Self {
        Self {
            stack_top,
            stack_len,
            code_start,
            code_end,
        }
    }

    /// Lowest valid stack address.
    #[must_use]
    pub const fn stack_bottom(&self) -> u32 {
        self.stack_top.saturating_sub(self.stack_len)
    }

    /// Checks that the bounds describe non-empty, row-aligned regions.
    ///
    /// # Errors
    ///
    /// Returns the first [`BoundsError`] found. Misaligned bounds still
    /// produce safe windows, but dumps may then end in a partial row.
    pub const fn validate(&self) -> Result<(), BoundsError> {
        if self.stack_len == 0 || self.stack_len > self.stack_top {
            return Err(BoundsError::EmptyStack);
        }
        if self.code_end <= self.code_start {
            return Err(BoundsError::InvertedCode);
        }
        let aligned = self.stack_top & !ROW_MASK == 0
            && self.stack_len & !ROW_MASK == 0
            && self.code_start & !ROW_MASK == 0
            && self.code_end & !ROW_MASK == 0;
        if aligned {
            Ok(())
        } else {
            Err(BoundsError::Misaligned)
        }
    }

    /// Window starting at the stack pointer, or `None` when it lies outside the stack.
    #[must_use]
    pub fn stack_window(&self, stack_pointer: u32) -> Option<MemoryWindow> {
        let sp = stack_pointer & ROW_MASK;
        if sp < self.stack_bottom() || sp >= self.stack_top {
            return None;
        }

        Some(MemoryWindow {
            lower: sp,
            upper: sp.saturating_add(STACK_DUMP_LEN).min(self.stack_top),
        })
    }

    /// Window centred on the program counter, clamped to the code image.
    #[must_use]
    pub fn code_window(&self, program_counter: u32) -> Option<MemoryWindow> {
        let pc = program_counter & ROW_MASK;
        if pc < self.code_start || pc >= self.code_end {
            return None;
        }

        Some(MemoryWindow {
            lower: pc.saturating_sub(CODE_DUMP_RADIUS).max(self.code_start),
            upper: pc.saturating_add(CODE_DUMP_RADIUS).min(self.code_end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: RegionBounds = RegionBounds::new(0x0800_0000, 0x4000, 0x0808_0000, 0x080A_0000);

    #[test]
    fn stack_window_spans_fixed_length() {
        let window = BOUNDS.stack_window(0x07FF_E000).expect("sp in range");
        assert_eq!(window.lower(), 0x07FF_E000);
        assert_eq!(window.upper(), 0x07FF_E080);
        assert_eq!(window.len(), STACK_DUMP_LEN);
    }

    #[test]
    fn stack_window_masks_to_row() {
        let window = BOUNDS.stack_window(0x07FF_E00C).expect("sp in range");
        assert_eq!(window.lower(), 0x07FF_E000);
    }

    #[test]
    fn stack_window_clamps_at_top() {
        let window = BOUNDS.stack_window(0x07FF_FFF0).expect("sp in range");
        assert_eq!(window.upper(), BOUNDS.stack_top);
        assert_eq!(window.len(), 0x10);
    }

    #[test]
    fn stack_window_rejects_out_of_range() {
        assert_eq!(BOUNDS.stack_window(0x0800_0000), None);
        assert_eq!(BOUNDS.stack_window(BOUNDS.stack_bottom() - 0x10), None);
        assert!(BOUNDS.stack_window(BOUNDS.stack_bottom()).is_some());
    }

    #[test]
    fn code_window_is_centred_on_pc() {
        let window = BOUNDS.code_window(0x0808_1004).expect("pc in range");
        assert_eq!(window.lower(), 0x0808_0FF0);
        assert_eq!(window.upper(), 0x0808_1010);
        assert!(window.contains(0x0808_1004));
    }

    #[test]
    fn code_window_clamps_at_both_edges() {
        let start = BOUNDS.code_window(BOUNDS.code_start).expect("pc at start");
        assert_eq!(start.lower(), BOUNDS.code_start);
        assert_eq!(start.upper(), BOUNDS.code_start + CODE_DUMP_RADIUS);

        let end = BOUNDS.code_window(BOUNDS.code_end - 4).expect("pc at end");
        assert_eq!(end.lower(), BOUNDS.code_end - 0x20);
        assert_eq!(end.upper(), BOUNDS.code_end);
    }

    #[test]
    fn code_window_rejects_addresses_outside_image() {
        assert_eq!(BOUNDS.code_window(BOUNDS.code_end), None);
        assert_eq!(BOUNDS.code_window(BOUNDS.code_end + 4), None);
        assert_eq!(BOUNDS.code_window(BOUNDS.code_start - 4), None);
    }

    #[test]
    fn extreme_addresses_do_not_overflow() {
        let bounds = RegionBounds::new(u32::MAX & ROW_MASK, 0x100, 0, 0x20);
        let window = bounds.stack_window(u32::MAX - 0x20).expect("sp in range");
        assert_eq!(window.upper(), bounds.stack_top);

        let low = bounds.code_window(0).expect("pc at zero");
        assert_eq!(low.lower(), 0);
        assert_eq!(low.upper(), CODE_DUMP_RADIUS);
    }

    #[test]
    fn validate_reports_layout_problems() {
        assert_eq!(BOUNDS.validate(), Ok(()));
        assert_eq!(
            RegionBounds::new(0x1000, 0, 0, 0x10).validate(),
            Err(BoundsError::EmptyStack)
        );
        assert_eq!(
            RegionBounds::new(0x1000, 0x100, 0x20, 0x10).validate(),
            Err(BoundsError::InvertedCode)
        );
        assert_eq!(
            RegionBounds::new(0x1000, 0x100, 0x0, 0x14).validate(),
            Err(BoundsError::Misaligned)
        );
    }
}
