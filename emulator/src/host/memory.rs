//! Synthetic memory image standing in for target RAM and flash.

use anyhow::{Result, bail};
use crashdump_core::dump::{MemorySource, WordSize};
use crashdump_core::region::RegionBounds;

/// Stack words carry this tag in their upper half so they stand out in dumps.
const STACK_FILL: u32 = 0x5AC0_0000;
/// ARM `mov r0, r0` used to fill the code image.
const CODE_FILL: u32 = 0xE1A0_0000;

struct Region {
    base: u32,
    bytes: Vec<u8>,
}

impl Region {
    fn filled(base: u32, len: u32, fill: impl Fn(u32) -> u32) -> Self {
        let mut bytes = Vec::with_capacity(len as usize);
        let mut address = base;
        while bytes.len() < len as usize {
            bytes.extend_from_slice(&fill(address).to_le_bytes());
            address = address.wrapping_add(4);
        }
        bytes.truncate(len as usize);
        Self { base, bytes }
    }

    fn offset(&self, address: u32) -> Option<usize> {
        let offset = address.checked_sub(self.base)? as usize;
        (offset < self.bytes.len()).then_some(offset)
    }
}

/// Byte-addressed image holding the stack and code regions.
pub struct SyntheticMemory {
    regions: Vec<Region>,
}

impl SyntheticMemory {
    /// Fills the stack and code regions described by `bounds` with
    /// recognisable patterns.
    pub fn for_bounds(bounds: &RegionBounds) -> Self {
        let stack = Region::filled(bounds.stack_bottom(), bounds.stack_len, |address| {
            STACK_FILL | (address & 0xFFFF)
        });
        let code = Region::filled(
            bounds.code_start,
            bounds.code_end.saturating_sub(bounds.code_start),
            |address| CODE_FILL | ((address >> 2) & 0xFFFF),
        );
        Self {
            regions: vec![stack, code],
        }
    }

    pub fn byte(&self, address: u32) -> Option<u8> {
        self.regions
            .iter()
            .find_map(|region| region.offset(address).map(|offset| region.bytes[offset]))
    }

    /// Overwrites little-endian words starting at `address`.
    pub fn patch_words(&mut self, address: u32, words: &[u32]) -> Result<()> {
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        let Some(region) = self
            .regions
            .iter_mut()
            .find(|region| region.offset(address).is_some())
        else {
            bail!("address {address:#010X} is outside every region");
        };

        let start = address as usize - region.base as usize;
        let Some(target) = region.bytes.get_mut(start..start + bytes.len()) else {
            bail!(
                "patch of {} bytes at {address:#010X} runs past its region",
                bytes.len()
            );
        };
        target.copy_from_slice(&bytes);
        Ok(())
    }
}

impl MemorySource for SyntheticMemory {
    fn read(&self, address: u32, size: WordSize) -> u32 {
        // Unmapped bytes read as zero; the handler only reads validated windows.
        (0..size.bytes()).fold(0, |word, offset| {
            let byte = self.byte(address.wrapping_add(offset)).unwrap_or(0);
            word | (u32::from(byte) << (offset * 8))
        })
    }
}
