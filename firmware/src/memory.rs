use core::ptr;

use crashdump_core::dump::{MemorySource, WordSize};
use crashdump_core::region::RegionBounds;

unsafe extern "C" {
    static _stack_start: u32;
    static _stack_end: u32;
    static __stext: u32;
    static __etext: u32;
}

/// Stack and code regions as laid out by the `cortex-m-rt` linker script.
pub fn linker_bounds() -> RegionBounds {
    // SAFETY: only the addresses of the linker symbols are taken.
    let (stack_top, stack_end, code_start, code_end) = unsafe {
        (
            ptr::addr_of!(_stack_start) as u32,
            ptr::addr_of!(_stack_end) as u32,
            ptr::addr_of!(__stext) as u32,
            ptr::addr_of!(__etext) as u32,
        )
    };
    RegionBounds::new(
        stack_top,
        stack_top.saturating_sub(stack_end),
        code_start,
        code_end,
    )
}

/// Reads live memory with volatile accesses of the requested width.
pub struct LiveMemory;

impl MemorySource for LiveMemory {
    fn read(&self, address: u32, size: WordSize) -> u32 {
        // SAFETY: the handler only reads inside windows validated against
        // the linker regions, and every row address is aligned to 16 bytes.
        unsafe {
            match size {
                WordSize::Byte => u32::from(ptr::read_volatile(address as *const u8)),
                WordSize::Half => u32::from(ptr::read_volatile(address as *const u16)),
                WordSize::Word => ptr::read_volatile(address as *const u32),
            }
        }
    }
}
