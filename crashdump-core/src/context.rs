//! Register bank captured at fault entry.

/// Number of general-purpose registers in the bank.
pub const GENERAL_REGISTERS: usize = 16;
/// Total number of words captured: R0..R15 plus the status word.
pub const REGISTER_COUNT: usize = GENERAL_REGISTERS + 1;

/// Index of the stack pointer (R13).
pub const SP_INDEX: usize = 13;
/// Index of the link register (R14).
pub const LR_INDEX: usize = 14;
/// Index of the program counter (R15).
pub const PC_INDEX: usize = 15;
/// Index of the status word following the general-purpose registers.
pub const STATUS_INDEX: usize = GENERAL_REGISTERS;

/// Immutable register snapshot taken by the exception entry stub.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultContext {
    words: [u32; REGISTER_COUNT],
}

impl FaultContext {
    /// Wraps the raw words in capture order (R0..R15, status).
    #[must_use]
    pub const fn new(words: [u32; REGISTER_COUNT]) -> Self {
        Self { words }
    }

    /// Builds a context from the general-purpose bank and a separate status word.
    #[must_use]
    pub const fn from_parts(general: [u32; GENERAL_REGISTERS], status: u32) -> Self {
        let mut words = [0; REGISTER_COUNT];
        let mut index = 0;
        while index < GENERAL_REGISTERS {
            words[index] = general[index];
            index += 1;
        }
        words[STATUS_INDEX] = status;
        Self { words }
    }

    /// Returns every captured word in capture order.
    #[must_use]
    pub const fn words(&self) -> &[u32; REGISTER_COUNT] {
        &self.words
    }

    /// Returns general-purpose register `Rn`, if `n` names one.
    #[must_use]
    pub fn register(&self, n: usize) -> Option<u32> {
        if n < GENERAL_REGISTERS {
            self.words.get(n).copied()
        } else {
            None
        }
    }

    #[must_use]
    pub const fn stack_pointer(&self) -> u32 {
        self.words[SP_INDEX]
    }

    #[must_use]
    pub const fn link_register(&self) -> u32 {
        self.words[LR_INDEX]
    }

    #[must_use]
    pub const fn program_counter(&self) -> u32 {
        self.words[PC_INDEX]
    }

    /// Returns the status word (CPSR / xPSR depending on the core).
    #[must_use]
    pub const fn status(&self) -> u32 {
        self.words[STATUS_INDEX]
    }

    /// Returns `true` when any bit of `thumb_mask` is set in the status word.
    #[must_use]
    pub const fn is_thumb(&self, thumb_mask: u32) -> bool {
        self.status() & thumb_mask != 0
    }
}
