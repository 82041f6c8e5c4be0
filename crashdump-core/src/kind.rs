//! Exception vector naming.
//!
//! The entry stubs pass the raw vector index. Only the low three bits select
//! a name; the raw value is still printed so nothing is lost if higher bits
//! ever carry a sub-code.

use core::fmt;

/// Mask applied to the raw vector index before naming it.
pub const VECTOR_MASK: u32 = 0b111;

/// Processor exception classes, in vector-table order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExceptionKind {
    Reset,
    Undefined,
    Swi,
    PrefetchAbort,
    DataAbort,
    Reserved,
    Irq,
    Fiq,
}

/// Every kind, indexed by masked vector number.
pub const ALL_KINDS: [ExceptionKind; 8] = [
    ExceptionKind::Reset,
    ExceptionKind::Undefined,
    ExceptionKind::Swi,
    ExceptionKind::PrefetchAbort,
    ExceptionKind::DataAbort,
    ExceptionKind::Reserved,
    ExceptionKind::Irq,
    ExceptionKind::Fiq,
];

impl ExceptionKind {
    /// Names a raw vector index using its low three bits.
    #[must_use]
    pub const fn from_vector(raw: u32) -> Self {
        ALL_KINDS[(raw & VECTOR_MASK) as usize]
    }

    /// Position of this kind in the vector table.
    #[must_use]
    pub const fn as_index(self) -> u32 {
        match self {
            ExceptionKind::Reset => 0,
            ExceptionKind::Undefined => 1,
            ExceptionKind::Swi => 2,
            ExceptionKind::PrefetchAbort => 3,
            ExceptionKind::DataAbort => 4,
            ExceptionKind::Reserved => 5,
            ExceptionKind::Irq => 6,
            ExceptionKind::Fiq => 7,
        }
    }

    /// Human-readable label used in the report header.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ExceptionKind::Reset => "Reset",
            ExceptionKind::Undefined => "Undefined",
            ExceptionKind::Swi => "SWI",
            ExceptionKind::PrefetchAbort => "Prefetch Abort",
            ExceptionKind::DataAbort => "Data Abort",
            ExceptionKind::Reserved => "Reserved",
            ExceptionKind::Irq => "IRQ",
            ExceptionKind::Fiq => "FIQ",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw vector index as delivered by the entry stub.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExceptionVector(pub u32);

impl ExceptionVector {
    #[must_use]
    pub const fn kind(self) -> ExceptionKind {
        ExceptionKind::from_vector(self.0)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<ExceptionKind> for ExceptionVector {
    fn from(kind: ExceptionKind) -> Self {
        Self(kind.as_index())
    }
}

impl fmt::Display for ExceptionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind(), self.0)
    }
}
