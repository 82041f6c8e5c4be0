//! Word-generic hexadecimal dumper.
//!
//! Rows always cover 16 bytes. The word size only changes how those bytes are
//! grouped: bytes for the stack (endianness-agnostic), half-words for Thumb
//! code, and words for ARM code, so an instruction stream reads naturally.

use core::fmt;

use crate::region::{MemoryWindow, ROW_BYTES};

/// Granularity used when reading and printing a dump row.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordSize {
    Byte,
    Half,
    Word,
}

impl WordSize {
    /// Width of one word in bytes.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            WordSize::Byte => 1,
            WordSize::Half => 2,
            WordSize::Word => 4,
        }
    }

    /// Hex digits printed per word.
    #[must_use]
    pub const fn digits(self) -> usize {
        self.bytes() as usize * 2
    }

    /// Words printed on a full row.
    #[must_use]
    pub const fn words_per_row(self) -> u32 {
        ROW_BYTES / self.bytes()
    }

    /// Picks the code dump granularity from the instruction set in use.
    #[must_use]
    pub const fn for_code(thumb: bool) -> Self {
        if thumb { WordSize::Half } else { WordSize::Word }
    }
}

/// Read access to the memory being dumped.
///
/// Implementations are only ever handed addresses inside a [`MemoryWindow`],
/// aligned to `size`.
pub trait MemorySource {
    /// Reads one word of `size` at `address`, zero-extended.
    fn read(&self, address: u32, size: WordSize) -> u32;
}

impl<T> MemorySource for &T
where
    T: MemorySource + ?Sized,
{
    fn read(&self, address: u32, size: WordSize) -> u32 {
        (**self).read(address, size)
    }
}

/// Address prefix: eight digits, a colon and a space.
const ADDRESS_COLUMN: usize = 10;

/// Renders a validated window as hex rows.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HexDump {
    window: MemoryWindow,
    size: WordSize,
}

impl HexDump {
    #[must_use]
    pub const fn new(window: MemoryWindow, size: WordSize) -> Self {
        Self { window, size }
    }

    #[must_use]
    pub const fn window(&self) -> MemoryWindow {
        self.window
    }

    #[must_use]
    pub const fn word_size(&self) -> WordSize {
        self.size
    }

    /// Number of rows the window produces.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.window.len().div_ceil(ROW_BYTES) as usize
    }

    /// Exact length of the rendered text in bytes.
    #[must_use]
    pub fn rendered_len(&self) -> usize {
        self.row_starts().map(|start| self.row_len(start)).sum()
    }

    /// Length of the row starting at `start`, including its newline.
    fn row_len(&self, start: u32) -> usize {
        ADDRESS_COLUMN + self.words_in_row(start) as usize * (self.size.digits() + 1) + 1
    }

    /// Whole words of the row at `start` that lie below the window's end.
    fn words_in_row(&self, start: u32) -> u32 {
        let remaining = self.window.upper().saturating_sub(start);
        remaining.min(ROW_BYTES) / self.size.bytes()
    }

    /// Writes a single row starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns the writer's error; the row may be partially written.
    pub fn write_row<W, M>(&self, writer: &mut W, memory: &M, start: u32) -> fmt::Result
    where
        W: fmt::Write,
        M: MemorySource + ?Sized,
    {
        let width = self.size.digits();
        write!(writer, "{start:08X}: ")?;
        let mut address = start;
        for _ in 0..self.words_in_row(start) {
            let value = memory.read(address, self.size);
            write!(writer, "{value:0width$X} ")?;
            address += self.size.bytes();
        }
        writer.write_char('\n')
    }

    /// Iterates over the start address of every row.
    pub fn row_starts(&self) -> impl Iterator<Item = u32> + use<> {
        (self.window.lower()..self.window.upper()).step_by(ROW_BYTES as usize)
    }

    /// Writes every row of the window.
    ///
    /// # Errors
    ///
    /// Returns the writer's error at the first row that fails.
    pub fn write_to<W, M>(&self, writer: &mut W, memory: &M) -> fmt::Result
    where
        W: fmt::Write,
        M: MemorySource + ?Sized,
    {
        for start in self.row_starts() {
            self.write_row(writer, memory, start)?;
        }
        Ok(())
    }
}
