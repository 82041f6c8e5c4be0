//! Fixed-capacity report buffer.
//!
//! Text is appended one line at a time. A line that does not fit is rolled
//! back entirely, so the buffer only ever holds whole lines and can never be
//! left with a half-written record.

use core::fmt::{self, Write as _};

use heapless::String;

/// Default report capacity in bytes.
pub const REPORT_CAPACITY: usize = 2048;

/// Outcome of appending one line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Append {
    Written,
    Rejected,
}

impl Append {
    #[must_use]
    pub const fn fits(self) -> bool {
        matches!(self, Append::Written)
    }
}

/// Append-only text buffer holding one crash report.
#[derive(Clone, Debug, Default)]
pub struct Report<const N: usize = REPORT_CAPACITY> {
    text: String<N>,
    summary_end: usize,
    truncated: bool,
}

impl<const N: usize> Report<N> {
    /// Creates an empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            summary_end: 0,
            truncated: false,
        }
    }

    /// Discards all content so the buffer can be reused.
    pub fn clear(&mut self) {
        self.text.clear();
        self.summary_end = 0;
        self.truncated = false;
    }

    /// Appends the text produced by `render` as one unit.
    ///
    /// When the text does not fit, the buffer is restored to its previous
    /// length and the report is flagged as truncated.
    pub fn append_with<F>(&mut self, render: F) -> Append
    where
        F: FnOnce(&mut String<N>) -> fmt::Result,
    {
        let mark = self.text.len();
        if render(&mut self.text).is_ok() {
            Append::Written
        } else {
            self.text.truncate(mark);
            self.truncated = true;
            Append::Rejected
        }
    }

    /// Appends formatted text as one unit.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> Append {
        self.append_with(|text| text.write_fmt(args))
    }

    /// Appends a literal string as one unit.
    pub fn append_str(&mut self, line: &str) -> Append {
        self.append_with(|text| text.write_str(line))
    }

    /// Records the current length as the end of the on-screen summary.
    pub fn mark_summary_end(&mut self) {
        self.summary_end = self.text.len();
    }

    /// Returns the full report.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Returns the header and register block shown on the primary screen.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.text.get(..self.summary_end).unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Maximum number of bytes the report can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns `true` when any line was dropped for lack of space.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<const N: usize> fmt::Display for Report<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use core::fmt::Write;

    use super::*;

    #[test]
    fn lines_that_fit_are_kept() {
        let mut report: Report<16> = Report::new();
        assert_eq!(report.append_str("hello\n"), Append::Written);
        assert_eq!(report.append_fmt(format_args!("{}\n", 42)), Append::Written);
        assert_eq!(report.as_str(), "hello\n42\n");
        assert!(!report.is_truncated());
    }

    #[test]
    fn rejected_line_leaves_buffer_untouched() {
        let mut report: Report<8> = Report::new();
        report.append_str("abcd\n");
        let outcome = report.append_with(|text| {
            text.write_str("ef")?;
            text.write_str("ghij\n")
        });
        assert_eq!(outcome, Append::Rejected);
        assert_eq!(report.as_str(), "abcd\n");
        assert!(report.is_truncated());
        assert!(report.len() <= report.capacity());
    }

    #[test]
    fn summary_tracks_marked_prefix() {
        let mut report: Report<32> = Report::new();
        report.append_str("head\n");
        report.mark_summary_end();
        report.append_str("tail\n");
        assert_eq!(report.summary(), "head\n");

        report.clear();
        assert!(report.is_empty());
        assert_eq!(report.summary(), "");
    }
}
