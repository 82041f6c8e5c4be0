//! BCD date/time snapshot read from the real-time clock.
//!
//! RTC peripherals hand out each field as two packed decimal digits. Printing
//! a BCD byte as two hexadecimal digits yields its decimal rendering, so the
//! formatter never converts the raw bytes.

use core::fmt;

/// Packed-BCD clock reading. The year holds the two digits within the century.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp {
    /// Creates a timestamp from raw BCD bytes.
    #[must_use]
    pub const fn from_bcd(year: u8, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Creates a timestamp from binary values, packing each into BCD.
    ///
    /// Values above 99 wrap into the two-digit range.
    #[must_use]
    pub const fn from_decimal(year: u8, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year: to_bcd(year),
            month: to_bcd(month),
            day: to_bcd(day),
            hour: to_bcd(hour),
            minute: to_bcd(minute),
            second: to_bcd(second),
        }
    }

    /// Renders `YYMMDDHHMMSS`, the form used in dump filenames.
    ///
    /// # Errors
    ///
    /// Returns the writer's error.
    pub fn write_compact<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(
            writer,
            "{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    /// Returns a [`fmt::Display`] adapter for the compact form.
    #[must_use]
    pub const fn compact(&self) -> Compact<'_> {
        Compact(self)
    }
}

/// Renders `20YY-MM-DD HH:MM:SS`.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "20{:02X}-{:02X}-{:02X} {:02X}:{:02X}:{:02X}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Display adapter produced by [`Timestamp::compact`].
#[derive(Copy, Clone, Debug)]
pub struct Compact<'a>(&'a Timestamp);

impl fmt::Display for Compact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write_compact(f)
    }
}

const fn to_bcd(value: u8) -> u8 {
    let value = value % 100;
    ((value / 10) << 4) | (value % 10)
}
