//! Collaborator contracts consumed by the snapshot driver.
//!
//! The firmware and emulator implement these traits so the driver can run the
//! same sequence against real peripherals or host stand-ins. Every call happens
//! strictly in order from a single context, so none of the traits require
//! `Sync` or interior mutability.

use core::fmt;
use core::time::Duration;

use crate::timestamp::Timestamp;

/// Real-time clock read once at fault entry.
pub trait Clock {
    fn now(&mut self) -> Timestamp;
}

/// A timestamp latched at exception entry stands in for the clock.
impl Clock for Timestamp {
    fn now(&mut self) -> Timestamp {
        *self
    }
}

/// Screens the handler draws on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Surface {
    /// Summary and status lines.
    Primary,
    /// QR code.
    Secondary,
}

/// 24-bit RGB colour.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Self = Self(0x00_0000);
    pub const WHITE: Self = Self(0xFF_FFFF);
    pub const GREY: Self = Self(0xE0_E0E0);

    /// Background of the crash screens.
    pub const BACKGROUND: Self = Self::BLACK;
    /// Foreground of the crash text.
    pub const FOREGROUND: Self = Self::GREY;
}

/// Width and height in surface units (pixels or character cells).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Square module matrix produced by a [`CodeEncoder`].
pub trait CodeMatrix {
    /// Modules per side.
    fn size(&self) -> u32;

    /// Returns `true` for dark modules. Out-of-range coordinates are light.
    fn is_dark(&self, x: u32, y: u32) -> bool;
}

/// Quiet zone, in modules, kept around a drawn code.
pub const CODE_QUIET_ZONE: u32 = 2;

/// Where and how large a code is drawn on a surface.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CodePlacement {
    /// Surface units per module; zero when the code does not fit.
    pub scale: u32,
    pub x: u32,
    pub y: u32,
}

impl CodePlacement {
    /// Largest integer scale that fits `modules` plus the quiet zone into
    /// `surface`, centred.
    #[must_use]
    pub const fn fit(surface: Extent, modules: u32) -> Self {
        let span = modules.saturating_add(2 * CODE_QUIET_ZONE);
        let side = if surface.width < surface.height {
            surface.width
        } else {
            surface.height
        };
        let scale = match side.checked_div(span) {
            Some(scale) => scale,
            None => 0,
        };
        let drawn = scale * modules;
        Self {
            scale,
            x: surface.width.saturating_sub(drawn) / 2,
            y: surface.height.saturating_sub(drawn) / 2,
        }
    }

    #[must_use]
    pub const fn fits(&self) -> bool {
        self.scale > 0
    }
}

/// Text output surfaces.
pub trait Display {
    fn clear(&mut self, surface: Surface, color: Color);

    /// Draws formatted text with its top-left corner at `(x, y)`.
    fn draw_text(
        &mut self,
        surface: Surface,
        x: u32,
        y: u32,
        foreground: Color,
        background: Color,
        text: fmt::Arguments<'_>,
    );

    /// Size `text` occupies when drawn, including every line.
    fn measure_text(&self, text: &str) -> Extent;

    fn surface_size(&self, surface: Surface) -> Extent;

    /// Draws a module matrix scaled to fit `surface`.
    fn draw_code<C>(&mut self, surface: Surface, code: &C)
    where
        C: CodeMatrix + ?Sized;
}

/// Reasons a visual code could not be produced.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The payload exceeds the largest symbol the encoder supports.
    DataTooLong,
    /// The encoder's scratch buffers are too small for the requested symbol.
    BufferTooSmall,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EncodeError::DataTooLong => "payload exceeds visual code capacity",
            EncodeError::BufferTooSmall => "encoder buffer too small",
        })
    }
}

/// Turns report text into a scannable code.
pub trait CodeEncoder {
    type Code<'a>: CodeMatrix
    where
        Self: 'a;

    /// Encodes `text`.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] when the text cannot be represented.
    fn encode(&mut self, text: &str) -> Result<Self::Code<'_>, EncodeError>;
}

/// File storage the dump is persisted to.
pub trait Storage {
    type Error: fmt::Debug;

    /// Mounts the medium.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the medium is absent or unreadable.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Unmounts the medium. Safe to call when `init` failed.
    fn deinit(&mut self);

    /// Writes `data` into the file at `path`, starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the write cannot complete.
    fn write_file(
        &mut self,
        path: &str,
        data: &[u8],
        offset: u32,
        create: bool,
    ) -> Result<(), Self::Error>;
}

/// Bitmask of pressed buttons.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u32);

impl Buttons {
    pub const NONE: Self = Self(0);
    pub const POWER: Self = Self(1 << 0);
    pub const HOME: Self = Self(1 << 1);
    pub const A: Self = Self(1 << 2);

    /// Returns `true` when every button in `other` is pressed.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Button input.
pub trait Input {
    /// Waits up to `timeout` for a button state change and returns the
    /// pressed set. `None` waits until something is pressed.
    fn poll(&mut self, timeout: Option<Duration>) -> Buttons;
}

/// Terminal power control.
pub trait Power {
    fn power_off(&mut self) -> !;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_centres_largest_scale() {
        // 25 modules + quiet zone = 29; 240 / 29 = 8.
        let placement = CodePlacement::fit(Extent::new(320, 240), 25);
        assert_eq!(placement.scale, 8);
        assert_eq!(placement.x, (320 - 200) / 2);
        assert_eq!(placement.y, (240 - 200) / 2);
        assert!(placement.fits());
    }

    #[test]
    fn placement_reports_codes_that_do_not_fit() {
        let placement = CodePlacement::fit(Extent::new(80, 24), 177);
        assert_eq!(placement.scale, 0);
        assert!(!placement.fits());
    }

    #[test]
    fn placement_survives_oversized_module_counts() {
        let placement = CodePlacement::fit(Extent::new(320, 240), u32::MAX);
        assert_eq!(placement, CodePlacement { scale: 0, x: 160, y: 120 });
    }

    #[test]
    fn latched_timestamp_reads_back_unchanged() {
        let mut latched = Timestamp::from_bcd(0x25, 0x03, 0x14, 0x15, 0x09, 0x26);
        let first = latched.now();
        assert_eq!(first, latched.now());
        assert_eq!(first, latched);
    }

    #[test]
    fn buttons_contain_only_pressed_sets() {
        let pressed = Buttons::POWER.union(Buttons::A);
        assert!(pressed.contains(Buttons::POWER));
        assert!(!pressed.contains(Buttons::HOME));
        assert!(!pressed.contains(Buttons::NONE));
    }
}
