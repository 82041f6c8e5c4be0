//! QR encoder backed by `qrcodegen-no-heap`.
//!
//! Both scratch buffers are sized for the largest symbol (version 40), so the
//! only failure left is a payload beyond that symbol's capacity.

use qrcodegen_no_heap::{QrCode, QrCodeEcc, Version};

use crate::platform::{CodeEncoder, CodeMatrix, EncodeError};

/// Buffer length required for a version 40 symbol.
pub const QR_BUFFER_LEN: usize = 3918;

/// Largest byte-mode payload at the lowest error-correction level.
pub const QR_MAX_BYTES: usize = 2953;

const MIN_VERSION: u8 = 1;
const MAX_VERSION: u8 = 40;

/// Encodes report text with low error correction, any version, automatic mask
/// and error-correction boosting.
pub struct QrEncoder {
    temp: [u8; QR_BUFFER_LEN],
    modules: [u8; QR_BUFFER_LEN],
    max_version: u8,
}

impl QrEncoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            temp: [0; QR_BUFFER_LEN],
            modules: [0; QR_BUFFER_LEN],
            max_version: MAX_VERSION,
        }
    }

    /// Caps the symbol version, for displays too small for a full symbol.
    /// Values are clamped to `1..=40`.
    #[must_use]
    pub const fn with_max_version(mut self, version: u8) -> Self {
        self.max_version = if version < MIN_VERSION {
            MIN_VERSION
        } else if version > MAX_VERSION {
            MAX_VERSION
        } else {
            version
        };
        self
    }

    #[must_use]
    pub const fn max_version(&self) -> u8 {
        self.max_version
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeEncoder for QrEncoder {
    type Code<'a>
        = QrCode<'a>
    where
        Self: 'a;

    fn encode(&mut self, text: &str) -> Result<Self::Code<'_>, EncodeError> {
        let Self {
            temp,
            modules,
            max_version,
        } = self;
        QrCode::encode_text(
            text,
            temp,
            modules,
            QrCodeEcc::Low,
            Version::MIN,
            Version::new(*max_version),
            None,
            true,
        )
        .map_err(|_| EncodeError::DataTooLong)
    }
}

/// Lets a statically allocated encoder be handed to the driver by reference.
impl CodeEncoder for &mut QrEncoder {
    type Code<'a>
        = QrCode<'a>
    where
        Self: 'a;

    fn encode(&mut self, text: &str) -> Result<Self::Code<'_>, EncodeError> {
        CodeEncoder::encode(&mut **self, text)
    }
}

impl CodeMatrix for QrCode<'_> {
    fn size(&self) -> u32 {
        u32::try_from(QrCode::size(self)).unwrap_or(0)
    }

    fn is_dark(&self, x: u32, y: u32) -> bool {
        match (i32::try_from(x), i32::try_from(y)) {
            (Ok(x), Ok(y)) => self.get_module(x, y),
            _ => false,
        }
    }
}
