//! Board peripherals used once the handler has taken over.
//!
//! The fault path cannot rely on the executor or interrupts, so every driver
//! here is blocking and reclaims its peripheral with
//! [`embassy_stm32::Peripherals::steal`].

pub mod button;
pub mod flash;
pub mod power;
pub mod rtc;

/// Core clock after `embassy_stm32::init` with the default configuration (HSI16).
pub const CORE_CLOCK_HZ: u32 = 16_000_000;
