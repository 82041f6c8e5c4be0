use core::time::Duration;

use cortex_m::asm;
use crashdump_core::platform::{Buttons, Input};
use embassy_stm32::gpio::{Input as Pin, Pull};
use embassy_stm32::Peripherals;

use super::CORE_CLOCK_HZ;

const SAMPLE_CYCLES: u32 = CORE_CLOCK_HZ / 1_000;
/// Consecutive 1 ms samples a press must last.
const DEBOUNCE_SAMPLES: u8 = 3;

/// Active-low POWER button on PA0, sampled by busy-waiting.
pub struct PowerButton {
    pin: Pin<'static>,
}

impl PowerButton {
    /// # Safety
    ///
    /// PA0 must not be driven by any other owner; the fault path is the only
    /// caller and the application is never resumed.
    pub unsafe fn steal() -> Self {
        let p = unsafe { Peripherals::steal() };
        Self {
            pin: Pin::new(p.PA0, Pull::Up),
        }
    }

    fn pressed_for(&self, samples: u8) -> bool {
        for _ in 0..samples {
            if self.pin.is_high() {
                return false;
            }
            asm::delay(SAMPLE_CYCLES);
        }
        true
    }
}

impl Input for PowerButton {
    fn poll(&mut self, timeout: Option<Duration>) -> Buttons {
        let mut remaining_ms = timeout.map(|timeout| timeout.as_millis());
        loop {
            if self.pressed_for(DEBOUNCE_SAMPLES) {
                return Buttons::POWER;
            }
            match remaining_ms.as_mut() {
                Some(0) => return Buttons::NONE,
                Some(ms) => *ms -= 1,
                None => {}
            }
            asm::delay(SAMPLE_CYCLES);
        }
    }
}
