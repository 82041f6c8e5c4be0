use cortex_m::asm;
use cortex_m::interrupt;
use crashdump_core::platform::Power;
use defmt::info;

/// Parks the core in deep sleep with interrupts masked. Only a reset or a
/// power cycle brings the board back.
pub struct DeepSleep;

impl Power for DeepSleep {
    fn power_off(&mut self) -> ! {
        info!("crash: powering off");
        interrupt::disable();
        // SAFETY: interrupts are masked and nothing else touches the SCB now.
        let mut core = unsafe { cortex_m::Peripherals::steal() };
        core.SCB.set_sleepdeep();
        loop {
            asm::wfi();
        }
    }
}
