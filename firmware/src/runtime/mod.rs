use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Pull};
use embassy_stm32::rcc::LsConfig;
use embassy_time::{Duration, Timer};

use crate::hw::rtc;
use crate::{crash, fault};

/// How often the crash-test button is sampled.
const TRIGGER_POLL: Duration = Duration::from_millis(20);

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

#[embassy_executor::main]
pub async fn main(_spawner: Spawner) {
    let mut config = hal::Config::default();
    // The fault path timestamps dumps from the RTC, so keep it running.
    config.rcc.ls = LsConfig::default_lsi();
    let hal::Peripherals { PA1, .. } = hal::init(config);
    rtc::enable_bus_clock();
    crash::log_config();

    // PA0 stays unclaimed so the fault path can take it over as POWER.
    let trigger = Input::new(PA1, Pull::Up);
    info!("runtime: hold PA1 low to raise a test fault");

    loop {
        if trigger.is_low() {
            fault::trigger_test_fault();
        }
        Timer::after(TRIGGER_POLL).await;
    }
}
