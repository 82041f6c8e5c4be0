//! Calendar reads for the fault path.
//!
//! The RTC is clocked from LSI (see `runtime`), which survives the fault.
//! Reads go through the shadow registers, so they wait for RSF first.

use crashdump_core::platform::Clock;
use crashdump_core::timestamp::Timestamp;
use defmt::warn;
use embassy_stm32::pac;

/// Upper bound on the RSF wait: two RTCCLK periods at 32 kHz are about
/// 1000 core cycles at 16 MHz, each poll takes several.
const SYNC_POLLS: u32 = 10_000;

/// Turns on the RTC register interface on APB.
pub fn enable_bus_clock() {
    pac::RCC.apbenr1().modify(|w| w.set_rtcapben(true));
}

/// Reads the RTC calendar shadow registers, which already hold BCD.
pub struct RtcClock;

impl RtcClock {
    /// Waits for the shadow registers to resync with the calendar.
    fn wait_for_sync() -> bool {
        (0..SYNC_POLLS).any(|_| pac::RTC.icsr().read().rsf())
    }
}

impl Clock for RtcClock {
    fn now(&mut self) -> Timestamp {
        enable_bus_clock();
        if !Self::wait_for_sync() {
            warn!("crash: rtc shadow registers never synchronised");
        }
        if !pac::RTC.icsr().read().inits() {
            warn!("crash: rtc calendar was never set");
        }

        // Reading TR locks DR until it is read, so both describe one instant.
        let tr = pac::RTC.tr().read();
        let dr = pac::RTC.dr().read();
        let pack = |tens: u8, units: u8| (tens << 4) | units;
        Timestamp::from_bcd(
            pack(u8::from(dr.yt()), u8::from(dr.yu())),
            pack(u8::from(dr.mt()), u8::from(dr.mu())),
            pack(u8::from(dr.dt()), u8::from(dr.du())),
            pack(u8::from(tr.ht()), u8::from(tr.hu())),
            pack(u8::from(tr.mnt()), u8::from(tr.mnu())),
            pack(u8::from(tr.st()), u8::from(tr.su())),
        )
    }
}
