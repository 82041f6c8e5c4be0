use std::process;

use crashdump_core::platform::Power;
use tracing::info;

use super::display::restore_terminal;

/// Ends the emulator process, restoring the terminal first when it was taken.
pub struct HostPower {
    terminal: bool,
}

impl HostPower {
    pub fn headless() -> Self {
        Self { terminal: false }
    }

    pub fn terminal() -> Self {
        Self { terminal: true }
    }
}

impl Power for HostPower {
    fn power_off(&mut self) -> ! {
        if self.terminal {
            restore_terminal();
        }
        info!("power off");
        process::exit(0)
    }
}
