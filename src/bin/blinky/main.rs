//! Blink the LED on GPIO 16 of a Raspberry Pi 3 / Zero 2 W.
//!
//! Build with `--target aarch64-unknown-none --features firmware`, convert to
//! a raw image with `objcopy -O binary` and boot it as `kernel8.img`.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod boot;

#[cfg(target_os = "none")]
use bcm_blinky::{Blinker, BoardConfig, MmioBus};

#[cfg(feature = "rtt")]
use defmt_rtt as _;

#[cfg(target_os = "none")]
static CONFIG: BoardConfig = BoardConfig::RPI3;

/// Entered from `_start` on core 0 with a stack and a zeroed `.bss`.
#[cfg(target_os = "none")]
#[no_mangle]
pub extern "C" fn kmain() -> ! {
    // SAFETY: sole core running, MMU off, peripherals identity-mapped.
    let bus = unsafe { MmioBus::new() };

    #[cfg(feature = "defmt")]
    defmt::info!("blinky: GPIO{}", CONFIG.led().pin());

    blink(bus)
}

#[cfg(all(target_os = "none", not(feature = "system-timer")))]
fn blink(bus: MmioBus) -> ! {
    Blinker::with_spin_delay(&CONFIG, bus).run()
}

#[cfg(all(target_os = "none", feature = "system-timer"))]
fn blink(bus: MmioBus) -> ! {
    use bcm_blinky::SystemTimer;

    let timer = SystemTimer::new(&bus, CONFIG.timer_base());
    Blinker::new(&CONFIG, &bus, timer).run()
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("blinky is bare-metal firmware; build it with --target aarch64-unknown-none");
    std::process::exit(1);
}
