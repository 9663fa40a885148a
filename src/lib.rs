//! # BCM2837 LED blinker
//!
//! A bare-metal GPIO blinker for the BCM2837/BCM2710 SoC used in the
//! Raspberry Pi 3 and Zero 2 W.
//!
//! The firmware configures GPIO 16 as an output, then sets and clears it
//! every 200 ms forever, timing itself with a calibrated spin loop.
//!
//! ## Features
//!
//! - `defmt`: Route driver logging through defmt (needs a global logger)
//! - `rtt`: Use `defmt-rtt` as that logger in the firmware image
//! - `firmware`: Build the `blinky` aarch64 firmware binary
//!
//! ## Example
//!
//! ```rust,no_run
//! use bcm_blinky::{BoardConfig, Blinker, MmioBus};
//!
//! static CONFIG: BoardConfig = BoardConfig::RPI3;
//!
//! // Only sound on real hardware with the peripheral window mapped.
//! let bus = unsafe { MmioBus::new() };
//! Blinker::with_spin_delay(&CONFIG, bus).run();
//! ```
//!
//! Off-target, [`sim::SimBoard`] replaces the hardware:
//!
//! ```rust
//! use bcm_blinky::{BoardConfig, Blinker, LedState};
//! use bcm_blinky::sim::SimBoard;
//!
//! let config = BoardConfig::RPI3.with_half_period_ms(1);
//! let board = SimBoard::new();
//! let mut blinker = Blinker::new(&config, &board, board.spin_delay(*config.calibration()));
//!
//! blinker.configure();
//! assert_eq!(blinker.step(), LedState::On);
//! assert_eq!(board.value(config.led().fsel_addr()), 1 << 18);
//! ```

#![no_std]
#![warn(missing_docs, clippy::all)]

mod fmt;

pub mod blinker;
pub mod config;
pub mod hal;
pub mod sim;

pub use blinker::{Blinker, LedState};
pub use config::{BoardConfig, ConfigError, HALF_PERIOD_MS, LED_PIN};

// Re-export HAL components for advanced users
pub use hal::{
    gpio::{FselPolicy, GpioController, GpioFunction, GpioLayout, PinMask},
    mmio::Mmio,
    timer::{CpuNop, Delay, Nop, SpinCalibration, SpinDelay, SystemTimer},
    MmioBus, RegisterBus,
};
