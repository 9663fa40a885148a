//! Board configuration
//!
//! Everything the blinker needs to know about the hardware, fixed once at
//! startup and handed around by reference.

use core::fmt;

use crate::hal::gpio::{FselPolicy, GpioLayout};
use crate::hal::timer::SpinCalibration;
use crate::hal::{GPIO_BASE, PERIPHERAL_BASE, TIMER_BASE};

/// GPIO line the tutorial board wires its LED to.
pub const LED_PIN: u8 = 16;

/// Time spent in each of the ON and OFF states.
pub const HALF_PERIOD_MS: u32 = 200;

/// Rejected board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The BCM2837 only has GPIO 0..=53.
    InvalidPin(u8),
    /// A calibration of zero iterations per microsecond would never wait.
    ZeroCalibration,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPin(pin) => write!(f, "GPIO {pin} does not exist (valid: 0..=53)"),
            ConfigError::ZeroCalibration => f.write_str("spin calibration must be non-zero"),
        }
    }
}

/// Immutable description of the board and the blink pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    peripheral_base: usize,
    led: GpioLayout,
    fsel_policy: FselPolicy,
    calibration: SpinCalibration,
    half_period_ms: u32,
}

impl BoardConfig {
    /// Raspberry Pi 3 / Zero 2 W: LED on GPIO 16, whole-register FSEL
    /// write, 200 ms per state.
    pub const RPI3: Self = match GpioLayout::for_pin(GPIO_BASE, LED_PIN) {
        Ok(led) => Self {
            peripheral_base: PERIPHERAL_BASE,
            led,
            fsel_policy: FselPolicy::Overwrite,
            calibration: SpinCalibration::RPI3,
            half_period_ms: HALF_PERIOD_MS,
        },
        Err(_) => panic!("LED_PIN out of range"),
    };

    /// Same board, LED moved to `pin`.
    pub const fn with_pin(self, pin: u8) -> Result<Self, ConfigError> {
        match GpioLayout::for_pin(self.gpio_base(), pin) {
            Ok(led) => Ok(Self { led, ..self }),
            Err(e) => Err(e),
        }
    }

    /// Same board, peripherals mapped at `peripheral_base` (0x2000_0000 on
    /// BCM2835 parts). The LED layout is re-derived.
    pub const fn with_peripheral_base(self, peripheral_base: usize) -> Self {
        let gpio_base = peripheral_base + (GPIO_BASE - PERIPHERAL_BASE);
        match GpioLayout::for_pin(gpio_base, self.led.pin()) {
            Ok(led) => Self {
                peripheral_base,
                led,
                ..self
            },
            // `self.led` was validated when it was built.
            Err(_) => self,
        }
    }

    pub const fn with_policy(self, fsel_policy: FselPolicy) -> Self {
        Self { fsel_policy, ..self }
    }

    pub const fn with_calibration(self, calibration: SpinCalibration) -> Self {
        Self { calibration, ..self }
    }

    pub const fn with_half_period_ms(self, half_period_ms: u32) -> Self {
        Self {
            half_period_ms,
            ..self
        }
    }

    pub const fn peripheral_base(&self) -> usize {
        self.peripheral_base
    }

    pub const fn gpio_base(&self) -> usize {
        self.peripheral_base + (GPIO_BASE - PERIPHERAL_BASE)
    }

    pub const fn timer_base(&self) -> usize {
        self.peripheral_base + (TIMER_BASE - PERIPHERAL_BASE)
    }

    /// Register layout of the LED pin.
    pub const fn led(&self) -> &GpioLayout {
        &self.led
    }

    pub const fn fsel_policy(&self) -> FselPolicy {
        self.fsel_policy
    }

    pub const fn calibration(&self) -> &SpinCalibration {
        &self.calibration
    }

    pub const fn half_period_ms(&self) -> u32 {
        self.half_period_ms
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::RPI3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpi3_defaults() {
        let config = BoardConfig::RPI3;
        assert_eq!(config.gpio_base(), 0x3F20_0000);
        assert_eq!(config.led().pin(), 16);
        assert_eq!(config.led().fsel_addr(), 0x3F20_0004);
        assert_eq!(config.fsel_policy(), FselPolicy::Overwrite);
        assert_eq!(config.calibration().iterations_per_us(), 6);
        assert_eq!(config.half_period_ms(), 200);
    }

    #[test]
    fn with_pin_rederives_addresses() {
        let config = BoardConfig::RPI3.with_pin(26).unwrap();
        assert_eq!(config.led().fsel_addr(), 0x3F20_0008);
        assert_eq!(config.led().fsel_shift(), 18);
        assert_eq!(config.led().set_addr(), 0x3F20_001C);
    }

    #[test]
    fn with_peripheral_base_moves_every_register() {
        let config = BoardConfig::RPI3.with_peripheral_base(0x2000_0000);
        assert_eq!(config.gpio_base(), 0x2020_0000);
        assert_eq!(config.timer_base(), 0x2000_3000);
        assert_eq!(config.led().set_addr(), 0x2020_001C);
        assert_eq!(config.led().pin(), 16);
    }

    #[test]
    fn with_pin_rejects_missing_gpio() {
        assert_eq!(BoardConfig::RPI3.with_pin(60), Err(ConfigError::InvalidPin(60)));
    }

    #[test]
    fn builders_leave_other_fields_alone() {
        let config = BoardConfig::RPI3
            .with_policy(FselPolicy::ReadModifyWrite)
            .with_half_period_ms(50);
        assert_eq!(config.fsel_policy(), FselPolicy::ReadModifyWrite);
        assert_eq!(config.half_period_ms(), 50);
        assert_eq!(config.led(), BoardConfig::RPI3.led());
    }

    #[test]
    fn config_error_display() {
        extern crate std;
        use std::string::ToString;

        assert_eq!(
            ConfigError::InvalidPin(99).to_string(),
            "GPIO 99 does not exist (valid: 0..=53)"
        );
    }
}
