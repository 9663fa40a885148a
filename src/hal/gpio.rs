//! GPIO controller for BCM2837
//!
//! Pin addressing is precomputed into a [`GpioLayout`] once, at
//! configuration time; the controller only ever touches the addresses a
//! layout names.

use super::RegisterBus;
use crate::config::ConfigError;
use bitflags::bitflags;

/// GPIO function select register 0 offset; FSELn lives at `GPFSEL0 + 4 * n`
const GPFSEL0: usize = 0x00;

/// GPIO pin output set register 0 offset
const GPSET0: usize = 0x1C;

/// GPIO pin output clear register 0 offset
const GPCLR0: usize = 0x28;

/// Number of GPIO lines on the BCM2837
pub const PIN_COUNT: u8 = 54;

/// GPIO pin function modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioFunction {
    Input = 0b000,
    Output = 0b001,
    Alt0 = 0b100,
    Alt1 = 0b101,
    Alt2 = 0b110,
    Alt3 = 0b111,
    Alt4 = 0b011,
    Alt5 = 0b010,
}

impl GpioFunction {
    /// The 3-bit field encoding.
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// How a function-select write treats the other nine fields of the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FselPolicy {
    /// Write only the target field; every other pin in the register drops
    /// to `Input`.
    #[default]
    Overwrite,
    /// Read the register, replace the target field, write it back.
    ReadModifyWrite,
}

bitflags! {
    /// One bank (32 lines) of SET/CLR register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PinMask: u32 {
        /// GPIO 16, the LED line on the tutorial board
        const GPIO16 = 1 << 16;

        const _ = !0;
    }
}

impl PinMask {
    /// Bit for `pin` within its bank.
    pub const fn from_pin(pin: u8) -> Self {
        Self::from_bits_retain(1 << (pin % 32))
    }
}

/// Register addresses and bit positions for one GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioLayout {
    pin: u8,
    fsel: usize,
    fsel_shift: u32,
    set: usize,
    clr: usize,
    mask: PinMask,
}

impl GpioLayout {
    /// Derive the layout of `pin` for a GPIO block at `gpio_base`.
    pub const fn for_pin(gpio_base: usize, pin: u8) -> Result<Self, ConfigError> {
        if pin >= PIN_COUNT {
            return Err(ConfigError::InvalidPin(pin));
        }
        let bank = (pin / 32) as usize * 4;
        Ok(Self {
            pin,
            fsel: gpio_base + GPFSEL0 + (pin / 10) as usize * 4,
            fsel_shift: (pin % 10) as u32 * 3,
            set: gpio_base + GPSET0 + bank,
            clr: gpio_base + GPCLR0 + bank,
            mask: PinMask::from_pin(pin),
        })
    }

    pub const fn pin(&self) -> u8 {
        self.pin
    }

    /// Function-select register holding this pin's field.
    pub const fn fsel_addr(&self) -> usize {
        self.fsel
    }

    /// Bit offset of this pin's 3-bit field.
    pub const fn fsel_shift(&self) -> u32 {
        self.fsel_shift
    }

    pub const fn set_addr(&self) -> usize {
        self.set
    }

    pub const fn clr_addr(&self) -> usize {
        self.clr
    }

    pub const fn mask(&self) -> PinMask {
        self.mask
    }
}

/// GPIO controller for BCM2837
pub struct GpioController<B> {
    bus: B,
}

impl<B: RegisterBus> GpioController<B> {
    /// Create a new GPIO controller
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Set the pin's function.
    ///
    /// With [`FselPolicy::Overwrite`] the register is never read.
    pub fn set_function(&self, layout: &GpioLayout, function: GpioFunction, policy: FselPolicy) {
        let field = function.bits() << layout.fsel_shift;
        let value = match policy {
            FselPolicy::Overwrite => field,
            FselPolicy::ReadModifyWrite => {
                let mask = !(0b111 << layout.fsel_shift);
                (self.bus.read32(layout.fsel) & mask) | field
            }
        };
        self.bus.write32(layout.fsel, value);
        trace!("GPIO{} FSEL {:#x} <- {:#x}", layout.pin, layout.fsel, value);
    }

    /// Drive the pin high
    pub fn set_high(&self, layout: &GpioLayout) {
        self.bus.write32(layout.set, layout.mask.bits());
    }

    /// Drive the pin low
    pub fn set_low(&self, layout: &GpioLayout) {
        self.bus.write32(layout.clr, layout.mask.bits());
    }

    /// The underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }
}
