//! Hardware Abstraction Layer for BCM2837/BCM2710 (Raspberry Pi 3, Zero 2 W)
//!
//! Register traffic goes through [`RegisterBus`]. On hardware that is
//! [`MmioBus`], which performs volatile accesses through [`mmio::Mmio`];
//! under test it is the emulated register file in [`crate::sim`].

pub mod gpio;
pub mod mmio;
pub mod timer;

use mmio::Mmio;

/// Base address for BCM2837 peripherals (ARM physical view)
pub const PERIPHERAL_BASE: usize = 0x3F00_0000;

/// GPIO base address
pub const GPIO_BASE: usize = PERIPHERAL_BASE + 0x20_0000;

/// System Timer base address
pub const TIMER_BASE: usize = PERIPHERAL_BASE + 0x00_3000;

/// 32-bit register access at absolute addresses.
pub trait RegisterBus {
    /// Read the register at `addr`.
    fn read32(&self, addr: usize) -> u32;

    /// Write `value` to the register at `addr`.
    fn write32(&self, addr: usize, value: u32);
}

impl<B: RegisterBus + ?Sized> RegisterBus for &B {
    fn read32(&self, addr: usize) -> u32 {
        (**self).read32(addr)
    }

    fn write32(&self, addr: usize, value: u32) {
        (**self).write32(addr, value)
    }
}

/// The real bus: every access is a volatile load or store.
pub struct MmioBus {
    _private: (),
}

impl MmioBus {
    /// Claim the physical register space.
    ///
    /// # Safety
    /// Only sound when running bare-metal on a BCM2837-class SoC with the
    /// peripheral window identity-mapped, and when no other code drives the
    /// same registers concurrently.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for MmioBus {
    fn read32(&self, addr: usize) -> u32 {
        // SAFETY: `MmioBus::new` guarantees the register window is valid.
        unsafe { Mmio::<u32>::new(addr) }.read()
    }

    fn write32(&self, addr: usize, value: u32) {
        // SAFETY: `MmioBus::new` guarantees the register window is valid.
        unsafe { Mmio::<u32>::new(addr) }.write(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpio_block_sits_at_0x3f200000() {
        assert_eq!(GPIO_BASE, 0x3F20_0000);
        assert_eq!(TIMER_BASE, 0x3F00_3000);
    }
}
