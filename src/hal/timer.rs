//! Delays for BCM2837
//!
//! Two ways to wait: [`SpinDelay`] burns a calibrated number of no-op
//! iterations and needs no peripheral at all, [`SystemTimer`] polls the
//! free-running 1 MHz system counter.

use super::RegisterBus;
use crate::config::ConfigError;

/// System timer counter lower 32 bits
const TIMER_CLO: usize = 0x04;
/// System timer counter upper 32 bits
const TIMER_CHI: usize = 0x08;

/// Spin-loop iterations per requested microsecond.
///
/// Measured on a Raspberry Pi 3 running at [`ASSUMED_CPU_HZ`] straight out of
/// the boot firmware, caches off. Any other clock needs a new measurement.
pub const ITERATIONS_PER_US: u32 = 6;

/// ARM core clock [`ITERATIONS_PER_US`] was measured at.
pub const ASSUMED_CPU_HZ: u32 = 600_000_000;

/// Blocking delay source.
pub trait Delay {
    /// Block for roughly `us` microseconds.
    fn delay_us(&mut self, us: u64);

    /// Block for roughly `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(u64::from(ms) * 1000);
    }
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn delay_us(&mut self, us: u64) {
        (**self).delay_us(us)
    }
}

/// A single no-op instruction.
pub trait Nop {
    fn nop(&mut self);
}

/// Executes a real `nop` on ARM targets; elsewhere a spin-loop hint.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuNop;

impl Nop for CpuNop {
    #[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
    #[inline(always)]
    fn nop(&mut self) {
        // SAFETY: `nop` has no architectural effect.
        unsafe { core::arch::asm!("nop", options(nomem, nostack, preserves_flags)) }
    }

    #[cfg(not(any(target_arch = "aarch64", target_arch = "arm")))]
    #[inline(always)]
    fn nop(&mut self) {
        core::hint::spin_loop();
    }
}

/// Conversion from microseconds to spin iterations for one clock speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpinCalibration {
    iterations_per_us: u32,
    assumed_cpu_hz: u32,
}

impl SpinCalibration {
    /// Calibration for the Raspberry Pi 3 boot clock.
    pub const RPI3: Self = Self {
        iterations_per_us: ITERATIONS_PER_US,
        assumed_cpu_hz: ASSUMED_CPU_HZ,
    };

    pub const fn new(iterations_per_us: u32, assumed_cpu_hz: u32) -> Result<Self, ConfigError> {
        if iterations_per_us == 0 {
            return Err(ConfigError::ZeroCalibration);
        }
        Ok(Self {
            iterations_per_us,
            assumed_cpu_hz,
        })
    }

    pub const fn iterations_per_us(&self) -> u32 {
        self.iterations_per_us
    }

    pub const fn assumed_cpu_hz(&self) -> u32 {
        self.assumed_cpu_hz
    }

    /// Iterations needed to wait `us` microseconds. Saturates instead of
    /// wrapping.
    pub const fn iterations_for_us(&self, us: u64) -> u64 {
        us.saturating_mul(self.iterations_per_us as u64)
    }
}

impl Default for SpinCalibration {
    fn default() -> Self {
        Self::RPI3
    }
}

/// Calibrated busy-wait.
pub struct SpinDelay<N = CpuNop> {
    calibration: SpinCalibration,
    nop: N,
}

impl SpinDelay<CpuNop> {
    pub const fn new(calibration: SpinCalibration) -> Self {
        Self {
            calibration,
            nop: CpuNop,
        }
    }
}

impl<N: Nop> SpinDelay<N> {
    /// Spin delay that executes `nop` for each iteration.
    pub const fn with_nop(calibration: SpinCalibration, nop: N) -> Self {
        Self { calibration, nop }
    }

    pub fn calibration(&self) -> &SpinCalibration {
        &self.calibration
    }
}

impl<N: Nop> Delay for SpinDelay<N> {
    #[inline(never)]
    fn delay_us(&mut self, us: u64) {
        for _ in 0..self.calibration.iterations_for_us(us) {
            self.nop.nop();
        }
    }
}

/// System timer for BCM2837
pub struct SystemTimer<B> {
    bus: B,
    base: usize,
}

impl<B: RegisterBus> SystemTimer<B> {
    /// Create a system timer for the register block at `base`
    pub const fn new(bus: B, base: usize) -> Self {
        Self { bus, base }
    }

    /// Get the current timer value (microseconds since boot)
    pub fn get_time_us(&self) -> u64 {
        let clo = self.base + TIMER_CLO;
        let chi = self.base + TIMER_CHI;

        // Read high, then low, then high again to handle wraparound
        let high1 = self.bus.read32(chi);
        let low = self.bus.read32(clo);
        let high2 = self.bus.read32(chi);

        // If high changed, re-read low
        let (high, low) = if high1 == high2 {
            (high1, low)
        } else {
            (high2, self.bus.read32(clo))
        };

        (u64::from(high) << 32) | u64::from(low)
    }

    /// Check if a timeout has occurred
    pub fn is_timeout(&self, start_time: u64, timeout_us: u64) -> bool {
        self.get_time_us().wrapping_sub(start_time) >= timeout_us
    }
}

impl<B: RegisterBus> Delay for SystemTimer<B> {
    fn delay_us(&mut self, us: u64) {
        let start = self.get_time_us();
        while !self.is_timeout(start, us) {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Counter that advances `step` microseconds on every CLO read.
    struct TickingCounter {
        base: usize,
        now: Cell<u64>,
        step: u64,
    }

    impl RegisterBus for TickingCounter {
        fn read32(&self, addr: usize) -> u32 {
            let now = self.now.get();
            if addr == self.base + TIMER_CLO {
                self.now.set(now + self.step);
                now as u32
            } else if addr == self.base + TIMER_CHI {
                (now >> 32) as u32
            } else {
                0
            }
        }

        fn write32(&self, _addr: usize, _value: u32) {}
    }

    struct CountingNop(u64);

    impl Nop for CountingNop {
        fn nop(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn rpi3_calibration_is_six_per_microsecond() {
        assert_eq!(SpinCalibration::RPI3.iterations_per_us(), 6);
        assert_eq!(SpinCalibration::RPI3.iterations_for_us(200_000), 1_200_000);
    }

    #[test]
    fn zero_calibration_is_rejected() {
        assert_eq!(SpinCalibration::new(0, ASSUMED_CPU_HZ), Err(ConfigError::ZeroCalibration));
    }

    #[test]
    fn iteration_count_saturates() {
        assert_eq!(SpinCalibration::RPI3.iterations_for_us(u64::MAX), u64::MAX);
    }

    #[test]
    fn delay_ms_is_thousand_times_delay_us() {
        let mut delay = SpinDelay::with_nop(SpinCalibration::RPI3, CountingNop(0));
        delay.delay_ms(3);
        assert_eq!(delay.nop.0, 18_000);
        delay.delay_us(5);
        assert_eq!(delay.nop.0, 18_030);
    }

    #[test]
    fn zero_delay_spins_zero_times() {
        let mut delay = SpinDelay::with_nop(SpinCalibration::RPI3, CountingNop(0));
        delay.delay_ms(0);
        assert_eq!(delay.nop.0, 0);
    }

    #[test]
    fn system_timer_joins_high_and_low_words() {
        let bus = TickingCounter {
            base: 0x1000,
            now: Cell::new((3 << 32) | 42),
            step: 1,
        };
        let timer = SystemTimer::new(&bus, 0x1000);
        assert_eq!(timer.get_time_us(), (3 << 32) | 42);
    }

    #[test]
    fn system_timer_rereads_low_word_on_rollover() {
        let bus = TickingCounter {
            base: 0x1000,
            now: Cell::new(0xFFFF_FFFF),
            step: 1,
        };
        let timer = SystemTimer::new(&bus, 0x1000);
        assert_eq!(timer.get_time_us(), 1 << 32);
    }

    #[test]
    fn system_timer_delay_waits_at_least_requested_time() {
        let bus = TickingCounter {
            base: 0x1000,
            now: Cell::new(0),
            step: 10,
        };
        let mut timer = SystemTimer::new(&bus, 0x1000);
        timer.delay_ms(2);
        assert!(bus.now.get() >= 2_000);
        assert!(bus.now.get() < 2_100);
    }
}
