//! LED blink state machine
//!
//! Configures the LED pin as an output once, then alternates between ON and
//! OFF forever, holding each state for the configured half-period.

use crate::config::BoardConfig;
use crate::hal::gpio::{GpioController, GpioFunction};
use crate::hal::timer::{Delay, SpinDelay};
use crate::hal::RegisterBus;

/// Output level the LED is driven to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedState {
    On,
    Off,
}

impl LedState {
    /// The state that follows this one.
    pub const fn toggled(self) -> Self {
        match self {
            LedState::On => LedState::Off,
            LedState::Off => LedState::On,
        }
    }
}

/// Blinks the LED described by a [`BoardConfig`].
pub struct Blinker<'c, B, D> {
    config: &'c BoardConfig,
    gpio: GpioController<B>,
    delay: D,
    next: LedState,
    cycles: u64,
}

impl<'c, B: RegisterBus> Blinker<'c, B, SpinDelay> {
    /// Blinker timed by the calibrated busy-wait.
    pub fn with_spin_delay(config: &'c BoardConfig, bus: B) -> Self {
        Self::new(config, bus, SpinDelay::new(*config.calibration()))
    }
}

impl<'c, B: RegisterBus, D: Delay> Blinker<'c, B, D> {
    /// Create a blinker. Nothing touches the hardware until
    /// [`configure`](Self::configure) or [`run`](Self::run).
    pub fn new(config: &'c BoardConfig, bus: B, delay: D) -> Self {
        Self {
            config,
            gpio: GpioController::new(bus),
            delay,
            next: LedState::On,
            cycles: 0,
        }
    }

    /// Put the LED pin in output mode and restart the pattern at ON.
    ///
    /// Safe to repeat: the function-select register ends up with the same
    /// value every time.
    pub fn configure(&mut self) {
        let config = self.config;
        let led = config.led();
        self.gpio
            .set_function(led, GpioFunction::Output, config.fsel_policy());
        self.next = LedState::On;
        info!(
            "GPIO{} configured as output, {}ms half-period",
            led.pin(),
            config.half_period_ms()
        );
    }

    /// Enter the next state, hold it for one half-period, return it.
    pub fn step(&mut self) -> LedState {
        let config = self.config;
        let led = config.led();
        let state = self.next;
        match state {
            LedState::On => self.gpio.set_high(led),
            LedState::Off => {
                self.gpio.set_low(led);
                self.cycles = self.cycles.wrapping_add(1);
            }
        }
        trace!("GPIO{} {}", led.pin(), state == LedState::On);
        self.delay.delay_ms(config.half_period_ms());
        self.next = state.toggled();
        state
    }

    /// Configure, then blink forever.
    pub fn run(mut self) -> ! {
        self.configure();
        loop {
            self.step();
        }
    }

    /// State the next [`step`](Self::step) will enter.
    pub fn next_state(&self) -> LedState {
        self.next
    }

    /// Completed ON/OFF cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn config(&self) -> &BoardConfig {
        self.config
    }

    pub fn gpio(&self) -> &GpioController<B> {
        &self.gpio
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBoard;

    #[test]
    fn toggled_alternates() {
        assert_eq!(LedState::On.toggled(), LedState::Off);
        assert_eq!(LedState::Off.toggled(), LedState::On);
    }

    #[test]
    fn new_does_not_touch_registers() {
        let board = SimBoard::new();
        let config = BoardConfig::RPI3;
        let blinker = Blinker::new(&config, &board, board.spin_delay(*config.calibration()));
        assert!(board.writes().is_empty());
        assert_eq!(blinker.next_state(), LedState::On);
    }

    #[test]
    fn step_returns_the_state_entered() {
        let board = SimBoard::new();
        let config = BoardConfig::RPI3.with_half_period_ms(1);
        let mut blinker = Blinker::new(&config, &board, board.spin_delay(*config.calibration()));
        blinker.configure();

        assert_eq!(blinker.step(), LedState::On);
        assert_eq!(blinker.step(), LedState::Off);
        assert_eq!(blinker.step(), LedState::On);
        assert_eq!(blinker.cycles(), 1);
    }

    #[test]
    fn configure_restarts_at_on() {
        let board = SimBoard::new();
        let config = BoardConfig::RPI3.with_half_period_ms(1);
        let mut blinker = Blinker::new(&config, &board, board.spin_delay(*config.calibration()));
        blinker.configure();
        blinker.step();
        assert_eq!(blinker.next_state(), LedState::Off);

        blinker.configure();
        assert_eq!(blinker.next_state(), LedState::On);
    }

    #[test]
    fn spin_delay_blinker_uses_board_calibration() {
        let board = SimBoard::new();
        let config = BoardConfig::RPI3;
        let blinker = Blinker::with_spin_delay(&config, &board);
        assert_eq!(blinker.delay().calibration().iterations_per_us(), 6);
    }
}
