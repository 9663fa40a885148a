//! Emulated register file for running the blinker off-target.
//!
//! [`SimBoard`] stands in for the peripheral window: it stores register
//! values, logs every write together with the spin-clock reading at the
//! time, and provides a [`Nop`] that advances that clock. Wiring a
//! [`Blinker`](crate::Blinker) to it gives a deterministic trace of what the
//! firmware would do on hardware.

use core::cell::{Cell, RefCell};

use heapless::{FnvIndexMap, Vec};

use crate::hal::timer::{Nop, SpinCalibration, SpinDelay};
use crate::hal::RegisterBus;

/// Distinct register addresses the board can hold.
pub const REGISTER_CAPACITY: usize = 16;

/// Writes kept in the log before further ones are counted as dropped.
pub const LOG_CAPACITY: usize = 64;

/// One logged register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    pub addr: usize,
    pub value: u32,
    /// Spin iterations executed before the write.
    pub at_iteration: u64,
}

/// Register file plus write log and spin clock.
pub struct SimBoard {
    registers: RefCell<FnvIndexMap<usize, u32, REGISTER_CAPACITY>>,
    writes: RefCell<Vec<WriteRecord, LOG_CAPACITY>>,
    dropped: Cell<usize>,
    reads: Cell<usize>,
    clock: Cell<u64>,
    spin_budget: Option<u64>,
}

impl SimBoard {
    /// All registers read as zero, clock at zero.
    pub fn new() -> Self {
        Self {
            registers: RefCell::new(FnvIndexMap::new()),
            writes: RefCell::new(Vec::new()),
            dropped: Cell::new(0),
            reads: Cell::new(0),
            clock: Cell::new(0),
            spin_budget: None,
        }
    }

    /// A board whose spin clock panics once it passes `iterations`.
    ///
    /// This is the only way to get control back from code that loops
    /// forever, such as [`Blinker::run`](crate::Blinker::run).
    pub fn with_spin_budget(iterations: u64) -> Self {
        Self {
            spin_budget: Some(iterations),
            ..Self::new()
        }
    }

    /// Set a register's value without logging a write.
    pub fn preload(&self, addr: usize, value: u32) {
        self.store(addr, value);
    }

    /// Current value of the register at `addr`.
    pub fn value(&self, addr: usize) -> u32 {
        self.registers.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Logged writes, oldest first.
    pub fn writes(&self) -> Vec<WriteRecord, LOG_CAPACITY> {
        self.writes.borrow().clone()
    }

    /// Logged writes to `addr` only.
    pub fn writes_to(&self, addr: usize) -> Vec<WriteRecord, LOG_CAPACITY> {
        self.writes.borrow().iter().filter(|w| w.addr == addr).copied().collect()
    }

    /// Writes that did not fit in the log, or whose register did not fit in
    /// the register file.
    pub fn dropped(&self) -> usize {
        self.dropped.get()
    }

    /// Number of register reads so far.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Spin iterations executed so far.
    pub fn iterations(&self) -> u64 {
        self.clock.get()
    }

    /// Spin clock converted to microseconds under `calibration`.
    pub fn elapsed_us(&self, calibration: &SpinCalibration) -> u64 {
        self.clock.get() / u64::from(calibration.iterations_per_us())
    }

    /// Forget all writes and reset the clock; register values are kept, as
    /// on a warm reset.
    pub fn clear_log(&self) {
        self.writes.borrow_mut().clear();
        self.dropped.set(0);
        self.reads.set(0);
        self.clock.set(0);
    }

    /// A spin delay whose iterations tick this board's clock.
    pub fn spin_delay(&self, calibration: SpinCalibration) -> SpinDelay<SimNop<'_>> {
        SpinDelay::with_nop(calibration, SimNop { board: self })
    }

    fn store(&self, addr: usize, value: u32) {
        if self.registers.borrow_mut().insert(addr, value).is_err() {
            self.dropped.set(self.dropped.get() + 1);
        }
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for SimBoard {
    fn read32(&self, addr: usize) -> u32 {
        self.reads.set(self.reads.get() + 1);
        self.value(addr)
    }

    fn write32(&self, addr: usize, value: u32) {
        self.store(addr, value);
        let record = WriteRecord {
            addr,
            value,
            at_iteration: self.clock.get(),
        };
        if self.writes.borrow_mut().push(record).is_err() {
            self.dropped.set(self.dropped.get() + 1);
        }
    }
}

/// No-op that advances a [`SimBoard`]'s spin clock by one.
pub struct SimNop<'a> {
    board: &'a SimBoard,
}

impl Nop for SimNop<'_> {
    fn nop(&mut self) {
        let now = self.board.clock.get() + 1;
        if let Some(budget) = self.board.spin_budget {
            if now > budget {
                panic!("spin budget of {budget} iterations exhausted");
            }
        }
        self.board.clock.set(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::timer::Delay;

    #[test]
    fn unwritten_registers_read_zero() {
        let board = SimBoard::new();
        assert_eq!(board.read32(0x3F20_0004), 0);
        assert_eq!(board.reads(), 1);
    }

    #[test]
    fn writes_are_stamped_with_the_spin_clock() {
        let board = SimBoard::new();
        board.write32(0x10, 1);
        board.spin_delay(SpinCalibration::RPI3).delay_us(10);
        board.write32(0x10, 2);

        let writes = board.writes();
        assert_eq!(writes[0].at_iteration, 0);
        assert_eq!(writes[1].at_iteration, 60);
        assert_eq!(board.value(0x10), 2);
        assert_eq!(board.elapsed_us(&SpinCalibration::RPI3), 10);
    }

    #[test]
    fn preload_is_not_logged() {
        let board = SimBoard::new();
        board.preload(0x20, 7);
        assert!(board.writes().is_empty());
        assert_eq!(board.value(0x20), 7);
    }

    #[test]
    fn overflowing_log_counts_drops() {
        let board = SimBoard::new();
        for i in 0..LOG_CAPACITY + 3 {
            board.write32(0x10, i as u32);
        }
        assert_eq!(board.writes().len(), LOG_CAPACITY);
        assert_eq!(board.dropped(), 3);
    }

    #[test]
    fn clear_log_keeps_register_values() {
        let board = SimBoard::new();
        board.write32(0x10, 5);
        board.clear_log();
        assert!(board.writes().is_empty());
        assert_eq!(board.value(0x10), 5);
        assert_eq!(board.iterations(), 0);
    }

    #[test]
    #[should_panic(expected = "spin budget")]
    fn spin_budget_stops_the_clock() {
        let board = SimBoard::with_spin_budget(5);
        board.spin_delay(SpinCalibration::RPI3).delay_us(1);
    }
}
