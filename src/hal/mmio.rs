//! Memory-mapped I/O abstraction for hardware register access

use core::ptr::{read_volatile, write_volatile};

/// Volatile register at a fixed address.
///
/// Every access goes through `read_volatile`/`write_volatile`, so the
/// compiler never caches, merges, reorders or drops it relative to other
/// volatile accesses.
pub struct Mmio<T> {
    addr: *mut T,
}

impl<T> Mmio<T> {
    /// Create a register handle for `addr`.
    ///
    /// # Safety
    /// `addr` must be a valid, suitably aligned register (or memory) location
    /// for `T` for as long as the handle is used.
    pub const unsafe fn new(addr: usize) -> Self {
        Self {
            addr: addr as *mut T,
        }
    }

    /// Address this handle points at.
    pub fn addr(&self) -> usize {
        self.addr as usize
    }

    /// Read from the register
    pub fn read(&self) -> T
    where
        T: Copy,
    {
        // SAFETY: validity of `addr` is the contract of `Mmio::new`.
        unsafe { read_volatile(self.addr) }
    }

    /// Write to the register
    pub fn write(&self, value: T) {
        // SAFETY: validity of `addr` is the contract of `Mmio::new`.
        unsafe { write_volatile(self.addr, value) }
    }

    /// Read, transform with `f`, write back.
    pub fn modify<F>(&self, f: F)
    where
        T: Copy,
        F: FnOnce(T) -> T,
    {
        let value = self.read();
        self.write(f(value));
    }
}

// SAFETY: a register handle is just an address; the hardware serialises access.
unsafe impl<T> Send for Mmio<T> {}
unsafe impl<T> Sync for Mmio<T> {}
