//! Reset entry, panic handler and (with `rtt`) the critical section.

use core::arch::global_asm;
use core::panic::PanicInfo;

// The boot firmware starts all four cores at `_start`. Cores 1-3 park in
// `wfe`; core 0 takes the stack below the image, clears `.bss` and enters
// `kmain`, which never returns.
global_asm!(
    ".section .text.boot, \"ax\"",
    ".global _start",
    "_start:",
    "    mrs     x1, mpidr_el1",
    "    and     x1, x1, #3",
    "    cbz     x1, 2f",
    "1:  wfe",
    "    b       1b",
    "2:  ldr     x1, =_start",
    "    mov     sp, x1",
    "    ldr     x1, =__bss_start",
    "    ldr     x2, =__bss_end",
    "3:  cmp     x1, x2",
    "    b.hs    4f",
    "    str     xzr, [x1], #8",
    "    b       3b",
    "4:  bl      kmain",
    "    b       1b",
);

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    #[cfg(feature = "defmt")]
    defmt::error!("panic: {}", defmt::Display2Format(info));
    #[cfg(not(feature = "defmt"))]
    let _ = info;

    loop {
        // SAFETY: waiting for an event has no side effects.
        unsafe { core::arch::asm!("wfe", options(nomem, nostack)) }
    }
}

/// Interrupts are never unmasked, but defmt-rtt still asks for a critical
/// section; masking DAIF makes it real should that ever change.
#[cfg(feature = "rtt")]
mod critical {
    use critical_section::RawRestoreState;

    struct SingleCore;
    critical_section::set_impl!(SingleCore);

    unsafe impl critical_section::Impl for SingleCore {
        unsafe fn acquire() -> RawRestoreState {
            let daif: u64;
            core::arch::asm!("mrs {}, daif", "msr daifset, #0xf", out(reg) daif, options(nostack));
            daif
        }

        unsafe fn release(daif: RawRestoreState) {
            core::arch::asm!("msr daif, {}", in(reg) daif, options(nostack));
        }
    }
}
