//! Peripheral-side interrupt masking
//!
//! The bxCAN peripheral routes its receive interrupts through two FIFO
//! message-pending lines. The driver unmasks both while a receive handler is
//! installed and masks them again when the handler is dropped; everything
//! else in IER stays untouched so an application can manage error interrupts
//! on its own.

use crate::reg::{InterruptEnable, Register, Registers};

/// Unmasks the message-pending interrupt of both receive FIFOs.
pub(crate) fn enable_receive<R: Registers>(reg: &mut R) {
    reg.modify(Register::Ier, |value| {
        let mut ier = InterruptEnable(value);
        ier.set_fmpie0(true);
        ier.set_fmpie1(true);
        ier.0
    });
}

/// Masks the message-pending interrupt of both receive FIFOs.
pub(crate) fn disable_receive<R: Registers>(reg: &mut R) {
    reg.modify(Register::Ier, |value| {
        let mut ier = InterruptEnable(value);
        ier.set_fmpie0(false);
        ier.set_fmpie1(false);
        ier.0
    });
}
