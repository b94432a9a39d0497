//! Acceptance filter configuration
//!
//! Without at least one active filter bank the receive FIFOs never see a
//! frame, whatever arrives on the bus. The driver programs bank 0 as a
//! single 32-bit mask filter that matches everything and routes it to
//! FIFO 0.

use crate::reg::{FilterMaster, Register, Registers};

/// Bank used for the accept-everything filter
const ACCEPT_ALL_BANK: u8 = 0;

/// Programs filter bank 0 to accept every frame into FIFO 0.
///
/// Filter banks may only be written while the filter block is in its own
/// initialization mode (FMR.FINIT), which is independent of the controller's
/// initialization mode. Reception through the bank starts as soon as FINIT
/// is released.
pub(crate) fn accept_all<R: Registers>(reg: &mut R) {
    let bank = u32::from(ACCEPT_ALL_BANK);
    reg.modify(Register::Fmr, |value| {
        let mut fmr = FilterMaster(value);
        fmr.set_finit(true);
        fmr.0
    });
    // Deactivate the bank before touching its configuration
    reg.modify(Register::Fa1r, |value| value & !(1 << bank));
    // Single 32-bit filter in mask mode; a zero mask matches any identifier
    reg.modify(Register::Fs1r, |value| value | (1 << bank));
    reg.modify(Register::Fm1r, |value| value & !(1 << bank));
    reg.write(Register::Fr1(ACCEPT_ALL_BANK), 0);
    reg.write(Register::Fr2(ACCEPT_ALL_BANK), 0);
    // Route matches to FIFO 0
    reg.modify(Register::Ffa1r, |value| value & !(1 << bank));
    reg.modify(Register::Fa1r, |value| value | (1 << bank));
    reg.modify(Register::Fmr, |value| {
        let mut fmr = FilterMaster(value);
        fmr.set_finit(false);
        fmr.0
    });
}
