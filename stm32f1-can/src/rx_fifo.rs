//! Receive FIFO draining

use crate::message::{rx, Message};
use crate::reg::{Fifo, FifoStatus, Register, Registers};

/// Takes one pending frame out of the receive FIFOs, if any.
///
/// FIFO 0 is drained before FIFO 1. The occupied slot is released back to
/// the hardware even when the frame itself is dropped by the decoder, so a
/// stream of garbage frames cannot wedge the FIFO full.
pub(crate) fn take<R: Registers>(reg: &mut R) -> Option<Message> {
    while let Some(fifo) = Fifo::ALL.into_iter().find(|fifo| pending(reg, *fifo) > 0) {
        if let Some(message) = pop(reg, fifo) {
            return Some(message);
        }
    }
    None
}

fn pending<R: Registers>(reg: &R, fifo: Fifo) -> u8 {
    FifoStatus(reg.read(fifo.status())).fmp()
}

fn pop<R: Registers>(reg: &mut R, fifo: Fifo) -> Option<Message> {
    let rir = reg.read(Register::Rir(fifo));
    let rdtr = reg.read(Register::Rdtr(fifo));
    let rdlr = reg.read(Register::Rdlr(fifo));
    let rdhr = reg.read(Register::Rdhr(fifo));
    reg.modify(fifo.status(), |value| {
        let mut status = FifoStatus(value);
        status.set_rfom(true);
        status.0
    });
    rx::decode(rir, rdtr, rdlr, rdhr)
}
