//! Transmit mailbox arbitration

use crate::bus::BusOff;
use crate::message::{tx, Message};
use crate::reg::{Mailbox, MasterStatus, Register, Registers, TransmitStatus};

/// Hands `message` to the first empty transmit mailbox.
///
/// Mailboxes are scanned in index order, so under contention lower-numbered
/// mailboxes are preferred. The identifier word goes in last; once its
/// transmit request bit is set the mailbox belongs to the hardware.
pub(crate) fn transmit<R: Registers>(reg: &mut R, message: &Message) -> nb::Result<(), BusOff> {
    if MasterStatus(reg.read(Register::Msr)).slak() {
        return Err(nb::Error::Other(BusOff));
    }
    let status = TransmitStatus(reg.read(Register::Tsr));
    let mailbox = Mailbox::ALL
        .into_iter()
        .find(|mailbox| status.mailbox_empty(*mailbox))
        .ok_or(nb::Error::WouldBlock)?;
    let words = tx::encode(message);
    reg.modify(Register::Tdtr(mailbox), |value| {
        (value & !0xF) | u32::from(words.dlc)
    });
    reg.write(Register::Tdlr(mailbox), words.data_low);
    reg.write(Register::Tdhr(mailbox), words.data_high);
    reg.write(Register::Tir(mailbox), words.identifier);
    Ok(())
}
