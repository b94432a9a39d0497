//! Messages to be sent on the bus

use super::Message;
use crate::reg::MailboxIdentifier;
use embedded_can::Id;

/// Register words a frame occupies in a transmit mailbox
///
/// `identifier` already carries the transmit request bit, so writing it to
/// TIR hands the mailbox over to the hardware. It must therefore be written
/// last.
pub(crate) struct MailboxWords {
    /// TIR contents, TXRQ set
    pub identifier: u32,
    /// DLC to merge into the low bits of TDTR
    pub dlc: u8,
    /// TDLR contents, bytes 0..4 of the payload
    pub data_low: u32,
    /// TDHR contents, bytes 4..8 of the payload
    pub data_high: u32,
}

pub(crate) fn encode(message: &Message) -> MailboxWords {
    let mut identifier = MailboxIdentifier(0);
    match message.id() {
        Id::Standard(id) => {
            identifier.set_stid(id.as_raw());
        }
        Id::Extended(id) => {
            identifier.set_ide(true);
            identifier.set_exid(id.as_raw());
        }
    }
    identifier.set_rtr(message.is_remote());
    identifier.set_txrq(true);
    MailboxWords {
        identifier: identifier.0,
        dlc: message.dlc,
        data_low: u32::from_le_bytes([
            message.data[0],
            message.data[1],
            message.data[2],
            message.data[3],
        ]),
        data_high: u32::from_le_bytes([
            message.data[4],
            message.data[5],
            message.data[6],
            message.data[7],
        ]),
    }
}
