//! Messages received from the bus.

use super::Message;
use crate::reg::{FrameInfo, MailboxIdentifier};
use embedded_can::{ExtendedId, Id, StandardId};

/// Reassembles a frame from the words of a receive FIFO output mailbox.
///
/// Returns `None` when the reported DLC exceeds eight bytes. Classic CAN
/// never produces such a frame; a controller in that state is feeding us
/// garbage and the frame is dropped rather than truncated.
pub(crate) fn decode(rir: u32, rdtr: u32, rdlr: u32, rdhr: u32) -> Option<Message> {
    let info = FrameInfo(rdtr);
    let dlc = info.dlc();
    if dlc > 8 {
        return None;
    }
    let identifier = MailboxIdentifier(rir);
    let id = if identifier.ide() {
        Id::Extended(ExtendedId::new(identifier.exid())?)
    } else {
        Id::Standard(StandardId::new(identifier.stid())?)
    };
    let mut data = [0; 8];
    data[..4].copy_from_slice(&rdlr.to_le_bytes());
    data[4..].copy_from_slice(&rdhr.to_le_bytes());
    Some(Message {
        id,
        data,
        dlc,
        remote: identifier.rtr(),
    })
}
