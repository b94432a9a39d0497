//! Handling of messages/frames

pub(crate) mod rx;
pub(crate) mod tx;

use embedded_can::{Frame, Id};

/// A classic CAN frame
///
/// Carries up to eight data bytes together with a standard (11-bit) or
/// extended (29-bit) identifier. Remote frames transport no data; their DLC
/// encodes the length being requested from the responder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    id: Id,
    data: [u8; 8],
    dlc: u8,
    remote: bool,
}

impl Message {
    /// Identifier of the frame
    pub fn id(&self) -> Id {
        self.id
    }

    /// Payload bytes; empty for remote frames
    pub fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[..usize::from(self.dlc)]
        }
    }

    /// Data length code
    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// `true` for remote transmission requests
    pub fn is_remote(&self) -> bool {
        self.remote
    }
}

impl Frame for Message {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut padded = [0; 8];
        padded[..data.len()].copy_from_slice(data);
        Some(Self {
            id: id.into(),
            data: padded,
            dlc: data.len() as u8,
            remote: false,
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > 8 {
            return None;
        }
        Some(Self {
            id: id.into(),
            data: [0; 8],
            dlc: dlc as u8,
            remote: true,
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        usize::from(self.dlc)
    }

    fn data(&self) -> &[u8] {
        Message::data(self)
    }
}
