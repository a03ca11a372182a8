//! Dialog RPCs. The body text rides the compressed-string codec.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::compressed::{read_compressed_str, write_compressed_str};
use crowbar_bitstream::{BitStream, ProtocolResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShowDialog {
    pub dialog_id: u16,
    pub style: u8,
    pub title: String,
    pub first_button: String,
    pub second_button: String,
    pub body: String,
}

impl Message for ShowDialog {
    const ID: u8 = 61;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            dialog_id: bs.read_u16()?,
            style: bs.read_u8()?,
            title: bs.read_str8()?,
            first_button: bs.read_str8()?,
            second_button: bs.read_str8()?,
            body: read_compressed_str(bs)?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.dialog_id);
        bs.write_u8(self.style);
        bs.write_str8(&self.title);
        bs.write_str8(&self.first_button);
        bs.write_str8(&self.second_button);
        write_compressed_str(bs, &self.body);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerDialogResponse {
    pub dialog_id: u16,
    pub response: u8,
    pub list_item: u16,
    pub text: String,
}

impl Message for OnPlayerDialogResponse {
    const ID: u8 = 62;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            dialog_id: bs.read_u16()?,
            response: bs.read_u8()?,
            list_item: bs.read_u16()?,
            text: bs.read_str8()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_dialog_roundtrip() {
        let msg = ShowDialog {
            dialog_id: 1,
            style: 1,
            title: "T".into(),
            first_button: "OK".into(),
            second_button: "".into(),
            body: "Hello".into(),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(ShowDialog::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_show_dialog_header_bytes() {
        let msg = ShowDialog {
            dialog_id: 1,
            style: 1,
            title: "T".into(),
            first_button: "OK".into(),
            second_button: "".into(),
            body: "Hello".into(),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        // id, style, then the three length-prefixed button strings.
        assert_eq!(
            &bs.as_bytes()[..9],
            &[0x01, 0x00, 0x01, 0x01, b'T', 0x02, b'O', b'K', 0x00]
        );
    }

    #[test]
    fn test_dialog_response_roundtrip() {
        let mut bs = BitStream::new();
        bs.write_u16(7);
        bs.write_u8(1);
        bs.write_u16(3);
        bs.write_str8("input text");
        let msg = OnPlayerDialogResponse::read(&mut bs).unwrap();
        assert_eq!(msg.dialog_id, 7);
        assert_eq!(msg.response, 1);
        assert_eq!(msg.list_item, 3);
        assert_eq!(msg.text, "input text");
    }
}
