//! Console packet: in-game RCON command, the one unordered message.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerRconCommand {
    pub command: String,
}

impl Message for PlayerRconCommand {
    const ID: u8 = 201;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::Unordered;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            command: bs.read_str32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_str32(&self.command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rcon_command_roundtrip() {
        let msg = PlayerRconCommand {
            command: "login changeme".into(),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(PlayerRconCommand::read(&mut bs).unwrap(), msg);
    }
}
