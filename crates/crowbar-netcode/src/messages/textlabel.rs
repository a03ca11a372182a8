//! 3D text label RPCs, sharing the global/per-player ID-offset scheme
//! with textdraws.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::compressed::{read_compressed_str, write_compressed_str};
use crowbar_bitstream::{BitStream, ProtocolResult};
use crowbar_types::{Colour, Vec3, TEXT_LABEL_POOL_SIZE};

fn wire_label_id(per_player: bool, id: u16) -> u16 {
    if per_player {
        TEXT_LABEL_POOL_SIZE as u16 + id
    } else {
        id
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerShowTextLabel {
    pub per_player: bool,
    pub label_id: u16,
    pub colour: Colour,
    pub position: Vec3,
    pub draw_distance: f32,
    pub test_los: bool,
    pub attached_player: u16,
    pub attached_vehicle: u16,
    pub text: String,
}

impl Message for PlayerShowTextLabel {
    const ID: u8 = 36;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let wire_id = bs.read_u16()?;
        let per_player = wire_id >= TEXT_LABEL_POOL_SIZE as u16;
        Ok(Self {
            per_player,
            label_id: if per_player {
                wire_id - TEXT_LABEL_POOL_SIZE as u16
            } else {
                wire_id
            },
            colour: Colour::from_rgba(bs.read_u32()?),
            position: bs.read_vec3()?,
            draw_distance: bs.read_f32()?,
            test_los: bs.read_u8()? != 0,
            attached_player: bs.read_u16()?,
            attached_vehicle: bs.read_u16()?,
            text: read_compressed_str(bs)?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(wire_label_id(self.per_player, self.label_id));
        bs.write_u32(self.colour.rgba());
        bs.write_vec3(self.position);
        bs.write_f32(self.draw_distance);
        bs.write_u8(self.test_los as u8);
        bs.write_u16(self.attached_player);
        bs.write_u16(self.attached_vehicle);
        write_compressed_str(bs, &self.text);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerHideTextLabel {
    pub per_player: bool,
    pub label_id: u16,
}

impl Message for PlayerHideTextLabel {
    const ID: u8 = 58;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let wire_id = bs.read_u16()?;
        let per_player = wire_id >= TEXT_LABEL_POOL_SIZE as u16;
        Ok(Self {
            per_player,
            label_id: if per_player {
                wire_id - TEXT_LABEL_POOL_SIZE as u16
            } else {
                wire_id
            },
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(wire_label_id(self.per_player, self.label_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip() {
        let msg = PlayerShowTextLabel {
            per_player: false,
            label_id: 30,
            colour: Colour::from_rgba(0x00FF00FF),
            position: Vec3::new(10.0, 20.0, 5.0),
            draw_distance: 50.0,
            test_los: true,
            attached_player: 0xFFFF,
            attached_vehicle: 0xFFFF,
            text: "Bank of Los Santos".into(),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(PlayerShowTextLabel::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_per_player_label_offset() {
        let msg = PlayerHideTextLabel {
            per_player: true,
            label_id: 2,
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        let wire = u16::from_le_bytes([bs.as_bytes()[0], bs.as_bytes()[1]]);
        assert_eq!(wire, TEXT_LABEL_POOL_SIZE as u16 + 2);
        assert_eq!(PlayerHideTextLabel::read(&mut bs).unwrap(), msg);
    }
}
