//! Textdraw RPCs. Per-player textdraws share the wire ID space with the
//! global pool: IDs at or above the global pool size are per-player, with
//! the pool size subtracted to recover the local index.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolError, ProtocolResult};
use crowbar_types::{Colour, Vec2, Vec3, GLOBAL_TEXTDRAW_POOL_SIZE, INVALID_TEXTDRAW_ID};

fn wire_textdraw_id(per_player: bool, id: u16) -> u16 {
    if per_player {
        GLOBAL_TEXTDRAW_POOL_SIZE as u16 + id
    } else {
        id
    }
}

/// Full textdraw description; `flags` packs box/alignment/proportional.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerShowTextDraw {
    pub per_player: bool,
    pub textdraw_id: u16,
    pub use_box: bool,
    pub alignment: u8,
    pub proportional: bool,
    pub letter_size: Vec2,
    pub letter_colour: Colour,
    pub text_size: Vec2,
    pub box_colour: Colour,
    pub shadow: u8,
    pub outline: u8,
    pub back_colour: Colour,
    pub style: u8,
    pub selectable: bool,
    pub position: Vec2,
    pub model: u16,
    pub rotation: Vec3,
    pub zoom: f32,
    pub colour1: i16,
    pub colour2: i16,
    pub text: String,
}

impl Message for PlayerShowTextDraw {
    const ID: u8 = 134;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let wire_id = bs.read_u16()?;
        let per_player = wire_id >= GLOBAL_TEXTDRAW_POOL_SIZE as u16;
        let flags = bs.read_u8()?;
        Ok(Self {
            per_player,
            textdraw_id: if per_player {
                wire_id - GLOBAL_TEXTDRAW_POOL_SIZE as u16
            } else {
                wire_id
            },
            use_box: flags & 0x01 != 0,
            alignment: (flags >> 1) & 0x07,
            proportional: flags & 0x10 != 0,
            letter_size: bs.read_vec2()?,
            letter_colour: Colour::from_abgr(bs.read_u32()?),
            text_size: bs.read_vec2()?,
            box_colour: Colour::from_abgr(bs.read_u32()?),
            shadow: bs.read_u8()?,
            outline: bs.read_u8()?,
            back_colour: Colour::from_abgr(bs.read_u32()?),
            style: bs.read_u8()?,
            selectable: bs.read_u8()? != 0,
            position: bs.read_vec2()?,
            model: bs.read_u16()?,
            rotation: bs.read_vec3()?,
            zoom: bs.read_f32()?,
            colour1: bs.read_i16()?,
            colour2: bs.read_i16()?,
            text: bs.read_str16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        let flags = self.use_box as u8 | (self.alignment << 1) | ((self.proportional as u8) << 4);
        bs.write_u16(wire_textdraw_id(self.per_player, self.textdraw_id));
        bs.write_u8(flags);
        bs.write_vec2(self.letter_size);
        bs.write_u32(self.letter_colour.abgr());
        bs.write_vec2(self.text_size);
        bs.write_u32(self.box_colour.abgr());
        bs.write_u8(self.shadow);
        bs.write_u8(self.outline);
        bs.write_u32(self.back_colour.abgr());
        bs.write_u8(self.style);
        bs.write_u8(self.selectable as u8);
        bs.write_vec2(self.position);
        bs.write_u16(self.model);
        bs.write_vec3(self.rotation);
        bs.write_f32(self.zoom);
        bs.write_i16(self.colour1);
        bs.write_i16(self.colour2);
        bs.write_str16(&self.text);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerHideTextDraw {
    pub per_player: bool,
    pub textdraw_id: u16,
}

impl Message for PlayerHideTextDraw {
    const ID: u8 = 135;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let wire_id = bs.read_u16()?;
        let per_player = wire_id >= GLOBAL_TEXTDRAW_POOL_SIZE as u16;
        Ok(Self {
            per_player,
            textdraw_id: if per_player {
                wire_id - GLOBAL_TEXTDRAW_POOL_SIZE as u16
            } else {
                wire_id
            },
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(wire_textdraw_id(self.per_player, self.textdraw_id));
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerTextDrawSetString {
    pub per_player: bool,
    pub textdraw_id: u16,
    pub text: String,
}

impl Message for PlayerTextDrawSetString {
    const ID: u8 = 105;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let wire_id = bs.read_u16()?;
        let per_player = wire_id >= GLOBAL_TEXTDRAW_POOL_SIZE as u16;
        Ok(Self {
            per_player,
            textdraw_id: if per_player {
                wire_id - GLOBAL_TEXTDRAW_POOL_SIZE as u16
            } else {
                wire_id
            },
            text: bs.read_str16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(wire_textdraw_id(self.per_player, self.textdraw_id));
        bs.write_str16(&self.text);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerBeginTextDrawSelect {
    pub enable: bool,
    pub hover_colour: Colour,
}

impl Message for PlayerBeginTextDrawSelect {
    const ID: u8 = 83;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_bit(self.enable);
        bs.write_u32(self.hover_colour.rgba());
    }
}

/// Click report; the invalid sentinel means selection was cancelled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerSelectTextDraw {
    pub per_player: bool,
    pub cancelled: bool,
    pub textdraw_id: u16,
}

impl Message for OnPlayerSelectTextDraw {
    const ID: u8 = 83;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let wire_id = bs.read_u16()?;
        if wire_id == INVALID_TEXTDRAW_ID {
            return Ok(Self {
                per_player: false,
                cancelled: true,
                textdraw_id: wire_id,
            });
        }
        let per_player = wire_id >= GLOBAL_TEXTDRAW_POOL_SIZE as u16;
        Ok(Self {
            per_player,
            cancelled: false,
            textdraw_id: if per_player {
                wire_id - GLOBAL_TEXTDRAW_POOL_SIZE as u16
            } else {
                wire_id
            },
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_roundtrip_global() {
        let msg = PlayerShowTextDraw {
            textdraw_id: 12,
            use_box: true,
            alignment: 2,
            proportional: true,
            letter_size: Vec2::new(0.5, 1.0),
            style: 1,
            text: "~r~armed".into(),
            ..Default::default()
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(PlayerShowTextDraw::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_per_player_id_offset() {
        let msg = PlayerHideTextDraw {
            per_player: true,
            textdraw_id: 5,
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        let wire = u16::from_le_bytes([bs.as_bytes()[0], bs.as_bytes()[1]]);
        assert_eq!(wire, GLOBAL_TEXTDRAW_POOL_SIZE as u16 + 5);
        assert_eq!(PlayerHideTextDraw::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_select_cancel_sentinel() {
        let mut bs = BitStream::new();
        bs.write_u16(INVALID_TEXTDRAW_ID);
        let msg = OnPlayerSelectTextDraw::read(&mut bs).unwrap();
        assert!(msg.cancelled);
    }

    #[test]
    fn test_flags_packing() {
        let msg = PlayerShowTextDraw {
            use_box: true,
            alignment: 3,
            proportional: true,
            ..Default::default()
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.as_bytes()[2], 0b0001_0111);
    }
}
