//! Gang zone RPCs. Zone colours travel in ABGR order.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolResult};
use crowbar_types::{Colour, Vec2};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShowGangZone {
    pub zone_id: u16,
    pub min: Vec2,
    pub max: Vec2,
    pub colour: Colour,
}

impl Message for ShowGangZone {
    const ID: u8 = 108;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let zone_id = bs.read_u16()?;
        let min = bs.read_vec2()?;
        let max = bs.read_vec2()?;
        Ok(Self {
            zone_id,
            min,
            max,
            colour: Colour::from_abgr(bs.read_u32()?),
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.zone_id);
        bs.write_vec2(self.min);
        bs.write_vec2(self.max);
        bs.write_u32(self.colour.abgr());
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HideGangZone {
    pub zone_id: u16,
}

impl Message for HideGangZone {
    const ID: u8 = 120;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            zone_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.zone_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlashGangZone {
    pub zone_id: u16,
    pub colour: Colour,
}

impl Message for FlashGangZone {
    const ID: u8 = 121;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let zone_id = bs.read_u16()?;
        Ok(Self {
            zone_id,
            colour: Colour::from_abgr(bs.read_u32()?),
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.zone_id);
        bs.write_u32(self.colour.abgr());
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StopFlashGangZone {
    pub zone_id: u16,
}

impl Message for StopFlashGangZone {
    const ID: u8 = 85;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            zone_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.zone_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_zone_roundtrip() {
        let msg = ShowGangZone {
            zone_id: 4,
            min: Vec2::new(100.0, 200.0),
            max: Vec2::new(300.0, 400.0),
            colour: Colour::new(0x11, 0x22, 0x33, 0x44),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(ShowGangZone::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_zone_colour_is_abgr() {
        let msg = FlashGangZone {
            zone_id: 0,
            colour: Colour::new(0x11, 0x22, 0x33, 0x44),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        // ABGR 0x44332211 little-endian.
        assert_eq!(bs.as_bytes()[2..6], [0x11, 0x22, 0x33, 0x44]);
    }
}
