//! Pickup RPCs. Pickups address the externally visible legacy ID space,
//! carried as 32-bit integers.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolResult};
use crowbar_types::Vec3;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerCreatePickup {
    pub pickup_id: i32,
    pub model: i32,
    pub pickup_type: i32,
    pub position: Vec3,
}

impl Message for PlayerCreatePickup {
    const ID: u8 = 95;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            pickup_id: bs.read_i32()?,
            model: bs.read_i32()?,
            pickup_type: bs.read_i32()?,
            position: bs.read_vec3()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_i32(self.pickup_id);
        bs.write_i32(self.model);
        bs.write_i32(self.pickup_type);
        bs.write_vec3(self.position);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerDestroyPickup {
    pub pickup_id: i32,
}

impl Message for PlayerDestroyPickup {
    const ID: u8 = 63;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            pickup_id: bs.read_i32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_i32(self.pickup_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerPickUpPickup {
    pub pickup_id: i32,
}

impl Message for OnPlayerPickUpPickup {
    const ID: u8 = 131;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            pickup_id: bs.read_i32()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pickup_roundtrip() {
        let msg = PlayerCreatePickup {
            pickup_id: 17,
            model: 1240,
            pickup_type: 2,
            position: Vec3::new(5.0, 6.0, 7.0),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.as_bytes().len(), 24);
        assert_eq!(PlayerCreatePickup::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_pickup_ids_are_32_bit() {
        let msg = PlayerDestroyPickup { pickup_id: 70000 };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(PlayerDestroyPickup::read(&mut bs).unwrap(), msg);
    }
}
