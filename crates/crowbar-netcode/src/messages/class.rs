//! Class selection and spawn negotiation.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolResult};
use crowbar_types::Vec3;

/// Client cycles through the selectable spawn classes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerRequestClass {
    pub class_id: u16,
}

impl Message for PlayerRequestClass {
    const ID: u8 = 128;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            class_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.class_id);
    }
}

/// Server reply describing the class under the selection camera. Shares
/// ID 128 with the request; direction disambiguates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRequestClassResponse {
    pub selectable: u8,
    pub team: u8,
    pub model: u32,
    pub unknown1: u8,
    pub spawn: Vec3,
    pub z_angle: f32,
    pub weapons: [u32; 3],
    pub ammos: [u32; 3],
}

impl Default for PlayerRequestClassResponse {
    fn default() -> Self {
        Self {
            selectable: 1,
            team: 0,
            model: 0,
            unknown1: 0,
            spawn: Vec3::default(),
            z_angle: 0.0,
            weapons: [0; 3],
            ammos: [0; 3],
        }
    }
}

impl Message for PlayerRequestClassResponse {
    const ID: u8 = 128;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            selectable: bs.read_u8()?,
            team: bs.read_u8()?,
            model: bs.read_u32()?,
            unknown1: bs.read_u8()?,
            spawn: bs.read_vec3()?,
            z_angle: bs.read_f32()?,
            weapons: bs.read_u32_array()?,
            ammos: bs.read_u32_array()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u8(self.selectable);
        bs.write_u8(self.team);
        bs.write_u32(self.model);
        bs.write_u8(self.unknown1);
        bs.write_vec3(self.spawn);
        bs.write_f32(self.z_angle);
        bs.write_u32_array(&self.weapons);
        bs.write_u32_array(&self.ammos);
    }
}

/// Replaces the spawn info the player will use on their next spawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetSpawnInfo {
    pub team: u8,
    pub model: u32,
    pub unknown1: u8,
    pub spawn: Vec3,
    pub z_angle: f32,
    pub weapons: [u32; 3],
    pub ammos: [u32; 3],
}

impl Message for SetSpawnInfo {
    const ID: u8 = 68;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            team: bs.read_u8()?,
            model: bs.read_u32()?,
            unknown1: bs.read_u8()?,
            spawn: bs.read_vec3()?,
            z_angle: bs.read_f32()?,
            weapons: bs.read_u32_array()?,
            ammos: bs.read_u32_array()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u8(self.team);
        bs.write_u32(self.model);
        bs.write_u8(self.unknown1);
        bs.write_vec3(self.spawn);
        bs.write_f32(self.z_angle);
        bs.write_u32_array(&self.weapons);
        bs.write_u32_array(&self.ammos);
    }
}

/// Empty client request to leave class selection and spawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerRequestSpawn;

impl Message for PlayerRequestSpawn {
    const ID: u8 = 129;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerRequestSpawnResponse {
    pub allow: u32,
}

impl Message for PlayerRequestSpawnResponse {
    const ID: u8 = 129;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            allow: bs.read_u32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u32(self.allow);
    }
}

/// Forces a spawn without the client asking first (spawn-response code 2).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImmediatelySpawnPlayer;

impl Message for ImmediatelySpawnPlayer {
    const ID: u8 = 129;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        bs.read_u32()?;
        Ok(Self)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u32(2);
    }
}

/// Returns the player to class selection on their next death or respawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForcePlayerClassSelection;

impl Message for ForcePlayerClassSelection {
    const ID: u8 = 74;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_class_roundtrip() {
        let msg = PlayerRequestClass { class_id: 12 };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(PlayerRequestClass::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_class_response_roundtrip() {
        let msg = PlayerRequestClassResponse {
            selectable: 1,
            team: 2,
            model: 101,
            unknown1: 0,
            spawn: Vec3::new(1.0, 2.0, 3.0),
            z_angle: 90.0,
            weapons: [24, 31, 0],
            ammos: [100, 500, 0],
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(PlayerRequestClassResponse::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_spawn_response_allow() {
        let msg = PlayerRequestSpawnResponse { allow: 1 };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.as_bytes(), &[1, 0, 0, 0]);
    }

    #[test]
    fn test_immediate_spawn_is_code_two() {
        let mut bs = BitStream::new();
        ImmediatelySpawnPlayer.write(&mut bs);
        assert_eq!(bs.as_bytes(), &[2, 0, 0, 0]);
    }
}
