//! Actor (scripted NPC ped) RPCs, all per-player streaming messages.

use crate::messages::player::{read_animation, write_animation};
use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolResult};
use crowbar_types::{Animation, Vec3};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShowActorForPlayer {
    pub actor_id: u16,
    pub skin: u32,
    pub position: Vec3,
    pub angle: f32,
    pub health: f32,
    pub invulnerable: bool,
}

impl Message for ShowActorForPlayer {
    const ID: u8 = 171;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            actor_id: bs.read_u16()?,
            skin: bs.read_u32()?,
            position: bs.read_vec3()?,
            angle: bs.read_f32()?,
            health: bs.read_f32()?,
            invulnerable: bs.read_u8()? != 0,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.actor_id);
        bs.write_u32(self.skin);
        bs.write_vec3(self.position);
        bs.write_f32(self.angle);
        bs.write_f32(self.health);
        bs.write_u8(self.invulnerable as u8);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HideActorForPlayer {
    pub actor_id: u16,
}

impl Message for HideActorForPlayer {
    const ID: u8 = 172;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            actor_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.actor_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplyActorAnimationForPlayer {
    pub actor_id: u16,
    pub animation: Animation,
}

impl Message for ApplyActorAnimationForPlayer {
    const ID: u8 = 173;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            actor_id: bs.read_u16()?,
            animation: read_animation(bs)?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.actor_id);
        write_animation(bs, &self.animation);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClearActorAnimationsForPlayer {
    pub actor_id: u16,
}

impl Message for ClearActorAnimationsForPlayer {
    const ID: u8 = 174;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            actor_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.actor_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetActorFacingAngleForPlayer {
    pub actor_id: u16,
    pub angle: f32,
}

impl Message for SetActorFacingAngleForPlayer {
    const ID: u8 = 175;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            actor_id: bs.read_u16()?,
            angle: bs.read_f32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.actor_id);
        bs.write_f32(self.angle);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetActorPosForPlayer {
    pub actor_id: u16,
    pub position: Vec3,
}

impl Message for SetActorPosForPlayer {
    const ID: u8 = 176;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            actor_id: bs.read_u16()?,
            position: bs.read_vec3()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.actor_id);
        bs.write_vec3(self.position);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetActorHealthForPlayer {
    pub actor_id: u16,
    pub health: f32,
}

impl Message for SetActorHealthForPlayer {
    const ID: u8 = 178;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            actor_id: bs.read_u16()?,
            health: bs.read_f32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.actor_id);
        bs.write_f32(self.health);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_actor_roundtrip() {
        let msg = ShowActorForPlayer {
            actor_id: 2,
            skin: 179,
            position: Vec3::new(100.0, 200.0, 10.0),
            angle: 180.0,
            health: 100.0,
            invulnerable: true,
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(ShowActorForPlayer::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_actor_animation_roundtrip() {
        let msg = ApplyActorAnimationForPlayer {
            actor_id: 1,
            animation: Animation {
                library: "PED".into(),
                name: "IDLE_CHAT".into(),
                delta: 4.1,
                looping: true,
                ..Default::default()
            },
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(ApplyActorAnimationForPlayer::read(&mut bs).unwrap(), msg);
    }
}
