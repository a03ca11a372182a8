//! Checkpoint and race-checkpoint RPCs; one of each per player at most.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolResult};
use crowbar_types::Vec3;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetCheckpoint {
    pub position: Vec3,
    pub size: f32,
}

impl Message for SetCheckpoint {
    const ID: u8 = 107;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            position: bs.read_vec3()?,
            size: bs.read_f32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_vec3(self.position);
        bs.write_f32(self.size);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisableCheckpoint;

impl Message for DisableCheckpoint {
    const ID: u8 = 37;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

/// Race checkpoint with a direction arrow towards the next one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetRaceCheckpoint {
    pub checkpoint_type: u8,
    pub position: Vec3,
    pub next_position: Vec3,
    pub size: f32,
}

impl Message for SetRaceCheckpoint {
    const ID: u8 = 38;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            checkpoint_type: bs.read_u8()?,
            position: bs.read_vec3()?,
            next_position: bs.read_vec3()?,
            size: bs.read_f32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u8(self.checkpoint_type);
        bs.write_vec3(self.position);
        bs.write_vec3(self.next_position);
        bs.write_f32(self.size);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisableRaceCheckpoint;

impl Message for DisableRaceCheckpoint {
    const ID: u8 = 39;
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
    fn test_checkpoint_roundtrip() {
        let msg = SetCheckpoint {
            position: Vec3::new(10.0, -20.0, 3.0),
            size: 4.0,
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.as_bytes().len(), 16);
        assert_eq!(SetCheckpoint::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_race_checkpoint_roundtrip() {
        let msg = SetRaceCheckpoint {
            checkpoint_type: 1,
            position: Vec3::new(1.0, 2.0, 3.0),
            next_position: Vec3::new(4.0, 5.0, 6.0),
            size: 8.0,
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(SetRaceCheckpoint::read(&mut bs).unwrap(), msg);
    }
}
