//! Vehicle lifecycle, streaming and control RPCs.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolError, ProtocolResult};
use crowbar_types::{is_train_carriage, Vec3, MAX_VEHICLE_MODS};

/// Full vehicle snapshot sent when a vehicle enters a player's streaming
/// range. Train carriage models (569/570) are suppressed entirely: the
/// client builds carriages from the towing train.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInVehicle {
    pub vehicle_id: u16,
    pub model: i32,
    pub position: Vec3,
    pub angle: f32,
    pub colour1: u8,
    pub colour2: u8,
    pub health: f32,
    pub interior: u8,
    pub door_damage: u32,
    pub panel_damage: u32,
    pub light_damage: u8,
    pub tyre_damage: u8,
    pub siren: u8,
    pub mods: [i32; MAX_VEHICLE_MODS],
    pub paintjob: u8,
    pub body_colour1: i32,
    pub body_colour2: i32,
}

impl Default for StreamInVehicle {
    fn default() -> Self {
        Self {
            vehicle_id: 0,
            model: 400,
            position: Vec3::default(),
            angle: 0.0,
            colour1: 0,
            colour2: 0,
            health: 1000.0,
            interior: 0,
            door_damage: 0,
            panel_damage: 0,
            light_damage: 0,
            tyre_damage: 0,
            siren: 0,
            mods: [0; MAX_VEHICLE_MODS],
            paintjob: 3,
            body_colour1: -1,
            body_colour2: -1,
        }
    }
}

impl Message for StreamInVehicle {
    const ID: u8 = 164;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        if is_train_carriage(self.model) {
            return;
        }
        bs.write_u16(self.vehicle_id);
        bs.write_u32(self.model as u32);
        bs.write_vec3(self.position);
        bs.write_f32(self.angle);
        bs.write_u8(self.colour1);
        bs.write_u8(self.colour2);
        bs.write_f32(self.health);
        bs.write_u8(self.interior);
        bs.write_u32(self.door_damage);
        bs.write_u32(self.panel_damage);
        bs.write_u8(self.light_damage);
        bs.write_u8(self.tyre_damage);
        bs.write_u8(self.siren);
        // Mod IDs are biased by 999 so a byte holds them; 0 means empty.
        for &m in &self.mods {
            bs.write_u8(if m != 0 { (m - 999) as u8 } else { 0 });
        }
        bs.write_u8(self.paintjob);
        bs.write_u32(self.body_colour1 as u32);
        bs.write_u32(self.body_colour2 as u32);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamOutVehicle {
    pub vehicle_id: u16,
}

impl Message for StreamOutVehicle {
    const ID: u8 = 165;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PutPlayerInVehicle {
    pub vehicle_id: u16,
    pub seat: u8,
}

impl Message for PutPlayerInVehicle {
    const ID: u8 = 70;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
            seat: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
        bs.write_u8(self.seat);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemovePlayerFromVehicle;

impl Message for RemovePlayerFromVehicle {
    const ID: u8 = 71;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

/// Client announces it started entering a vehicle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerEnterVehicle {
    pub vehicle_id: u16,
    pub passenger: u8,
}

impl Message for OnPlayerEnterVehicle {
    const ID: u8 = 26;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
            passenger: bs.read_u8()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

/// Relays an entry animation to the player's streamed-in peers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnterVehicle {
    pub player_id: u16,
    pub vehicle_id: u16,
    pub passenger: u8,
}

impl Message for EnterVehicle {
    const ID: u8 = 26;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u16(self.vehicle_id);
        bs.write_u8(self.passenger);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerExitVehicle {
    pub vehicle_id: u16,
}

impl Message for OnPlayerExitVehicle {
    const ID: u8 = 154;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExitVehicle {
    pub player_id: u16,
    pub vehicle_id: u16,
}

impl Message for ExitVehicle {
    const ID: u8 = 154;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u16(self.vehicle_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetVehicleHealth {
    pub vehicle_id: u16,
    pub health: f32,
}

impl Message for SetVehicleHealth {
    const ID: u8 = 147;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
            health: bs.read_f32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
        bs.write_f32(self.health);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetVehicleZAngle {
    pub vehicle_id: u16,
    pub angle: f32,
}

impl Message for SetVehicleZAngle {
    const ID: u8 = 160;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
            angle: bs.read_f32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
        bs.write_f32(self.angle);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetVehiclePosition {
    pub vehicle_id: u16,
    pub position: Vec3,
}

impl Message for SetVehiclePosition {
    const ID: u8 = 159;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
            position: bs.read_vec3()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
        bs.write_vec3(self.position);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetVehiclePlate {
    pub vehicle_id: u16,
    pub plate: String,
}

impl Message for SetVehiclePlate {
    const ID: u8 = 123;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
            plate: bs.read_str8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
        bs.write_str8(&self.plate);
    }
}

/// Client report that a vehicle it drives (or last synced) blew up.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleDeath {
    pub vehicle_id: u16,
}

impl Message for VehicleDeath {
    const ID: u8 = 136;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkVehicleToInterior {
    pub vehicle_id: u16,
    pub interior: u8,
}

impl Message for LinkVehicleToInterior {
    const ID: u8 = 65;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
            interior: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
        bs.write_u8(self.interior);
    }
}

/// Trailer first, cab second on the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachTrailer {
    pub trailer_id: u16,
    pub vehicle_id: u16,
}

impl Message for AttachTrailer {
    const ID: u8 = 148;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            trailer_id: bs.read_u16()?,
            vehicle_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.trailer_id);
        bs.write_u16(self.vehicle_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetachTrailer {
    pub vehicle_id: u16,
}

impl Message for DetachTrailer {
    const ID: u8 = 149;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetVehicleVelocity {
    /// 0 sets linear velocity, 1 angular.
    pub velocity_type: u8,
    pub velocity: Vec3,
}

impl Message for SetVehicleVelocity {
    const ID: u8 = 91;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            velocity_type: bs.read_u8()?,
            velocity: bs.read_vec3()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u8(self.velocity_type);
        bs.write_vec3(self.velocity);
    }
}

/// The sixteen tri-state vehicle params (engine, lights, doors, windows)
/// packed as one byte each: 255 keeps the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct SetVehicleParams {
    pub vehicle_id: u16,
    pub params: [u8; 16],
}

impl Default for SetVehicleParams {
    fn default() -> Self {
        Self {
            vehicle_id: 0,
            params: [255; 16],
        }
    }
}

impl Message for SetVehicleParams {
    const ID: u8 = 24;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let vehicle_id = bs.read_u16()?;
        let mut params = [0u8; 16];
        for p in &mut params {
            *p = bs.read_u8()?;
        }
        Ok(Self { vehicle_id, params })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
        for &p in &self.params {
            bs.write_u8(p);
        }
    }
}

/// Panel status precedes door status on the wire, both directions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetVehicleDamageStatus {
    pub vehicle_id: u16,
    pub panel_damage: u32,
    pub door_damage: u32,
    pub light_damage: u8,
    pub tyre_damage: u8,
}

impl Message for SetVehicleDamageStatus {
    const ID: u8 = 106;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
            panel_damage: bs.read_u32()?,
            door_damage: bs.read_u32()?,
            light_damage: bs.read_u8()?,
            tyre_damage: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
        bs.write_u32(self.panel_damage);
        bs.write_u32(self.door_damage);
        bs.write_u8(self.light_damage);
        bs.write_u8(self.tyre_damage);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoveVehicleComponent {
    pub vehicle_id: u16,
    pub component: u16,
}

impl Message for RemoveVehicleComponent {
    const ID: u8 = 57;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            vehicle_id: bs.read_u16()?,
            component: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.vehicle_id);
        bs.write_u16(self.component);
    }
}

/// Client-side script event (mod shop purchase, paintjob, colour change).
/// Inbound and outbound field orders differ.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScmEvent {
    pub player_id: u16,
    pub vehicle_id: u32,
    pub arg1: u32,
    pub arg2: u32,
    pub event_type: u32,
}

impl Message for ScmEvent {
    const ID: u8 = 96;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: 0,
            vehicle_id: bs.read_u32()?,
            arg1: bs.read_u32()?,
            arg2: bs.read_u32()?,
            event_type: bs.read_u32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u32(self.event_type);
        bs.write_u32(self.vehicle_id);
        bs.write_u32(self.arg1);
        bs.write_u32(self.arg2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_in_mod_bias() {
        let mut msg = StreamInVehicle {
            vehicle_id: 1,
            model: 560,
            ..Default::default()
        };
        msg.mods[0] = 1010; // nitro
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        // id(2) model(4) pos(12) angle(4) colours(2) health(4) interior(1)
        // damage(10) siren(1) puts the first mod byte at offset 40.
        assert_eq!(bs.as_bytes()[40], (1010 - 999) as u8);
    }

    #[test]
    fn test_train_carriage_not_emitted() {
        let msg = StreamInVehicle {
            vehicle_id: 1,
            model: 570,
            ..Default::default()
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.len_bits(), 0);
    }

    #[test]
    fn test_enter_vehicle_layout() {
        let msg = EnterVehicle {
            player_id: 0,
            vehicle_id: 5,
            passenger: 0,
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.as_bytes(), &[0, 0, 5, 0, 0]);
    }

    #[test]
    fn test_on_enter_vehicle_roundtrip() {
        let mut bs = BitStream::new();
        bs.write_u16(5);
        bs.write_u8(1);
        let msg = OnPlayerEnterVehicle::read(&mut bs).unwrap();
        assert_eq!(msg.vehicle_id, 5);
        assert_eq!(msg.passenger, 1);
    }

    #[test]
    fn test_attach_trailer_order() {
        let msg = AttachTrailer {
            trailer_id: 7,
            vehicle_id: 3,
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.as_bytes(), &[7, 0, 3, 0]);
    }

    #[test]
    fn test_damage_status_roundtrip() {
        let msg = SetVehicleDamageStatus {
            vehicle_id: 2,
            panel_damage: 0x11223344,
            door_damage: 0x55667788,
            light_damage: 5,
            tyre_damage: 9,
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(SetVehicleDamageStatus::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_vehicle_params_roundtrip() {
        let mut msg = SetVehicleParams {
            vehicle_id: 4,
            ..Default::default()
        };
        msg.params[0] = 1; // engine on
        msg.params[1] = 0; // lights off
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(SetVehicleParams::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_scm_event_read_side() {
        let mut bs = BitStream::new();
        bs.write_u32(12);
        bs.write_u32(1);
        bs.write_u32(2);
        bs.write_u32(3);
        let msg = ScmEvent::read(&mut bs).unwrap();
        assert_eq!(msg.vehicle_id, 12);
        assert_eq!(msg.event_type, 3);
    }
}
