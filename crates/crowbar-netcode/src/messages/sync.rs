//! Per-tick sync packets. Inbound layouts (client->server) and outbound
//! relays (server->client, prefixed with the reporting player's ID) are
//! asymmetric; both live on the same type with `read` taking the inbound
//! shape and `write` the outbound one.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolError, ProtocolResult};
use crowbar_types::{
    GtaQuat, SurfingData, SurfingTarget, Vec2, Vec3, Vec4, MAX_WEAPON_SLOTS, OBJECT_POOL_SIZE,
    VEHICLE_POOL_SIZE,
};

fn read_surfing_id(id: u16, offset: Vec3) -> SurfingData {
    let target = if (id as usize) < VEHICLE_POOL_SIZE {
        SurfingTarget::Vehicle(id)
    } else if (id as usize) < VEHICLE_POOL_SIZE + OBJECT_POOL_SIZE {
        SurfingTarget::Object(id - VEHICLE_POOL_SIZE as u16)
    } else {
        SurfingTarget::None
    };
    SurfingData { target, offset }
}

/// On-foot movement sync, the highest-volume packet on a server.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerFootSync {
    pub player_id: u16,
    pub left_right: u16,
    pub up_down: u16,
    pub keys: u16,
    pub position: Vec3,
    pub rotation: GtaQuat,
    pub health_armour: Vec2,
    pub weapon: u8,
    pub special_action: u8,
    pub velocity: Vec3,
    pub surfing: SurfingData,
    pub animation_id: u16,
    pub animation_flags: u16,
}

impl Message for PlayerFootSync {
    const ID: u8 = 207;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let left_right = bs.read_u16()?;
        let up_down = bs.read_u16()?;
        let keys = bs.read_u16()?;
        let position = bs.read_vec3()?;
        let rotation = bs.read_gta_quat()?;
        let health_armour = bs.read_health_armour()?;
        let weapon = bs.read_u8()?;
        let special_action = bs.read_u8()?;
        let velocity = bs.read_vec3()?;
        let surf_offset = bs.read_vec3()?;
        let surf_id = bs.read_u16()?;
        let animation_id = bs.read_u16()?;
        let animation_flags = bs.read_u16()?;
        if !position.is_finite() || !velocity.is_finite() {
            return Err(ProtocolError::Malformed);
        }
        Ok(Self {
            player_id: 0,
            left_right,
            up_down,
            keys,
            position,
            rotation,
            health_armour,
            weapon,
            special_action,
            velocity,
            surfing: read_surfing_id(surf_id, surf_offset),
            animation_id,
            animation_flags,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);

        bs.write_bit(self.left_right > 0);
        if self.left_right > 0 {
            bs.write_u16(self.left_right);
        }
        bs.write_bit(self.up_down > 0);
        if self.up_down > 0 {
            bs.write_u16(self.up_down);
        }

        bs.write_u16(self.keys);
        bs.write_vec3(self.position);
        bs.write_gta_quat(self.rotation);
        bs.write_health_armour(self.health_armour);
        bs.write_u8(self.weapon);
        bs.write_u8(self.special_action);
        bs.write_vec3_compressed(self.velocity);

        match self.surfing.target {
            SurfingTarget::None => bs.write_bit(false),
            SurfingTarget::Vehicle(id) => {
                bs.write_bit(true);
                bs.write_u16(id);
                bs.write_vec3(self.surfing.offset);
            }
            SurfingTarget::Object(id) => {
                bs.write_bit(true);
                bs.write_u16(id + VEHICLE_POOL_SIZE as u16);
                bs.write_vec3(self.surfing.offset);
            }
        }

        bs.write_bit(self.animation_id > 0);
        if self.animation_id > 0 {
            bs.write_u16(self.animation_id);
            bs.write_u16(self.animation_flags);
        }
    }
}

/// Driver-side vehicle sync.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerVehicleSync {
    pub player_id: u16,
    pub vehicle_id: u16,
    pub left_right: u16,
    pub up_down: u16,
    pub keys: u16,
    pub rotation: GtaQuat,
    pub position: Vec3,
    pub velocity: Vec3,
    pub health: f32,
    pub player_health_armour: Vec2,
    pub weapon: u8,
    pub siren: u8,
    pub landing_gear: u8,
    pub trailer_id: u16,
    pub has_trailer: bool,
    /// Hydra thrust angle or train speed, depending on the model.
    pub special: u32,
}

impl Message for PlayerVehicleSync {
    const ID: u8 = 200;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let msg = Self {
            player_id: 0,
            vehicle_id: bs.read_u16()?,
            left_right: bs.read_u16()?,
            up_down: bs.read_u16()?,
            keys: bs.read_u16()?,
            rotation: bs.read_gta_quat()?,
            position: bs.read_vec3()?,
            velocity: bs.read_vec3()?,
            health: bs.read_f32()?,
            player_health_armour: bs.read_health_armour()?,
            weapon: bs.read_u8()?,
            siren: bs.read_u8()?,
            landing_gear: bs.read_u8()?,
            trailer_id: bs.read_u16()?,
            has_trailer: false,
            special: bs.read_u32()?,
        };
        if !msg.position.is_finite() || !msg.velocity.is_finite() || !msg.health.is_finite() {
            return Err(ProtocolError::Malformed);
        }
        Ok(msg)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u16(self.vehicle_id);
        bs.write_u16(self.left_right);
        bs.write_u16(self.up_down);
        bs.write_u16(self.keys);
        bs.write_gta_quat(self.rotation);
        bs.write_vec3(self.position);
        bs.write_vec3_compressed(self.velocity);
        bs.write_u16(self.health as u16);
        bs.write_health_armour(self.player_health_armour);
        bs.write_u8(self.weapon);
        bs.write_bit(self.siren != 0);
        bs.write_bit(self.landing_gear != 0);

        bs.write_bit(self.special > 0);
        if self.special > 0 {
            bs.write_u32(self.special);
        }

        bs.write_bit(self.has_trailer);
        if self.has_trailer {
            bs.write_u16(self.trailer_id);
        }
    }
}

/// Camera and aim direction, sent while a weapon is drawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerAimSync {
    pub player_id: u16,
    pub cam_mode: u8,
    pub cam_front: Vec3,
    pub cam_position: Vec3,
    pub aim_z: f32,
    pub zoom_weapon_state: u8,
    pub aspect_ratio: u8,
}

impl Message for PlayerAimSync {
    const ID: u8 = 203;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: 0,
            cam_mode: bs.read_u8()?,
            cam_front: bs.read_vec3()?,
            cam_position: bs.read_vec3()?,
            aim_z: bs.read_f32()?,
            zoom_weapon_state: bs.read_u8()?,
            aspect_ratio: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u8(self.cam_mode);
        bs.write_vec3(self.cam_front);
        bs.write_vec3(self.cam_position);
        bs.write_f32(self.aim_z);
        bs.write_u8(self.zoom_weapon_state);
        bs.write_u8(self.aspect_ratio);
    }
}

/// One fired shot with its hit test result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerBulletSync {
    pub player_id: u16,
    pub hit_type: u8,
    pub hit_id: u16,
    pub origin: Vec3,
    pub hit_position: Vec3,
    pub offset: Vec3,
    pub weapon: u8,
}

impl Message for PlayerBulletSync {
    const ID: u8 = 206;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let msg = Self {
            player_id: 0,
            hit_type: bs.read_u8()?,
            hit_id: bs.read_u16()?,
            origin: bs.read_vec3()?,
            hit_position: bs.read_vec3()?,
            offset: bs.read_vec3()?,
            weapon: bs.read_u8()?,
        };
        if !msg.origin.is_finite() || !msg.hit_position.is_finite() {
            return Err(ProtocolError::Malformed);
        }
        Ok(msg)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u8(self.hit_type);
        bs.write_u16(self.hit_id);
        bs.write_vec3(self.origin);
        bs.write_vec3(self.hit_position);
        bs.write_vec3(self.offset);
        bs.write_u8(self.weapon);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerStatsSync {
    pub money: i32,
    pub drunk_level: i32,
}

impl Message for PlayerStatsSync {
    const ID: u8 = 205;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            money: bs.read_i32()?,
            drunk_level: bs.read_i32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_i32(self.money);
        bs.write_i32(self.drunk_level);
    }
}

/// Client-reported ammo counts for targeted slots; entries repeat until
/// the stream runs dry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerWeaponsUpdate {
    pub target_player: u16,
    pub target_actor: u16,
    pub weapons: Vec<(u8, u8, u16)>,
}

impl Message for PlayerWeaponsUpdate {
    const ID: u8 = 204;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let target_player = bs.read_u16()?;
        let target_actor = bs.read_u16()?;
        let mut weapons = Vec::new();
        while weapons.len() < MAX_WEAPON_SLOTS && bs.remaining_bits() >= 8 {
            let slot = bs.read_u8()?;
            if slot as usize >= MAX_WEAPON_SLOTS {
                return Err(ProtocolError::Malformed);
            }
            let id = bs.read_u8()?;
            let ammo = bs.read_u16()?;
            weapons.push((slot, id, ammo));
        }
        Ok(Self {
            target_player,
            target_actor,
            weapons,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.target_player);
        bs.write_u16(self.target_actor);
        for &(slot, id, ammo) in &self.weapons {
            bs.write_u8(slot);
            bs.write_u8(id);
            bs.write_u16(ammo);
        }
    }
}

/// One minimap marker: present markers carry a truncated world position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerMarker {
    pub player_id: u16,
    pub position: Option<(i16, i16, i16)>,
}

/// Server-composed minimap marker broadcast covering every other player.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerMarkersSync {
    pub markers: Vec<PlayerMarker>,
}

impl Message for PlayerMarkersSync {
    const ID: u8 = 208;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u32(self.markers.len() as u32);
        for marker in &self.markers {
            bs.write_u16(marker.player_id);
            match marker.position {
                Some((x, y, z)) => {
                    bs.write_bit(true);
                    bs.write_i16(x);
                    bs.write_i16(y);
                    bs.write_i16(z);
                }
                None => bs.write_bit(false),
            }
        }
    }
}

/// Passenger seat sync; seat, drive-by state and weapon share one word.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerPassengerSync {
    pub player_id: u16,
    pub vehicle_id: u16,
    pub drive_by_seat_weapon: u16,
    pub health_armour: Vec2,
    pub left_right: u16,
    pub up_down: u16,
    pub keys: u16,
    pub position: Vec3,
}

impl Message for PlayerPassengerSync {
    const ID: u8 = 211;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let msg = Self {
            player_id: 0,
            vehicle_id: bs.read_u16()?,
            drive_by_seat_weapon: bs.read_u16()?,
            health_armour: bs.read_health_armour()?,
            left_right: bs.read_u16()?,
            up_down: bs.read_u16()?,
            keys: bs.read_u16()?,
            position: bs.read_vec3()?,
        };
        if !msg.position.is_finite() {
            return Err(ProtocolError::Malformed);
        }
        Ok(msg)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u16(self.vehicle_id);
        bs.write_u16(self.drive_by_seat_weapon);
        // Outbound health and armour are full bytes, not the nibble pair.
        bs.write_u8(self.health_armour.x.clamp(0.0, 255.0) as u8);
        bs.write_u8(self.health_armour.y.clamp(0.0, 255.0) as u8);
        bs.write_u16(self.left_right);
        bs.write_u16(self.up_down);
        bs.write_u16(self.keys);
        bs.write_vec3(self.position);
    }
}

/// Physics sync for a vehicle near a player but without a driver.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerUnoccupiedSync {
    pub player_id: u16,
    pub vehicle_id: u16,
    pub seat: u8,
    pub roll: Vec3,
    pub rotation: Vec3,
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub health: f32,
}

impl Message for PlayerUnoccupiedSync {
    const ID: u8 = 209;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let msg = Self {
            player_id: 0,
            vehicle_id: bs.read_u16()?,
            seat: bs.read_u8()?,
            roll: bs.read_vec3()?,
            rotation: bs.read_vec3()?,
            position: bs.read_vec3()?,
            velocity: bs.read_vec3()?,
            angular_velocity: bs.read_vec3()?,
            health: bs.read_f32()?,
        };
        if !msg.position.is_finite() || !msg.health.is_finite() {
            return Err(ProtocolError::Malformed);
        }
        Ok(msg)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u16(self.vehicle_id);
        bs.write_u8(self.seat);
        bs.write_vec3(self.roll);
        bs.write_vec3(self.rotation);
        bs.write_vec3(self.position);
        bs.write_vec3(self.velocity);
        bs.write_vec3(self.angular_velocity);
        bs.write_f32(self.health);
    }
}

/// Towed trailer physics reported by the towing driver.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerTrailerSync {
    pub player_id: u16,
    pub vehicle_id: u16,
    pub position: Vec3,
    pub quat: Vec4,
    pub velocity: Vec3,
    pub turn_velocity: Vec3,
}

impl Message for PlayerTrailerSync {
    const ID: u8 = 210;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let msg = Self {
            player_id: 0,
            vehicle_id: bs.read_u16()?,
            position: bs.read_vec3()?,
            quat: bs.read_vec4()?,
            velocity: bs.read_vec3()?,
            turn_velocity: bs.read_vec3()?,
        };
        if !msg.position.is_finite() {
            return Err(ProtocolError::Malformed);
        }
        Ok(msg)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u16(self.vehicle_id);
        bs.write_vec3(self.position);
        bs.write_vec4(self.quat);
        bs.write_vec3(self.velocity);
        bs.write_vec3(self.turn_velocity);
    }
}

/// Freecam position while spectating; echoed only to tooling, never to
/// other players.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSpectatorSync {
    pub left_right: u16,
    pub up_down: u16,
    pub keys: u16,
    pub position: Vec3,
}

impl Message for PlayerSpectatorSync {
    const ID: u8 = 212;
    const CATEGORY: MessageCategory = MessageCategory::Packet;
    const CHANNEL: Channel = Channel::SyncPacket;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let msg = Self {
            left_right: bs.read_u16()?,
            up_down: bs.read_u16()?,
            keys: bs.read_u16()?,
            position: bs.read_vec3()?,
        };
        if !msg.position.is_finite() {
            return Err(ProtocolError::Malformed);
        }
        Ok(msg)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_bit(self.left_right > 0);
        if self.left_right > 0 {
            bs.write_u16(self.left_right);
        }
        bs.write_bit(self.up_down > 0);
        if self.up_down > 0 {
            bs.write_u16(self.up_down);
        }
        bs.write_u16(self.keys);
        bs.write_vec3(self.position);
    }
}
