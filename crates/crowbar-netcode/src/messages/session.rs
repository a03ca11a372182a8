//! Connection and session lifecycle messages.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolError, ProtocolResult};
use crowbar_types::Colour;

/// Number of per-model preload flags carried in the init payload
/// (vehicle models 400..=611).
pub const VEHICLE_MODEL_FLAGS: usize = 212;

/// First message from a connecting client, carrying its identity and the
/// answer to the connection-cookie challenge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerConnect {
    pub version_number: u32,
    pub modded: u8,
    pub name: String,
    pub challenge_response: u32,
    pub key: String,
    pub version_string: String,
}

impl Message for PlayerConnect {
    const ID: u8 = 25;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            version_number: bs.read_u32()?,
            modded: bs.read_u8()?,
            name: bs.read_str8()?,
            challenge_response: bs.read_u32()?,
            key: bs.read_str8()?,
            version_string: bs.read_str8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u32(self.version_number);
        bs.write_u8(self.modded);
        bs.write_str8(&self.name);
        bs.write_u32(self.challenge_response);
        bs.write_str8(&self.key);
        bs.write_str8(&self.version_string);
    }
}

/// Connect handshake variant sent by NPC bots; no key or version string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NpcConnect {
    pub version_number: u32,
    pub modded: u8,
    pub name: String,
    pub challenge_response: u32,
}

impl Message for NpcConnect {
    const ID: u8 = 54;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            version_number: bs.read_u32()?,
            modded: bs.read_u8()?,
            name: bs.read_str8()?,
            challenge_response: bs.read_u32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u32(self.version_number);
        bs.write_u8(self.modded);
        bs.write_str8(&self.name);
        bs.write_u32(self.challenge_response);
    }
}

/// Announces a newly joined player to every connected client.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerJoin {
    pub player_id: u16,
    pub colour: Colour,
    pub is_npc: bool,
    pub name: String,
}

impl Message for PlayerJoin {
    const ID: u8 = 137;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: bs.read_u16()?,
            colour: Colour::from_rgba(bs.read_u32()?),
            is_npc: bs.read_u8()? != 0,
            name: bs.read_str8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u32(self.colour.rgba());
        bs.write_u8(self.is_npc as u8);
        bs.write_str8(&self.name);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerQuit {
    pub player_id: u16,
    pub reason: u8,
}

impl Message for PlayerQuit {
    const ID: u8 = 138;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: bs.read_u16()?,
            reason: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u8(self.reason);
    }
}

/// The session bootstrap blob: every game rule the client needs before it
/// can enter class selection, finished off by the vehicle preload flags.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInit {
    pub enable_zone_names: bool,
    pub use_player_ped_anims: bool,
    pub allow_interior_weapons: bool,
    pub use_limit_global_chat_radius: bool,
    pub limit_global_chat_radius: f32,
    pub enable_stunt_bonus: bool,
    pub name_tag_draw_distance: f32,
    pub disable_interior_enter_exits: bool,
    pub disable_name_tag_los: bool,
    pub manual_vehicle_engine_and_lights: bool,
    pub spawns_available: u32,
    pub player_id: u16,
    pub show_name_tags: bool,
    pub show_player_markers: u32,
    pub world_time: u8,
    pub weather: u8,
    pub gravity: f32,
    pub lan_mode: bool,
    pub death_drop_amount: u32,
    pub instagib: bool,
    pub on_foot_rate: u32,
    pub in_car_rate: u32,
    pub weapon_rate: u32,
    pub multiplier: u32,
    pub lag_compensation: u32,
    pub server_name: String,
    pub vehicle_models: Vec<u8>,
}

impl Default for PlayerInit {
    fn default() -> Self {
        Self {
            enable_zone_names: false,
            use_player_ped_anims: false,
            allow_interior_weapons: false,
            use_limit_global_chat_radius: false,
            limit_global_chat_radius: 200.0,
            enable_stunt_bonus: true,
            name_tag_draw_distance: 70.0,
            disable_interior_enter_exits: false,
            disable_name_tag_los: false,
            manual_vehicle_engine_and_lights: false,
            spawns_available: 0,
            player_id: 0,
            show_name_tags: true,
            show_player_markers: 1,
            world_time: 12,
            weather: 10,
            gravity: 0.008,
            lan_mode: false,
            death_drop_amount: 0,
            instagib: false,
            on_foot_rate: 30,
            in_car_rate: 30,
            weapon_rate: 30,
            multiplier: 10,
            lag_compensation: 1,
            server_name: String::new(),
            vehicle_models: vec![0; VEHICLE_MODEL_FLAGS],
        }
    }
}

impl Message for PlayerInit {
    const ID: u8 = 139;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            enable_zone_names: bs.read_bit()?,
            use_player_ped_anims: bs.read_bit()?,
            allow_interior_weapons: bs.read_bit()?,
            use_limit_global_chat_radius: bs.read_bit()?,
            limit_global_chat_radius: bs.read_f32()?,
            enable_stunt_bonus: bs.read_bit()?,
            name_tag_draw_distance: bs.read_f32()?,
            disable_interior_enter_exits: bs.read_bit()?,
            disable_name_tag_los: bs.read_bit()?,
            manual_vehicle_engine_and_lights: bs.read_bit()?,
            spawns_available: bs.read_u32()?,
            player_id: bs.read_u16()?,
            show_name_tags: bs.read_bit()?,
            show_player_markers: bs.read_u32()?,
            world_time: bs.read_u8()?,
            weather: bs.read_u8()?,
            gravity: bs.read_f32()?,
            lan_mode: bs.read_bit()?,
            death_drop_amount: bs.read_u32()?,
            instagib: bs.read_bit()?,
            on_foot_rate: bs.read_u32()?,
            in_car_rate: bs.read_u32()?,
            weapon_rate: bs.read_u32()?,
            multiplier: bs.read_u32()?,
            lag_compensation: bs.read_u32()?,
            server_name: bs.read_str8()?,
            vehicle_models: bs.read_raw(VEHICLE_MODEL_FLAGS)?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_bit(self.enable_zone_names);
        bs.write_bit(self.use_player_ped_anims);
        bs.write_bit(self.allow_interior_weapons);
        bs.write_bit(self.use_limit_global_chat_radius);
        bs.write_f32(self.limit_global_chat_radius);
        bs.write_bit(self.enable_stunt_bonus);
        bs.write_f32(self.name_tag_draw_distance);
        bs.write_bit(self.disable_interior_enter_exits);
        bs.write_bit(self.disable_name_tag_los);
        bs.write_bit(self.manual_vehicle_engine_and_lights);
        bs.write_u32(self.spawns_available);
        bs.write_u16(self.player_id);
        bs.write_bit(self.show_name_tags);
        bs.write_u32(self.show_player_markers);
        bs.write_u8(self.world_time);
        bs.write_u8(self.weather);
        bs.write_f32(self.gravity);
        bs.write_bit(self.lan_mode);
        bs.write_u32(self.death_drop_amount);
        bs.write_bit(self.instagib);
        bs.write_u32(self.on_foot_rate);
        bs.write_u32(self.in_car_rate);
        bs.write_u32(self.weapon_rate);
        bs.write_u32(self.multiplier);
        bs.write_u32(self.lag_compensation);
        bs.write_str8(&self.server_name);
        let mut models = self.vehicle_models.clone();
        models.resize(VEHICLE_MODEL_FLAGS, 0);
        bs.write_raw(&models);
    }
}

/// Client notification that its pawn finished spawning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSpawn;

impl Message for PlayerSpawn {
    const ID: u8 = 52;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

/// Tells the client its session is over; sent right before a kick or ban
/// closes the transport peer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerClose;

impl Message for PlayerClose {
    const ID: u8 = 40;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

/// Server-issued memory probe; the client answers with the same type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientCheck {
    pub check_type: u8,
    pub address: u32,
    pub offset: u16,
    pub count: u16,
}

impl Message for ClientCheck {
    const ID: u8 = 103;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            check_type: bs.read_u8()?,
            address: bs.read_u32()?,
            offset: 0,
            count: 0,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u8(self.check_type);
        bs.write_u32(self.address);
        bs.write_u16(self.offset);
        bs.write_u16(self.count);
    }
}

/// Client response to a ClientCheck probe.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientCheckResponse {
    pub check_type: u8,
    pub address: u32,
    pub results: u16,
}

impl Message for ClientCheckResponse {
    const ID: u8 = 103;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            check_type: bs.read_u8()?,
            address: bs.read_u32()?,
            results: bs.read_u16()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

/// Periodic server-clock broadcast driving the client's money/game timers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SendGameTimeUpdate {
    pub time: i32,
}

impl Message for SendGameTimeUpdate {
    const ID: u8 = 60;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            time: bs.read_i32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_i32(self.time);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScorePingEntry {
    pub player_id: u16,
    pub score: i32,
    pub ping: u32,
}

/// Scoreboard snapshot answering a client request; one entry per player.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SendPlayerScoresAndPings {
    pub entries: Vec<ScorePingEntry>,
}

impl Message for SendPlayerScoresAndPings {
    const ID: u8 = 155;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        for entry in &self.entries {
            bs.write_u16(entry.player_id);
            bs.write_i32(entry.score);
            bs.write_u32(entry.ping);
        }
    }
}

/// Empty client request for the scoreboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerRequestScoresAndPings;

impl Message for OnPlayerRequestScoresAndPings {
    const ID: u8 = 155;
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
    fn test_player_connect_roundtrip() {
        let msg = PlayerConnect {
            version_number: 0x0FFFFFFF,
            modded: 0,
            name: "Alice".into(),
            challenge_response: 42,
            key: "k".into(),
            version_string: "0.3.7".into(),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(PlayerConnect::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_player_join_layout() {
        let msg = PlayerJoin {
            player_id: 3,
            colour: Colour::from_rgba(0xFF00FFFF),
            is_npc: false,
            name: "Bob".into(),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(
            bs.as_bytes(),
            &[0x03, 0x00, 0xFF, 0xFF, 0x00, 0xFF, 0x00, 0x03, b'B', b'o', b'b']
        );
        let mut bs = BitStream::from_bytes(bs.as_bytes());
        assert_eq!(PlayerJoin::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_player_init_roundtrip() {
        let msg = PlayerInit {
            player_id: 17,
            server_name: "test server".into(),
            enable_zone_names: true,
            gravity: 0.008,
            ..Default::default()
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        let out = PlayerInit::read(&mut bs).unwrap();
        assert_eq!(out, msg);
        assert_eq!(out.vehicle_models.len(), VEHICLE_MODEL_FLAGS);
    }

    #[test]
    fn test_npc_connect_roundtrip() {
        let msg = NpcConnect {
            version_number: 0x0FFFFFFF,
            modded: 1,
            name: "bot_0".into(),
            challenge_response: 7,
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(NpcConnect::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_truncated_connect_fails() {
        let mut bs = BitStream::from_bytes(&[0x01, 0x02]);
        assert!(PlayerConnect::read(&mut bs).is_err());
    }

    #[test]
    fn test_scores_and_pings_layout() {
        let msg = SendPlayerScoresAndPings {
            entries: vec![ScorePingEntry {
                player_id: 1,
                score: -5,
                ping: 60,
            }],
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.as_bytes().len(), 10);
    }
}
