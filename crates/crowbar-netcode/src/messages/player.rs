//! Per-player state, movement, combat, camera, chat and world RPCs.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolError, ProtocolResult};
use crowbar_types::{Animation, Colour, Vec3, Vec4, MAX_SKILL_LEVELS};

/// Implements `Message` for a server->client RPC with a plain field list.
/// Client->server request types are written out by hand since most carry
/// conditional fields or decode quirks.
macro_rules! server_rpc {
    ($name:ident, $id:expr, { $($field:ident : $read:ident / $write:ident),* $(,)? }) => {
        impl Message for $name {
            const ID: u8 = $id;
            const CATEGORY: MessageCategory = MessageCategory::Rpc;
            const CHANNEL: Channel = Channel::SyncRpc;

            fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
                #[allow(unused_variables)]
                let bs = bs;
                Ok(Self {
                    $($field: bs.$read()?,)*
                })
            }

            fn write(&self, bs: &mut BitStream) {
                #[allow(unused_variables)]
                let bs = bs;
                $(bs.$write(self.$field);)*
            }
        }
    };
}

// === Movement and transform ===

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerPosition {
    pub position: Vec3,
}
server_rpc!(SetPlayerPosition, 12, { position: read_vec3 / write_vec3 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerPositionFindZ {
    pub position: Vec3,
}
server_rpc!(SetPlayerPositionFindZ, 13, { position: read_vec3 / write_vec3 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerFacingAngle {
    pub angle: f32,
}
server_rpc!(SetPlayerFacingAngle, 19, { angle: read_f32 / write_f32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerVelocity {
    pub velocity: Vec3,
}
server_rpc!(SetPlayerVelocity, 90, { velocity: read_vec3 / write_vec3 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerHealth {
    pub health: f32,
}
server_rpc!(SetPlayerHealth, 14, { health: read_f32 / write_f32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerArmour {
    pub armour: f32,
}
server_rpc!(SetPlayerArmour, 66, { armour: read_f32 / write_f32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerGravity {
    pub gravity: f32,
}
server_rpc!(SetPlayerGravity, 146, { gravity: read_f32 / write_f32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TogglePlayerControllable {
    pub enable: u8,
}
server_rpc!(TogglePlayerControllable, 15, { enable: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerInterior {
    pub interior: u8,
}
server_rpc!(SetPlayerInterior, 156, { interior: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerVirtualWorld {
    pub world: i32,
}
server_rpc!(SetPlayerVirtualWorld, 48, { world: read_i32 / write_i32 });

/// World bounds as x-max, x-min, y-max, y-min.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetWorldBounds {
    pub coords: Vec4,
}
server_rpc!(SetWorldBounds, 17, { coords: read_vec4 / write_vec4 });

// === Identity and appearance ===

/// Skin assignment; the one player-targeted RPC with a 32-bit player ID.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerSkin {
    pub player_id: u32,
    pub skin: u32,
}
server_rpc!(SetPlayerSkin, 153, { player_id: read_u32 / write_u32, skin: read_u32 / write_u32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerTeam {
    pub player_id: u16,
    pub team: u8,
}
server_rpc!(SetPlayerTeam, 69, { player_id: read_u16 / write_u16, team: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerFightingStyle {
    pub player_id: u16,
    pub style: u8,
}
server_rpc!(SetPlayerFightingStyle, 89, { player_id: read_u16 / write_u16, style: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerSkillLevel {
    pub player_id: u16,
    pub skill_type: u32,
    pub level: u16,
}
server_rpc!(SetPlayerSkillLevel, 34, {
    player_id: read_u16 / write_u16,
    skill_type: read_u32 / write_u32,
    level: read_u16 / write_u16,
});

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerSpecialAction {
    pub action: u8,
}
server_rpc!(SetPlayerSpecialAction, 88, { action: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerColor {
    pub player_id: u16,
    pub colour: Colour,
}

impl Message for SetPlayerColor {
    const ID: u8 = 72;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: bs.read_u16()?,
            colour: Colour::from_rgba(bs.read_u32()?),
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u32(self.colour.rgba());
    }
}

/// Broadcast of a rename and its acceptance status.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerName {
    pub player_id: u16,
    pub name: String,
    pub success: u8,
}

impl Message for SetPlayerName {
    const ID: u8 = 11;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: bs.read_u16()?,
            name: bs.read_str8()?,
            success: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_str8(&self.name);
        bs.write_u8(self.success);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerWantedLevel {
    pub level: u8,
}
server_rpc!(SetPlayerWantedLevel, 133, { level: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToggleWidescreen {
    pub enable: bool,
}
server_rpc!(ToggleWidescreen, 111, { enable: read_bit / write_bit });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisableRemoteVehicleCollisions {
    pub disable: bool,
}
server_rpc!(DisableRemoteVehicleCollisions, 167, { disable: read_bit / write_bit });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerCameraTargeting {
    pub enabled: bool,
}
server_rpc!(SetPlayerCameraTargeting, 170, { enabled: read_bit / write_bit });

// === Weapons and combat ===

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GivePlayerWeapon {
    pub weapon: u32,
    pub ammo: u32,
}
server_rpc!(GivePlayerWeapon, 22, { weapon: read_u32 / write_u32, ammo: read_u32 / write_u32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResetPlayerWeapons;

impl Message for ResetPlayerWeapons {
    const ID: u8 = 21;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerArmedWeapon {
    pub weapon: u32,
}
server_rpc!(SetPlayerArmedWeapon, 67, { weapon: read_u32 / write_u32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerAmmo {
    pub weapon: u8,
    pub ammo: u16,
}
server_rpc!(SetPlayerAmmo, 145, { weapon: read_u8 / write_u8, ammo: read_u16 / write_u16 });

/// Client report of its own death.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerDeath {
    pub reason: u8,
    pub killer_id: u16,
}

impl Message for OnPlayerDeath {
    const ID: u8 = 53;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            reason: bs.read_u8()?,
            killer_id: bs.read_u16()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

/// Tells remote clients a player died (ragdoll without a kill-feed line).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerDeath {
    pub player_id: u16,
}
server_rpc!(PlayerDeath, 166, { player_id: read_u16 / write_u16 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SendDeathMessage {
    pub killer_id: u16,
    pub player_id: u16,
    pub reason: u8,
}
server_rpc!(SendDeathMessage, 55, {
    killer_id: read_u16 / write_u16,
    player_id: read_u16 / write_u16,
    reason: read_u8 / write_u8,
});

/// Client damage report; `taking` distinguishes damage taken from damage
/// given. Interpretation when both sides are the same peer is left to
/// handlers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerGiveTakeDamage {
    pub taking: bool,
    pub player_id: u16,
    pub damage: f32,
    pub weapon: u32,
    pub body_part: u32,
}

impl Message for OnPlayerGiveTakeDamage {
    const ID: u8 = 115;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let msg = Self {
            taking: bs.read_bit()?,
            player_id: bs.read_u16()?,
            damage: bs.read_f32()?,
            weapon: bs.read_u32()?,
            body_part: bs.read_u32()?,
        };
        if !msg.damage.is_finite() || msg.damage < 0.0 {
            return Err(ProtocolError::Malformed);
        }
        Ok(msg)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerDamageActor {
    pub unknown: bool,
    pub actor_id: u16,
    pub damage: f32,
    pub weapon: u32,
    pub body_part: u32,
}

impl Message for OnPlayerDamageActor {
    const ID: u8 = 177;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let msg = Self {
            unknown: bs.read_bit()?,
            actor_id: bs.read_u16()?,
            damage: bs.read_f32()?,
            weapon: bs.read_u32()?,
            body_part: bs.read_u32()?,
        };
        if !msg.damage.is_finite() || msg.damage < 0.0 {
            return Err(ProtocolError::Malformed);
        }
        Ok(msg)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateExplosion {
    pub position: Vec3,
    pub explosion_type: u16,
    pub radius: f32,
}
server_rpc!(CreateExplosion, 79, {
    position: read_vec3 / write_vec3,
    explosion_type: read_u16 / write_u16,
    radius: read_f32 / write_f32,
});

// === Animation ===

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplyPlayerAnimation {
    pub player_id: u16,
    pub animation: Animation,
}

impl Message for ApplyPlayerAnimation {
    const ID: u8 = 86;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: bs.read_u16()?,
            animation: read_animation(bs)?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        write_animation(bs, &self.animation);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClearPlayerAnimations {
    pub player_id: u16,
}
server_rpc!(ClearPlayerAnimations, 87, { player_id: read_u16 / write_u16 });

pub(crate) fn write_animation(bs: &mut BitStream, anim: &Animation) {
    bs.write_str8(&anim.library);
    bs.write_str8(&anim.name);
    bs.write_f32(anim.delta);
    bs.write_bit(anim.looping);
    bs.write_bit(anim.lock_x);
    bs.write_bit(anim.lock_y);
    bs.write_bit(anim.freeze);
    bs.write_u32(anim.time);
}

pub(crate) fn read_animation(bs: &mut BitStream) -> ProtocolResult<Animation> {
    Ok(Animation {
        library: bs.read_str8()?,
        name: bs.read_str8()?,
        delta: bs.read_f32()?,
        looping: bs.read_bit()?,
        lock_x: bs.read_bit()?,
        lock_y: bs.read_bit()?,
        freeze: bs.read_bit()?,
        time: bs.read_u32()?,
    })
}

// === Camera ===

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerCameraPosition {
    pub position: Vec3,
}
server_rpc!(SetPlayerCameraPosition, 157, { position: read_vec3 / write_vec3 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerCameraLookAt {
    pub position: Vec3,
    pub cut_type: u8,
}
server_rpc!(SetPlayerCameraLookAt, 158, {
    position: read_vec3 / write_vec3,
    cut_type: read_u8 / write_u8,
});

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerCameraBehindPlayer;

impl Message for SetPlayerCameraBehindPlayer {
    const ID: u8 = 162;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterpolateCamera {
    pub pos_set: bool,
    pub from: Vec3,
    pub to: Vec3,
    pub time: u32,
    pub cut_type: u8,
}
server_rpc!(InterpolateCamera, 82, {
    pos_set: read_bit / write_bit,
    from: read_vec3 / write_vec3,
    to: read_vec3 / write_vec3,
    time: read_u32 / write_u32,
    cut_type: read_u8 / write_u8,
});

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachCameraToObject {
    pub object_id: u16,
}
server_rpc!(AttachCameraToObject, 81, { object_id: read_u16 / write_u16 });

/// Client report of what its camera currently aims at.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerCameraTarget {
    pub object_id: u16,
    pub vehicle_id: u16,
    pub player_id: u16,
    pub actor_id: u16,
}

impl Message for OnPlayerCameraTarget {
    const ID: u8 = 168;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            object_id: bs.read_u16()?,
            vehicle_id: bs.read_u16()?,
            player_id: bs.read_u16()?,
            actor_id: bs.read_u16()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

// === Chat, text and sound ===

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SendClientMessage {
    pub colour: Colour,
    pub message: String,
}

impl Message for SendClientMessage {
    const ID: u8 = 93;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            colour: Colour::from_rgba(bs.read_u32()?),
            message: bs.read_str32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u32(self.colour.rgba());
        bs.write_str32(&self.message);
    }
}

/// Chat line typed by a client.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerRequestChatMessage {
    pub message: String,
}

impl Message for PlayerRequestChatMessage {
    const ID: u8 = 101;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            message: bs.read_str8()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

/// Chat line relayed to clients, attributed to its speaker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerChatMessage {
    pub player_id: u16,
    pub message: String,
}

impl Message for PlayerChatMessage {
    const ID: u8 = 101;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_str8(&self.message);
    }
}

/// Slash-command typed by a client.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerRequestCommandMessage {
    pub message: String,
}

impl Message for PlayerRequestCommandMessage {
    const ID: u8 = 50;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            message: bs.read_str32()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerCommandMessage {
    pub message: String,
}

impl Message for PlayerCommandMessage {
    const ID: u8 = 50;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_str32(&self.message);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerChatBubble {
    pub player_id: u16,
    pub colour: Colour,
    pub draw_distance: f32,
    pub expire_time: u32,
    pub text: String,
}

impl Message for SetPlayerChatBubble {
    const ID: u8 = 59;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: bs.read_u16()?,
            colour: Colour::from_rgba(bs.read_u32()?),
            draw_distance: bs.read_f32()?,
            expire_time: bs.read_u32()?,
            text: bs.read_str8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u32(self.colour.rgba());
        bs.write_f32(self.draw_distance);
        bs.write_u32(self.expire_time);
        bs.write_str8(&self.text);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SendGameText {
    pub style: u32,
    pub time: u32,
    pub text: String,
}

impl Message for SendGameText {
    const ID: u8 = 73;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            style: bs.read_u32()?,
            time: bs.read_u32()?,
            text: bs.read_str32()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u32(self.style);
        bs.write_u32(self.time);
        bs.write_str32(&self.text);
    }
}

/// Shop interior name, always 32 bytes on the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerShopName {
    pub name: String,
}

impl Message for SetPlayerShopName {
    const ID: u8 = 33;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            name: bs.read_fixed_str(32)?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_fixed_str(&self.name, 32);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerDrunkLevel {
    pub level: i32,
}
server_rpc!(SetPlayerDrunkLevel, 35, { level: read_i32 / write_i32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayAudioStreamForPlayer {
    pub url: String,
    pub position: Vec3,
    pub distance: f32,
    pub use_position: u8,
}

impl Message for PlayAudioStreamForPlayer {
    const ID: u8 = 41;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            url: bs.read_str8()?,
            position: bs.read_vec3()?,
            distance: bs.read_f32()?,
            use_position: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_str8(&self.url);
        bs.write_vec3(self.position);
        bs.write_f32(self.distance);
        bs.write_u8(self.use_position);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StopAudioStreamForPlayer;

impl Message for StopAudioStreamForPlayer {
    const ID: u8 = 42;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayCrimeReport {
    pub suspect_id: u16,
    pub in_vehicle: u32,
    pub vehicle_model: u32,
    pub vehicle_colour: u32,
    pub crime_id: u32,
    pub position: Vec3,
}
server_rpc!(PlayCrimeReport, 112, {
    suspect_id: read_u16 / write_u16,
    in_vehicle: read_u32 / write_u32,
    vehicle_model: read_u32 / write_u32,
    vehicle_colour: read_u32 / write_u32,
    crime_id: read_u32 / write_u32,
    position: read_vec3 / write_vec3,
});

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerPlaySound {
    pub sound_id: u32,
    pub position: Vec3,
}
server_rpc!(PlayerPlaySound, 16, {
    sound_id: read_u32 / write_u32,
    position: read_vec3 / write_vec3,
});

// === Money ===

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GivePlayerMoney {
    pub money: i32,
}
server_rpc!(GivePlayerMoney, 18, { money: read_i32 / write_i32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResetPlayerMoney;

impl Message for ResetPlayerMoney {
    const ID: u8 = 20;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

// === World presentation ===

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoveBuildingForPlayer {
    pub model: u32,
    pub position: Vec3,
    pub radius: f32,
}
server_rpc!(RemoveBuildingForPlayer, 43, {
    model: read_u32 / write_u32,
    position: read_vec3 / write_vec3,
    radius: read_f32 / write_f32,
});

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerTime {
    pub hour: u8,
    pub minute: u8,
}
server_rpc!(SetPlayerTime, 29, { hour: read_u8 / write_u8, minute: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TogglePlayerClock {
    pub toggle: u8,
}
server_rpc!(TogglePlayerClock, 30, { toggle: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerWorldTime {
    pub hours: u8,
}
server_rpc!(SetPlayerWorldTime, 94, { hours: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerWeather {
    pub weather: u8,
}
server_rpc!(SetPlayerWeather, 152, { weather: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerMapIcon {
    pub icon_id: u8,
    pub position: Vec3,
    pub icon_type: u8,
    pub colour: Colour,
    pub style: u8,
}

impl Message for SetPlayerMapIcon {
    const ID: u8 = 56;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            icon_id: bs.read_u8()?,
            position: bs.read_vec3()?,
            icon_type: bs.read_u8()?,
            colour: Colour::from_rgba(bs.read_u32()?),
            style: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u8(self.icon_id);
        bs.write_vec3(self.position);
        bs.write_u8(self.icon_type);
        bs.write_u32(self.colour.rgba());
        bs.write_u8(self.style);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemovePlayerMapIcon {
    pub icon_id: u8,
}
server_rpc!(RemovePlayerMapIcon, 144, { icon_id: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShowPlayerNameTagForPlayer {
    pub player_id: u16,
    pub show: u8,
}
server_rpc!(ShowPlayerNameTagForPlayer, 80, { player_id: read_u16 / write_u16, show: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnableStuntBonusForPlayer {
    pub enable: bool,
}
server_rpc!(EnableStuntBonusForPlayer, 104, { enable: read_bit / write_bit });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerClickMap {
    pub position: Vec3,
}

impl Message for OnPlayerClickMap {
    const ID: u8 = 119;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let position = bs.read_vec3()?;
        if !position.is_finite() {
            return Err(ProtocolError::Malformed);
        }
        Ok(Self { position })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerClickPlayer {
    pub player_id: u16,
    pub source: u8,
}

impl Message for OnPlayerClickPlayer {
    const ID: u8 = 23;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: bs.read_u16()?,
            source: bs.read_u8()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerInteriorChange {
    pub interior: u8,
}

impl Message for OnPlayerInteriorChange {
    const ID: u8 = 118;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            interior: bs.read_u8()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

// === Player streaming ===

/// Full appearance snapshot a client needs to materialize a remote player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStreamIn {
    pub player_id: u16,
    pub team: u8,
    pub skin: u32,
    pub position: Vec3,
    pub angle: f32,
    pub colour: Colour,
    pub fighting_style: u8,
    pub skill_levels: [u16; MAX_SKILL_LEVELS],
}

impl Default for PlayerStreamIn {
    fn default() -> Self {
        Self {
            player_id: 0,
            team: 0,
            skin: 0,
            position: Vec3::default(),
            angle: 0.0,
            colour: Colour::default(),
            fighting_style: 4,
            skill_levels: [0; MAX_SKILL_LEVELS],
        }
    }
}

impl Message for PlayerStreamIn {
    const ID: u8 = 32;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: bs.read_u16()?,
            team: bs.read_u8()?,
            skin: bs.read_u32()?,
            position: bs.read_vec3()?,
            angle: bs.read_f32()?,
            colour: Colour::from_rgba(bs.read_u32()?),
            fighting_style: bs.read_u8()?,
            skill_levels: bs.read_u16_array()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u8(self.team);
        bs.write_u32(self.skin);
        bs.write_vec3(self.position);
        bs.write_f32(self.angle);
        bs.write_u32(self.colour.rgba());
        bs.write_u8(self.fighting_style);
        bs.write_u16_array(&self.skill_levels);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerStreamOut {
    pub player_id: u16,
}
server_rpc!(PlayerStreamOut, 163, { player_id: read_u16 / write_u16 });

// === Spectating ===

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TogglePlayerSpectating {
    pub enable: u32,
}
server_rpc!(TogglePlayerSpectating, 124, { enable: read_u32 / write_u32 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSpectatePlayer {
    pub target_id: u16,
    pub camera_mode: u8,
}
server_rpc!(PlayerSpectatePlayer, 126, { target_id: read_u16 / write_u16, camera_mode: read_u8 / write_u8 });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSpectateVehicle {
    pub vehicle_id: u16,
    pub camera_mode: u8,
}
server_rpc!(PlayerSpectateVehicle, 127, { vehicle_id: read_u16 / write_u16, camera_mode: read_u8 / write_u8 });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_position_layout() {
        let msg = SetPlayerPosition {
            position: Vec3::new(1.0, 2.0, 3.0),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.as_bytes().len(), 12);
        assert_eq!(SetPlayerPosition::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_stream_in_roundtrip() {
        let msg = PlayerStreamIn {
            player_id: 5,
            team: 1,
            skin: 101,
            position: Vec3::new(10.0, 20.0, 3.0),
            angle: 90.0,
            colour: Colour::from_rgba(0xFF0000FF),
            fighting_style: 4,
            skill_levels: [999; MAX_SKILL_LEVELS],
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(PlayerStreamIn::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_give_take_damage_rejects_nonfinite() {
        let mut bs = BitStream::new();
        bs.write_bit(true);
        bs.write_u16(3);
        bs.write_f32(f32::NAN);
        bs.write_u32(24);
        bs.write_u32(3);
        assert_eq!(
            OnPlayerGiveTakeDamage::read(&mut bs),
            Err(ProtocolError::Malformed)
        );
    }

    #[test]
    fn test_give_take_damage_roundtrip_fields() {
        let mut bs = BitStream::new();
        bs.write_bit(true);
        bs.write_u16(3);
        bs.write_f32(12.5);
        bs.write_u32(24);
        bs.write_u32(9);
        let msg = OnPlayerGiveTakeDamage::read(&mut bs).unwrap();
        assert!(msg.taking);
        assert_eq!(msg.player_id, 3);
        assert_eq!(msg.damage, 12.5);
        assert_eq!(msg.body_part, 9);
    }

    #[test]
    fn test_animation_roundtrip() {
        let msg = ApplyPlayerAnimation {
            player_id: 2,
            animation: Animation {
                library: "DANCING".into(),
                name: "dance_loop".into(),
                delta: 4.1,
                looping: true,
                lock_x: false,
                lock_y: true,
                freeze: false,
                time: 0,
            },
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(ApplyPlayerAnimation::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_chat_request_reads_str8() {
        let mut bs = BitStream::new();
        bs.write_str8("hello");
        let msg = PlayerRequestChatMessage::read(&mut bs).unwrap();
        assert_eq!(msg.message, "hello");
    }

    #[test]
    fn test_send_client_message_layout() {
        let msg = SendClientMessage {
            colour: Colour::from_rgba(0xFFFFFFFF),
            message: "hi".into(),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        // rgba + u32 length prefix + body
        assert_eq!(bs.as_bytes().len(), 4 + 4 + 2);
    }

    #[test]
    fn test_shop_name_fixed_width() {
        let msg = SetPlayerShopName {
            name: "AMMUN5".into(),
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(bs.as_bytes().len(), 32);
        assert_eq!(SetPlayerShopName::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_click_map_rejects_nonfinite() {
        let mut bs = BitStream::new();
        bs.write_vec3(Vec3::new(f32::INFINITY, 0.0, 0.0));
        assert_eq!(OnPlayerClickMap::read(&mut bs), Err(ProtocolError::Malformed));
    }
}
