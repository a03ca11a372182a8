//! The per-peer authoritative player record and its sync validation.

use crate::checkpoint::{PlayerCheckpoint, PlayerRaceCheckpoint};
use crate::object::PlayerObject;
use crate::textdraw::TextDraw;
use crate::textlabel::TextLabel;
use crowbar_netcode::AttachedObjectSlot;
use crowbar_pool::Pool;
use crowbar_types::{
    Colour, GtaQuat, KeyData, SurfingData, Vec3, Vec4, WeaponSlotData, MAX_ATTACHED_OBJECT_SLOTS,
    MAX_PLAYER_MAP_ICONS, MAX_PLAYER_NAME, MAX_SKILL_LEVELS, MAX_WEAPON_SLOTS, OBJECT_POOL_SIZE,
    PLAYER_TEXTDRAW_POOL_SIZE, TEXT_LABEL_POOL_SIZE,
};
use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};

/// Player lifecycle and movement state. Transitions are validated against
/// a small legal-transition table; a sync carrying an illegal transition
/// is dropped and the previous state kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    None,
    OnFoot,
    Driver,
    Passenger,
    ExitVehicle,
    EnterVehicleDriver,
    EnterVehiclePassenger,
    Wasted,
    Spawned,
    Spectating,
    Kicked,
}

impl PlayerState {
    /// Whether a state machine step from `self` to `to` is legal. Server
    /// teleports and kicks bypass this; it gates client-driven syncs.
    pub fn can_transition_to(self, to: PlayerState) -> bool {
        use PlayerState::*;
        if self == to {
            return true;
        }
        match (self, to) {
            // Anyone can die or start spectating; spawning leaves both.
            (_, Wasted) | (_, Spectating) => true,
            (Wasted, Spawned) | (None, Spawned) | (Spectating, Spawned) => true,
            (Spawned, OnFoot) => true,
            (OnFoot, EnterVehicleDriver) | (OnFoot, EnterVehiclePassenger) => true,
            (EnterVehicleDriver, Driver) | (EnterVehiclePassenger, Passenger) => true,
            (Driver, ExitVehicle) | (Passenger, ExitVehicle) => true,
            // Clients skip the exit animation when warped out.
            (Driver, OnFoot) | (Passenger, OnFoot) | (ExitVehicle, OnFoot) => true,
            _ => false,
        }
    }
}

/// Outcome of a rename request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStatus {
    Updated,
    Taken,
    Invalid,
}

/// Name rules the reference client enforces on its end too: 1..=24 chars
/// from the letter/digit/bracket/punctuation set.
pub fn is_name_valid(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_PLAYER_NAME {
        return false;
    }
    name.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '[' | ']' | '(' | ')' | '$' | '@' | '.' | '_' | '=')
    })
}

/// A map icon shown to one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapIcon {
    pub position: Vec3,
    pub icon_type: u8,
    pub colour: Colour,
    pub style: u8,
}

/// Handshake identity captured from the connect message.
#[derive(Debug, Clone, Default)]
pub struct PlayerConnectData {
    pub version_number: u32,
    pub modded: bool,
    pub challenge_response: u32,
    pub key: String,
    pub version_string: String,
}

/// Camera state as last reported or last set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerAimData {
    pub cam_mode: u8,
    pub cam_front: Vec3,
    pub cam_position: Vec3,
    pub aim_z: f32,
    pub cam_zoom: u8,
    pub weapon_state: u8,
    pub aspect_ratio: u8,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerBulletData {
    pub origin: Vec3,
    pub hit_position: Vec3,
    pub offset: Vec3,
    pub weapon: u8,
    pub hit_type: u8,
    pub hit_id: u16,
}

/// What the player's camera was last aiming at.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraTargetData {
    pub object_id: u16,
    pub vehicle_id: u16,
    pub player_id: u16,
    pub actor_id: u16,
}

/// Entity classes the streamer tracks per player.
#[derive(Debug, Clone, Default)]
pub struct StreamedSets {
    pub players: BTreeSet<usize>,
    pub vehicles: BTreeSet<usize>,
    pub objects: BTreeSet<usize>,
    pub actors: BTreeSet<usize>,
    pub pickups: BTreeSet<usize>,
    pub labels: BTreeSet<usize>,
}

/// Small typed key-value store hung off a player for components that need
/// per-player state without widening this struct.
#[derive(Default)]
pub struct Extensions {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    pub fn insert<T: Any>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    pub fn remove<T: Any>(&mut self) -> bool {
        self.entries.remove(&TypeId::of::<T>()).is_some()
    }
}

/// Coalesced per-tick outbound state. Setters overwrite their slot so at
/// most one RPC per field leaves per tick, carrying the final value.
/// Event-flavoured RPCs (sounds, explosions, animations) bypass this and
/// append to the immediate queue instead.
#[derive(Debug, Clone, Default)]
pub struct PendingUpdates {
    pub position: Option<Vec3>,
    pub position_find_z: Option<Vec3>,
    pub facing_angle: Option<f32>,
    pub velocity: Option<Vec3>,
    pub health: Option<f32>,
    pub armour: Option<f32>,
    pub skin: Option<u32>,
    pub team: Option<u8>,
    pub colour: Option<Colour>,
    pub interior: Option<u8>,
    pub virtual_world: Option<i32>,
    pub armed_weapon: Option<u32>,
    pub special_action: Option<u8>,
    pub wanted_level: Option<u8>,
    pub fighting_style: Option<u8>,
    pub drunk_level: Option<i32>,
    pub weather: Option<u8>,
    pub world_time: Option<u8>,
    pub gravity: Option<f32>,
    pub controllable: Option<bool>,
    pub world_bounds: Option<Vec4>,
}

impl PendingUpdates {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Counters behind the error policy: every dropped inbound message bumps
/// one of these; external policy reads them off the stats surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCounters {
    pub truncated: u64,
    pub malformed: u64,
    pub illegal_state: u64,
    pub unknown_id: u64,
    pub vetoed: u64,
}

impl ErrorCounters {
    pub fn total(&self) -> u64 {
        self.truncated + self.malformed + self.illegal_state + self.unknown_id + self.vetoed
    }
}

/// Everything the server knows about one connected peer.
pub struct Player {
    pub name: String,
    pub connect_data: PlayerConnectData,
    pub is_npc: bool,
    pub is_bot_controlled: bool,

    pub state: PlayerState,
    pub in_class_selection: bool,
    pub selected_class: usize,
    pub spawn_requested: bool,

    pub position: Vec3,
    pub rotation: GtaQuat,
    pub velocity: Vec3,
    pub facing_angle: f32,

    pub skin: u32,
    pub team: u8,
    pub colour: Colour,
    pub fighting_style: u8,
    pub skill_levels: [u16; MAX_SKILL_LEVELS],

    pub health: f32,
    pub armour: f32,
    pub money: i32,
    pub score: i32,
    pub drunk_level: i32,
    pub wanted_level: u8,

    pub weapons: [WeaponSlotData; MAX_WEAPON_SLOTS],
    pub armed_weapon: u8,
    pub special_action: u8,
    pub animation_id: u16,
    pub animation_flags: u16,

    pub surfing: SurfingData,
    pub keys: KeyData,
    pub aim: PlayerAimData,
    pub last_bullet: PlayerBulletData,
    pub camera_target: CameraTargetData,

    pub vehicle_id: Option<usize>,
    pub vehicle_seat: u8,

    pub virtual_world: i32,
    pub interior: u8,
    pub world_bounds: Option<Vec4>,
    /// Set when a sync landed outside the active world bounds; kick
    /// policy lives outside the core.
    pub out_of_bounds: bool,

    pub game_time_hour: u8,
    pub game_time_minute: u8,
    pub weather: u8,

    pub spectate_target: Option<usize>,
    pub shown_menu: Option<usize>,
    pub active_dialog: Option<u16>,
    pub chat_bubble_expiry: u64,

    pub checkpoint: Option<PlayerCheckpoint>,
    pub race_checkpoint: Option<PlayerRaceCheckpoint>,
    pub map_icons: [Option<MapIcon>; MAX_PLAYER_MAP_ICONS],
    pub attached_objects: [Option<AttachedObjectSlot>; MAX_ATTACHED_OBJECT_SLOTS],

    pub objects: Pool<PlayerObject, OBJECT_POOL_SIZE>,
    pub text_draws: Pool<TextDraw, PLAYER_TEXTDRAW_POOL_SIZE>,
    pub text_labels: Pool<TextLabel, TEXT_LABEL_POOL_SIZE>,

    pub streamed: StreamedSets,
    pub pending: PendingUpdates,
    pub extensions: Extensions,

    /// Opaque transport-owned blob (connection cookies, raknet state).
    pub network_data: Vec<u8>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            name: String::new(),
            connect_data: PlayerConnectData::default(),
            is_npc: false,
            is_bot_controlled: false,
            state: PlayerState::None,
            in_class_selection: false,
            selected_class: 0,
            spawn_requested: false,
            position: Vec3::default(),
            rotation: GtaQuat::default(),
            velocity: Vec3::default(),
            facing_angle: 0.0,
            skin: 0,
            team: 255,
            colour: Colour::default(),
            fighting_style: 4,
            skill_levels: [0; MAX_SKILL_LEVELS],
            health: 100.0,
            armour: 0.0,
            money: 0,
            score: 0,
            drunk_level: 0,
            wanted_level: 0,
            weapons: [WeaponSlotData::default(); MAX_WEAPON_SLOTS],
            armed_weapon: 0,
            special_action: 0,
            animation_id: 0,
            animation_flags: 0,
            surfing: SurfingData::default(),
            keys: KeyData::default(),
            aim: PlayerAimData::default(),
            last_bullet: PlayerBulletData::default(),
            camera_target: CameraTargetData::default(),
            vehicle_id: None,
            vehicle_seat: 0,
            virtual_world: 0,
            interior: 0,
            world_bounds: None,
            out_of_bounds: false,
            game_time_hour: 12,
            game_time_minute: 0,
            weather: 10,
            spectate_target: None,
            shown_menu: None,
            active_dialog: None,
            chat_bubble_expiry: 0,
            checkpoint: None,
            race_checkpoint: None,
            map_icons: [None; MAX_PLAYER_MAP_ICONS],
            attached_objects: std::array::from_fn(|_| None),
            objects: Pool::new(),
            text_draws: Pool::new(),
            text_labels: Pool::new(),
            streamed: StreamedSets::default(),
            pending: PendingUpdates::default(),
            extensions: Extensions::default(),
            network_data: Vec::new(),
        }
    }
}

impl Player {
    /// Attempt a client-driven state transition. Illegal transitions are
    /// refused and the last valid state kept.
    pub fn try_transition(&mut self, to: PlayerState) -> bool {
        if self.state.can_transition_to(to) {
            self.state = to;
            true
        } else {
            false
        }
    }

    /// Store a weapon in its fixed slot; same-slot weapons displace each
    /// other. Unknown weapon IDs are refused.
    pub fn give_weapon(&mut self, weapon: WeaponSlotData) -> bool {
        match weapon.slot() {
            Some(slot) if slot < MAX_WEAPON_SLOTS => {
                self.weapons[slot] = weapon;
                true
            }
            _ => false,
        }
    }

    pub fn reset_weapons(&mut self) {
        self.weapons = [WeaponSlotData::default(); MAX_WEAPON_SLOTS];
        self.armed_weapon = 0;
    }

    /// Accept a position update if the coordinates are sane; flags the
    /// player when outside the active world bounds.
    pub fn apply_synced_position(&mut self, position: Vec3) -> bool {
        if !position.is_finite() {
            return false;
        }
        if let Some(bounds) = self.world_bounds {
            // Bounds order on the wire is x-max, x-min, y-max, y-min.
            let inside = position.x <= bounds.x
                && position.x >= bounds.y
                && position.y <= bounds.z
                && position.y >= bounds.w;
            self.out_of_bounds = !inside;
        }
        self.position = position;
        true
    }

    /// Apply a key state update, reporting whether it changed. Callers
    /// dispatch the key-change event before this mutation lands.
    pub fn keys_changed(&self, new: &KeyData) -> bool {
        self.keys.keys != new.keys
    }

    /// Health and armour from a sync, quantized and clamped upstream.
    pub fn apply_synced_vitals(&mut self, health: f32, armour: f32) {
        self.health = health.clamp(0.0, 100.0);
        self.armour = armour.clamp(0.0, 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_vehicle_entry() {
        let mut p = Player::default();
        p.state = PlayerState::OnFoot;
        assert!(p.try_transition(PlayerState::EnterVehicleDriver));
        assert!(p.try_transition(PlayerState::Driver));
        assert!(p.try_transition(PlayerState::ExitVehicle));
        assert!(p.try_transition(PlayerState::OnFoot));
    }

    #[test]
    fn test_state_machine_rejects_illegal() {
        let mut p = Player::default();
        p.state = PlayerState::OnFoot;
        // Cannot become a driver without the entry animation state.
        assert!(!p.try_transition(PlayerState::Driver));
        assert_eq!(p.state, PlayerState::OnFoot);
        // Passenger entry cannot complete as driver.
        p.state = PlayerState::EnterVehiclePassenger;
        assert!(!p.try_transition(PlayerState::Driver));
        assert_eq!(p.state, PlayerState::EnterVehiclePassenger);
    }

    #[test]
    fn test_anyone_can_die_and_respawn() {
        let mut p = Player::default();
        p.state = PlayerState::Driver;
        assert!(p.try_transition(PlayerState::Wasted));
        assert!(p.try_transition(PlayerState::Spawned));
        assert!(p.try_transition(PlayerState::OnFoot));
    }

    #[test]
    fn test_name_validation() {
        assert!(is_name_valid("Alice"));
        assert!(is_name_valid("[TAG]Bob_42"));
        assert!(!is_name_valid(""));
        assert!(!is_name_valid("a name with spaces"));
        assert!(!is_name_valid("twentyfive_characters_xxx"));
        assert!(!is_name_valid("bad\u{e9}name"));
    }

    #[test]
    fn test_weapon_slot_displacement() {
        let mut p = Player::default();
        assert!(p.give_weapon(WeaponSlotData::new(22, 100))); // colt -> slot 2
        assert!(p.give_weapon(WeaponSlotData::new(24, 50))); // deagle -> slot 2
        assert_eq!(p.weapons[2].id, 24);
        assert!(!p.give_weapon(WeaponSlotData::new(19, 1))); // gap id
    }

    #[test]
    fn test_world_bounds_flagging() {
        let mut p = Player::default();
        p.world_bounds = Some(Vec4::new(100.0, -100.0, 50.0, -50.0));
        assert!(p.apply_synced_position(Vec3::new(0.0, 0.0, 3.0)));
        assert!(!p.out_of_bounds);
        assert!(p.apply_synced_position(Vec3::new(500.0, 0.0, 3.0)));
        assert!(p.out_of_bounds);
    }

    #[test]
    fn test_nonfinite_position_rejected() {
        let mut p = Player::default();
        assert!(!p.apply_synced_position(Vec3::new(f32::NAN, 0.0, 0.0)));
        assert_eq!(p.position, Vec3::default());
    }

    #[test]
    fn test_extensions_typed_store() {
        #[derive(PartialEq, Debug)]
        struct AdminLevel(u8);

        let mut p = Player::default();
        p.extensions.insert(AdminLevel(3));
        assert_eq!(p.extensions.get::<AdminLevel>(), Some(&AdminLevel(3)));
        p.extensions.get_mut::<AdminLevel>().unwrap().0 = 4;
        assert_eq!(p.extensions.get::<AdminLevel>().unwrap().0, 4);
        assert!(p.extensions.remove::<AdminLevel>());
        assert!(p.extensions.get::<AdminLevel>().is_none());
    }
}
