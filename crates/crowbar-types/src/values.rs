//! Protocol-wide limits and sentinel IDs. The client hardcodes the same
//! values; changing any of them breaks wire compatibility.

pub const MAX_SEATS: usize = 4;

pub const PLAYER_POOL_SIZE: usize = 1000;
pub const VEHICLE_POOL_SIZE: usize = 2000;
pub const OBJECT_POOL_SIZE: usize = 1000;
pub const PICKUP_POOL_SIZE: usize = 4096;
pub const ACTOR_POOL_SIZE: usize = 1000;
pub const TEXT_LABEL_POOL_SIZE: usize = 1024;
pub const GLOBAL_TEXTDRAW_POOL_SIZE: usize = 2048;
pub const PLAYER_TEXTDRAW_POOL_SIZE: usize = 256;
pub const GANG_ZONE_POOL_SIZE: usize = 1024;
pub const MENU_POOL_SIZE: usize = 128;
pub const CLASS_POOL_SIZE: usize = 320;

pub const MAX_WEAPON_SLOTS: usize = 13;
pub const MAX_PLAYER_NAME: usize = 24;
pub const MAX_ATTACHED_OBJECT_SLOTS: usize = 10;
pub const MAX_OBJECT_MATERIAL_SLOTS: usize = 16;
pub const MAX_PLAYER_MAP_ICONS: usize = 100;
pub const MAX_MENU_ITEMS: usize = 12;
pub const MAX_MENU_TEXT_LENGTH: usize = 32;
pub const MAX_VEHICLE_MODS: usize = 14;
pub const MAX_SKILL_LEVELS: usize = 11;

pub const INVALID_PLAYER_ID: u16 = 0xFFFF;
pub const INVALID_VEHICLE_ID: u16 = 0xFFFF;
pub const INVALID_OBJECT_ID: u16 = 0xFFFF;
pub const INVALID_ACTOR_ID: u16 = 0xFFFF;
pub const INVALID_TEXTDRAW_ID: u16 = 0xFFFF;
pub const INVALID_WEAPON_SLOT: u8 = 0xFF;

pub const DEFAULT_MAX_PLAYERS: usize = 50;
pub const DEFAULT_PORT: u16 = 7777;
pub const DEFAULT_TICK_RATE: u32 = 50;

/// Train carriage models: tracked server-side, never stream-in emitted
/// (the client materializes carriages with the towing train).
pub const TRAIN_CARRIAGE_MODELS: [i32; 2] = [569, 570];

pub fn is_train_carriage(model: i32) -> bool {
    TRAIN_CARRIAGE_MODELS.contains(&model)
}
