//! Per-player checkpoint state.

use crowbar_types::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerCheckpoint {
    pub position: Vec3,
    pub size: f32,
    pub inside: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerRaceCheckpoint {
    pub checkpoint_type: u8,
    pub position: Vec3,
    pub next_position: Vec3,
    pub size: f32,
    pub inside: bool,
}
