//! Actor (static scripted ped) records.

use crowbar_types::{Animation, Vec3};

pub struct Actor {
    pub skin: u32,
    pub position: Vec3,
    pub angle: f32,
    pub health: f32,
    pub invulnerable: bool,
    pub virtual_world: i32,
    pub animation: Option<Animation>,
}

impl Default for Actor {
    fn default() -> Self {
        Self {
            skin: 0,
            position: Vec3::default(),
            angle: 0.0,
            health: 100.0,
            invulnerable: true,
            virtual_world: 0,
            animation: None,
        }
    }
}
