//! 3D text label records, global and per-player.

use crowbar_types::{Colour, Vec3, INVALID_PLAYER_ID, INVALID_VEHICLE_ID};

pub struct TextLabel {
    pub text: String,
    pub colour: Colour,
    pub position: Vec3,
    pub draw_distance: f32,
    pub test_los: bool,
    pub virtual_world: i32,
    pub attached_player: u16,
    pub attached_vehicle: u16,
}

impl Default for TextLabel {
    fn default() -> Self {
        Self {
            text: String::new(),
            colour: Colour::white(),
            position: Vec3::default(),
            draw_distance: 50.0,
            test_los: true,
            virtual_world: 0,
            attached_player: INVALID_PLAYER_ID,
            attached_vehicle: INVALID_VEHICLE_ID,
        }
    }
}

impl TextLabel {
    pub fn is_attached(&self) -> bool {
        self.attached_player != INVALID_PLAYER_ID || self.attached_vehicle != INVALID_VEHICLE_ID
    }
}
