//! Object records: global pool entries and the per-player variant.

use crowbar_netcode::{ObjectAttachment, ObjectMaterial};
use crowbar_types::{Vec3, MAX_OBJECT_MATERIAL_SLOTS};

/// In-flight interpolation state for a moving object.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ObjectMoveData {
    pub moving: bool,
    pub target_position: Vec3,
    pub target_rotation: Vec3,
    pub speed: f32,
}

pub struct GameObject {
    pub model: i32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub draw_distance: f32,
    pub camera_collision: bool,
    pub virtual_world: i32,
    pub movement: ObjectMoveData,
    pub attachment: ObjectAttachment,
    pub attachment_offset: Vec3,
    pub attachment_rotation: Vec3,
    pub attachment_sync_rotation: bool,
    /// Sparse material overrides; slot index is the array position.
    pub materials: Vec<Option<ObjectMaterial>>,
}

impl Default for GameObject {
    fn default() -> Self {
        Self {
            model: 0,
            position: Vec3::default(),
            rotation: Vec3::default(),
            draw_distance: 0.0,
            camera_collision: true,
            virtual_world: 0,
            movement: ObjectMoveData::default(),
            attachment: ObjectAttachment::None,
            attachment_offset: Vec3::default(),
            attachment_rotation: Vec3::default(),
            attachment_sync_rotation: false,
            materials: vec![None; MAX_OBJECT_MATERIAL_SLOTS],
        }
    }
}

impl GameObject {
    pub fn set_material(&mut self, slot: usize, material: ObjectMaterial) -> bool {
        if slot >= MAX_OBJECT_MATERIAL_SLOTS {
            return false;
        }
        self.materials[slot] = Some(material);
        true
    }

    /// Used material slots in ascending order, as the create payload
    /// sends them.
    pub fn used_materials(&self) -> Vec<(u8, ObjectMaterial)> {
        self.materials
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.clone().map(|m| (i as u8, m)))
            .collect()
    }

    pub fn begin_move(&mut self, target_position: Vec3, target_rotation: Vec3, speed: f32) {
        self.movement = ObjectMoveData {
            moving: true,
            target_position,
            target_rotation,
            speed,
        };
    }

    /// Stop moving; the object lands on its target.
    pub fn stop_move(&mut self) {
        if self.movement.moving {
            self.position = self.movement.target_position;
            self.rotation = self.movement.target_rotation;
            self.movement.moving = false;
        }
    }
}

/// Per-player object: the same record plus its owner-visible lifetime.
#[derive(Default)]
pub struct PlayerObject {
    pub object: GameObject,
    /// Attached to the owning player rather than the world.
    pub attached_to_owner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_slots_sparse() {
        let mut o = GameObject::default();
        assert!(o.set_material(
            2,
            ObjectMaterial::Default {
                model: 18646,
                txd: "a".into(),
                texture: "b".into(),
                colour: Default::default(),
            }
        ));
        assert!(!o.set_material(MAX_OBJECT_MATERIAL_SLOTS, ObjectMaterial::Default {
            model: 0,
            txd: String::new(),
            texture: String::new(),
            colour: Default::default(),
        }));
        let used = o.used_materials();
        assert_eq!(used.len(), 1);
        assert_eq!(used[0].0, 2);
    }

    #[test]
    fn test_stop_move_lands_on_target() {
        let mut o = GameObject::default();
        o.begin_move(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 90.0), 2.0);
        assert!(o.movement.moving);
        o.stop_move();
        assert!(!o.movement.moving);
        assert_eq!(o.position, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(o.rotation, Vec3::new(0.0, 0.0, 90.0));
    }
}
