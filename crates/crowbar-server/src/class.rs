//! Spawn class catalog used during class selection.

use crowbar_netcode::PlayerRequestClassResponse;
use crowbar_types::{Vec3, WeaponSlotData};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerClass {
    pub team: u8,
    pub skin: u32,
    pub spawn: Vec3,
    pub z_angle: f32,
    pub weapons: [WeaponSlotData; 3],
}

impl Default for PlayerClass {
    fn default() -> Self {
        Self {
            team: 0,
            skin: 0,
            spawn: Vec3::default(),
            z_angle: 0.0,
            weapons: [WeaponSlotData::default(); 3],
        }
    }
}

impl PlayerClass {
    pub fn response(&self) -> PlayerRequestClassResponse {
        PlayerRequestClassResponse {
            selectable: 1,
            team: self.team,
            model: self.skin,
            unknown1: 0,
            spawn: self.spawn,
            z_angle: self.z_angle,
            weapons: [
                self.weapons[0].id as u32,
                self.weapons[1].id as u32,
                self.weapons[2].id as u32,
            ],
            ammos: [
                self.weapons[0].ammo,
                self.weapons[1].ammo,
                self.weapons[2].ammo,
            ],
        }
    }
}

/// Ordered class list; requests index it modulo its length so clients can
/// cycle freely.
#[derive(Default)]
pub struct ClassList {
    classes: Vec<PlayerClass>,
}

impl ClassList {
    pub fn add(&mut self, class: PlayerClass) -> usize {
        self.classes.push(class);
        self.classes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The class for a raw request index; an empty list yields the
    /// implicit default class 0.
    pub fn select(&self, requested: usize) -> (usize, PlayerClass) {
        if self.classes.is_empty() {
            return (0, PlayerClass::default());
        }
        let index = requested % self.classes.len();
        (index, self.classes[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_wraps() {
        let mut list = ClassList::default();
        list.add(PlayerClass {
            skin: 100,
            ..Default::default()
        });
        list.add(PlayerClass {
            skin: 101,
            ..Default::default()
        });
        assert_eq!(list.select(0).1.skin, 100);
        assert_eq!(list.select(3).1.skin, 101);
        assert_eq!(list.select(3).0, 1);
    }

    #[test]
    fn test_empty_list_defaults() {
        let list = ClassList::default();
        let (index, class) = list.select(7);
        assert_eq!(index, 0);
        assert_eq!(class.skin, 0);
    }

    #[test]
    fn test_response_carries_weapons() {
        let class = PlayerClass {
            team: 2,
            skin: 101,
            weapons: [
                WeaponSlotData::new(24, 100),
                WeaponSlotData::new(31, 500),
                WeaponSlotData::default(),
            ],
            ..Default::default()
        };
        let resp = class.response();
        assert_eq!(resp.selectable, 1);
        assert_eq!(resp.model, 101);
        assert_eq!(resp.weapons, [24, 31, 0]);
        assert_eq!(resp.ammos, [100, 500, 0]);
    }
}
