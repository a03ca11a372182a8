//! Gang zone records: a coloured rectangle per zone plus per-player
//! shown/flash state. The pool pairs with a legacy ID map.

use crowbar_types::{Colour, Vec2};
use std::collections::BTreeSet;

pub struct GangZone {
    pub min: Vec2,
    pub max: Vec2,
    pub colour: Colour,
    pub flash_colour: Colour,
    pub legacy_id: usize,
    pub shown_to: BTreeSet<usize>,
    pub flashing_for: BTreeSet<usize>,
}

impl Default for GangZone {
    fn default() -> Self {
        Self {
            min: Vec2::default(),
            max: Vec2::default(),
            colour: Colour::default(),
            flash_colour: Colour::default(),
            legacy_id: 0,
            shown_to: BTreeSet::new(),
            flashing_for: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_flash_state() {
        let mut zone = GangZone {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(100.0, 100.0),
            ..Default::default()
        };
        zone.shown_to.insert(3);
        zone.flashing_for.insert(3);
        zone.shown_to.remove(&3);
        zone.flashing_for.remove(&3);
        assert!(zone.shown_to.is_empty());
        assert!(zone.flashing_for.is_empty());
    }
}
