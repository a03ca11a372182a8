//! Textdraw records, shared between the global pool and the per-player
//! pools hanging off each `Player`.

use crowbar_netcode::PlayerShowTextDraw;
use crowbar_types::{Colour, Vec2, Vec3};
use std::collections::BTreeSet;

pub struct TextDraw {
    pub text: String,
    pub position: Vec2,
    pub letter_size: Vec2,
    pub letter_colour: Colour,
    pub text_size: Vec2,
    pub use_box: bool,
    pub box_colour: Colour,
    pub shadow: u8,
    pub outline: u8,
    pub back_colour: Colour,
    pub alignment: u8,
    pub proportional: bool,
    pub style: u8,
    pub selectable: bool,
    pub preview_model: u16,
    pub preview_rotation: Vec3,
    pub preview_zoom: f32,
    pub preview_colour1: i16,
    pub preview_colour2: i16,
    /// Players the draw is currently shown to (global draws only).
    pub shown_to: BTreeSet<usize>,
}

impl Default for TextDraw {
    fn default() -> Self {
        Self {
            text: String::new(),
            position: Vec2::default(),
            letter_size: Vec2::new(1.0, 1.0),
            letter_colour: Colour::white(),
            text_size: Vec2::default(),
            use_box: false,
            box_colour: Colour::new(0, 0, 0, 0x80),
            shadow: 2,
            outline: 0,
            back_colour: Colour::new(0, 0, 0, 0xFF),
            alignment: 1,
            proportional: true,
            style: 1,
            selectable: false,
            preview_model: 0,
            preview_rotation: Vec3::default(),
            preview_zoom: 1.0,
            preview_colour1: -1,
            preview_colour2: -1,
            shown_to: BTreeSet::new(),
        }
    }
}

impl TextDraw {
    /// Build the show message for this draw under the given wire identity.
    pub fn show_message(&self, per_player: bool, id: u16) -> PlayerShowTextDraw {
        PlayerShowTextDraw {
            per_player,
            textdraw_id: id,
            use_box: self.use_box,
            alignment: self.alignment,
            proportional: self.proportional,
            letter_size: self.letter_size,
            letter_colour: self.letter_colour,
            text_size: self.text_size,
            box_colour: self.box_colour,
            shadow: self.shadow,
            outline: self.outline,
            back_colour: self.back_colour,
            style: self.style,
            selectable: self.selectable,
            position: self.position,
            model: self.preview_model,
            rotation: self.preview_rotation,
            zoom: self.preview_zoom,
            colour1: self.preview_colour1,
            colour2: self.preview_colour2,
            text: self.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_message_carries_state() {
        let draw = TextDraw {
            text: "~g~$500".into(),
            use_box: true,
            alignment: 3,
            ..Default::default()
        };
        let msg = draw.show_message(true, 7);
        assert!(msg.per_player);
        assert_eq!(msg.textdraw_id, 7);
        assert!(msg.use_box);
        assert_eq!(msg.alignment, 3);
        assert_eq!(msg.text, "~g~$500");
    }
}
