//! Menu records. A player sees at most one menu at a time; the world
//! setter pair enforces it.

use crowbar_netcode::{MenuColumn, PlayerInitMenu};
use crowbar_types::{Vec2, MAX_MENU_ITEMS};
use std::collections::BTreeSet;

pub struct Menu {
    pub title: String,
    pub position: Vec2,
    pub two_columns: bool,
    pub column1_width: f32,
    pub column2_width: f32,
    pub columns: [MenuColumn; 2],
    pub row_enabled: [bool; MAX_MENU_ITEMS],
    pub enabled: bool,
    /// Players that received the init payload for this menu.
    pub initialized_for: BTreeSet<usize>,
}

impl Default for Menu {
    fn default() -> Self {
        Self {
            title: String::new(),
            position: Vec2::default(),
            two_columns: false,
            column1_width: 0.0,
            column2_width: 0.0,
            columns: [MenuColumn::default(), MenuColumn::default()],
            row_enabled: [true; MAX_MENU_ITEMS],
            enabled: true,
            initialized_for: BTreeSet::new(),
        }
    }
}

impl Menu {
    pub fn add_item(&mut self, column: usize, text: &str) -> Option<usize> {
        let col = self.columns.get_mut(column)?;
        if col.items.len() >= MAX_MENU_ITEMS {
            return None;
        }
        col.items.push(text.to_string());
        Some(col.items.len() - 1)
    }

    pub fn init_message(&self, menu_id: u8) -> PlayerInitMenu {
        PlayerInitMenu {
            menu_id,
            two_columns: self.two_columns,
            title: self.title.clone(),
            position: self.position,
            column1_width: self.column1_width,
            column2_width: self.column2_width,
            enabled: self.enabled,
            row_enabled: self.row_enabled,
            columns: self.columns.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_cap() {
        let mut menu = Menu::default();
        for i in 0..MAX_MENU_ITEMS {
            assert_eq!(menu.add_item(0, "row"), Some(i));
        }
        assert_eq!(menu.add_item(0, "overflow"), None);
        assert_eq!(menu.add_item(2, "bad column"), None);
    }
}
