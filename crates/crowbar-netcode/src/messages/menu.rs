//! Menu RPCs. Menu text is fixed-width on the wire; the second column and
//! its header only travel when the menu declares two columns.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::{BitStream, ProtocolError, ProtocolResult};
use crowbar_types::{Vec2, MAX_MENU_ITEMS, MAX_MENU_TEXT_LENGTH};

#[derive(Debug, Clone, PartialEq)]
pub struct MenuColumn {
    pub header: String,
    pub items: Vec<String>,
}

impl Default for MenuColumn {
    fn default() -> Self {
        Self {
            header: String::new(),
            items: Vec::new(),
        }
    }
}

/// Uploads a menu definition to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInitMenu {
    pub menu_id: u8,
    pub two_columns: bool,
    pub title: String,
    pub position: Vec2,
    pub column1_width: f32,
    pub column2_width: f32,
    pub enabled: bool,
    pub row_enabled: [bool; MAX_MENU_ITEMS],
    pub columns: [MenuColumn; 2],
}

impl Default for PlayerInitMenu {
    fn default() -> Self {
        Self {
            menu_id: 0,
            two_columns: false,
            title: String::new(),
            position: Vec2::default(),
            column1_width: 0.0,
            column2_width: 0.0,
            enabled: true,
            row_enabled: [true; MAX_MENU_ITEMS],
            columns: [MenuColumn::default(), MenuColumn::default()],
        }
    }
}

impl Message for PlayerInitMenu {
    const ID: u8 = 76;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u8(self.menu_id);
        bs.write_u32(self.two_columns as u32);
        bs.write_fixed_str(&self.title, MAX_MENU_TEXT_LENGTH);
        bs.write_vec2(self.position);
        bs.write_f32(self.column1_width);
        if self.two_columns {
            bs.write_f32(self.column2_width);
        }
        bs.write_u32(self.enabled as u32);
        for &row in &self.row_enabled {
            bs.write_u32(row as u32);
        }

        let first = &self.columns[0];
        bs.write_fixed_str(&first.header, MAX_MENU_TEXT_LENGTH);
        let count = first.items.len().min(MAX_MENU_ITEMS);
        bs.write_u8(count as u8);
        for item in first.items.iter().take(count) {
            bs.write_fixed_str(item, MAX_MENU_TEXT_LENGTH);
        }

        if self.two_columns {
            let second = &self.columns[1];
            bs.write_fixed_str(&second.header, MAX_MENU_TEXT_LENGTH);
            let count = second.items.len().min(MAX_MENU_ITEMS);
            bs.write_u8(count as u8);
            for item in second.items.iter().take(count) {
                bs.write_fixed_str(item, MAX_MENU_TEXT_LENGTH);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerShowMenu {
    pub menu_id: u8,
}

impl Message for PlayerShowMenu {
    const ID: u8 = 77;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            menu_id: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u8(self.menu_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerHideMenu {
    pub menu_id: u8,
}

impl Message for PlayerHideMenu {
    const ID: u8 = 78;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            menu_id: bs.read_u8()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u8(self.menu_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerSelectedMenuRow {
    pub row: u8,
}

impl Message for OnPlayerSelectedMenuRow {
    const ID: u8 = 132;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            row: bs.read_u8()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerExitedMenu;

impl Message for OnPlayerExitedMenu {
    const ID: u8 = 140;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column_size() {
        let menu = PlayerInitMenu {
            menu_id: 1,
            title: "Garage".into(),
            column1_width: 200.0,
            columns: [
                MenuColumn {
                    header: "Option".into(),
                    items: vec!["Spray".into(), "Repair".into()],
                },
                MenuColumn::default(),
            ],
            ..Default::default()
        };
        let mut bs = BitStream::new();
        menu.write(&mut bs);
        // id(1) + twocol(4) + title(32) + pos(8) + width(4) + enabled(4)
        // + rows(48) + header(32) + count(1) + 2 items(64)
        assert_eq!(bs.as_bytes().len(), 1 + 4 + 32 + 8 + 4 + 4 + 48 + 32 + 1 + 64);
    }

    #[test]
    fn test_two_column_writes_second_width() {
        let menu = PlayerInitMenu {
            menu_id: 0,
            two_columns: true,
            column1_width: 100.0,
            column2_width: 50.0,
            ..Default::default()
        };
        let mut bs = BitStream::new();
        menu.write(&mut bs);
        let one_col_len = 1 + 4 + 32 + 8 + 4 + 4 + 48 + 32 + 1;
        // Adds the second width, header and count.
        assert_eq!(bs.as_bytes().len(), one_col_len + 4 + 32 + 1);
    }

    #[test]
    fn test_selected_row_read() {
        let mut bs = BitStream::new();
        bs.write_u8(3);
        assert_eq!(OnPlayerSelectedMenuRow::read(&mut bs).unwrap().row, 3);
    }
}
