pub mod actor;
pub mod checkpoint;
pub mod class;
pub mod console;
pub mod dialog;
pub mod gangzone;
pub mod menu;
pub mod object;
pub mod pickup;
pub mod player;
pub mod session;
pub mod sync;
pub mod textdraw;
pub mod textlabel;
pub mod vehicle;

pub use actor::*;
pub use checkpoint::*;
pub use class::*;
pub use console::*;
pub use dialog::*;
pub use gangzone::*;
pub use menu::*;
pub use object::*;
pub use pickup::*;
pub use player::*;
pub use session::*;
pub use sync::*;
pub use textdraw::*;
pub use textlabel::*;
pub use vehicle::*;
