pub mod actor;
pub mod checkpoint;
pub mod class;
pub mod config;
pub mod events;
pub mod gangzone;
pub mod handlers;
pub mod menu;
pub mod object;
pub mod pickup;
pub mod player;
pub mod router;
pub mod streamer;
pub mod textdraw;
pub mod textlabel;
pub mod tick;
pub mod timers;
pub mod transport;
pub mod vehicle;
pub mod world;

pub use config::ServerConfig;
pub use world::World;
