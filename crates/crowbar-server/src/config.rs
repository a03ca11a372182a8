use serde::Deserialize;
use std::path::Path;

/// Server configuration, loaded from TOML. Every field has a default so a
/// missing file or a sparse one still boots a sane server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_server_name")]
    pub server_name: String,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    #[serde(default)]
    pub lan_mode: bool,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub rcon: RconConfig,
    #[serde(default)]
    pub chat_input_filter: bool,
    #[serde(default = "default_stream_radius")]
    pub stream_radius: f32,
    #[serde(default = "default_stream_rate")]
    pub max_streamed_players: usize,
    #[serde(default = "default_stream_rate")]
    pub max_streamed_vehicles: usize,
    #[serde(default = "default_stream_rate")]
    pub max_streamed_objects: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub use_zone_names: bool,
    #[serde(default)]
    pub use_player_ped_anims: bool,
    #[serde(default)]
    pub allow_interior_weapons: bool,
    #[serde(default)]
    pub use_chat_radius: bool,
    #[serde(default = "default_chat_radius")]
    pub chat_radius: f32,
    #[serde(default)]
    pub use_player_marker_draw_radius: bool,
    #[serde(default = "default_marker_radius")]
    pub player_marker_draw_radius: f32,
    #[serde(default = "default_player_marker_mode")]
    pub player_marker_mode: u32,
    #[serde(default = "default_true")]
    pub use_nametags: bool,
    #[serde(default)]
    pub use_nametag_los: bool,
    #[serde(default = "default_nametag_radius")]
    pub nametag_draw_radius: f32,
    #[serde(default = "default_true")]
    pub use_entry_exit_markers: bool,
    #[serde(default)]
    pub use_all_animations: bool,
    #[serde(default)]
    pub use_vehicle_friendly_fire: bool,
    #[serde(default)]
    pub use_manual_engine_and_lights: bool,
    #[serde(default = "default_true")]
    pub use_stunt_bonus: bool,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default)]
    pub death_drop_amount: u32,
    #[serde(default = "default_time")]
    pub time: u8,
    #[serde(default = "default_weather")]
    pub weather: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RconConfig {
    #[serde(default)]
    pub allow_teleport: bool,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    crowbar_types::DEFAULT_PORT
}

fn default_server_name() -> String {
    "Crowbar Server".into()
}

fn default_max_players() -> u32 {
    crowbar_types::DEFAULT_MAX_PLAYERS as u32
}

fn default_tick_rate() -> u32 {
    crowbar_types::DEFAULT_TICK_RATE
}

fn default_stream_radius() -> f32 {
    200.0
}

fn default_stream_rate() -> usize {
    // The client chokes well before the pool sizes do.
    200
}

fn default_chat_radius() -> f32 {
    200.0
}

fn default_marker_radius() -> f32 {
    250.0
}

fn default_player_marker_mode() -> u32 {
    1
}

fn default_nametag_radius() -> f32 {
    70.0
}

fn default_gravity() -> f32 {
    0.008
}

fn default_time() -> u8 {
    12
}

fn default_weather() -> u8 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            use_zone_names: false,
            use_player_ped_anims: false,
            allow_interior_weapons: false,
            use_chat_radius: false,
            chat_radius: default_chat_radius(),
            use_player_marker_draw_radius: false,
            player_marker_draw_radius: default_marker_radius(),
            player_marker_mode: default_player_marker_mode(),
            use_nametags: true,
            use_nametag_los: false,
            nametag_draw_radius: default_nametag_radius(),
            use_entry_exit_markers: true,
            use_all_animations: false,
            use_vehicle_friendly_fire: false,
            use_manual_engine_and_lights: false,
            use_stunt_bonus: true,
            gravity: default_gravity(),
            death_drop_amount: 0,
            time: default_time(),
            weather: default_weather(),
        }
    }
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            allow_teleport: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            server_name: default_server_name(),
            max_players: default_max_players(),
            tick_rate: default_tick_rate(),
            lan_mode: false,
            game: GameConfig::default(),
            rcon: RconConfig::default(),
            chat_input_filter: false,
            stream_radius: default_stream_radius(),
            max_streamed_players: default_stream_rate(),
            max_streamed_vehicles: default_stream_rate(),
            max_streamed_objects: default_stream_rate(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ServerConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(1000 / self.tick_rate.max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 7777);
        assert_eq!(config.tick_rate, 50);
        assert_eq!(config.tick_interval().as_millis(), 20);
        assert!(config.game.use_nametags);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            server_name = "dm server"
            max_players = 100

            [game]
            weather = 2
            use_chat_radius = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server_name, "dm server");
        assert_eq!(config.max_players, 100);
        assert_eq!(config.game.weather, 2);
        assert!(config.game.use_chat_radius);
        // Untouched sections keep defaults.
        assert_eq!(config.game.time, 12);
        assert_eq!(config.port, 7777);
    }
}
