//! Vehicle records. Occupancy and trailer links are cross-entity
//! invariants enforced by the setter pairs in `world.rs`.

use crowbar_types::{Vec3, MAX_SEATS, MAX_VEHICLE_MODS};

/// Where and how a vehicle respawns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSpawnData {
    pub model: i32,
    pub position: Vec3,
    pub z_angle: f32,
    pub colour1: u8,
    pub colour2: u8,
    /// Seconds until respawn after death or abandonment; negative never
    /// respawns.
    pub respawn_delay: i64,
    pub interior: u8,
}

impl Default for VehicleSpawnData {
    fn default() -> Self {
        Self {
            model: 400,
            position: Vec3::default(),
            z_angle: 0.0,
            colour1: 0,
            colour2: 0,
            respawn_delay: -1,
            interior: 0,
        }
    }
}

/// The sixteen tri-state params: -1 unset, 0 off, 1 on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleParams {
    pub engine: i8,
    pub lights: i8,
    pub alarm: i8,
    pub doors: i8,
    pub bonnet: i8,
    pub boot: i8,
    pub objective: i8,
    pub siren: i8,
    pub door_driver: i8,
    pub door_passenger: i8,
    pub door_back_left: i8,
    pub door_back_right: i8,
    pub window_driver: i8,
    pub window_passenger: i8,
    pub window_back_left: i8,
    pub window_back_right: i8,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            engine: -1,
            lights: -1,
            alarm: -1,
            doors: -1,
            bonnet: -1,
            boot: -1,
            objective: -1,
            siren: -1,
            door_driver: -1,
            door_passenger: -1,
            door_back_left: -1,
            door_back_right: -1,
            window_driver: -1,
            window_passenger: -1,
            window_back_left: -1,
            window_back_right: -1,
        }
    }
}

impl VehicleParams {
    /// Wire form: one byte per field, 255 for unset.
    pub fn to_wire(&self) -> [u8; 16] {
        [
            self.engine as u8,
            self.lights as u8,
            self.alarm as u8,
            self.doors as u8,
            self.bonnet as u8,
            self.boot as u8,
            self.objective as u8,
            self.siren as u8,
            self.door_driver as u8,
            self.door_passenger as u8,
            self.door_back_left as u8,
            self.door_back_right as u8,
            self.window_driver as u8,
            self.window_passenger as u8,
            self.window_back_left as u8,
            self.window_back_right as u8,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VehicleDamage {
    pub panels: u32,
    pub doors: u32,
    pub lights: u8,
    pub tyres: u8,
}

pub struct Vehicle {
    pub spawn: VehicleSpawnData,
    pub position: Vec3,
    pub z_angle: f32,
    pub velocity: Vec3,
    pub health: f32,
    pub interior: u8,
    pub virtual_world: i32,

    pub driver: Option<usize>,
    pub passengers: [Option<usize>; MAX_SEATS - 1],
    /// Symmetric with the trailer's `cab` field.
    pub trailer: Option<usize>,
    pub cab: Option<usize>,

    pub damage: VehicleDamage,
    pub params: VehicleParams,
    pub mods: [i32; MAX_VEHICLE_MODS],
    pub paintjob: u8,
    pub body_colour1: i32,
    pub body_colour2: i32,
    pub plate: String,
    pub siren: bool,
    pub dead: bool,

    /// Tick timestamps driving the respawn policy.
    pub last_occupied_tick: u64,
    pub spawned_at_tick: u64,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            spawn: VehicleSpawnData::default(),
            position: Vec3::default(),
            z_angle: 0.0,
            velocity: Vec3::default(),
            health: 1000.0,
            interior: 0,
            virtual_world: 0,
            driver: None,
            passengers: [None; MAX_SEATS - 1],
            trailer: None,
            cab: None,
            damage: VehicleDamage::default(),
            params: VehicleParams::default(),
            mods: [0; MAX_VEHICLE_MODS],
            paintjob: 3,
            body_colour1: -1,
            body_colour2: -1,
            plate: String::new(),
            siren: false,
            dead: false,
            last_occupied_tick: 0,
            spawned_at_tick: 0,
        }
    }
}

impl Vehicle {
    pub fn from_spawn(spawn: VehicleSpawnData) -> Self {
        Self {
            position: spawn.position,
            z_angle: spawn.z_angle,
            interior: spawn.interior,
            spawn,
            ..Default::default()
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.driver.is_some() || self.passengers.iter().any(|p| p.is_some())
    }

    /// Reset to spawn state (called by the respawn timer and on death).
    pub fn respawn(&mut self, tick: u64) {
        self.position = self.spawn.position;
        self.z_angle = self.spawn.z_angle;
        self.velocity = Vec3::default();
        self.health = 1000.0;
        self.damage = VehicleDamage::default();
        self.dead = false;
        self.driver = None;
        self.passengers = [None; MAX_SEATS - 1];
        self.spawned_at_tick = tick;
        self.last_occupied_tick = tick;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_wire_form() {
        let mut params = VehicleParams::default();
        assert_eq!(params.to_wire(), [255u8; 16]);
        params.engine = 1;
        params.lights = 0;
        let wire = params.to_wire();
        assert_eq!(wire[0], 1);
        assert_eq!(wire[1], 0);
        assert_eq!(wire[2], 255);
    }

    #[test]
    fn test_respawn_restores_spawn_state() {
        let mut v = Vehicle::from_spawn(VehicleSpawnData {
            model: 411,
            position: Vec3::new(5.0, 6.0, 7.0),
            z_angle: 90.0,
            ..Default::default()
        });
        v.position = Vec3::new(100.0, 100.0, 0.0);
        v.health = 250.0;
        v.dead = true;
        v.respawn(42);
        assert_eq!(v.position, Vec3::new(5.0, 6.0, 7.0));
        assert_eq!(v.health, 1000.0);
        assert!(!v.dead);
        assert_eq!(v.spawned_at_tick, 42);
    }

    #[test]
    fn test_occupancy() {
        let mut v = Vehicle::default();
        assert!(!v.is_occupied());
        v.passengers[1] = Some(3);
        assert!(v.is_occupied());
    }
}
