use serde::{Deserialize, Serialize};

/// A 2D float vector (screen coordinates, zone corners, percent pairs).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 3D float vector (world positions, velocities, rotations-as-euler).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Squared distance to another point. The streamer compares against
    /// a squared radius, so the square root is never taken on hot paths.
    pub fn distance_squared(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

/// A 4D float vector (world bounds as x-max/x-min/y-max/y-min).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

/// A rotation quaternion in GTA component order (w, x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GtaQuat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl GtaQuat {
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Quaternion for a rotation of `angle` degrees around the Z axis,
    /// the only rotation the facing-angle RPCs carry.
    pub fn from_z_angle(angle: f32) -> Self {
        let half = angle.to_radians() * 0.5;
        Self {
            w: half.cos(),
            x: 0.0,
            y: 0.0,
            z: half.sin(),
        }
    }

    /// The Z-axis facing angle in degrees recovered from the quaternion.
    pub fn z_angle(&self) -> f32 {
        let siny = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny.atan2(cosy).to_degrees()
    }

    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for GtaQuat {
    fn default() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

/// An RGBA colour. The wire uses three different byte orders depending on
/// the message, so each is an explicit accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn white() -> Self {
        Self::new(0xFF, 0xFF, 0xFF, 0xFF)
    }

    pub fn from_rgba(v: u32) -> Self {
        Self {
            r: (v >> 24) as u8,
            g: (v >> 16) as u8,
            b: (v >> 8) as u8,
            a: v as u8,
        }
    }

    pub fn from_abgr(v: u32) -> Self {
        Self {
            a: (v >> 24) as u8,
            b: (v >> 16) as u8,
            g: (v >> 8) as u8,
            r: v as u8,
        }
    }

    pub fn from_argb(v: u32) -> Self {
        Self {
            a: (v >> 24) as u8,
            r: (v >> 16) as u8,
            g: (v >> 8) as u8,
            b: v as u8,
        }
    }

    pub fn rgba(&self) -> u32 {
        (self.r as u32) << 24 | (self.g as u32) << 16 | (self.b as u32) << 8 | self.a as u32
    }

    pub fn argb(&self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub fn abgr(&self) -> u32 {
        (self.a as u32) << 24 | (self.b as u32) << 16 | (self.g as u32) << 8 | self.r as u32
    }
}

/// An animation to apply to a player or actor: library, clip name, and
/// playback flags as the client expects them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Animation {
    pub library: String,
    pub name: String,
    pub delta: f32,
    pub looping: bool,
    pub lock_x: bool,
    pub lock_y: bool,
    pub freeze: bool,
    pub time: u32,
}

/// A weapon slot entry: weapon ID plus remaining ammo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeaponSlotData {
    pub id: u8,
    pub ammo: u32,
}

impl WeaponSlotData {
    pub fn new(id: u8, ammo: u32) -> Self {
        Self { id, ammo }
    }

    /// The inventory slot this weapon occupies. The mapping is fixed per
    /// weapon ID; two weapons in the same slot displace each other.
    pub fn slot(&self) -> Option<usize> {
        const SLOTS: [u8; 47] = [
            0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 10, 10, 10, 10, 10, 10, 8, 8, 8, 0xFF, 0xFF, 0xFF, 2,
            2, 2, 3, 3, 3, 4, 4, 5, 5, 4, 6, 6, 7, 7, 7, 7, 8, 12, 9, 9, 9, 11, 11, 11,
        ];
        match SLOTS.get(self.id as usize) {
            Some(&slot) if slot != 0xFF => Some(slot as usize),
            _ => None,
        }
    }

    /// Whether the weapon fires bullets (bullet sync is only valid for these).
    pub fn shootable(&self) -> bool {
        (22..=34).contains(&self.id) || self.id == 38
    }
}

/// What a player is standing on while it moves, so remote clients can
/// reproduce the carry motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfingTarget {
    #[default]
    None,
    Vehicle(u16),
    Object(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfingData {
    pub target: SurfingTarget,
    pub offset: Vec3,
}

/// Key, walk and look input state as carried by the sync packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyData {
    pub keys: u32,
    pub up_down: u16,
    pub left_right: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_byte_orders() {
        let c = Colour::new(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.rgba(), 0x11223344);
        assert_eq!(c.argb(), 0x44112233);
        assert_eq!(c.abgr(), 0x44332211);
        assert_eq!(Colour::from_rgba(0x11223344), c);
        assert_eq!(Colour::from_argb(0x44112233), c);
    }

    #[test]
    fn test_weapon_slot_mapping() {
        // Fists and brass knuckles share the hand slot.
        assert_eq!(WeaponSlotData::new(0, 0).slot(), Some(0));
        assert_eq!(WeaponSlotData::new(1, 0).slot(), Some(0));
        // Colt 45 / silenced / deagle are the pistol slot.
        assert_eq!(WeaponSlotData::new(22, 100).slot(), Some(2));
        assert_eq!(WeaponSlotData::new(24, 50).slot(), Some(2));
        // Detonator gap has no slot.
        assert_eq!(WeaponSlotData::new(19, 0).slot(), None);
        assert_eq!(WeaponSlotData::new(200, 0).slot(), None);
    }

    #[test]
    fn test_weapon_shootable_range() {
        assert!(WeaponSlotData::new(22, 1).shootable());
        assert!(WeaponSlotData::new(34, 1).shootable());
        assert!(WeaponSlotData::new(38, 1).shootable());
        assert!(!WeaponSlotData::new(35, 1).shootable());
        assert!(!WeaponSlotData::new(0, 1).shootable());
    }

    #[test]
    fn test_z_angle_roundtrip() {
        for angle in [0.0f32, 45.0, 90.0, 135.0, -90.0] {
            let q = GtaQuat::from_z_angle(angle);
            assert!((q.z_angle() - angle).abs() < 0.01, "angle {}", angle);
        }
    }

    #[test]
    fn test_distance_squared() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance_squared(&b), 25.0);
    }
}
