//! Pickup records. The pool pairs with a legacy ID map because scripts
//! address pickups through a dense external ID space.

use crowbar_types::Vec3;

pub struct Pickup {
    pub model: i32,
    pub pickup_type: i32,
    pub position: Vec3,
    pub virtual_world: i32,
    /// Externally visible ID bound in the legacy map.
    pub legacy_id: usize,
    /// One-shot pickups despawn after first pickup.
    pub respawnable: bool,
}

impl Default for Pickup {
    fn default() -> Self {
        Self {
            model: 0,
            pickup_type: 0,
            position: Vec3::default(),
            virtual_world: 0,
            legacy_id: 0,
            respawnable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowbar_pool::{LegacyIdMap, Pool};
    use crowbar_types::PICKUP_POOL_SIZE;

    #[test]
    fn test_pool_and_legacy_map_pair() {
        let mut pool: Pool<Pickup, PICKUP_POOL_SIZE> = Pool::new();
        let mut map: LegacyIdMap<PICKUP_POOL_SIZE> = LegacyIdMap::new();

        let legacy = map.reserve().unwrap();
        let slot = pool.claim().unwrap();
        map.bind(legacy, slot);
        pool.get_mut(slot).unwrap().legacy_id = legacy;

        assert_eq!(map.to_internal(legacy), Some(slot));
        assert_eq!(map.to_legacy(slot), Some(legacy));

        map.release(legacy);
        pool.release(slot);
        assert!(pool.get(slot).is_none());
        assert_eq!(map.to_internal(legacy), None);
    }
}
