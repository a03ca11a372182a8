//! Area-of-interest streamer. Once per tick, after input processing and
//! before the outbound flush, each player's candidate set per entity
//! class is recomputed from virtual world and squared distance, diffed
//! against the previous set, and the transitions are sent as stream-in /
//! stream-out RPCs.
//!
//! Scans are slot-ascending and distance ties break on the lower slot,
//! so the emitted order is deterministic for a given world state.

use crate::events::{fire, StreamEvent, StreamKind};
use crate::player::PlayerState;
use crate::world::World;
use crowbar_netcode as netcode;
use std::collections::BTreeSet;

/// A candidate entity with its squared distance to the observer.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    slot: usize,
    distance_sq: f32,
}

/// Keep the `cap` nearest candidates, slot index breaking ties.
fn apply_cap(mut candidates: Vec<Candidate>, cap: usize) -> BTreeSet<usize> {
    if candidates.len() > cap {
        candidates.sort_by(|a, b| {
            a.distance_sq
                .partial_cmp(&b.distance_sq)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.slot.cmp(&b.slot))
        });
        candidates.truncate(cap);
    }
    candidates.into_iter().map(|c| c.slot).collect()
}

/// Whether a player is in a state where anything streams to it at all.
fn observes(state: PlayerState) -> bool {
    !matches!(state, PlayerState::None | PlayerState::Kicked)
}

pub fn run(world: &mut World) {
    let radius_sq = world.config.stream_radius * world.config.stream_radius;
    let observers = world.players.indices();

    for observer in observers {
        let Some(p) = world.players.get(observer) else {
            continue;
        };
        if !observes(p.state) {
            continue;
        }
        let pos = p.position;
        let vw = p.virtual_world;

        update_players(world, observer, pos, vw, radius_sq);
        update_vehicles(world, observer, pos, vw, radius_sq);
        update_objects(world, observer, pos, vw, radius_sq);
        update_actors(world, observer, pos, vw, radius_sq);
        update_pickups(world, observer, pos, vw, radius_sq);
        update_labels(world, observer, pos, vw, radius_sq);
    }
}

fn update_players(world: &mut World, observer: usize, pos: crowbar_types::Vec3, vw: i32, radius_sq: f32) {
    let mut candidates = Vec::new();
    for (slot, other) in world.players.entries() {
        if slot == observer || !observes(other.state) {
            continue;
        }
        if other.virtual_world != vw {
            continue;
        }
        let distance_sq = pos.distance_squared(&other.position);
        if distance_sq <= radius_sq {
            candidates.push(Candidate { slot, distance_sq });
        }
    }
    let target = apply_cap(candidates, world.config.max_streamed_players);
    let previous = world
        .players
        .get(observer)
        .map(|p| p.streamed.players.clone())
        .unwrap_or_default();

    for &slot in target.difference(&previous) {
        if let Some(msg) = player_stream_in_message(world, slot) {
            world.send_rpc(observer, &msg);
        }
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.players.insert(slot);
        }
        fire!(world, stream_in, StreamEvent {
            kind: StreamKind::Player,
            entity: slot,
            for_player: observer,
        });
    }
    for &slot in previous.difference(&target) {
        world.send_rpc(
            observer,
            &netcode::PlayerStreamOut {
                player_id: slot as u16,
            },
        );
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.players.remove(&slot);
        }
        fire!(world, stream_out, StreamEvent {
            kind: StreamKind::Player,
            entity: slot,
            for_player: observer,
        });
    }
}

fn player_stream_in_message(world: &World, slot: usize) -> Option<netcode::PlayerStreamIn> {
    let p = world.players.get(slot)?;
    Some(netcode::PlayerStreamIn {
        player_id: slot as u16,
        team: p.team,
        skin: p.skin,
        position: p.position,
        angle: p.facing_angle,
        colour: p.colour,
        fighting_style: p.fighting_style,
        skill_levels: p.skill_levels,
    })
}

fn update_vehicles(world: &mut World, observer: usize, pos: crowbar_types::Vec3, vw: i32, radius_sq: f32) {
    let mut candidates = Vec::new();
    for (slot, vehicle) in world.vehicles.entries() {
        if vehicle.virtual_world != vw {
            continue;
        }
        let distance_sq = pos.distance_squared(&vehicle.position);
        if distance_sq <= radius_sq {
            candidates.push(Candidate { slot, distance_sq });
        }
    }
    let target = apply_cap(candidates, world.config.max_streamed_vehicles);
    let previous = world
        .players
        .get(observer)
        .map(|p| p.streamed.vehicles.clone())
        .unwrap_or_default();

    for &slot in target.difference(&previous) {
        if let Some(msg) = world.vehicle_stream_in_message(slot) {
            world.send_rpc(observer, &msg);
        }
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.vehicles.insert(slot);
        }
        fire!(world, stream_in, StreamEvent {
            kind: StreamKind::Vehicle,
            entity: slot,
            for_player: observer,
        });
    }
    for &slot in previous.difference(&target) {
        world.send_rpc(
            observer,
            &netcode::StreamOutVehicle {
                vehicle_id: slot as u16,
            },
        );
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.vehicles.remove(&slot);
        }
        fire!(world, stream_out, StreamEvent {
            kind: StreamKind::Vehicle,
            entity: slot,
            for_player: observer,
        });
    }
}

fn update_objects(world: &mut World, observer: usize, pos: crowbar_types::Vec3, vw: i32, radius_sq: f32) {
    let mut candidates = Vec::new();
    for (slot, object) in world.objects.entries() {
        if object.virtual_world != vw {
            continue;
        }
        // Objects use draw distance when it exceeds the stream radius.
        let range_sq = radius_sq.max(object.draw_distance * object.draw_distance);
        let distance_sq = pos.distance_squared(&object.position);
        if distance_sq <= range_sq {
            candidates.push(Candidate { slot, distance_sq });
        }
    }
    let target = apply_cap(candidates, world.config.max_streamed_objects);
    let previous = world
        .players
        .get(observer)
        .map(|p| p.streamed.objects.clone())
        .unwrap_or_default();

    for &slot in target.difference(&previous) {
        if let Some(msg) = world.object_stream_in_message(slot) {
            world.send_rpc(observer, &msg);
        }
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.objects.insert(slot);
        }
        fire!(world, stream_in, StreamEvent {
            kind: StreamKind::Object,
            entity: slot,
            for_player: observer,
        });
    }
    for &slot in previous.difference(&target) {
        world.send_rpc(
            observer,
            &netcode::DestroyObject {
                object_id: slot as u16,
            },
        );
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.objects.remove(&slot);
        }
        fire!(world, stream_out, StreamEvent {
            kind: StreamKind::Object,
            entity: slot,
            for_player: observer,
        });
    }
}

fn update_actors(world: &mut World, observer: usize, pos: crowbar_types::Vec3, vw: i32, radius_sq: f32) {
    let mut candidates = Vec::new();
    for (slot, actor) in world.actors.entries() {
        if actor.virtual_world != vw {
            continue;
        }
        let distance_sq = pos.distance_squared(&actor.position);
        if distance_sq <= radius_sq {
            candidates.push(Candidate { slot, distance_sq });
        }
    }
    let target: BTreeSet<usize> = candidates.into_iter().map(|c| c.slot).collect();
    let previous = world
        .players
        .get(observer)
        .map(|p| p.streamed.actors.clone())
        .unwrap_or_default();

    for &slot in target.difference(&previous) {
        if let Some(msg) = world.actor_stream_in_message(slot) {
            world.send_rpc(observer, &msg);
        }
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.actors.insert(slot);
        }
        fire!(world, stream_in, StreamEvent {
            kind: StreamKind::Actor,
            entity: slot,
            for_player: observer,
        });
    }
    for &slot in previous.difference(&target) {
        world.send_rpc(
            observer,
            &netcode::HideActorForPlayer {
                actor_id: slot as u16,
            },
        );
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.actors.remove(&slot);
        }
        fire!(world, stream_out, StreamEvent {
            kind: StreamKind::Actor,
            entity: slot,
            for_player: observer,
        });
    }
}

fn update_pickups(world: &mut World, observer: usize, pos: crowbar_types::Vec3, vw: i32, radius_sq: f32) {
    let mut candidates = Vec::new();
    for (slot, pickup) in world.pickups.entries() {
        if pickup.virtual_world != vw {
            continue;
        }
        let distance_sq = pos.distance_squared(&pickup.position);
        if distance_sq <= radius_sq {
            candidates.push(Candidate { slot, distance_sq });
        }
    }
    let target: BTreeSet<usize> = candidates.into_iter().map(|c| c.slot).collect();
    let previous = world
        .players
        .get(observer)
        .map(|p| p.streamed.pickups.clone())
        .unwrap_or_default();

    for &slot in target.difference(&previous) {
        if let Some(msg) = world.pickup_stream_in_message(slot) {
            world.send_rpc(observer, &msg);
        }
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.pickups.insert(slot);
        }
        fire!(world, stream_in, StreamEvent {
            kind: StreamKind::Pickup,
            entity: slot,
            for_player: observer,
        });
    }
    for &slot in previous.difference(&target) {
        let legacy = world
            .pickups
            .get(slot)
            .map(|p| p.legacy_id)
            .unwrap_or(slot);
        world.send_rpc(
            observer,
            &netcode::PlayerDestroyPickup {
                pickup_id: legacy as i32,
            },
        );
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.pickups.remove(&slot);
        }
        fire!(world, stream_out, StreamEvent {
            kind: StreamKind::Pickup,
            entity: slot,
            for_player: observer,
        });
    }
}

fn update_labels(world: &mut World, observer: usize, pos: crowbar_types::Vec3, vw: i32, radius_sq: f32) {
    let mut candidates = Vec::new();
    for (slot, label) in world.text_labels.entries() {
        if label.virtual_world != vw {
            continue;
        }
        let range_sq = (label.draw_distance * label.draw_distance).min(radius_sq);
        let distance_sq = pos.distance_squared(&label.position);
        if distance_sq <= range_sq {
            candidates.push(Candidate { slot, distance_sq });
        }
    }
    let target: BTreeSet<usize> = candidates.into_iter().map(|c| c.slot).collect();
    let previous = world
        .players
        .get(observer)
        .map(|p| p.streamed.labels.clone())
        .unwrap_or_default();

    for &slot in target.difference(&previous) {
        if let Some(msg) = world.label_stream_in_message(slot) {
            world.send_rpc(observer, &msg);
        }
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.labels.insert(slot);
        }
        fire!(world, stream_in, StreamEvent {
            kind: StreamKind::TextLabel,
            entity: slot,
            for_player: observer,
        });
    }
    for &slot in previous.difference(&target) {
        world.send_rpc(
            observer,
            &netcode::PlayerHideTextLabel {
                per_player: false,
                label_id: slot as u16,
            },
        );
        if let Some(p) = world.players.get_mut(observer) {
            p.streamed.labels.remove(&slot);
        }
        fire!(world, stream_out, StreamEvent {
            kind: StreamKind::TextLabel,
            entity: slot,
            for_player: observer,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::transport::LoopbackTransport;
    use crate::vehicle::VehicleSpawnData;
    use crowbar_netcode::Message;
    use crowbar_types::Vec3;

    fn world_with_players(positions: &[(Vec3, i32)]) -> World {
        let mut world = World::new(ServerConfig::default(), Box::new(LoopbackTransport::new()));
        for (i, (pos, vw)) in positions.iter().enumerate() {
            world
                .transport
                .as_any_mut()
                .downcast_mut::<LoopbackTransport>()
                .unwrap()
                .connect_peer(i);
            let slot = world.players.claim_hint(i).unwrap();
            let p = world.players.get_mut(slot).unwrap();
            p.name = format!("p{}", i);
            p.state = PlayerState::OnFoot;
            p.position = *pos;
            p.virtual_world = *vw;
        }
        world
    }

    fn loopback(world: &mut World) -> &mut LoopbackTransport {
        world.transport.as_any_mut().downcast_mut().unwrap()
    }

    #[test]
    fn test_no_self_membership() {
        let mut world = world_with_players(&[(Vec3::default(), 0)]);
        run(&mut world);
        assert!(world.players.get(0).unwrap().streamed.players.is_empty());
    }

    #[test]
    fn test_nearby_same_world_streams_in() {
        let mut world =
            world_with_players(&[(Vec3::default(), 0), (Vec3::new(10.0, 0.0, 0.0), 0)]);
        run(&mut world);
        assert!(world.players.get(0).unwrap().streamed.players.contains(&1));
        assert!(world.players.get(1).unwrap().streamed.players.contains(&0));
        let t = loopback(&mut world);
        assert_eq!(t.sent_to(0, netcode::PlayerStreamIn::ID).len(), 1);
    }

    #[test]
    fn test_world_partition_blocks_streaming() {
        let mut world =
            world_with_players(&[(Vec3::default(), 0), (Vec3::new(10.0, 0.0, 0.0), 7)]);
        run(&mut world);
        assert!(world.players.get(0).unwrap().streamed.players.is_empty());
    }

    #[test]
    fn test_out_of_range_streams_out() {
        let mut world =
            world_with_players(&[(Vec3::default(), 0), (Vec3::new(10.0, 0.0, 0.0), 0)]);
        run(&mut world);
        assert!(world.players.get(0).unwrap().streamed.players.contains(&1));

        world.players.get_mut(1).unwrap().position = Vec3::new(10_000.0, 0.0, 0.0);
        run(&mut world);
        assert!(!world.players.get(0).unwrap().streamed.players.contains(&1));
        let t = loopback(&mut world);
        assert_eq!(t.sent_to(0, netcode::PlayerStreamOut::ID).len(), 1);
    }

    #[test]
    fn test_radius_monotonicity() {
        let mut world =
            world_with_players(&[(Vec3::default(), 0), (Vec3::new(150.0, 0.0, 0.0), 0)]);
        world.config.stream_radius = 100.0;
        run(&mut world);
        let small: Vec<usize> = world.players.get(0).unwrap().streamed.players.iter().copied().collect();

        world.config.stream_radius = 300.0;
        run(&mut world);
        let large: Vec<usize> = world.players.get(0).unwrap().streamed.players.iter().copied().collect();
        for slot in &small {
            assert!(large.contains(slot));
        }
        assert!(large.len() >= small.len());
    }

    #[test]
    fn test_cap_prefers_nearest() {
        let mut world = world_with_players(&[
            (Vec3::default(), 0),
            (Vec3::new(50.0, 0.0, 0.0), 0),
            (Vec3::new(20.0, 0.0, 0.0), 0),
            (Vec3::new(80.0, 0.0, 0.0), 0),
        ]);
        world.config.max_streamed_players = 2;
        run(&mut world);
        let streamed = &world.players.get(0).unwrap().streamed.players;
        assert_eq!(streamed.len(), 2);
        assert!(streamed.contains(&2)); // 20m
        assert!(streamed.contains(&1)); // 50m
        assert!(!streamed.contains(&3)); // evicted, 80m
    }

    #[test]
    fn test_cap_tie_breaks_on_slot() {
        let mut world = world_with_players(&[
            (Vec3::default(), 0),
            (Vec3::new(30.0, 0.0, 0.0), 0),
            (Vec3::new(30.0, 0.0, 0.0), 0),
        ]);
        world.config.max_streamed_players = 1;
        run(&mut world);
        let streamed = &world.players.get(0).unwrap().streamed.players;
        assert!(streamed.contains(&1));
        assert!(!streamed.contains(&2));
    }

    #[test]
    fn test_vehicle_streaming() {
        let mut world = world_with_players(&[(Vec3::default(), 0)]);
        let vid = world
            .create_vehicle(VehicleSpawnData {
                model: 411,
                position: Vec3::new(20.0, 0.0, 0.0),
                ..Default::default()
            })
            .unwrap();
        run(&mut world);
        assert!(world.players.get(0).unwrap().streamed.vehicles.contains(&vid));
        let t = loopback(&mut world);
        assert_eq!(t.sent_to(0, netcode::StreamInVehicle::ID).len(), 1);
    }

    #[test]
    fn test_pickup_stream_in_uses_legacy_id() {
        let mut world = world_with_players(&[(Vec3::default(), 0)]);
        world.create_pickup(1240, 2, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        run(&mut world);
        let t = loopback(&mut world);
        let sent = t.sent_to(0, netcode::PlayerCreatePickup::ID);
        assert_eq!(sent.len(), 1);
        let mut bs = crowbar_bitstream::BitStream::from_bytes(&sent[0].payload);
        let msg = netcode::PlayerCreatePickup::read(&mut bs).unwrap();
        assert_eq!(msg.pickup_id, 0);
        assert_eq!(msg.model, 1240);
    }

    #[test]
    fn test_stream_events_fire() {
        let mut world =
            world_with_players(&[(Vec3::default(), 0), (Vec3::new(10.0, 0.0, 0.0), 0)]);
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        world.events.stream_in.register(
            crowbar_events::HandlerPriority::Default,
            Box::new(move |_, e: &StreamEvent| {
                sink.borrow_mut().push((e.kind, e.entity, e.for_player));
            }),
        );
        run(&mut world);
        let events = seen.borrow();
        assert!(events.contains(&(StreamKind::Player, 1, 0)));
        assert!(events.contains(&(StreamKind::Player, 0, 1)));
    }
}
