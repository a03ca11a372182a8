//! The server context: every pool, the router, the event surface and the
//! transport handle, owned by the tick thread and passed into handlers
//! explicitly. There are no process-wide singletons here.

use crate::actor::Actor;
use crate::class::ClassList;
use crate::config::ServerConfig;
use crate::events::{fire, DisconnectEvent, GameEvents, PickupEvent, PlayerEvent};
use crate::gangzone::GangZone;
use crate::menu::Menu;
use crate::object::GameObject;
use crate::pickup::Pickup;
use crate::player::{is_name_valid, ErrorCounters, NameStatus, Player, PlayerState};
use crate::router::MessageRouter;
use crate::textdraw::TextDraw;
use crate::textlabel::TextLabel;
use crate::timers::TimerQueue;
use crate::transport::{NetworkStats, Transport, TransportEvent};
use crate::vehicle::{Vehicle, VehicleSpawnData};
use crowbar_bitstream::BitStream;
use crowbar_netcode as netcode;
use crowbar_netcode::{Message, MessageCategory};
use crowbar_pool::{LegacyIdMap, Pool};
use crowbar_types::{
    Colour, Vec3, Vec4, WeaponSlotData, ACTOR_POOL_SIZE, GANG_ZONE_POOL_SIZE,
    GLOBAL_TEXTDRAW_POOL_SIZE, MENU_POOL_SIZE, OBJECT_POOL_SIZE, PICKUP_POOL_SIZE,
    PLAYER_POOL_SIZE, TEXT_LABEL_POOL_SIZE, VEHICLE_POOL_SIZE,
};
use tracing::{debug, info, warn};

/// Serialize a message body to bytes.
pub fn encode<M: Message>(msg: &M) -> Vec<u8> {
    let mut bs = BitStream::new();
    msg.write(&mut bs);
    bs.as_bytes().to_vec()
}

pub struct World {
    pub config: ServerConfig,
    pub tick_count: u64,

    pub players: Pool<Player, PLAYER_POOL_SIZE>,
    pub vehicles: Pool<Vehicle, VEHICLE_POOL_SIZE>,
    pub objects: Pool<GameObject, OBJECT_POOL_SIZE>,
    pub pickups: Pool<Pickup, PICKUP_POOL_SIZE>,
    pub pickup_ids: LegacyIdMap<PICKUP_POOL_SIZE>,
    pub actors: Pool<Actor, ACTOR_POOL_SIZE>,
    pub text_labels: Pool<TextLabel, TEXT_LABEL_POOL_SIZE>,
    pub text_draws: Pool<TextDraw, GLOBAL_TEXTDRAW_POOL_SIZE>,
    pub gang_zones: Pool<GangZone, GANG_ZONE_POOL_SIZE>,
    pub gang_zone_ids: LegacyIdMap<GANG_ZONE_POOL_SIZE>,
    pub menus: Pool<Menu, MENU_POOL_SIZE>,
    pub classes: ClassList,

    pub events: GameEvents,
    pub router: MessageRouter,
    pub timers: TimerQueue,
    pub peer_errors: Vec<ErrorCounters>,
    /// Pickups released under lock, awaiting their destroy notification.
    pub(crate) pending_pickup_events: Vec<usize>,

    pub transport: Box<dyn Transport>,
}

impl World {
    pub fn new(config: ServerConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            config,
            tick_count: 0,
            players: Pool::new(),
            vehicles: Pool::new(),
            objects: Pool::new(),
            pickups: Pool::new(),
            pickup_ids: LegacyIdMap::new(),
            actors: Pool::new(),
            text_labels: Pool::new(),
            text_draws: Pool::new(),
            gang_zones: Pool::new(),
            gang_zone_ids: LegacyIdMap::new(),
            menus: Pool::new(),
            classes: ClassList::default(),
            events: GameEvents::default(),
            router: MessageRouter::new(),
            timers: TimerQueue::new(),
            peer_errors: vec![ErrorCounters::default(); PLAYER_POOL_SIZE],
            pending_pickup_events: Vec::new(),
            transport,
        }
    }

    // === Outbound ===

    pub fn send_rpc<M: Message>(&mut self, peer: usize, msg: &M) -> bool {
        self.transport.send_rpc(peer, M::ID, &encode(msg), M::CHANNEL)
    }

    pub fn send_packet<M: Message>(&mut self, peer: usize, msg: &M) -> bool {
        self.transport.send_packet(peer, M::ID, &encode(msg), M::CHANNEL)
    }

    pub fn broadcast_rpc<M: Message>(&mut self, msg: &M) {
        self.transport.broadcast_rpc(M::ID, &encode(msg), M::CHANNEL);
    }

    /// Send to every player that currently has `source` streamed in.
    /// Delivery is slot-ascending for determinism.
    pub fn send_rpc_to_streamers<M: Message>(&mut self, source: usize, msg: &M) {
        let payload = encode(msg);
        for peer in self.players.indices() {
            if peer == source {
                continue;
            }
            let streamed = self
                .players
                .get(peer)
                .map(|p| p.streamed.players.contains(&source))
                .unwrap_or(false);
            if streamed {
                self.transport.send_rpc(peer, M::ID, &payload, M::CHANNEL);
            }
        }
    }

    /// Packet variant of `send_rpc_to_streamers`.
    pub fn send_packet_to_streamers<M: Message>(&mut self, source: usize, msg: &M) {
        let payload = encode(msg);
        for peer in self.players.indices() {
            if peer == source {
                continue;
            }
            let streamed = self
                .players
                .get(peer)
                .map(|p| p.streamed.players.contains(&source))
                .unwrap_or(false);
            if streamed {
                self.transport.send_packet(peer, M::ID, &payload, M::CHANNEL);
            }
        }
    }

    // === Session lifecycle ===

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::IncomingConnection { peer, addr, port } => {
                debug!(peer, %addr, port, "incoming connection");
            }
            TransportEvent::PeerConnect { peer, payload } => {
                crate::router::route(self, peer, MessageCategory::Rpc, netcode::PlayerConnect::ID, &payload);
            }
            TransportEvent::PeerDisconnect { peer, reason } => {
                self.handle_peer_disconnect(peer, reason);
            }
            TransportEvent::Message {
                peer,
                category,
                id,
                payload,
            } => {
                crate::router::route(self, peer, category, id, &payload);
            }
        }
    }

    /// Finish a connect handshake: claim the player slot matching the
    /// peer ID, announce the join, and push the session bootstrap.
    pub fn complete_connect(
        &mut self,
        peer: usize,
        connect: netcode::PlayerConnect,
        is_npc: bool,
    ) -> bool {
        if !is_name_valid(&connect.name) || self.find_player_by_name(&connect.name).is_some() {
            warn!(peer, name = %connect.name, "rejecting connect with bad or taken name");
            self.kick(peer);
            return false;
        }
        let Some(slot) = self.players.claim_hint(peer) else {
            warn!(peer, "player pool exhausted");
            self.kick(peer);
            return false;
        };
        debug_assert_eq!(slot, peer, "peer IDs are player slots");

        let player = self.players.get_mut(slot).expect("just claimed");
        player.name = connect.name.clone();
        player.is_npc = is_npc;
        player.connect_data.version_number = connect.version_number;
        player.connect_data.modded = connect.modded != 0;
        player.connect_data.challenge_response = connect.challenge_response;
        player.connect_data.key = connect.key;
        player.connect_data.version_string = connect.version_string;
        player.in_class_selection = true;
        player.weather = self.config.game.weather;
        player.game_time_hour = self.config.game.time;
        let colour = player.colour;

        info!(peer, name = %connect.name, is_npc, "player connected");

        // Tell the new player about everyone already here.
        let existing: Vec<netcode::PlayerJoin> = self
            .players
            .entries()
            .filter(|(id, _)| *id != slot)
            .map(|(id, p)| netcode::PlayerJoin {
                player_id: id as u16,
                colour: p.colour,
                is_npc: p.is_npc,
                name: p.name.clone(),
            })
            .collect();
        for join in &existing {
            self.send_rpc(peer, join);
        }

        self.broadcast_rpc(&netcode::PlayerJoin {
            player_id: slot as u16,
            colour,
            is_npc,
            name: connect.name,
        });

        let init = self.build_player_init(slot);
        self.send_rpc(peer, &init);

        fire!(self, player_connect, PlayerEvent { player: slot });
        true
    }

    /// The session bootstrap payload for one player, derived from config.
    pub fn build_player_init(&self, player: usize) -> netcode::PlayerInit {
        let game = &self.config.game;
        netcode::PlayerInit {
            enable_zone_names: game.use_zone_names,
            use_player_ped_anims: game.use_player_ped_anims,
            allow_interior_weapons: game.allow_interior_weapons,
            use_limit_global_chat_radius: game.use_chat_radius,
            limit_global_chat_radius: game.chat_radius,
            enable_stunt_bonus: game.use_stunt_bonus,
            name_tag_draw_distance: game.nametag_draw_radius,
            disable_interior_enter_exits: !game.use_entry_exit_markers,
            disable_name_tag_los: !game.use_nametag_los,
            manual_vehicle_engine_and_lights: game.use_manual_engine_and_lights,
            spawns_available: self.classes.len().max(1) as u32,
            player_id: player as u16,
            show_name_tags: game.use_nametags,
            show_player_markers: game.player_marker_mode,
            world_time: game.time,
            weather: game.weather,
            gravity: game.gravity,
            lan_mode: self.config.lan_mode,
            death_drop_amount: game.death_drop_amount,
            instagib: false,
            on_foot_rate: 30,
            in_car_rate: 30,
            weapon_rate: 30,
            multiplier: 10,
            lag_compensation: 1,
            server_name: self.config.server_name.clone(),
            vehicle_models: vec![0; netcode::VEHICLE_MODEL_FLAGS],
        }
    }

    pub fn handle_peer_disconnect(&mut self, peer: usize, reason: u8) {
        if self.players.get(peer).is_none() {
            return;
        }
        let name = self.players.get(peer).map(|p| p.name.clone()).unwrap_or_default();
        info!(peer, name = %name, reason, "player disconnected");

        self.transport.cancel_pending(peer);
        self.clear_vehicle_occupancy(peer);

        // Drop the departed player from everyone's visibility.
        for other in self.players.indices() {
            if other == peer {
                continue;
            }
            if let Some(p) = self.players.get_mut(other) {
                p.streamed.players.remove(&peer);
                if p.spectate_target == Some(peer) {
                    p.spectate_target = None;
                }
            }
        }

        fire!(self, player_disconnect, DisconnectEvent { player: peer, reason });

        self.broadcast_rpc(&netcode::PlayerQuit {
            player_id: peer as u16,
            reason,
        });

        // Per-player entities (objects, draws, labels) live inside the
        // Player record and are released with the slot. Release defers
        // until unlock when a handler is mid-iteration over the pool.
        self.players.release(peer);
        self.peer_errors[peer] = ErrorCounters::default();
    }

    /// Kick a peer: session-close RPC first, then transport teardown.
    pub fn kick(&mut self, peer: usize) {
        self.send_rpc(peer, &netcode::PlayerClose);
        if let Some(player) = self.players.get_mut(peer) {
            player.state = PlayerState::Kicked;
        }
        self.handle_peer_disconnect(peer, 2);
    }

    pub fn find_player_by_name(&self, name: &str) -> Option<usize> {
        self.players
            .entries()
            .find(|(_, p)| p.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| id)
    }

    /// Rename a player, broadcasting the result on success.
    pub fn set_player_name(&mut self, peer: usize, name: &str) -> NameStatus {
        if !is_name_valid(name) {
            return NameStatus::Invalid;
        }
        match self.find_player_by_name(name) {
            Some(existing) if existing != peer => return NameStatus::Taken,
            _ => {}
        }
        let Some(player) = self.players.get_mut(peer) else {
            return NameStatus::Invalid;
        };
        player.name = name.to_string();
        self.broadcast_rpc(&netcode::SetPlayerName {
            player_id: peer as u16,
            name: name.to_string(),
            success: 1,
        });
        NameStatus::Updated
    }

    pub fn peer_stats(&self, peer: usize) -> (NetworkStats, ErrorCounters) {
        (
            self.transport.stats(peer),
            self.peer_errors.get(peer).copied().unwrap_or_default(),
        )
    }

    // === Vehicles ===

    pub fn create_vehicle(&mut self, spawn: VehicleSpawnData) -> Option<usize> {
        let id = self.vehicles.claim()?;
        let tick = self.tick_count;
        let vehicle = self.vehicles.get_mut(id).expect("just claimed");
        *vehicle = Vehicle::from_spawn(spawn);
        vehicle.spawned_at_tick = tick;
        Some(id)
    }

    pub fn destroy_vehicle(&mut self, id: usize) -> bool {
        if let Some(vehicle) = self.vehicles.get(id) {
            if let Some(driver) = vehicle.driver {
                if let Some(p) = self.players.get_mut(driver) {
                    p.vehicle_id = None;
                }
            }
            let passengers = vehicle.passengers;
            for passenger in passengers.into_iter().flatten() {
                if let Some(p) = self.players.get_mut(passenger) {
                    p.vehicle_id = None;
                }
            }
            self.detach_trailer(id);
            // Drop the trailer side if this vehicle is someone's trailer.
            if let Some(cab) = self.vehicles.get(id).and_then(|v| v.cab) {
                self.detach_trailer(cab);
            }
            for peer in self.players.indices() {
                if let Some(p) = self.players.get_mut(peer) {
                    if p.streamed.vehicles.remove(&id) {
                        self.transport.send_rpc(
                            peer,
                            netcode::StreamOutVehicle::ID,
                            &encode(&netcode::StreamOutVehicle { vehicle_id: id as u16 }),
                            netcode::StreamOutVehicle::CHANNEL,
                        );
                    }
                }
            }
            self.vehicles.release(id)
        } else {
            false
        }
    }

    /// Seat a player in a vehicle, keeping both sides of the link in
    /// step: at most one driver, and the player's state must agree.
    pub fn set_vehicle_occupant(&mut self, vehicle_id: usize, peer: usize, seat: u8) -> bool {
        let tick = self.tick_count;
        let Some(vehicle) = self.vehicles.get_mut(vehicle_id) else {
            return false;
        };
        if seat == 0 {
            match vehicle.driver {
                Some(existing) if existing != peer => return false,
                _ => vehicle.driver = Some(peer),
            }
        } else {
            let Some(slot) = vehicle.passengers.get_mut(seat as usize - 1) else {
                return false;
            };
            *slot = Some(peer);
        }
        vehicle.last_occupied_tick = tick;
        if let Some(player) = self.players.get_mut(peer) {
            player.vehicle_id = Some(vehicle_id);
            player.vehicle_seat = seat;
            player.state = if seat == 0 {
                PlayerState::Driver
            } else {
                PlayerState::Passenger
            };
        }
        true
    }

    /// Remove a player from whatever seat they hold.
    pub fn clear_vehicle_occupancy(&mut self, peer: usize) {
        let Some(vehicle_id) = self.players.get(peer).and_then(|p| p.vehicle_id) else {
            return;
        };
        if let Some(vehicle) = self.vehicles.get_mut(vehicle_id) {
            if vehicle.driver == Some(peer) {
                vehicle.driver = None;
            }
            for slot in vehicle.passengers.iter_mut() {
                if *slot == Some(peer) {
                    *slot = None;
                }
            }
        }
        if let Some(player) = self.players.get_mut(peer) {
            player.vehicle_id = None;
            player.vehicle_seat = 0;
        }
    }

    /// Attach `trailer` behind `cab`. The link is symmetric; any previous
    /// link on either side is broken first.
    pub fn attach_trailer(&mut self, cab: usize, trailer: usize) -> bool {
        if cab == trailer
            || self.vehicles.get(cab).is_none()
            || self.vehicles.get(trailer).is_none()
        {
            return false;
        }
        self.detach_trailer(cab);
        if let Some(old_cab) = self.vehicles.get(trailer).and_then(|v| v.cab) {
            self.detach_trailer(old_cab);
        }
        self.vehicles.get_mut(cab).expect("checked").trailer = Some(trailer);
        self.vehicles.get_mut(trailer).expect("checked").cab = Some(cab);
        self.broadcast_rpc(&netcode::AttachTrailer {
            trailer_id: trailer as u16,
            vehicle_id: cab as u16,
        });
        true
    }

    pub fn detach_trailer(&mut self, cab: usize) -> bool {
        let Some(trailer) = self.vehicles.get(cab).and_then(|v| v.trailer) else {
            return false;
        };
        self.vehicles.get_mut(cab).expect("checked").trailer = None;
        if let Some(t) = self.vehicles.get_mut(trailer) {
            t.cab = None;
        }
        self.broadcast_rpc(&netcode::DetachTrailer {
            vehicle_id: cab as u16,
        });
        true
    }

    /// Stream-in snapshot for a vehicle.
    pub fn vehicle_stream_in_message(&self, id: usize) -> Option<netcode::StreamInVehicle> {
        let v = self.vehicles.get(id)?;
        Some(netcode::StreamInVehicle {
            vehicle_id: id as u16,
            model: v.spawn.model,
            position: v.position,
            angle: v.z_angle,
            colour1: v.spawn.colour1,
            colour2: v.spawn.colour2,
            health: v.health,
            interior: v.interior,
            door_damage: v.damage.doors,
            panel_damage: v.damage.panels,
            light_damage: v.damage.lights,
            tyre_damage: v.damage.tyres,
            siren: v.siren as u8,
            mods: v.mods,
            paintjob: v.paintjob,
            body_colour1: v.body_colour1,
            body_colour2: v.body_colour2,
        })
    }

    // === Objects ===

    pub fn create_object(&mut self, model: i32, position: Vec3, rotation: Vec3, draw_distance: f32) -> Option<usize> {
        let id = self.objects.claim()?;
        let object = self.objects.get_mut(id).expect("just claimed");
        object.model = model;
        object.position = position;
        object.rotation = rotation;
        object.draw_distance = draw_distance;
        Some(id)
    }

    pub fn destroy_object(&mut self, id: usize) -> bool {
        if self.objects.get(id).is_none() {
            return false;
        }
        for peer in self.players.indices() {
            if let Some(p) = self.players.get_mut(peer) {
                if p.streamed.objects.remove(&id) {
                    self.transport.send_rpc(
                        peer,
                        netcode::DestroyObject::ID,
                        &encode(&netcode::DestroyObject { object_id: id as u16 }),
                        netcode::DestroyObject::CHANNEL,
                    );
                }
            }
        }
        self.objects.release(id)
    }

    pub fn object_stream_in_message(&self, id: usize) -> Option<netcode::CreateObject> {
        let o = self.objects.get(id)?;
        Some(netcode::CreateObject {
            object_id: id as u16,
            model: o.model,
            position: o.position,
            rotation: o.rotation,
            draw_distance: o.draw_distance,
            camera_collision: o.camera_collision,
            attachment: o.attachment,
            attachment_offsets: netcode::AttachmentOffsets {
                offset: o.attachment_offset,
                rotation: o.attachment_rotation,
                sync_rotation: o.attachment_sync_rotation,
            },
            materials: o.used_materials(),
        })
    }

    // === Pickups ===

    /// Create a pickup, reserving its externally visible ID.
    pub fn create_pickup(&mut self, model: i32, pickup_type: i32, position: Vec3) -> Option<usize> {
        let legacy = self.pickup_ids.reserve()?;
        let Some(slot) = self.pickups.claim() else {
            self.pickup_ids.release(legacy);
            return None;
        };
        self.pickup_ids.bind(legacy, slot);
        let pickup = self.pickups.get_mut(slot).expect("just claimed");
        pickup.model = model;
        pickup.pickup_type = pickup_type;
        pickup.position = position;
        pickup.legacy_id = legacy;
        Some(slot)
    }

    /// Destroy a pickup. Under a release-lock the entry survives until
    /// `unlock_pickup`, which fires the destruction event exactly once.
    pub fn destroy_pickup(&mut self, slot: usize) -> bool {
        let Some(pickup) = self.pickups.get(slot) else {
            return false;
        };
        let legacy = pickup.legacy_id;
        for peer in self.players.indices() {
            if let Some(p) = self.players.get_mut(peer) {
                if p.streamed.pickups.remove(&slot) {
                    self.transport.send_rpc(
                        peer,
                        netcode::PlayerDestroyPickup::ID,
                        &encode(&netcode::PlayerDestroyPickup {
                            pickup_id: legacy as i32,
                        }),
                        netcode::PlayerDestroyPickup::CHANNEL,
                    );
                }
            }
        }
        if self.pickups.release(slot) {
            self.pickup_ids.release(legacy);
            fire!(self, pickup_destroyed, PickupEvent { pickup: slot, player: None });
            true
        } else {
            // Deferred by a lock; the unlock path completes it.
            self.pending_pickup_events.push(slot);
            false
        }
    }

    /// Unlock a pickup slot, completing any deferred destruction.
    pub fn unlock_pickup(&mut self, slot: usize) {
        if self.pickups.unlock(slot) {
            if let Some(pos) = self.pending_pickup_events.iter().position(|&s| s == slot) {
                self.pending_pickup_events.remove(pos);
                if let Some(legacy) = self.pickup_ids.to_legacy(slot) {
                    self.pickup_ids.release(legacy);
                }
                fire!(self, pickup_destroyed, PickupEvent { pickup: slot, player: None });
            }
        }
    }

    pub fn pickup_stream_in_message(&self, slot: usize) -> Option<netcode::PlayerCreatePickup> {
        let p = self.pickups.get(slot)?;
        Some(netcode::PlayerCreatePickup {
            pickup_id: p.legacy_id as i32,
            model: p.model,
            pickup_type: p.pickup_type,
            position: p.position,
        })
    }

    // === Actors, labels, textdraws, zones, menus ===

    pub fn create_actor(&mut self, skin: u32, position: Vec3, angle: f32) -> Option<usize> {
        let id = self.actors.claim()?;
        let actor = self.actors.get_mut(id).expect("just claimed");
        actor.skin = skin;
        actor.position = position;
        actor.angle = angle;
        Some(id)
    }

    pub fn actor_stream_in_message(&self, id: usize) -> Option<netcode::ShowActorForPlayer> {
        let a = self.actors.get(id)?;
        Some(netcode::ShowActorForPlayer {
            actor_id: id as u16,
            skin: a.skin,
            position: a.position,
            angle: a.angle,
            health: a.health,
            invulnerable: a.invulnerable,
        })
    }

    pub fn create_text_label(
        &mut self,
        text: &str,
        colour: Colour,
        position: Vec3,
        draw_distance: f32,
    ) -> Option<usize> {
        let id = self.text_labels.claim()?;
        let label = self.text_labels.get_mut(id).expect("just claimed");
        label.text = text.to_string();
        label.colour = colour;
        label.position = position;
        label.draw_distance = draw_distance;
        Some(id)
    }

    pub fn label_stream_in_message(&self, id: usize) -> Option<netcode::PlayerShowTextLabel> {
        let l = self.text_labels.get(id)?;
        Some(netcode::PlayerShowTextLabel {
            per_player: false,
            label_id: id as u16,
            colour: l.colour,
            position: l.position,
            draw_distance: l.draw_distance,
            test_los: l.test_los,
            attached_player: l.attached_player,
            attached_vehicle: l.attached_vehicle,
            text: l.text.clone(),
        })
    }

    pub fn show_text_draw(&mut self, peer: usize, draw_id: usize) -> bool {
        let Some(msg) = self
            .text_draws
            .get(draw_id)
            .map(|d| d.show_message(false, draw_id as u16))
        else {
            return false;
        };
        if self.send_rpc(peer, &msg) {
            if let Some(draw) = self.text_draws.get_mut(draw_id) {
                draw.shown_to.insert(peer);
            }
            true
        } else {
            false
        }
    }

    pub fn hide_text_draw(&mut self, peer: usize, draw_id: usize) -> bool {
        let shown = self
            .text_draws
            .get_mut(draw_id)
            .map(|d| d.shown_to.remove(&peer))
            .unwrap_or(false);
        if shown {
            self.send_rpc(
                peer,
                &netcode::PlayerHideTextDraw {
                    per_player: false,
                    textdraw_id: draw_id as u16,
                },
            );
        }
        shown
    }

    pub fn create_gang_zone(&mut self, min: crowbar_types::Vec2, max: crowbar_types::Vec2, colour: Colour) -> Option<usize> {
        let legacy = self.gang_zone_ids.reserve()?;
        let Some(slot) = self.gang_zones.claim() else {
            self.gang_zone_ids.release(legacy);
            return None;
        };
        self.gang_zone_ids.bind(legacy, slot);
        let zone = self.gang_zones.get_mut(slot).expect("just claimed");
        zone.min = min;
        zone.max = max;
        zone.colour = colour;
        zone.legacy_id = legacy;
        Some(slot)
    }

    pub fn show_gang_zone(&mut self, peer: usize, slot: usize) -> bool {
        let Some(zone) = self.gang_zones.get(slot) else {
            return false;
        };
        let msg = netcode::ShowGangZone {
            zone_id: zone.legacy_id as u16,
            min: zone.min,
            max: zone.max,
            colour: zone.colour,
        };
        if self.send_rpc(peer, &msg) {
            if let Some(zone) = self.gang_zones.get_mut(slot) {
                zone.shown_to.insert(peer);
            }
            true
        } else {
            false
        }
    }

    pub fn hide_gang_zone(&mut self, peer: usize, slot: usize) -> bool {
        let Some(zone) = self.gang_zones.get_mut(slot) else {
            return false;
        };
        let legacy = zone.legacy_id;
        if zone.shown_to.remove(&peer) {
            zone.flashing_for.remove(&peer);
            self.send_rpc(peer, &netcode::HideGangZone { zone_id: legacy as u16 });
            true
        } else {
            false
        }
    }

    pub fn create_menu(&mut self, title: &str, position: crowbar_types::Vec2, two_columns: bool) -> Option<usize> {
        let id = self.menus.claim()?;
        let menu = self.menus.get_mut(id).expect("just claimed");
        menu.title = title.to_string();
        menu.position = position;
        menu.two_columns = two_columns;
        Some(id)
    }

    /// Show a menu; any menu already on screen for the player is hidden
    /// first, since the client renders one at a time.
    pub fn show_menu(&mut self, peer: usize, menu_id: usize) -> bool {
        if self.menus.get(menu_id).is_none() || self.players.get(peer).is_none() {
            return false;
        }
        if let Some(current) = self.players.get(peer).and_then(|p| p.shown_menu) {
            if current != menu_id {
                self.hide_menu(peer);
            }
        }
        let init = self
            .menus
            .get(menu_id)
            .map(|m| m.init_message(menu_id as u8))
            .expect("checked");
        self.send_rpc(peer, &init);
        self.send_rpc(peer, &netcode::PlayerShowMenu { menu_id: menu_id as u8 });
        if let Some(menu) = self.menus.get_mut(menu_id) {
            menu.initialized_for.insert(peer);
        }
        if let Some(player) = self.players.get_mut(peer) {
            player.shown_menu = Some(menu_id);
        }
        true
    }

    pub fn hide_menu(&mut self, peer: usize) -> bool {
        let Some(menu_id) = self.players.get(peer).and_then(|p| p.shown_menu) else {
            return false;
        };
        self.send_rpc(peer, &netcode::PlayerHideMenu { menu_id: menu_id as u8 });
        if let Some(player) = self.players.get_mut(peer) {
            player.shown_menu = None;
        }
        true
    }

    pub fn show_dialog(
        &mut self,
        peer: usize,
        dialog_id: u16,
        style: u8,
        title: &str,
        body: &str,
        first_button: &str,
        second_button: &str,
    ) -> bool {
        if self.players.get(peer).is_none() {
            return false;
        }
        let sent = self.send_rpc(
            peer,
            &netcode::ShowDialog {
                dialog_id,
                style,
                title: title.to_string(),
                first_button: first_button.to_string(),
                second_button: second_button.to_string(),
                body: body.to_string(),
            },
        );
        if sent {
            if let Some(player) = self.players.get_mut(peer) {
                player.active_dialog = Some(dialog_id);
            }
        }
        sent
    }

    // === Event-flavoured sends (append-only, never coalesced) ===

    pub fn play_sound_for_player(&mut self, peer: usize, sound_id: u32, position: Vec3) {
        self.send_rpc(peer, &netcode::PlayerPlaySound { sound_id, position });
    }

    pub fn create_explosion(&mut self, position: Vec3, explosion_type: u16, radius: f32) {
        self.broadcast_rpc(&netcode::CreateExplosion {
            position,
            explosion_type,
            radius,
        });
    }

    /// Animations replay on everyone who can see the player, plus the
    /// player itself.
    pub fn apply_player_animation(&mut self, peer: usize, animation: crowbar_types::Animation) {
        let msg = netcode::ApplyPlayerAnimation {
            player_id: peer as u16,
            animation,
        };
        self.send_rpc(peer, &msg);
        self.send_rpc_to_streamers(peer, &msg);
    }

    pub fn clear_player_animations(&mut self, peer: usize) {
        let msg = netcode::ClearPlayerAnimations {
            player_id: peer as u16,
        };
        self.send_rpc(peer, &msg);
        self.send_rpc_to_streamers(peer, &msg);
    }

    pub fn send_game_text(&mut self, peer: usize, style: u32, time: u32, text: &str) {
        self.send_rpc(
            peer,
            &netcode::SendGameText {
                style,
                time,
                text: text.to_string(),
            },
        );
    }

    // === Spectating ===

    pub fn toggle_player_spectating(&mut self, peer: usize, enable: bool) {
        let transitioned = self
            .players
            .get_mut(peer)
            .map(|p| {
                if enable {
                    let ok = p.try_transition(PlayerState::Spectating);
                    if !ok {
                        return false;
                    }
                } else {
                    p.spectate_target = None;
                }
                true
            })
            .unwrap_or(false);
        if transitioned {
            self.send_rpc(
                peer,
                &netcode::TogglePlayerSpectating {
                    enable: enable as u32,
                },
            );
        }
    }

    pub fn spectate_player(&mut self, peer: usize, target: usize, camera_mode: u8) -> bool {
        if self.players.get(target).is_none() || peer == target {
            return false;
        }
        let spectating = self
            .players
            .get(peer)
            .map(|p| p.state == PlayerState::Spectating)
            .unwrap_or(false);
        if !spectating {
            return false;
        }
        if let Some(p) = self.players.get_mut(peer) {
            p.spectate_target = Some(target);
        }
        self.send_rpc(
            peer,
            &netcode::PlayerSpectatePlayer {
                target_id: target as u16,
                camera_mode,
            },
        )
    }

    pub fn spectate_vehicle(&mut self, peer: usize, vehicle_id: usize, camera_mode: u8) -> bool {
        if self.vehicles.get(vehicle_id).is_none() {
            return false;
        }
        let spectating = self
            .players
            .get(peer)
            .map(|p| p.state == PlayerState::Spectating)
            .unwrap_or(false);
        if !spectating {
            return false;
        }
        self.send_rpc(
            peer,
            &netcode::PlayerSpectateVehicle {
                vehicle_id: vehicle_id as u16,
                camera_mode,
            },
        )
    }

    // === Player setters (coalesced) ===

    pub fn set_player_position(&mut self, peer: usize, position: Vec3) {
        if let Some(p) = self.players.get_mut(peer) {
            p.position = position;
            p.pending.position = Some(position);
            p.pending.position_find_z = None;
        }
    }

    pub fn set_player_health(&mut self, peer: usize, health: f32) {
        if let Some(p) = self.players.get_mut(peer) {
            p.health = health.clamp(0.0, 100.0);
            p.pending.health = Some(p.health);
        }
    }

    pub fn set_player_armour(&mut self, peer: usize, armour: f32) {
        if let Some(p) = self.players.get_mut(peer) {
            p.armour = armour.clamp(0.0, 100.0);
            p.pending.armour = Some(p.armour);
        }
    }

    pub fn set_player_facing_angle(&mut self, peer: usize, angle: f32) {
        if let Some(p) = self.players.get_mut(peer) {
            p.facing_angle = angle;
            p.pending.facing_angle = Some(angle);
        }
    }

    pub fn set_player_skin(&mut self, peer: usize, skin: u32) {
        if let Some(p) = self.players.get_mut(peer) {
            p.skin = skin;
            p.pending.skin = Some(skin);
        }
    }

    pub fn set_player_team(&mut self, peer: usize, team: u8) {
        if let Some(p) = self.players.get_mut(peer) {
            p.team = team;
            p.pending.team = Some(team);
        }
    }

    pub fn set_player_colour(&mut self, peer: usize, colour: Colour) {
        if let Some(p) = self.players.get_mut(peer) {
            p.colour = colour;
            p.pending.colour = Some(colour);
        }
    }

    pub fn set_player_interior(&mut self, peer: usize, interior: u8) {
        if let Some(p) = self.players.get_mut(peer) {
            p.interior = interior;
            p.pending.interior = Some(interior);
        }
    }

    pub fn set_player_virtual_world(&mut self, peer: usize, world: i32) {
        if let Some(p) = self.players.get_mut(peer) {
            p.virtual_world = world;
            p.pending.virtual_world = Some(world);
        }
    }

    pub fn set_player_world_bounds(&mut self, peer: usize, bounds: Vec4) {
        if let Some(p) = self.players.get_mut(peer) {
            p.world_bounds = Some(bounds);
            p.pending.world_bounds = Some(bounds);
        }
    }

    pub fn give_player_weapon(&mut self, peer: usize, weapon: WeaponSlotData) -> bool {
        let accepted = self
            .players
            .get_mut(peer)
            .map(|p| p.give_weapon(weapon))
            .unwrap_or(false);
        if accepted {
            self.send_rpc(
                peer,
                &netcode::GivePlayerWeapon {
                    weapon: weapon.id as u32,
                    ammo: weapon.ammo,
                },
            );
        }
        accepted
    }

    /// Flush coalesced setter state. At most one RPC per field per player
    /// leaves, carrying the final value of the tick.
    pub fn flush_pending(&mut self) {
        for peer in self.players.indices() {
            let Some(player) = self.players.get_mut(peer) else {
                continue;
            };
            let pending = std::mem::take(&mut player.pending);

            if let Some(v) = pending.position {
                self.send_rpc(peer, &netcode::SetPlayerPosition { position: v });
            }
            if let Some(v) = pending.position_find_z {
                self.send_rpc(peer, &netcode::SetPlayerPositionFindZ { position: v });
            }
            if let Some(v) = pending.facing_angle {
                self.send_rpc(peer, &netcode::SetPlayerFacingAngle { angle: v });
            }
            if let Some(v) = pending.velocity {
                self.send_rpc(peer, &netcode::SetPlayerVelocity { velocity: v });
            }
            if let Some(v) = pending.health {
                self.send_rpc(peer, &netcode::SetPlayerHealth { health: v });
            }
            if let Some(v) = pending.armour {
                self.send_rpc(peer, &netcode::SetPlayerArmour { armour: v });
            }
            if let Some(v) = pending.skin {
                self.broadcast_rpc(&netcode::SetPlayerSkin {
                    player_id: peer as u32,
                    skin: v,
                });
            }
            if let Some(v) = pending.team {
                self.broadcast_rpc(&netcode::SetPlayerTeam {
                    player_id: peer as u16,
                    team: v,
                });
            }
            if let Some(v) = pending.colour {
                self.broadcast_rpc(&netcode::SetPlayerColor {
                    player_id: peer as u16,
                    colour: v,
                });
            }
            if let Some(v) = pending.interior {
                self.send_rpc(peer, &netcode::SetPlayerInterior { interior: v });
            }
            if let Some(v) = pending.virtual_world {
                self.send_rpc(peer, &netcode::SetPlayerVirtualWorld { world: v });
            }
            if let Some(v) = pending.armed_weapon {
                self.send_rpc(peer, &netcode::SetPlayerArmedWeapon { weapon: v });
            }
            if let Some(v) = pending.special_action {
                self.send_rpc(peer, &netcode::SetPlayerSpecialAction { action: v });
            }
            if let Some(v) = pending.wanted_level {
                self.send_rpc(peer, &netcode::SetPlayerWantedLevel { level: v });
            }
            if let Some(v) = pending.fighting_style {
                self.broadcast_rpc(&netcode::SetPlayerFightingStyle {
                    player_id: peer as u16,
                    style: v,
                });
            }
            if let Some(v) = pending.drunk_level {
                self.send_rpc(peer, &netcode::SetPlayerDrunkLevel { level: v });
            }
            if let Some(v) = pending.weather {
                self.send_rpc(peer, &netcode::SetPlayerWeather { weather: v });
            }
            if let Some(v) = pending.world_time {
                self.send_rpc(peer, &netcode::SetPlayerWorldTime { hours: v });
            }
            if let Some(v) = pending.gravity {
                self.send_rpc(peer, &netcode::SetPlayerGravity { gravity: v });
            }
            if let Some(v) = pending.controllable {
                self.send_rpc(
                    peer,
                    &netcode::TogglePlayerControllable { enable: v as u8 },
                );
            }
            if let Some(v) = pending.world_bounds {
                self.send_rpc(peer, &netcode::SetWorldBounds { coords: v });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackTransport;

    fn test_world() -> World {
        World::new(
            ServerConfig::default(),
            Box::new(LoopbackTransport::new()),
        )
    }

    fn loopback(world: &mut World) -> &mut LoopbackTransport {
        world
            .transport
            .as_any_mut()
            .downcast_mut()
            .expect("tests run on the loopback transport")
    }

    fn connect_peer(world: &mut World, peer: usize, name: &str) {
        loopback(world).connect_peer(peer);
        assert!(world.complete_connect(
            peer,
            netcode::PlayerConnect {
                version_number: 0x0FFFFFFF,
                name: name.into(),
                ..Default::default()
            },
            false,
        ));
    }

    #[test]
    fn test_connect_allocates_peer_slot() {
        let mut world = test_world();
        connect_peer(&mut world, 0, "Alice");
        assert!(world.players.get(0).is_some());
        assert_eq!(world.players.get(0).unwrap().name, "Alice");
        assert!(world.players.get(0).unwrap().in_class_selection);
    }

    #[test]
    fn test_connect_broadcasts_join_and_init() {
        let mut world = test_world();
        connect_peer(&mut world, 0, "Alice");
        let t = loopback(&mut world);
        assert_eq!(t.sent_to(0, netcode::PlayerJoin::ID).len(), 1);
        assert_eq!(t.sent_to(0, netcode::PlayerInit::ID).len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut world = test_world();
        connect_peer(&mut world, 0, "Alice");
        loopback(&mut world).connect_peer(1);
        let accepted = world.complete_connect(
            1,
            netcode::PlayerConnect {
                name: "alice".into(), // case-insensitive clash
                ..Default::default()
            },
            false,
        );
        assert!(!accepted);
        assert!(world.players.get(1).is_none());
    }

    #[test]
    fn test_set_player_name_statuses() {
        let mut world = test_world();
        connect_peer(&mut world, 0, "Alice");
        connect_peer(&mut world, 1, "Bob");
        assert_eq!(world.set_player_name(1, "Alice"), NameStatus::Taken);
        assert_eq!(world.set_player_name(1, "has space"), NameStatus::Invalid);
        assert_eq!(world.set_player_name(1, "Robert"), NameStatus::Updated);
        assert_eq!(world.players.get(1).unwrap().name, "Robert");
    }

    #[test]
    fn test_disconnect_releases_and_announces() {
        let mut world = test_world();
        connect_peer(&mut world, 0, "Alice");
        connect_peer(&mut world, 1, "Bob");
        loopback(&mut world).drain();

        world.handle_peer_disconnect(0, 1);
        assert!(world.players.get(0).is_none());
        let t = loopback(&mut world);
        assert_eq!(t.sent_to(1, netcode::PlayerQuit::ID).len(), 1);
    }

    #[test]
    fn test_vehicle_occupancy_invariant() {
        let mut world = test_world();
        connect_peer(&mut world, 0, "Alice");
        let vid = world.create_vehicle(VehicleSpawnData::default()).unwrap();

        assert!(world.set_vehicle_occupant(vid, 0, 0));
        assert_eq!(world.vehicles.get(vid).unwrap().driver, Some(0));
        let p = world.players.get(0).unwrap();
        assert_eq!(p.vehicle_id, Some(vid));
        assert_eq!(p.state, PlayerState::Driver);

        // A second driver is refused while the seat is held.
        connect_peer(&mut world, 1, "Bob");
        assert!(!world.set_vehicle_occupant(vid, 1, 0));

        world.clear_vehicle_occupancy(0);
        assert_eq!(world.vehicles.get(vid).unwrap().driver, None);
        assert_eq!(world.players.get(0).unwrap().vehicle_id, None);
    }

    #[test]
    fn test_trailer_link_symmetry() {
        let mut world = test_world();
        let cab = world.create_vehicle(VehicleSpawnData::default()).unwrap();
        let trailer = world.create_vehicle(VehicleSpawnData::default()).unwrap();
        assert!(world.attach_trailer(cab, trailer));
        assert_eq!(world.vehicles.get(cab).unwrap().trailer, Some(trailer));
        assert_eq!(world.vehicles.get(trailer).unwrap().cab, Some(cab));

        // Re-attaching to a new cab breaks the old link on both sides.
        let cab2 = world.create_vehicle(VehicleSpawnData::default()).unwrap();
        assert!(world.attach_trailer(cab2, trailer));
        assert_eq!(world.vehicles.get(cab).unwrap().trailer, None);
        assert_eq!(world.vehicles.get(trailer).unwrap().cab, Some(cab2));

        assert!(world.detach_trailer(cab2));
        assert_eq!(world.vehicles.get(trailer).unwrap().cab, None);
    }

    #[test]
    fn test_trailer_self_link_refused() {
        let mut world = test_world();
        let cab = world.create_vehicle(VehicleSpawnData::default()).unwrap();
        assert!(!world.attach_trailer(cab, cab));
    }

    #[test]
    fn test_pickup_legacy_ids() {
        let mut world = test_world();
        let a = world.create_pickup(1240, 2, Vec3::default()).unwrap();
        let b = world.create_pickup(1242, 2, Vec3::default()).unwrap();
        assert_eq!(world.pickups.get(a).unwrap().legacy_id, 0);
        assert_eq!(world.pickups.get(b).unwrap().legacy_id, 1);
        assert!(world.destroy_pickup(a));
        // Freed legacy ID is reused densely.
        let c = world.create_pickup(1254, 2, Vec3::default()).unwrap();
        assert_eq!(world.pickups.get(c).unwrap().legacy_id, 0);
    }

    #[test]
    fn test_pickup_destroy_under_lock_defers_event() {
        let mut world = test_world();
        let slot = world.create_pickup(1240, 2, Vec3::default()).unwrap();

        let observed = std::rc::Rc::new(std::cell::Cell::new(0u32));
        let seen = observed.clone();
        world
            .events
            .pickup_destroyed
            .register(crowbar_events::HandlerPriority::Default, Box::new(move |_, _| {
                seen.set(seen.get() + 1);
            }));

        world.pickups.lock(slot);
        assert!(!world.destroy_pickup(slot));
        // Entry is still readable mid-iteration and no event fired yet.
        assert!(world.pickups.get(slot).is_some());
        assert_eq!(observed.get(), 0);

        world.unlock_pickup(slot);
        assert!(world.pickups.get(slot).is_none());
        assert_eq!(observed.get(), 1);

        // A second unlock does not re-fire.
        world.unlock_pickup(slot);
        assert_eq!(observed.get(), 1);
    }

    #[test]
    fn test_setters_coalesce_to_final_value() {
        let mut world = test_world();
        connect_peer(&mut world, 0, "Alice");
        loopback(&mut world).drain();

        world.set_player_health(0, 50.0);
        world.set_player_health(0, 75.0);
        world.set_player_position(0, Vec3::new(1.0, 1.0, 1.0));
        world.flush_pending();

        let t = loopback(&mut world);
        let health = t.sent_to(0, netcode::SetPlayerHealth::ID);
        assert_eq!(health.len(), 1);
        let mut bs = BitStream::from_bytes(&health[0].payload);
        assert_eq!(bs.read_f32().unwrap(), 75.0);
        assert_eq!(t.sent_to(0, netcode::SetPlayerPosition::ID).len(), 1);

        // Nothing further goes out next tick.
        t.drain();
        world.flush_pending();
        assert!(loopback(&mut world).sent.is_empty());
    }

    #[test]
    fn test_menu_exclusivity() {
        let mut world = test_world();
        connect_peer(&mut world, 0, "Alice");
        let m1 = world.create_menu("one", crowbar_types::Vec2::default(), false).unwrap();
        let m2 = world.create_menu("two", crowbar_types::Vec2::default(), false).unwrap();
        assert!(world.show_menu(0, m1));
        loopback(&mut world).drain();
        assert!(world.show_menu(0, m2));
        // The first menu is hidden before the second shows.
        let t = loopback(&mut world);
        assert_eq!(t.sent_to(0, netcode::PlayerHideMenu::ID).len(), 1);
        assert_eq!(world.players.get(0).unwrap().shown_menu, Some(m2));
    }

    #[test]
    fn test_capacity_exhaustion_returns_none() {
        let mut world = test_world();
        for _ in 0..MENU_POOL_SIZE {
            assert!(world.create_menu("m", crowbar_types::Vec2::default(), false).is_some());
        }
        assert!(world.create_menu("m", crowbar_types::Vec2::default(), false).is_none());
    }
}
