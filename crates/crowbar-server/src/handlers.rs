//! Stock message handlers: the session, class-selection, chat, vehicle
//! and sync flows. Registered at default priority so filter handlers
//! (ACLs, anti-cheat) can pre-empt them from a higher one.

use crate::events::{
    fire, fire_filter, ClickMapEvent, DamageEvent, DeathEvent, DialogResponseEvent, PlayerEvent,
    StateChangeEvent, TextEvent, VehicleEvent,
};
use crate::player::PlayerState;
use crate::router::{note_illegal_state, note_veto, read_or_drop};
use crate::world::World;
use crowbar_bitstream::BitStream;
use crowbar_events::HandlerPriority;
use crowbar_netcode as netcode;
use crowbar_netcode::Message;
use crowbar_types::{KeyData, SurfingTarget, Vec2, WeaponSlotData};
use tracing::debug;

/// Register the stock handler set on a fresh world.
pub fn register(world: &mut World) {
    let r = &mut world.router;
    r.on_rpc(netcode::PlayerConnect::ID, HandlerPriority::Default, on_player_connect);
    r.on_rpc(netcode::NpcConnect::ID, HandlerPriority::Default, on_npc_connect);
    r.on_rpc(netcode::PlayerRequestClass::ID, HandlerPriority::Default, on_request_class);
    r.on_rpc(netcode::PlayerRequestSpawn::ID, HandlerPriority::Default, on_request_spawn);
    r.on_rpc(netcode::PlayerSpawn::ID, HandlerPriority::Default, on_player_spawn);
    r.on_rpc(netcode::PlayerRequestChatMessage::ID, HandlerPriority::Default, on_chat_message);
    r.on_rpc(netcode::PlayerRequestCommandMessage::ID, HandlerPriority::Default, on_command_message);
    r.on_rpc(netcode::OnPlayerEnterVehicle::ID, HandlerPriority::Default, on_enter_vehicle);
    r.on_rpc(netcode::OnPlayerExitVehicle::ID, HandlerPriority::Default, on_exit_vehicle);
    r.on_rpc(netcode::OnPlayerDeath::ID, HandlerPriority::Default, on_player_death);
    r.on_rpc(netcode::OnPlayerGiveTakeDamage::ID, HandlerPriority::Default, on_give_take_damage);
    r.on_rpc(netcode::OnPlayerDialogResponse::ID, HandlerPriority::Default, on_dialog_response);
    r.on_rpc(netcode::OnPlayerPickUpPickup::ID, HandlerPriority::Default, on_pickup_pickup);
    r.on_rpc(netcode::OnPlayerInteriorChange::ID, HandlerPriority::Default, on_interior_change);
    r.on_rpc(netcode::OnPlayerClickMap::ID, HandlerPriority::Default, on_click_map);
    r.on_rpc(netcode::OnPlayerCameraTarget::ID, HandlerPriority::Default, on_camera_target);
    r.on_rpc(netcode::VehicleDeath::ID, HandlerPriority::Default, on_vehicle_death);
    r.on_rpc(netcode::ScmEvent::ID, HandlerPriority::Default, on_scm_event);
    r.on_rpc(netcode::OnPlayerSelectedMenuRow::ID, HandlerPriority::Default, on_menu_row);
    r.on_rpc(netcode::OnPlayerExitedMenu::ID, HandlerPriority::Default, on_menu_exit);
    r.on_rpc(netcode::OnPlayerRequestScoresAndPings::ID, HandlerPriority::Default, on_scores_request);

    r.on_packet(netcode::PlayerFootSync::ID, HandlerPriority::Default, on_foot_sync);
    r.on_packet(netcode::PlayerVehicleSync::ID, HandlerPriority::Default, on_vehicle_sync);
    r.on_packet(netcode::PlayerPassengerSync::ID, HandlerPriority::Default, on_passenger_sync);
    r.on_packet(netcode::PlayerAimSync::ID, HandlerPriority::Default, on_aim_sync);
    r.on_packet(netcode::PlayerBulletSync::ID, HandlerPriority::Default, on_bullet_sync);
    r.on_packet(netcode::PlayerStatsSync::ID, HandlerPriority::Default, on_stats_sync);
    r.on_packet(netcode::PlayerWeaponsUpdate::ID, HandlerPriority::Default, on_weapons_update);
    r.on_packet(netcode::PlayerUnoccupiedSync::ID, HandlerPriority::Default, on_unoccupied_sync);
    r.on_packet(netcode::PlayerTrailerSync::ID, HandlerPriority::Default, on_trailer_sync);
    r.on_packet(netcode::PlayerSpectatorSync::ID, HandlerPriority::Default, on_spectator_sync);
    r.on_packet(netcode::PlayerRconCommand::ID, HandlerPriority::Default, on_rcon_command);
}

// === Session ===

fn on_player_connect(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::PlayerConnect);
    if world.players.get(peer).is_some() {
        note_illegal_state(world, peer);
        return false;
    }
    world.complete_connect(peer, msg, false)
}

fn on_npc_connect(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::NpcConnect);
    if world.players.get(peer).is_some() {
        note_illegal_state(world, peer);
        return false;
    }
    world.complete_connect(
        peer,
        netcode::PlayerConnect {
            version_number: msg.version_number,
            modded: msg.modded,
            name: msg.name,
            challenge_response: msg.challenge_response,
            key: String::new(),
            version_string: String::new(),
        },
        true,
    )
}

// === Class selection and spawning ===

fn on_request_class(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::PlayerRequestClass);
    let Some(player) = world.players.get_mut(peer) else {
        note_illegal_state(world, peer);
        return false;
    };
    player.in_class_selection = true;
    let (index, class) = world.classes.select(msg.class_id as usize);
    if let Some(player) = world.players.get_mut(peer) {
        player.selected_class = index;
    }
    world.send_rpc(peer, &class.response());
    true
}

fn on_request_spawn(world: &mut World, peer: usize, _bs: &mut BitStream) -> bool {
    let Some(player) = world.players.get(peer) else {
        note_illegal_state(world, peer);
        return false;
    };
    // Only legal from class selection; a spawned player asking again is
    // a protocol-state violation and the request is ignored.
    if !player.in_class_selection || player.state == PlayerState::Spawned {
        note_illegal_state(world, peer);
        return false;
    }
    if !fire_filter!(world, player_request_spawn, PlayerEvent { player: peer }) {
        note_veto(world, peer);
        world.send_rpc(peer, &netcode::PlayerRequestSpawnResponse { allow: 0 });
        return false;
    }
    if let Some(player) = world.players.get_mut(peer) {
        player.spawn_requested = true;
    }
    world.send_rpc(peer, &netcode::PlayerRequestSpawnResponse { allow: 1 });
    spawn_player(world, peer);
    true
}

/// Move a player from class selection into the world.
fn spawn_player(world: &mut World, peer: usize) {
    let Some(player) = world.players.get(peer) else {
        return;
    };
    let old_state = player.state;
    let class = world.classes.select(player.selected_class).1;
    if let Some(player) = world.players.get_mut(peer) {
        player.in_class_selection = false;
        player.state = PlayerState::Spawned;
        player.team = class.team;
        player.skin = class.skin;
        player.position = class.spawn;
        player.facing_angle = class.z_angle;
        player.health = 100.0;
        player.reset_weapons();
    }
    for weapon in class.weapons {
        if weapon.id != 0 {
            world.give_player_weapon(peer, weapon);
        }
    }
    fire!(world, player_state_change, StateChangeEvent {
        player: peer,
        new_state: PlayerState::Spawned,
        old_state,
    });
    fire!(world, player_spawn, PlayerEvent { player: peer });
}

fn on_player_spawn(world: &mut World, peer: usize, _bs: &mut BitStream) -> bool {
    let Some(player) = world.players.get_mut(peer) else {
        note_illegal_state(world, peer);
        return false;
    };
    // Client confirms its pawn exists; it now syncs on foot.
    if player.state == PlayerState::Spawned {
        player.state = PlayerState::OnFoot;
    }
    true
}

// === Chat and commands ===

fn on_chat_message(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::PlayerRequestChatMessage);
    if world.players.get(peer).is_none() {
        note_illegal_state(world, peer);
        return false;
    }
    let mut text = msg.message;
    if world.config.chat_input_filter {
        text.retain(|c| !c.is_control());
    }
    let event = TextEvent {
        player: peer,
        text: text.clone(),
    };
    if !fire_filter!(world, player_chat, event) {
        note_veto(world, peer);
        return false;
    }

    let relay = netcode::PlayerChatMessage {
        player_id: peer as u16,
        message: text,
    };
    if world.config.game.use_chat_radius {
        let radius_sq = world.config.game.chat_radius * world.config.game.chat_radius;
        let (pos, vw) = match world.players.get(peer) {
            Some(p) => (p.position, p.virtual_world),
            None => return false,
        };
        let payload = crate::world::encode(&relay);
        for other in world.players.indices() {
            let in_range = world
                .players
                .get(other)
                .map(|p| {
                    p.virtual_world == vw && p.position.distance_squared(&pos) <= radius_sq
                })
                .unwrap_or(false);
            if in_range {
                world.transport.send_rpc(
                    other,
                    netcode::PlayerChatMessage::ID,
                    &payload,
                    netcode::PlayerChatMessage::CHANNEL,
                );
            }
        }
    } else {
        world.broadcast_rpc(&relay);
    }
    true
}

fn on_command_message(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::PlayerRequestCommandMessage);
    if world.players.get(peer).is_none() {
        note_illegal_state(world, peer);
        return false;
    }
    let event = TextEvent {
        player: peer,
        text: msg.message,
    };
    if !fire_filter!(world, player_command, event) {
        note_veto(world, peer);
        return false;
    }
    true
}

fn on_rcon_command(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::PlayerRconCommand);
    debug!(peer, command = %msg.command, "in-game rcon command");
    let event = TextEvent {
        player: peer,
        text: msg.command,
    };
    fire_filter!(world, rcon_command, event)
}

// === Vehicle entry and exit ===

fn on_enter_vehicle(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerEnterVehicle);
    let vehicle_id = msg.vehicle_id as usize;
    if world.vehicles.get(vehicle_id).is_none() {
        note_illegal_state(world, peer);
        return false;
    }
    let target = if msg.passenger != 0 {
        PlayerState::EnterVehiclePassenger
    } else {
        PlayerState::EnterVehicleDriver
    };
    let transitioned = world
        .players
        .get_mut(peer)
        .map(|p| p.try_transition(target))
        .unwrap_or(false);
    if !transitioned {
        note_illegal_state(world, peer);
        return false;
    }

    world.send_rpc_to_streamers(
        peer,
        &netcode::EnterVehicle {
            player_id: peer as u16,
            vehicle_id: msg.vehicle_id,
            passenger: msg.passenger,
        },
    );
    fire!(world, player_enter_vehicle, VehicleEvent {
        player: peer,
        vehicle: vehicle_id,
        passenger: msg.passenger != 0,
    });
    true
}

fn on_exit_vehicle(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerExitVehicle);
    let vehicle_id = msg.vehicle_id as usize;
    let transitioned = world
        .players
        .get_mut(peer)
        .map(|p| p.try_transition(PlayerState::ExitVehicle))
        .unwrap_or(false);
    if !transitioned {
        note_illegal_state(world, peer);
        return false;
    }
    world.send_rpc_to_streamers(
        peer,
        &netcode::ExitVehicle {
            player_id: peer as u16,
            vehicle_id: msg.vehicle_id,
        },
    );
    fire!(world, player_exit_vehicle, VehicleEvent {
        player: peer,
        vehicle: vehicle_id,
        passenger: false,
    });
    true
}

// === Death and damage ===

fn on_player_death(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerDeath);
    let transitioned = world
        .players
        .get_mut(peer)
        .map(|p| {
            let ok = p.try_transition(PlayerState::Wasted);
            if ok {
                p.health = 0.0;
            }
            ok
        })
        .unwrap_or(false);
    if !transitioned {
        note_illegal_state(world, peer);
        return false;
    }
    world.clear_vehicle_occupancy(peer);
    world.send_rpc_to_streamers(
        peer,
        &netcode::PlayerDeath {
            player_id: peer as u16,
        },
    );
    let killer = (msg.killer_id as usize) < crowbar_types::PLAYER_POOL_SIZE
        && world.players.get(msg.killer_id as usize).is_some();
    fire!(world, player_death, DeathEvent {
        player: peer,
        killer: killer.then_some(msg.killer_id as usize),
        reason: msg.reason,
    });
    true
}

fn on_give_take_damage(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerGiveTakeDamage);
    if world.players.get(peer).is_none() {
        note_illegal_state(world, peer);
        return false;
    }
    // The damage report only feeds the event surface; raw sync never
    // fabricates damage and this handler applies none either.
    let other = (msg.player_id as usize) < crowbar_types::PLAYER_POOL_SIZE
        && world.players.get(msg.player_id as usize).is_some();
    fire!(world, player_give_take_damage, DamageEvent {
        player: peer,
        other: other.then_some(msg.player_id as usize),
        taking: msg.taking,
        amount: msg.damage,
        weapon: msg.weapon,
        body_part: msg.body_part,
    });
    true
}

// === UI ===

fn on_dialog_response(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerDialogResponse);
    let active = world.players.get(peer).and_then(|p| p.active_dialog);
    if active != Some(msg.dialog_id) {
        note_illegal_state(world, peer);
        return false;
    }
    if let Some(player) = world.players.get_mut(peer) {
        player.active_dialog = None;
    }
    fire!(world, dialog_response, DialogResponseEvent {
        player: peer,
        dialog_id: msg.dialog_id,
        response: msg.response,
        list_item: msg.list_item,
        input: msg.text,
    });
    true
}

fn on_menu_row(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerSelectedMenuRow);
    if world.players.get(peer).and_then(|p| p.shown_menu).is_none() {
        note_illegal_state(world, peer);
        return false;
    }
    debug!(peer, row = msg.row, "menu row selected");
    if let Some(player) = world.players.get_mut(peer) {
        player.shown_menu = None;
    }
    true
}

fn on_menu_exit(world: &mut World, peer: usize, _bs: &mut BitStream) -> bool {
    if let Some(player) = world.players.get_mut(peer) {
        player.shown_menu = None;
    }
    true
}

fn on_scores_request(world: &mut World, peer: usize, _bs: &mut BitStream) -> bool {
    let entries = world
        .players
        .entries()
        .map(|(id, p)| netcode::ScorePingEntry {
            player_id: id as u16,
            score: p.score,
            ping: 0,
        })
        .collect();
    world.send_rpc(peer, &netcode::SendPlayerScoresAndPings { entries });
    true
}

// === World reports ===

fn on_pickup_pickup(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerPickUpPickup);
    let Some(slot) = world.pickup_ids.to_internal(msg.pickup_id.max(0) as usize) else {
        note_illegal_state(world, peer);
        return false;
    };
    fire!(world, pickup_picked_up, crate::events::PickupEvent {
        pickup: slot,
        player: Some(peer),
    });
    true
}

fn on_interior_change(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerInteriorChange);
    let Some(player) = world.players.get_mut(peer) else {
        note_illegal_state(world, peer);
        return false;
    };
    player.interior = msg.interior;
    fire!(world, player_interior_change, PlayerEvent { player: peer });
    true
}

fn on_click_map(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerClickMap);
    fire!(world, player_click_map, ClickMapEvent {
        player: peer,
        position: msg.position,
    });
    true
}

fn on_camera_target(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::OnPlayerCameraTarget);
    if let Some(player) = world.players.get_mut(peer) {
        player.camera_target.object_id = msg.object_id;
        player.camera_target.vehicle_id = msg.vehicle_id;
        player.camera_target.player_id = msg.player_id;
        player.camera_target.actor_id = msg.actor_id;
    }
    true
}

fn on_vehicle_death(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::VehicleDeath);
    let Some(vehicle) = world.vehicles.get_mut(msg.vehicle_id as usize) else {
        note_illegal_state(world, peer);
        return false;
    };
    vehicle.dead = true;
    true
}

/// Mod-shop and paint-shop purchases arrive as script events.
fn on_scm_event(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    const EVENT_PAINTJOB: u32 = 1;
    const EVENT_COLOUR: u32 = 2;
    const EVENT_MOD: u32 = 3;

    let msg = read_or_drop!(world, peer, bs, netcode::ScmEvent);
    let Some(vehicle) = world.vehicles.get_mut(msg.vehicle_id as usize) else {
        note_illegal_state(world, peer);
        return false;
    };
    match msg.event_type {
        EVENT_PAINTJOB => vehicle.paintjob = msg.arg1 as u8,
        EVENT_COLOUR => {
            vehicle.body_colour1 = msg.arg1 as i32;
            vehicle.body_colour2 = msg.arg2 as i32;
        }
        EVENT_MOD => {
            let component = msg.arg1 as i32;
            // Mod slots mirror the stream-in array; find a free cell.
            if !vehicle.mods.contains(&component) {
                if let Some(cell) = vehicle.mods.iter_mut().find(|m| **m == 0) {
                    *cell = component;
                }
            }
        }
        _ => {
            note_illegal_state(world, peer);
            return false;
        }
    }
    let relay = netcode::ScmEvent {
        player_id: peer as u16,
        ..msg
    };
    world.send_rpc_to_streamers(peer, &relay);
    true
}

// === Sync packets ===

fn on_foot_sync(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let mut msg = read_or_drop!(world, peer, bs, netcode::PlayerFootSync);

    let Some(player) = world.players.get(peer) else {
        note_illegal_state(world, peer);
        return false;
    };
    // Foot sync is only legal once spawned and not inside a vehicle.
    let legal = matches!(
        player.state,
        PlayerState::Spawned | PlayerState::OnFoot | PlayerState::ExitVehicle
    );
    if !legal {
        note_illegal_state(world, peer);
        return false;
    }

    // Surfing targets must exist server-side.
    match msg.surfing.target {
        SurfingTarget::Vehicle(id) if world.vehicles.get(id as usize).is_none() => {
            crate::router::note_read_error(world, peer, crowbar_bitstream::ProtocolError::Malformed);
            return false;
        }
        SurfingTarget::Object(id) if world.objects.get(id as usize).is_none() => {
            crate::router::note_read_error(world, peer, crowbar_bitstream::ProtocolError::Malformed);
            return false;
        }
        _ => {}
    }

    dispatch_key_change(world, peer, msg.keys as u32, msg.up_down, msg.left_right);

    let Some(player) = world.players.get_mut(peer) else {
        return false;
    };
    if !player.apply_synced_position(msg.position) {
        crate::router::note_read_error(world, peer, crowbar_bitstream::ProtocolError::Malformed);
        return false;
    }
    let old_state = player.state;
    player.state = PlayerState::OnFoot;
    player.rotation = msg.rotation;
    player.velocity = msg.velocity;
    player.apply_synced_vitals(msg.health_armour.x, msg.health_armour.y);
    player.armed_weapon = msg.weapon;
    player.special_action = msg.special_action;
    player.animation_id = msg.animation_id;
    player.animation_flags = msg.animation_flags;
    player.surfing = msg.surfing;
    player.keys = KeyData {
        keys: msg.keys as u32,
        up_down: msg.up_down,
        left_right: msg.left_right,
    };
    if old_state != PlayerState::OnFoot {
        fire!(world, player_state_change, StateChangeEvent {
            player: peer,
            new_state: PlayerState::OnFoot,
            old_state,
        });
    }

    // Relay to everyone who has this player streamed in, same tick.
    msg.player_id = peer as u16;
    world.send_packet_to_streamers(peer, &msg);
    true
}

fn on_vehicle_sync(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let mut msg = read_or_drop!(world, peer, bs, netcode::PlayerVehicleSync);
    let vehicle_id = msg.vehicle_id as usize;
    if world.vehicles.get(vehicle_id).is_none() {
        note_illegal_state(world, peer);
        return false;
    }
    let Some(player) = world.players.get(peer) else {
        note_illegal_state(world, peer);
        return false;
    };
    // Driver sync completes the entry state machine or continues driving.
    let legal = matches!(
        player.state,
        PlayerState::EnterVehicleDriver | PlayerState::Driver
    );
    if !legal {
        note_illegal_state(world, peer);
        return false;
    }

    dispatch_key_change(world, peer, msg.keys as u32, msg.up_down, msg.left_right);

    let old_state = world.players.get(peer).map(|p| p.state).unwrap_or_default();
    if !world.set_vehicle_occupant(vehicle_id, peer, 0) {
        note_illegal_state(world, peer);
        return false;
    }
    if let Some(player) = world.players.get_mut(peer) {
        player.position = msg.position;
        player.rotation = msg.rotation;
        player.velocity = msg.velocity;
        player.apply_synced_vitals(msg.player_health_armour.x, msg.player_health_armour.y);
        player.armed_weapon = msg.weapon;
        player.keys = KeyData {
            keys: msg.keys as u32,
            up_down: msg.up_down,
            left_right: msg.left_right,
        };
    }
    if let Some(vehicle) = world.vehicles.get_mut(vehicle_id) {
        vehicle.position = msg.position;
        vehicle.velocity = msg.velocity;
        vehicle.health = msg.health;
        vehicle.siren = msg.siren != 0;
        msg.has_trailer = vehicle.trailer.is_some();
        if let Some(trailer) = vehicle.trailer {
            msg.trailer_id = trailer as u16;
        }
    }
    if old_state == PlayerState::EnterVehicleDriver {
        fire!(world, player_state_change, StateChangeEvent {
            player: peer,
            new_state: PlayerState::Driver,
            old_state,
        });
    }

    msg.player_id = peer as u16;
    world.send_packet_to_streamers(peer, &msg);
    true
}

fn on_passenger_sync(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let mut msg = read_or_drop!(world, peer, bs, netcode::PlayerPassengerSync);
    let vehicle_id = msg.vehicle_id as usize;
    if world.vehicles.get(vehicle_id).is_none() {
        note_illegal_state(world, peer);
        return false;
    }
    let legal = world
        .players
        .get(peer)
        .map(|p| {
            matches!(
                p.state,
                PlayerState::EnterVehiclePassenger | PlayerState::Passenger
            )
        })
        .unwrap_or(false);
    if !legal {
        note_illegal_state(world, peer);
        return false;
    }
    let old_state = world.players.get(peer).map(|p| p.state).unwrap_or_default();
    let seat = ((msg.drive_by_seat_weapon & 0x03) as u8).max(1);
    if !world.set_vehicle_occupant(vehicle_id, peer, seat) {
        note_illegal_state(world, peer);
        return false;
    }
    if let Some(player) = world.players.get_mut(peer) {
        player.position = msg.position;
        player.apply_synced_vitals(msg.health_armour.x, msg.health_armour.y);
    }
    if old_state == PlayerState::EnterVehiclePassenger {
        fire!(world, player_state_change, StateChangeEvent {
            player: peer,
            new_state: PlayerState::Passenger,
            old_state,
        });
    }
    msg.player_id = peer as u16;
    world.send_packet_to_streamers(peer, &msg);
    true
}

fn on_aim_sync(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let mut msg = read_or_drop!(world, peer, bs, netcode::PlayerAimSync);
    let Some(player) = world.players.get_mut(peer) else {
        note_illegal_state(world, peer);
        return false;
    };
    player.aim.cam_mode = msg.cam_mode;
    player.aim.cam_front = msg.cam_front;
    player.aim.cam_position = msg.cam_position;
    player.aim.aim_z = msg.aim_z;
    player.aim.cam_zoom = msg.zoom_weapon_state & 0x3F;
    player.aim.weapon_state = msg.zoom_weapon_state >> 6;
    player.aim.aspect_ratio = msg.aspect_ratio;

    msg.player_id = peer as u16;
    world.send_packet_to_streamers(peer, &msg);
    true
}

fn on_bullet_sync(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let mut msg = read_or_drop!(world, peer, bs, netcode::PlayerBulletSync);
    let shootable = world.players.get(peer).is_some()
        && WeaponSlotData::new(msg.weapon, 0).shootable();
    if !shootable {
        crate::router::note_read_error(world, peer, crowbar_bitstream::ProtocolError::Malformed);
        return false;
    }
    if let Some(player) = world.players.get_mut(peer) {
        player.last_bullet.origin = msg.origin;
        player.last_bullet.hit_position = msg.hit_position;
        player.last_bullet.offset = msg.offset;
        player.last_bullet.weapon = msg.weapon;
        player.last_bullet.hit_type = msg.hit_type;
        player.last_bullet.hit_id = msg.hit_id;
    }
    msg.player_id = peer as u16;
    world.send_packet_to_streamers(peer, &msg);
    true
}

fn on_stats_sync(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::PlayerStatsSync);
    if let Some(player) = world.players.get_mut(peer) {
        player.money = msg.money;
        player.drunk_level = msg.drunk_level;
    }
    true
}

fn on_weapons_update(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::PlayerWeaponsUpdate);
    if let Some(player) = world.players.get_mut(peer) {
        for (slot, id, ammo) in msg.weapons {
            player.weapons[slot as usize] = WeaponSlotData::new(id, ammo as u32);
        }
    }
    true
}

fn on_unoccupied_sync(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let mut msg = read_or_drop!(world, peer, bs, netcode::PlayerUnoccupiedSync);
    let vehicle_id = msg.vehicle_id as usize;
    // Only the nearest relevant peer reports; accept from anyone who has
    // the vehicle streamed in.
    let streamed = world
        .players
        .get(peer)
        .map(|p| p.streamed.vehicles.contains(&vehicle_id))
        .unwrap_or(false);
    if !streamed || world.vehicles.get(vehicle_id).map(|v| v.is_occupied()).unwrap_or(true) {
        note_illegal_state(world, peer);
        return false;
    }
    if let Some(vehicle) = world.vehicles.get_mut(vehicle_id) {
        vehicle.position = msg.position;
        vehicle.velocity = msg.velocity;
        vehicle.health = msg.health;
    }
    msg.player_id = peer as u16;
    world.send_packet_to_streamers(peer, &msg);
    true
}

fn on_trailer_sync(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let mut msg = read_or_drop!(world, peer, bs, netcode::PlayerTrailerSync);
    let vehicle_id = msg.vehicle_id as usize;
    // Trailer physics comes from the driver towing it.
    let towing = world
        .vehicles
        .get(vehicle_id)
        .and_then(|t| t.cab)
        .and_then(|cab| world.vehicles.get(cab))
        .map(|cab| cab.driver == Some(peer))
        .unwrap_or(false);
    if !towing {
        note_illegal_state(world, peer);
        return false;
    }
    if let Some(trailer) = world.vehicles.get_mut(vehicle_id) {
        trailer.position = msg.position;
        trailer.velocity = msg.velocity;
    }
    msg.player_id = peer as u16;
    world.send_packet_to_streamers(peer, &msg);
    true
}

fn on_spectator_sync(world: &mut World, peer: usize, bs: &mut BitStream) -> bool {
    let msg = read_or_drop!(world, peer, bs, netcode::PlayerSpectatorSync);
    let Some(player) = world.players.get_mut(peer) else {
        note_illegal_state(world, peer);
        return false;
    };
    if player.state != PlayerState::Spectating && !player.try_transition(PlayerState::Spectating) {
        note_illegal_state(world, peer);
        return false;
    }
    player.position = msg.position;
    player.keys = KeyData {
        keys: msg.keys as u32,
        up_down: msg.up_down,
        left_right: msg.left_right,
    };
    true
}

/// Fire the key-change event before any key mutation lands.
fn dispatch_key_change(world: &mut World, peer: usize, keys: u32, _up_down: u16, _left_right: u16) {
    let old_keys = world.players.get(peer).map(|p| p.keys.keys).unwrap_or(0);
    if old_keys != keys {
        fire!(world, player_key_state_change, crate::events::KeyChangeEvent {
            player: peer,
            new_keys: keys,
            old_keys,
        });
    }
}

/// Marker payload for one observer: every other player, with truncated
/// coordinates when their marker is in range.
pub fn build_markers_for(world: &World, observer: usize) -> netcode::PlayerMarkersSync {
    let limit = world.config.game.use_player_marker_draw_radius;
    let radius_sq = world.config.game.player_marker_draw_radius
        * world.config.game.player_marker_draw_radius;
    let (pos, vw) = world
        .players
        .get(observer)
        .map(|p| (p.position, p.virtual_world))
        .unwrap_or((crowbar_types::Vec3::default(), 0));

    let mut markers = Vec::new();
    for (slot, other) in world.players.entries() {
        if slot == observer {
            continue;
        }
        let visible = other.state != PlayerState::None
            && other.state != PlayerState::Spectating
            && other.virtual_world == vw
            && (!limit || {
                let d = Vec2::new(pos.x - other.position.x, pos.y - other.position.y);
                d.x * d.x + d.y * d.y <= radius_sq
            });
        markers.push(netcode::PlayerMarker {
            player_id: slot as u16,
            position: visible.then(|| {
                (
                    other.position.x as i16,
                    other.position.y as i16,
                    other.position.z as i16,
                )
            }),
        });
    }
    netcode::PlayerMarkersSync { markers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::router;
    use crate::transport::LoopbackTransport;
    use crate::vehicle::VehicleSpawnData;
    use crate::world::encode;
    use crowbar_netcode::MessageCategory;
    use crowbar_types::Vec3;

    fn test_world() -> World {
        let mut world = World::new(ServerConfig::default(), Box::new(LoopbackTransport::new()));
        register(&mut world);
        world
    }

    fn loopback(world: &mut World) -> &mut LoopbackTransport {
        world.transport.as_any_mut().downcast_mut().unwrap()
    }

    fn connect(world: &mut World, peer: usize, name: &str) {
        loopback(world).connect_peer(peer);
        let payload = encode(&netcode::PlayerConnect {
            version_number: 0x0FFFFFFF,
            modded: 0,
            name: name.into(),
            challenge_response: 42,
            key: "k".into(),
            version_string: "0.3.7".into(),
        });
        router::route(world, peer, MessageCategory::Rpc, netcode::PlayerConnect::ID, &payload);
    }

    fn route_rpc<M: Message>(world: &mut World, peer: usize, msg: &M) {
        router::route(world, peer, MessageCategory::Rpc, M::ID, &encode(msg));
    }

    fn route_packet<M: Message>(world: &mut World, peer: usize, msg: &M) {
        router::route(world, peer, MessageCategory::Packet, M::ID, &encode(msg));
    }

    fn spawn(world: &mut World, peer: usize) {
        route_rpc(world, peer, &netcode::PlayerRequestSpawn);
        route_rpc(world, peer, &netcode::PlayerSpawn);
    }

    fn foot_sync_at(position: Vec3) -> netcode::PlayerFootSync {
        netcode::PlayerFootSync {
            position,
            health_armour: Vec2::new(98.0, 0.0),
            ..Default::default()
        }
    }

    /// Client-side layout differs from the relay layout, so tests encode
    /// the inbound shape by hand.
    fn encode_foot_sync(msg: &netcode::PlayerFootSync) -> Vec<u8> {
        let mut bs = crowbar_bitstream::BitStream::new();
        bs.write_u16(msg.left_right);
        bs.write_u16(msg.up_down);
        bs.write_u16(msg.keys);
        bs.write_vec3(msg.position);
        bs.write_gta_quat(msg.rotation);
        bs.write_health_armour(msg.health_armour);
        bs.write_u8(msg.weapon);
        bs.write_u8(msg.special_action);
        bs.write_vec3(msg.velocity);
        bs.write_vec3(msg.surfing.offset);
        bs.write_u16(u16::MAX);
        bs.write_u16(msg.animation_id);
        bs.write_u16(msg.animation_flags);
        bs.as_bytes().to_vec()
    }

    #[test]
    fn test_connect_and_spawn_round_trip() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        assert!(world.players.get(0).is_some());

        // Class cycle.
        route_rpc(&mut world, 0, &netcode::PlayerRequestClass { class_id: 0 });
        let t = loopback(&mut world);
        let responses = t.sent_to(0, 128);
        assert_eq!(responses.len(), 1);
        let mut bs = crowbar_bitstream::BitStream::from_bytes(&responses[0].payload);
        let resp = netcode::PlayerRequestClassResponse::read(&mut bs).unwrap();
        assert_eq!(resp.selectable, 1);

        // Spawn request is granted and the state machine advances.
        route_rpc(&mut world, 0, &netcode::PlayerRequestSpawn);
        let t = loopback(&mut world);
        let grants = t.sent_to(0, 129);
        assert_eq!(grants.len(), 1);
        let mut bs = crowbar_bitstream::BitStream::from_bytes(&grants[0].payload);
        assert_eq!(bs.read_u32().unwrap(), 1);
        assert_eq!(world.players.get(0).unwrap().state, PlayerState::Spawned);
    }

    #[test]
    fn test_spawn_request_ignored_when_spawned() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        spawn(&mut world, 0);
        loopback(&mut world).drain();

        route_rpc(&mut world, 0, &netcode::PlayerRequestSpawn);
        assert!(loopback(&mut world).sent_to(0, 129).is_empty());
        assert!(world.peer_errors[0].illegal_state > 0);
    }

    #[test]
    fn test_foot_sync_broadcast_same_world() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        connect(&mut world, 1, "Bob");
        spawn(&mut world, 0);
        spawn(&mut world, 1);
        crate::streamer::run(&mut world);
        loopback(&mut world).drain();

        let sync = foot_sync_at(Vec3::new(10.0, 10.0, 3.0));
        router::route(
            &mut world,
            0,
            MessageCategory::Packet,
            netcode::PlayerFootSync::ID,
            &encode_foot_sync(&sync),
        );

        let t = loopback(&mut world);
        let relayed = t.sent_to(1, netcode::PlayerFootSync::ID);
        assert_eq!(relayed.len(), 1);
        // The relay is tagged with the reporting player's ID.
        let mut bs = crowbar_bitstream::BitStream::from_bytes(&relayed[0].payload);
        assert_eq!(bs.read_u16().unwrap(), 0);
        // Nothing echoes back to the sender.
        assert!(t.sent_to(0, netcode::PlayerFootSync::ID).is_empty());
    }

    #[test]
    fn test_foot_sync_not_relayed_across_worlds() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        connect(&mut world, 1, "Bob");
        spawn(&mut world, 0);
        spawn(&mut world, 1);
        world.players.get_mut(1).unwrap().virtual_world = 7;
        crate::streamer::run(&mut world);
        loopback(&mut world).drain();

        let sync = foot_sync_at(Vec3::new(10.0, 10.0, 3.0));
        router::route(
            &mut world,
            0,
            MessageCategory::Packet,
            netcode::PlayerFootSync::ID,
            &encode_foot_sync(&sync),
        );
        assert!(loopback(&mut world)
            .sent_to(1, netcode::PlayerFootSync::ID)
            .is_empty());
    }

    #[test]
    fn test_vehicle_enter_flow() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        connect(&mut world, 1, "Bob");
        spawn(&mut world, 0);
        spawn(&mut world, 1);
        let vid = world
            .create_vehicle(VehicleSpawnData {
                model: 411,
                position: Vec3::new(5.0, 0.0, 3.0),
                ..Default::default()
            })
            .unwrap();
        crate::streamer::run(&mut world);
        loopback(&mut world).drain();

        route_rpc(
            &mut world,
            0,
            &netcode::OnPlayerEnterVehicle {
                vehicle_id: vid as u16,
                passenger: 0,
            },
        );
        assert_eq!(
            world.players.get(0).unwrap().state,
            PlayerState::EnterVehicleDriver
        );
        let t = loopback(&mut world);
        assert_eq!(t.sent_to(1, netcode::EnterVehicle::ID).len(), 1);

        // The next driver sync completes the transition and links both
        // sides of the occupancy.
        let mut bs = crowbar_bitstream::BitStream::new();
        bs.write_u16(vid as u16);
        bs.write_u16(0);
        bs.write_u16(0);
        bs.write_u16(0);
        bs.write_gta_quat(Default::default());
        bs.write_vec3(Vec3::new(5.0, 0.0, 3.0));
        bs.write_vec3(Vec3::default());
        bs.write_f32(1000.0);
        bs.write_health_armour(Vec2::new(98.0, 0.0));
        bs.write_u8(0);
        bs.write_u8(0);
        bs.write_u8(0);
        bs.write_u16(u16::MAX);
        bs.write_u32(0);
        router::route(
            &mut world,
            0,
            MessageCategory::Packet,
            netcode::PlayerVehicleSync::ID,
            bs.as_bytes(),
        );

        assert_eq!(world.players.get(0).unwrap().state, PlayerState::Driver);
        assert_eq!(world.vehicles.get(vid).unwrap().driver, Some(0));
    }

    #[test]
    fn test_enter_unknown_vehicle_dropped() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        spawn(&mut world, 0);
        route_rpc(
            &mut world,
            0,
            &netcode::OnPlayerEnterVehicle {
                vehicle_id: 1999,
                passenger: 0,
            },
        );
        assert_eq!(world.players.get(0).unwrap().state, PlayerState::OnFoot);
        assert!(world.peer_errors[0].illegal_state > 0);
    }

    #[test]
    fn test_chat_veto_blocks_relay() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        connect(&mut world, 1, "Bob");
        loopback(&mut world).drain();

        world.events.player_chat.register(
            HandlerPriority::Highest,
            Box::new(|_, e: &TextEvent| !e.text.contains("blocked")),
        );

        route_rpc(
            &mut world,
            0,
            &netcode::PlayerRequestChatMessage {
                message: "this is blocked".into(),
            },
        );
        assert!(loopback(&mut world)
            .sent_to(1, netcode::PlayerChatMessage::ID)
            .is_empty());
        assert!(world.peer_errors[0].vetoed > 0);

        route_rpc(
            &mut world,
            0,
            &netcode::PlayerRequestChatMessage {
                message: "hello".into(),
            },
        );
        assert_eq!(
            loopback(&mut world)
                .sent_to(1, netcode::PlayerChatMessage::ID)
                .len(),
            1
        );
    }

    #[test]
    fn test_death_event_and_state() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        spawn(&mut world, 0);

        route_rpc(
            &mut world,
            0,
            &netcode::OnPlayerDeath {
                reason: 24,
                killer_id: 0xFFFF,
            },
        );
        let p = world.players.get(0).unwrap();
        assert_eq!(p.state, PlayerState::Wasted);
        assert_eq!(p.health, 0.0);
    }

    #[test]
    fn test_damage_report_does_not_apply_damage() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        connect(&mut world, 1, "Bob");
        spawn(&mut world, 0);
        spawn(&mut world, 1);
        let before = world.players.get(1).unwrap().health;

        let mut bs = crowbar_bitstream::BitStream::new();
        bs.write_bit(false); // giving
        bs.write_u16(1);
        bs.write_f32(20.0);
        bs.write_u32(24);
        bs.write_u32(3);
        router::route(&mut world, 0, MessageCategory::Rpc, 115, bs.as_bytes());

        assert_eq!(world.players.get(1).unwrap().health, before);
    }

    #[test]
    fn test_dialog_response_requires_active_dialog() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");

        route_rpc(
            &mut world,
            0,
            &netcode::OnPlayerDialogResponse {
                dialog_id: 9,
                response: 1,
                list_item: 0,
                text: String::new(),
            },
        );
        assert!(world.peer_errors[0].illegal_state > 0);

        world.show_dialog(0, 9, 1, "T", "Hello", "OK", "");
        route_rpc(
            &mut world,
            0,
            &netcode::OnPlayerDialogResponse {
                dialog_id: 9,
                response: 1,
                list_item: 0,
                text: "input".into(),
            },
        );
        assert_eq!(world.players.get(0).unwrap().active_dialog, None);
    }

    #[test]
    fn test_unknown_id_counter() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        router::route(&mut world, 0, MessageCategory::Rpc, 250, &[]);
        assert_eq!(world.peer_errors[0].unknown_id, 1);
    }

    #[test]
    fn test_truncated_sync_counted() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        spawn(&mut world, 0);
        router::route(
            &mut world,
            0,
            MessageCategory::Packet,
            netcode::PlayerFootSync::ID,
            &[0x01, 0x02],
        );
        assert_eq!(world.peer_errors[0].truncated, 1);
    }

    #[test]
    fn test_key_change_event_fires_before_mutation() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        spawn(&mut world, 0);
        crate::streamer::run(&mut world);

        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        world.events.player_key_state_change.register(
            HandlerPriority::Default,
            Box::new(move |world, e: &crate::events::KeyChangeEvent| {
                // The player's stored keys are still the old ones.
                let stored = world.players.get(e.player).unwrap().keys.keys;
                sink.borrow_mut().push((e.old_keys, e.new_keys, stored));
            }),
        );

        let mut sync = foot_sync_at(Vec3::new(1.0, 1.0, 3.0));
        sync.keys = 128;
        router::route(
            &mut world,
            0,
            MessageCategory::Packet,
            netcode::PlayerFootSync::ID,
            &encode_foot_sync(&sync),
        );
        assert_eq!(seen.borrow().as_slice(), &[(0, 128, 0)]);
    }

    #[test]
    fn test_markers_do_not_filter_npcs() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        loopback(&mut world).connect_peer(1);
        let payload = encode(&netcode::NpcConnect {
            version_number: 0x0FFFFFFF,
            modded: 0,
            name: "bot".into(),
            challenge_response: 1,
        });
        router::route(&mut world, 1, MessageCategory::Rpc, netcode::NpcConnect::ID, &payload);
        spawn(&mut world, 0);
        spawn(&mut world, 1);

        let markers = build_markers_for(&world, 0);
        assert_eq!(markers.markers.len(), 1);
        assert_eq!(markers.markers[0].player_id, 1);
        assert!(markers.markers[0].position.is_some());
    }

    #[test]
    fn test_scm_event_updates_paintjob() {
        let mut world = test_world();
        connect(&mut world, 0, "Alice");
        spawn(&mut world, 0);
        let vid = world.create_vehicle(VehicleSpawnData::default()).unwrap();

        let mut bs = crowbar_bitstream::BitStream::new();
        bs.write_u32(vid as u32);
        bs.write_u32(2); // paintjob index
        bs.write_u32(0);
        bs.write_u32(1); // paintjob event
        router::route(&mut world, 0, MessageCategory::Rpc, 96, bs.as_bytes());
        assert_eq!(world.vehicles.get(vid).unwrap().paintjob, 2);
    }
}
