//! The fixed-rate tick driver. Each tick runs, in order: inbound drain,
//! due timers, the streamer, the outbound flush, then the tick event with
//! the measured elapsed time. Drift is reported, never corrected by
//! skipping.

use crate::streamer;
use crate::timers;
use crate::transport::TransportEvent;
use crate::world::World;
use crowbar_netcode as netcode;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// How often the wall-clock broadcast goes out, in ticks.
const GAME_TIME_UPDATE_INTERVAL: u64 = 30;

/// How often minimap markers refresh, in ticks.
const MARKER_UPDATE_INTERVAL: u64 = 5;

/// One full tick over an already-drained batch of inbound events.
/// Extracted from the loop so tests can drive ticks synchronously.
pub fn run_single_tick(world: &mut World, inbound: Vec<TransportEvent>, elapsed: Duration) {
    // 1. Inbound.
    for event in inbound {
        world.handle_transport_event(event);
    }

    // 2. Timers.
    timers::run_due(world, Instant::now());

    // 3. Visibility.
    streamer::run(world);

    // Periodic server-clock broadcast.
    if world.tick_count % GAME_TIME_UPDATE_INTERVAL == 0 {
        let time = (world.tick_count as i32).wrapping_mul(world.config.tick_interval().as_millis() as i32);
        world.broadcast_rpc(&netcode::SendGameTimeUpdate { time });
    }

    // Minimap markers, mode 1 (global) only; per-player modes are driven
    // by the marker radius inside the payload builder.
    if world.config.game.player_marker_mode != 0
        && world.tick_count % MARKER_UPDATE_INTERVAL == 0
    {
        for peer in world.players.indices() {
            let markers = crate::handlers::build_markers_for(world, peer);
            if !markers.markers.is_empty() {
                world.send_packet(peer, &markers);
            }
        }
    }

    // 4. Outbound.
    world.flush_pending();
    world.transport.flush();

    // 5. Observers.
    let mut dispatcher = std::mem::take(&mut world.events.tick);
    dispatcher.dispatch(|h| h(&mut *world, elapsed));
    let registered_during = std::mem::take(&mut world.events.tick);
    dispatcher.merge(registered_during);
    world.events.tick = dispatcher;

    world.tick_count += 1;
}

/// Drive the world at the configured rate until shutdown. Inbound events
/// queue on `rx` and drain only at step 1; nothing suspends mid-tick.
pub async fn run_tick_loop(
    world: &mut World,
    mut rx: mpsc::Receiver<TransportEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval = world.config.tick_interval();
    let mut last_tick = Instant::now();
    info!(
        rate = world.config.tick_rate,
        interval_ms = interval.as_millis(),
        "tick loop started"
    );

    loop {
        if *shutdown.borrow() {
            info!("tick loop stopping");
            return;
        }

        let tick_start = Instant::now();
        let elapsed = tick_start - last_tick;
        last_tick = tick_start;

        let mut batch = Vec::new();
        while let Ok(event) = rx.try_recv() {
            batch.push(event);
        }

        run_single_tick(world, batch, elapsed);

        let spent = tick_start.elapsed();
        if spent < interval {
            tokio::select! {
                _ = tokio::time::sleep(interval - spent) => {}
                _ = shutdown.changed() => {}
            }
        } else if world.tick_count % 250 == 0 {
            warn!(tick = world.tick_count, spent_ms = spent.as_millis(), "tick over budget");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::handlers;
    use crate::transport::LoopbackTransport;
    use crate::world::encode;
    use bytes::Bytes;
    use crowbar_netcode::{Message, MessageCategory};

    fn test_world() -> World {
        let mut world = World::new(ServerConfig::default(), Box::new(LoopbackTransport::new()));
        handlers::register(&mut world);
        world
    }

    fn loopback(world: &mut World) -> &mut LoopbackTransport {
        world.transport.as_any_mut().downcast_mut().unwrap()
    }

    #[test]
    fn test_tick_processes_connect_event() {
        let mut world = test_world();
        loopback(&mut world).connect_peer(0);
        let payload = Bytes::from(encode(&crowbar_netcode::PlayerConnect {
            version_number: 0x0FFFFFFF,
            name: "Alice".into(),
            ..Default::default()
        }));

        run_single_tick(
            &mut world,
            vec![TransportEvent::PeerConnect { peer: 0, payload }],
            Duration::from_millis(20),
        );

        assert!(world.players.get(0).is_some());
        assert_eq!(world.tick_count, 1);
        assert_eq!(loopback(&mut world).flushes, 1);
    }

    #[test]
    fn test_tick_order_inputs_before_streamer() {
        // A player connecting and spawning in the same batch must be
        // visible to the streamer run of that same tick.
        let mut world = test_world();
        loopback(&mut world).connect_peer(0);
        loopback(&mut world).connect_peer(1);

        let connect = |name: &str| {
            Bytes::from(encode(&crowbar_netcode::PlayerConnect {
                version_number: 0x0FFFFFFF,
                name: name.into(),
                ..Default::default()
            }))
        };
        let spawn_events = |peer: usize| {
            vec![
                TransportEvent::Message {
                    peer,
                    category: MessageCategory::Rpc,
                    id: crowbar_netcode::PlayerRequestSpawn::ID,
                    payload: Bytes::new(),
                },
                TransportEvent::Message {
                    peer,
                    category: MessageCategory::Rpc,
                    id: crowbar_netcode::PlayerSpawn::ID,
                    payload: Bytes::new(),
                },
            ]
        };

        let mut batch = vec![
            TransportEvent::PeerConnect { peer: 0, payload: connect("Alice") },
            TransportEvent::PeerConnect { peer: 1, payload: connect("Bob") },
        ];
        batch.extend(spawn_events(0));
        batch.extend(spawn_events(1));

        run_single_tick(&mut world, batch, Duration::from_millis(20));

        assert!(world.players.get(0).unwrap().streamed.players.contains(&1));
        let t = loopback(&mut world);
        assert_eq!(
            t.sent_to(0, crowbar_netcode::PlayerStreamIn::ID).len(),
            1
        );
    }

    #[test]
    fn test_timers_run_at_step_two() {
        let mut world = test_world();
        let fired = std::rc::Rc::new(std::cell::Cell::new(false));
        let flag = fired.clone();
        world.timers.set(
            Duration::from_millis(0),
            Box::new(move |_| flag.set(true)),
        );
        run_single_tick(&mut world, Vec::new(), Duration::from_millis(20));
        assert!(fired.get());
        assert!(world.timers.is_empty());
    }

    #[test]
    fn test_repeating_timer_stays_scheduled() {
        let mut world = test_world();
        let count = std::rc::Rc::new(std::cell::Cell::new(0u32));
        let counter = count.clone();
        world.timers.set_repeating(
            Duration::from_millis(0),
            Box::new(move |_| counter.set(counter.get() + 1)),
        );
        run_single_tick(&mut world, Vec::new(), Duration::from_millis(20));
        run_single_tick(&mut world, Vec::new(), Duration::from_millis(20));
        assert!(count.get() >= 1);
        assert_eq!(world.timers.len(), 1);
    }

    #[test]
    fn test_tick_event_reports_elapsed() {
        let mut world = test_world();
        let seen = std::rc::Rc::new(std::cell::Cell::new(Duration::ZERO));
        let sink = seen.clone();
        world.events.tick.register(
            crowbar_events::HandlerPriority::Default,
            Box::new(move |_, elapsed| sink.set(elapsed)),
        );
        run_single_tick(&mut world, Vec::new(), Duration::from_millis(37));
        assert_eq!(seen.get(), Duration::from_millis(37));
    }
}
