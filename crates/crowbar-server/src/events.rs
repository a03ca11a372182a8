//! Typed game-event surface. Handlers receive the world plus an event
//! payload; dispatchers are taken out of the world for the duration of a
//! dispatch so handlers can freely mutate state (including registering
//! further handlers).

use crate::player::PlayerState;
use crate::world::World;
use crowbar_events::EventDispatcher;
use crowbar_types::Vec3;
use std::time::Duration;

/// Entity classes the streamer reports transitions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Player,
    Vehicle,
    Object,
    Actor,
    Pickup,
    TextLabel,
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerEvent {
    pub player: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct DisconnectEvent {
    pub player: usize,
    pub reason: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct DeathEvent {
    pub player: usize,
    pub killer: Option<usize>,
    pub reason: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct StateChangeEvent {
    pub player: usize,
    pub new_state: PlayerState,
    pub old_state: PlayerState,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyChangeEvent {
    pub player: usize,
    pub new_keys: u32,
    pub old_keys: u32,
}

#[derive(Debug, Clone)]
pub struct TextEvent {
    pub player: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct StreamEvent {
    pub kind: StreamKind,
    pub entity: usize,
    /// The player whose visibility changed.
    pub for_player: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct PickupEvent {
    pub pickup: usize,
    /// None for destruction without a collector.
    pub player: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct DialogResponseEvent {
    pub player: usize,
    pub dialog_id: u16,
    pub response: u8,
    pub list_item: u16,
    pub input: String,
}

#[derive(Debug, Clone, Copy)]
pub struct DamageEvent {
    pub player: usize,
    pub other: Option<usize>,
    pub taking: bool,
    pub amount: f32,
    pub weapon: u32,
    pub body_part: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct VehicleEvent {
    pub player: usize,
    pub vehicle: usize,
    pub passenger: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ClickMapEvent {
    pub player: usize,
    pub position: Vec3,
}

pub type Handler<E> = Box<dyn FnMut(&mut World, &E)>;
/// Cancellable handler: returning false consumes the event.
pub type FilterHandler<E> = Box<dyn FnMut(&mut World, &E) -> bool>;
pub type TickHandler = Box<dyn FnMut(&mut World, Duration)>;

/// All dispatchers, one per event. Fields are public so components pick
/// their registration priority directly.
#[derive(Default)]
pub struct GameEvents {
    pub player_connect: EventDispatcher<Handler<PlayerEvent>>,
    pub player_disconnect: EventDispatcher<Handler<DisconnectEvent>>,
    pub player_spawn: EventDispatcher<Handler<PlayerEvent>>,
    pub player_request_spawn: EventDispatcher<FilterHandler<PlayerEvent>>,
    pub player_death: EventDispatcher<Handler<DeathEvent>>,
    pub player_state_change: EventDispatcher<Handler<StateChangeEvent>>,
    pub player_key_state_change: EventDispatcher<Handler<KeyChangeEvent>>,
    pub player_chat: EventDispatcher<FilterHandler<TextEvent>>,
    pub player_command: EventDispatcher<FilterHandler<TextEvent>>,
    pub player_give_take_damage: EventDispatcher<Handler<DamageEvent>>,
    pub player_enter_vehicle: EventDispatcher<Handler<VehicleEvent>>,
    pub player_exit_vehicle: EventDispatcher<Handler<VehicleEvent>>,
    pub player_click_map: EventDispatcher<Handler<ClickMapEvent>>,
    pub player_interior_change: EventDispatcher<Handler<PlayerEvent>>,
    pub stream_in: EventDispatcher<Handler<StreamEvent>>,
    pub stream_out: EventDispatcher<Handler<StreamEvent>>,
    pub pickup_picked_up: EventDispatcher<Handler<PickupEvent>>,
    pub pickup_destroyed: EventDispatcher<Handler<PickupEvent>>,
    pub dialog_response: EventDispatcher<Handler<DialogResponseEvent>>,
    pub rcon_command: EventDispatcher<FilterHandler<TextEvent>>,
    pub tick: EventDispatcher<TickHandler>,
}

/// Dispatch an event through `world.events.$field` with the dispatcher
/// temporarily moved out, so handlers get `&mut World`.
macro_rules! fire {
    ($world:expr, $field:ident, $event:expr) => {{
        let event = $event;
        let mut dispatcher = std::mem::take(&mut $world.events.$field);
        dispatcher.dispatch(|h| h(&mut *$world, &event));
        let registered_during = std::mem::take(&mut $world.events.$field);
        dispatcher.merge(registered_during);
        $world.events.$field = dispatcher;
    }};
}

/// As `fire!` but stop-at-false; evaluates to false when vetoed.
macro_rules! fire_filter {
    ($world:expr, $field:ident, $event:expr) => {{
        let event = $event;
        let mut dispatcher = std::mem::take(&mut $world.events.$field);
        let passed = dispatcher.dispatch_stop_at_false(|h| h(&mut *$world, &event));
        let registered_during = std::mem::take(&mut $world.events.$field);
        dispatcher.merge(registered_during);
        $world.events.$field = dispatcher;
        passed
    }};
}

pub(crate) use fire;
pub(crate) use fire_filter;
