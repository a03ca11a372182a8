//! Demultiplexes inbound bitstreams to registered message handlers.
//!
//! Handlers are plain function pointers over the world, registered per
//! `(category, id)` in priority order, with a global chain that runs
//! first. The chain stops at the first handler returning false and the
//! message is discarded (filter handlers sit at high priority, the stock
//! behavior at default).

use crate::player::ErrorCounters;
use crate::world::World;
use crowbar_bitstream::{BitStream, ProtocolError};
use crowbar_events::{EventDispatcher, HandlerId, HandlerPriority, IndexedEventDispatcher};
use crowbar_netcode::{catalog, MessageCategory};
use tracing::{debug, trace};

/// A routed message handler. Returning false vetoes further propagation.
pub type MessageHandler = fn(&mut World, peer: usize, bs: &mut BitStream) -> bool;

pub struct MessageRouter {
    rpc: IndexedEventDispatcher<MessageHandler>,
    packet: IndexedEventDispatcher<MessageHandler>,
    global: EventDispatcher<MessageHandler>,
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self {
            rpc: IndexedEventDispatcher::new(),
            packet: IndexedEventDispatcher::new(),
            global: EventDispatcher::new(),
        }
    }
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_rpc(&mut self, id: u8, priority: HandlerPriority, handler: MessageHandler) -> HandlerId {
        self.rpc.register(id, priority, handler)
    }

    pub fn on_packet(
        &mut self,
        id: u8,
        priority: HandlerPriority,
        handler: MessageHandler,
    ) -> HandlerId {
        self.packet.register(id, priority, handler)
    }

    /// Register on the global chain that precedes every indexed dispatch.
    pub fn on_any(&mut self, priority: HandlerPriority, handler: MessageHandler) -> HandlerId {
        self.global.register(priority, handler)
    }

    pub fn remove_rpc(&mut self, id: u8, handler: HandlerId) -> bool {
        self.rpc.remove(id, handler)
    }

    pub fn remove_packet(&mut self, id: u8, handler: HandlerId) -> bool {
        self.packet.remove(id, handler)
    }

    fn has_handlers(&self, category: MessageCategory, id: u8) -> bool {
        match category {
            MessageCategory::Rpc => self.rpc.has_handlers(id),
            MessageCategory::Packet => self.packet.has_handlers(id),
            MessageCategory::Connection => false,
        }
    }

    /// Global chain followed by the indexed chain, in dispatch order.
    fn chain(&self, category: MessageCategory, id: u8) -> Vec<MessageHandler> {
        let mut handlers = self.global.snapshot();
        match category {
            MessageCategory::Rpc => handlers.extend(self.rpc.at(id).snapshot()),
            MessageCategory::Packet => handlers.extend(self.packet.at(id).snapshot()),
            MessageCategory::Connection => {}
        }
        handlers
    }
}

/// Route one inbound message. Read failures and vetoes drop the message
/// and bump the peer's counters; nothing propagates past here.
pub fn route(
    world: &mut World,
    peer: usize,
    category: MessageCategory,
    id: u8,
    payload: &[u8],
) {
    if !world.router.has_handlers(category, id) {
        debug!(
            peer,
            id,
            name = catalog::name_of(category, id),
            "dropping message with no handler"
        );
        bump(world, peer, |c| c.unknown_id += 1);
        return;
    }

    let handlers = world.router.chain(category, id);
    let mut bs = BitStream::from_bytes(payload);
    let start = bs.read_offset();
    for handler in handlers {
        // Each handler sees the message from the start.
        bs.set_read_offset(start);
        if !handler(world, peer, &mut bs) {
            trace!(peer, id, "message vetoed or dropped");
            return;
        }
    }
}

/// Record a read failure for a peer; called by handlers when a message
/// body does not parse.
pub fn note_read_error(world: &mut World, peer: usize, error: ProtocolError) {
    match error {
        ProtocolError::Truncated => bump(world, peer, |c| c.truncated += 1),
        ProtocolError::Malformed => bump(world, peer, |c| c.malformed += 1),
    }
}

pub fn note_illegal_state(world: &mut World, peer: usize) {
    bump(world, peer, |c| c.illegal_state += 1);
}

pub fn note_veto(world: &mut World, peer: usize) {
    bump(world, peer, |c| c.vetoed += 1);
}

fn bump(world: &mut World, peer: usize, update: impl FnOnce(&mut ErrorCounters)) {
    if let Some(counters) = world.peer_errors.get_mut(peer) {
        update(counters);
    }
}

/// Parse a message or drop it with the right counter. Expands to an early
/// return from the enclosing handler.
macro_rules! read_or_drop {
    ($world:expr, $peer:expr, $bs:expr, $ty:ty) => {
        match <$ty as crowbar_netcode::Message>::read($bs) {
            Ok(msg) => msg,
            Err(e) => {
                $crate::router::note_read_error($world, $peer, e);
                return false;
            }
        }
    };
}

pub(crate) use read_or_drop;
