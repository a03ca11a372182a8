pub mod catalog;
pub mod messages;

pub use crowbar_bitstream::{BitStream, ProtocolError, ProtocolResult};
pub use messages::*;

/// Whether a message travels as a reliable RPC or a per-tick sync packet.
/// The pair `(category, id)` identifies a message; RPC 128 and Packet 128
/// are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    Rpc,
    Packet,
    /// Transport-internal connection control, never routed to handlers.
    Connection,
}

/// The ordered stream a message rides on. Order is preserved within a
/// channel per peer; nothing is implied across channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Internal,
    SyncRpc,
    SyncPacket,
    Unordered,
}

/// A typed wire message. Reading and writing must be bit-exact with the
/// fixed external client; the leading ID byte is owned by the transport
/// framing, not by the message body.
///
/// Several IDs are shared between a client->server request and the
/// server->client response; each direction is its own type. A direction a
/// type does not support reads as malformed and writes nothing.
pub trait Message: Sized {
    const ID: u8;
    const CATEGORY: MessageCategory;
    const CHANNEL: Channel;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self>;
    fn write(&self, bs: &mut BitStream);
}
