pub mod bitstream;
pub mod compressed;

pub use bitstream::{BitStream, ProtocolError, ProtocolResult};
