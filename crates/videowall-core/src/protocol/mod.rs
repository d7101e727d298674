//! Control protocol: message types, the binary codec, and sequence numbering.

pub mod codec;
pub mod messages;
pub mod sequence;

pub use codec::{decode_message, encode_message, encode_message_now, payload_length, ProtocolError};
pub use messages::*;
pub use sequence::SequenceCounter;
