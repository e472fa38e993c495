//! Codec trait and implementations for serializing/deserializing events.
//!
//! The server loop only asks for "bytes out of an event" and "an event out
//! of bytes". [`JsonCodec`] is the only implementation today; browsers
//! speak JSON natively.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use noughts_protocol::{Codec, InboundEvent, JsonCodec, RoomId};
///
/// let codec = JsonCodec;
/// let event: InboundEvent = codec
///     .decode(br#"{"event":"reset","data":{"room":"r1"}}"#)
///     .unwrap();
/// assert_eq!(event, InboundEvent::Reset { room: RoomId::from("r1") });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Cell, Handle, InboundEvent, OutboundEvent, RoomId, Symbol};

    #[test]
    fn test_encode_outbound_is_valid_json() {
        let bytes = JsonCodec
            .encode(&OutboundEvent::GameOver {
                winner: Some(Handle::from("alice")),
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["event"], "game_over");
        assert_eq!(value["data"]["winner"], "alice");
    }

    #[test]
    fn test_decode_inbound_join() {
        let event: InboundEvent = JsonCodec
            .decode(br#"{"event":"join","data":{"room":"r1","username":"alice"}}"#)
            .unwrap();
        assert_eq!(
            event,
            InboundEvent::Join {
                room: RoomId::from("r1"),
                username: Handle::from("alice"),
            }
        );
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let result: Result<InboundEvent, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_field_is_decode_error() {
        let result: Result<InboundEvent, _> =
            JsonCodec.decode(br#"{"event":"make_move","data":{"room":"r1"}}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_negative_index_is_decode_error() {
        let result: Result<InboundEvent, _> =
            JsonCodec.decode(br#"{"event":"make_move","data":{"room":"r1","index":-1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_joined_board_round_trips_through_codec() {
        let mut board = [Cell::Empty; 9];
        board[4] = Cell::O;
        let event = OutboundEvent::Joined {
            role: Symbol::X,
            board,
        };
        let bytes = JsonCodec.encode(&event).unwrap();
        let decoded: OutboundEvent = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, event);
    }
}
