//! LED command wire format serialization and parsing.
//!
//! This module handles encoding and decoding of the fixed-format request
//! and response payloads exchanged with LED control clients.
//!
//! Request layout (6 bytes, big-endian multi-byte fields):
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0 | 1 | operation code (ASCII `'1'`..`'4'`) |
//! | 1 | 1 | LED position |
//! | 2 | 2 | operation parameter (flash duration ms for `'3'`) |
//! | 4 | 2 | sequence number |
//!
//! Response layout (3 bytes): result code, then the echoed sequence number.
//!
//! Both transforms are pure; logging of decoded commands is left to the
//! caller.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::DecodeError;

/// Exact length of a request payload.
pub const REQUEST_LENGTH: usize = 6;

/// Exact length of a response payload.
pub const RESPONSE_LENGTH: usize = 3;

// ============================================================================
// REQUESTS
// ============================================================================

/// LED operations addressable over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedOperation {
    /// Switch the LED on.
    On = b'1',
    /// Switch the LED off.
    Off = b'2',
    /// Flash the LED for the duration given in the request parameter.
    FlashTimed = b'3',
    /// Flash the LED with the device's default pattern.
    FlashDefault = b'4',
}

impl LedOperation {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            b'1' => Some(Self::On),
            b'2' => Some(Self::Off),
            b'3' => Some(Self::FlashTimed),
            b'4' => Some(Self::FlashDefault),
            _ => None,
        }
    }
}

/// A decoded LED control request.
///
/// Values of this type only come out of [`LedRequest::decode`]; a buffer
/// that is not exactly [`REQUEST_LENGTH`] bytes with a recognized operation
/// byte never produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedRequest {
    /// Requested operation.
    pub operation: LedOperation,
    /// Target LED index.
    pub led_position: u8,
    /// Operation parameter. Meaningful for [`LedOperation::FlashTimed`]
    /// (flash duration in milliseconds); carried verbatim for the other
    /// operations.
    pub parameter: u16,
    /// Caller-assigned correlation id, echoed in the response.
    pub sequence_number: u16,
}

impl LedRequest {
    /// Decode a request from its exact wire representation.
    ///
    /// Fails with [`DecodeError::InvalidLength`] if `data` is not exactly
    /// 6 bytes, and with [`DecodeError::InvalidOperation`] if the operation
    /// byte is not one of the four command codes. No further validation is
    /// performed: LED position and parameter accept their full bit width.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() != REQUEST_LENGTH {
            return Err(DecodeError::InvalidLength(data.len()));
        }

        let mut buf = data;
        let operation_raw = buf.get_u8();
        let operation =
            LedOperation::from_u8(operation_raw).ok_or(DecodeError::InvalidOperation(operation_raw))?;
        let led_position = buf.get_u8();
        let parameter = buf.get_u16();
        let sequence_number = buf.get_u16();

        Ok(Self {
            operation,
            led_position,
            parameter,
            sequence_number,
        })
    }

    /// Serialize the request to its wire representation.
    ///
    /// The parameter field is always written as stored, so decoding and
    /// re-serializing reproduces the original bytes for every operation.
    pub fn serialize(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.operation as u8);
        buf.put_u8(self.led_position);
        buf.put_u16(self.parameter);
        buf.put_u16(self.sequence_number);
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Result code carried in the first response byte.
///
/// OK is numerically greater than NOK; the asymmetry is part of the
/// protocol and is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultCode {
    Nok = 1,
    Ok = 2,
}

impl ResultCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Nok),
            2 => Some(Self::Ok),
            _ => None,
        }
    }
}

/// A response to an LED control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedResponse {
    /// Outcome of the requested operation.
    pub result: ResultCode,
    /// Sequence number echoed from the request being answered.
    pub sequence_number: u16,
}

impl LedResponse {
    /// An OK response answering the given request.
    pub fn ok_for(request: &LedRequest) -> Self {
        Self {
            result: ResultCode::Ok,
            sequence_number: request.sequence_number,
        }
    }

    /// Serialize the response to its 3-byte wire representation.
    pub fn serialize(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.result as u8);
        buf.put_u16(self.sequence_number);
    }

    /// Serialize the response into a freshly allocated payload buffer.
    pub fn to_payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RESPONSE_LENGTH);
        self.serialize(&mut buf);
        buf.freeze()
    }

    /// Parse a response from bytes. Returns `None` on a short buffer or an
    /// unknown result code.
    pub fn parse(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < RESPONSE_LENGTH {
            return None;
        }

        let result = ResultCode::from_u8(buf.get_u8())?;
        let sequence_number = buf.get_u16();

        Some(Self {
            result,
            sequence_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_switch_on_request() {
        let request = LedRequest::decode(&[0x31, 0x02, 0x01, 0xF4, 0x00, 0x07]).unwrap();

        assert_eq!(request.operation, LedOperation::On);
        assert_eq!(request.led_position, 2);
        assert_eq!(request.parameter, 500);
        assert_eq!(request.sequence_number, 7);
    }

    #[test]
    fn decode_recognizes_all_operations() {
        for (code, operation) in [
            (b'1', LedOperation::On),
            (b'2', LedOperation::Off),
            (b'3', LedOperation::FlashTimed),
            (b'4', LedOperation::FlashDefault),
        ] {
            let request = LedRequest::decode(&[code, 0x01, 0x00, 0x00, 0x00, 0x01]).unwrap();
            assert_eq!(request.operation, operation);
        }
    }

    #[test]
    fn decode_rejects_wrong_lengths() {
        assert_eq!(LedRequest::decode(&[]), Err(DecodeError::InvalidLength(0)));
        assert_eq!(
            LedRequest::decode(&[0x31, 0x01, 0x00, 0x00, 0x00]),
            Err(DecodeError::InvalidLength(5))
        );
        assert_eq!(
            LedRequest::decode(&[0x31, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00]),
            Err(DecodeError::InvalidLength(7))
        );
    }

    #[test]
    fn decode_rejects_unknown_operation() {
        let result = LedRequest::decode(&[0x39, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(result, Err(DecodeError::InvalidOperation(0x39)));

        let result = LedRequest::decode(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(result, Err(DecodeError::InvalidOperation(0x00)));
    }

    #[test]
    fn request_roundtrip_preserves_parameter_verbatim() {
        // Operation '1' does not use the parameter field, but re-serializing
        // must still reproduce it byte for byte.
        let original = [0x31, 0x05, 0xAB, 0xCD, 0x12, 0x34];
        let request = LedRequest::decode(&original).unwrap();

        let mut buf = BytesMut::new();
        request.serialize(&mut buf);
        assert_eq!(&buf[..], &original);
    }

    #[test]
    fn response_encodes_to_three_bytes() {
        let response = LedResponse {
            result: ResultCode::Ok,
            sequence_number: 7,
        };

        assert_eq!(&response.to_payload()[..], &[0x02, 0x00, 0x07]);
    }

    #[test]
    fn response_roundtrip_at_sequence_extremes() {
        for seq in [0u16, 1, 0x00FF, 0xFF00, u16::MAX] {
            let response = LedResponse {
                result: ResultCode::Ok,
                sequence_number: seq,
            };

            let mut cursor = response.to_payload();
            let parsed = LedResponse::parse(&mut cursor).unwrap();

            assert_eq!(parsed.result, ResultCode::Ok);
            assert_eq!(parsed.sequence_number, seq);
        }
    }

    #[test]
    fn response_parse_rejects_short_input() {
        let mut empty = Bytes::new();
        assert!(LedResponse::parse(&mut empty).is_none());

        let mut two_bytes = Bytes::from_static(&[0x02, 0x00]);
        assert!(LedResponse::parse(&mut two_bytes).is_none());
    }

    #[test]
    fn result_codes_match_protocol_values() {
        // OK is deliberately the larger value.
        assert_eq!(ResultCode::Ok as u8, 2);
        assert_eq!(ResultCode::Nok as u8, 1);
        assert_eq!(ResultCode::from_u8(0), None);
    }
}
