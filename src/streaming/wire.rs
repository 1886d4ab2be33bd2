//! Wire framing for both channels
//!
//! # TCP Protocol Specification
//!
//! All messages are length-prefixed; two framing modes exist in the field
//! and are selected once at startup, never negotiated per message:
//!
//! **Plain** (split-channel deployments):
//!
//! ```text
//! ┌──────────────────┬─────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)  │
//! │ Big-endian u32   │ JPEG or UTF-8 JSON  │
//! └──────────────────┴─────────────────────┘
//! ```
//!
//! **Tagged** (adds a message-type byte so frames and JSON can share a
//! connection):
//!
//! ```text
//! ┌──────────┬──────────────────┬─────────────────────┐
//! │ Type (1) │ Length (4 bytes) │ Payload (variable)  │
//! │ 0x01/0x02│ Big-endian u32   │ JPEG or UTF-8 JSON  │
//! └──────────┴──────────────────┴─────────────────────┘
//! ```
//!
//! ## Framing rules
//!
//! - Payload length is exact: a reader consumes the declared byte count,
//!   never infers a frame from end-of-stream.
//! - A peer that closes mid-message (short header or short payload) yields
//!   `Ok(None)` - end of stream, never a truncated frame.
//! - Messages above [`MAX_MESSAGE_SIZE`] are a protocol error.
//! - In plain mode the message kind is implied by the channel direction
//!   (frames inbound, detections outbound) and supplied by the caller.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Maximum payload size (4 MiB) - well above any camera frame,
/// small enough to reject garbage length prefixes
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Framing mode, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// 4-byte big-endian length prefix
    #[default]
    Plain,
    /// 1-byte type tag + 4-byte big-endian length prefix
    Tagged,
}

/// Message type tag (explicit on the wire in tagged mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    /// JPEG-encoded camera frame
    Jpeg = 0x01,
    /// UTF-8 JSON payload (detection results)
    Json = 0x02,
}

impl MessageKind {
    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(MessageKind::Jpeg),
            0x02 => Ok(MessageKind::Json),
            other => Err(Error::InvalidMessageType(other)),
        }
    }
}

/// One decoded wire message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub kind: MessageKind,
    pub payload: Vec<u8>,
}

/// Read exactly `buf.len()` bytes; `Ok(false)` means the peer closed first
fn read_exact_or_eof(reader: &mut impl Read, buf: &mut [u8]) -> Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}

impl Framing {
    /// Append one complete framed message to `buf` (cleared first).
    ///
    /// The buffer is reusable across calls to avoid an allocation per frame.
    /// Rejects payloads over [`MAX_MESSAGE_SIZE`], matching the read side.
    pub fn encode(&self, kind: MessageKind, payload: &[u8], buf: &mut Vec<u8>) -> Result<()> {
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(Error::MessageTooLarge {
                len: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        buf.clear();
        buf.reserve(5 + payload.len());
        if matches!(self, Framing::Tagged) {
            buf.push(kind as u8);
        }
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(payload);
        Ok(())
    }

    /// Read one complete message.
    ///
    /// Returns `Ok(None)` on end of stream - including a peer that closed
    /// after sending fewer than the declared payload bytes. In plain mode
    /// the returned kind is `default_kind`, since the wire carries no tag.
    pub fn read_message(
        &self,
        reader: &mut impl Read,
        default_kind: MessageKind,
    ) -> Result<Option<WireMessage>> {
        let (kind, len) = match self {
            Framing::Plain => {
                let mut header = [0u8; 4];
                if !read_exact_or_eof(reader, &mut header)? {
                    return Ok(None);
                }
                (default_kind, u32::from_be_bytes(header) as usize)
            }
            Framing::Tagged => {
                let mut header = [0u8; 5];
                if !read_exact_or_eof(reader, &mut header)? {
                    return Ok(None);
                }
                let kind = MessageKind::from_byte(header[0])?;
                let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
                (kind, len as usize)
            }
        };

        if len > MAX_MESSAGE_SIZE {
            return Err(Error::MessageTooLarge {
                len,
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut payload = vec![0u8; len];
        if !read_exact_or_eof(reader, &mut payload)? {
            return Ok(None);
        }

        Ok(Some(WireMessage { kind, payload }))
    }
}
