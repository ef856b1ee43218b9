//! Protocol codec
//!
//! Framing functions for the wire protocol.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │         JSON body           │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//! Length is big endian and covers the body only.

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{FractalError, Result};
use super::{FrameKind, RpcRequest, RpcResponse};

/// Header size: 1 byte kind + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum body size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Frame Encoding/Decoding
// =============================================================================

fn encode_frame(kind: FrameKind, body: &[u8]) -> Result<Vec<u8>> {
    if body.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(FractalError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            body.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + body.len());
    frame.put_u8(kind as u8);
    frame.put_u32(body.len() as u32);
    frame.put_slice(body);

    Ok(frame.to_vec())
}

/// Split a complete frame into kind and body, checking the header
fn decode_frame(bytes: &[u8], expected: FrameKind) -> Result<&[u8]> {
    if bytes.len() < HEADER_SIZE {
        return Err(FractalError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let kind = parse_kind(bytes[0])?;
    if kind != expected {
        return Err(FractalError::Protocol(format!(
            "Unexpected frame kind: expected {:?}, got {:?}",
            expected, kind
        )));
    }

    let body_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    check_len(body_len)?;

    let total_len = HEADER_SIZE + body_len;
    if bytes.len() < total_len {
        return Err(FractalError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok(&bytes[HEADER_SIZE..total_len])
}

fn parse_kind(byte: u8) -> Result<FrameKind> {
    FrameKind::from_byte(byte)
        .ok_or_else(|| FractalError::Protocol(format!("Unknown frame kind: 0x{:02x}", byte)))
}

fn check_len(len: usize) -> Result<()> {
    if len > MAX_PAYLOAD_SIZE as usize {
        return Err(FractalError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// Request/Response Encoding/Decoding
// =============================================================================

/// Encode a request to a complete frame
pub fn encode_request(request: &RpcRequest) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(request)?;
    encode_frame(FrameKind::Request, &body)
}

/// Decode a request from a complete frame
pub fn decode_request(bytes: &[u8]) -> Result<RpcRequest> {
    let body = decode_frame(bytes, FrameKind::Request)?;
    Ok(serde_json::from_slice(body)?)
}

/// Encode a response to a complete frame
pub fn encode_response(response: &RpcResponse) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(response)?;
    encode_frame(FrameKind::Response, &body)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<RpcResponse> {
    let body = decode_frame(bytes, FrameKind::Response)?;
    Ok(serde_json::from_slice(body)?)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one raw frame from a stream
///
/// Blocks until a complete frame is received or an error occurs. The body is
/// returned undecoded so that callers can answer malformed JSON themselves.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<(FrameKind, Vec<u8>)> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let kind = parse_kind(header[0])?;
    let body_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    check_len(body_len)?;

    let mut body = vec![0u8; body_len];
    if body_len > 0 {
        reader.read_exact(&mut body)?;
    }

    tracing::trace!("Read {:?} frame of {} bytes", kind, body_len);
    Ok((kind, body))
}

/// Read a complete request from a stream
pub fn read_request<R: Read>(reader: &mut R) -> Result<RpcRequest> {
    match read_frame(reader)? {
        (FrameKind::Request, body) => Ok(serde_json::from_slice(&body)?),
        (kind, _) => Err(FractalError::Protocol(format!("Expected request frame, got {:?}", kind))),
    }
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &RpcRequest) -> Result<()> {
    let bytes = encode_request(request)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<RpcResponse> {
    match read_frame(reader)? {
        (FrameKind::Response, body) => Ok(serde_json::from_slice(&body)?),
        (kind, _) => Err(FractalError::Protocol(format!("Expected response frame, got {:?}", kind))),
    }
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &RpcResponse) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
