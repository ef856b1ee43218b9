//! Protocol Module
//!
//! Defines the wire protocol between the client and registry nodes.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │      JSON-RPC 2.0 body      │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Kinds
//! - 0x01: REQUEST  - `{"jsonrpc":"2.0","method":..,"params":{"key":..,"val":..},"id":..}`
//! - 0x02: RESPONSE - `{"jsonrpc":"2.0","id":..,"result":{..}}` or `"error":{"code":..,"message":..}`
//!
//! ### Error Codes
//! - -32700: parse error
//! - -32600: invalid request
//! - -32601: method not found
//! - -32001: key not found
//! - -32002: node unavailable

mod message;
mod codec;

pub use message::{
    FrameKind, RegistryParams, RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION,
    INVALID_REQUEST, METHOD_NOT_FOUND, NODE_UNAVAILABLE, NOT_FOUND, PARSE_ERROR,
};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_frame,
    read_request, read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
