//! Cell record decoding and capture frame definitions for the cellstream
//! bridge.
//!
//! This crate holds the pure part of the bridge: turning one raw JSON
//! line from the phone feed into a canonical per-device cell record, and
//! the frame envelope used to hand lines across the host capture
//! boundary. There is no I/O here; the `cellstream-bridge` binary owns
//! sockets and delivery.
//!
//! # Decoding
//!
//! ```rust
//! use cellstream_protocol::decode_line;
//!
//! let line = br#"{"mcc":"310","mnc":"260","tac":"5","cid":"1234","earfcn":1300,"rssi":-85}"#;
//! let decoded = decode_line(line).unwrap();
//!
//! assert_eq!(decoded.record.composite_id, "310260-5-1234");
//! assert_eq!(decoded.record.band, Some(3));
//! assert_eq!(decoded.record.pseudo_address[0], 0x02);
//! ```
//!
//! # Band resolution
//!
//! ```rust
//! use cellstream_protocol::bands::{resolve_band, frequencies};
//!
//! assert_eq!(resolve_band(1300), Some(3));
//! let (dl, ul) = frequencies(3, 1300);
//! assert_eq!(dl, Some(1815.0));
//! assert_eq!(ul, Some(1720.0));
//! ```

pub mod bands;
pub mod decode;
pub mod error;
pub mod identity;
pub mod json;
pub mod types;

pub use decode::{decode_line, Decoded, CHANNEL_KEYS, FULL_ID_KEYS};
pub use error::DecodeError;
pub use identity::{composite_id, fnv1a_64, pseudo_address};
pub use types::{
    CellRecord, LocationUpdate, ProtocolFrame, TagMap, FRAME_TYPE_CELL, LINE_BUFFER_SIZE,
    READ_CHUNK_SIZE,
};
