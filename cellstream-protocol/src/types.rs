//! Core data types for the cellstream bridge.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Frame type tag carried in every outbound capture frame.
pub const FRAME_TYPE_CELL: &str = "cell";

/// Bound on the reframer's line accumulator. A line that exceeds this
/// without a newline is discarded whole.
pub const LINE_BUFFER_SIZE: usize = 8192;

/// Maximum bytes pulled from the feed socket per read.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Ordered tag map handed to the device-tracking boundary. Keys are
/// `cell.`-prefixed field names; derived keys are inserted first and are
/// never overwritten by raw fields of the same name.
pub type TagMap = BTreeMap<String, String>;

/// Canonical per-device record produced by the decoder.
///
/// `composite_id` and `pseudo_address` are pure functions of the identity
/// fields: identical identity fields always yield the same values, across
/// process restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    /// Synthesized unique key: `mcc + mnc + "-" + tac/lac + "-" + cid`,
    /// or the feed-provided full cell key when one is present.
    pub composite_id: String,
    /// Locally-administered 6-byte identifier derived from the identity.
    pub pseudo_address: [u8; 6],
    /// Radio access type as reported by the feed, empty when absent.
    pub rat: String,
    /// Channel number (NRARFCN/EARFCN/ARFCN) as a string, empty when absent.
    pub channel: String,
    /// Physical cell id, empty when absent.
    pub pci: String,
    /// Received signal strength in dBm. Zero readings are replaced by rsrp
    /// when available (zero means "missing", not "very weak").
    pub rssi: i64,
    /// Reference signal received power in dBm, 0 when absent.
    pub rsrp: i64,
    /// Reference signal received quality in dB, 0 when absent.
    pub rsrq: i64,
    /// Resolved LTE band number, None when unresolved.
    pub band: Option<u16>,
    /// Derived downlink carrier frequency in MHz.
    pub dl_freq_mhz: Option<f64>,
    /// Derived uplink carrier frequency in MHz. Stays None for bands
    /// without an uplink base (TDD bands).
    pub ul_freq_mhz: Option<f64>,
    /// Whether the chosen cell was the registered (serving) cell.
    pub registered: bool,
}

impl CellRecord {
    /// Pseudo address formatted as a colon-separated hardware address.
    pub fn address_string(&self) -> String {
        let a = &self.pseudo_address;
        format!(
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}

/// Best-effort location attached to a record when the envelope carries a
/// fix. Marked as a partial merge: downstream may combine it with more
/// authoritative location data instead of overwriting outright.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub lat: f64,
    pub lon: f64,
    pub alt_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub bearing_deg: Option<f64>,
}

/// Outbound capture frame: type tag + capture timestamp + the original
/// raw line, passed through unmodified. Built once per input line and
/// handed to the host boundary exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolFrame {
    /// Frame type tag, always [`FRAME_TYPE_CELL`] for this bridge.
    pub frame_type: &'static str,
    /// Wall-clock capture time in microseconds since the Unix epoch,
    /// taken when the newline was observed.
    pub timestamp_us: i64,
    /// The original line bytes, exactly as read from the feed.
    pub payload: Bytes,
}

impl ProtocolFrame {
    /// Build a cell frame from a raw line and its capture timestamp.
    pub fn cell(timestamp_us: i64, payload: Bytes) -> Self {
        Self {
            frame_type: FRAME_TYPE_CELL,
            timestamp_us,
            payload,
        }
    }

    /// Serialize as a single JSON line for the wire. The payload is
    /// embedded verbatim when it is valid JSON text (the decoder has
    /// already verified this for every forwarded line).
    pub fn to_wire(&self) -> String {
        let ts = self.timestamp_us as f64 / 1_000_000.0;
        match std::str::from_utf8(&self.payload)
            .ok()
            .and_then(|s| serde_json::from_str::<&RawValue>(s).ok())
        {
            Some(raw) => serde_json::json!({
                "type": self.frame_type,
                "ts": ts,
                "payload": raw,
            })
            .to_string(),
            None => serde_json::json!({
                "type": self.frame_type,
                "ts": ts,
                "payload": String::from_utf8_lossy(&self.payload),
            })
            .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_wire_embeds_payload_verbatim() {
        let line = Bytes::from_static(br#"{"mcc":"310","cid":"1"}"#);
        let frame = ProtocolFrame::cell(1_700_000_000_000_000, line);
        let wire: serde_json::Value = serde_json::from_str(&frame.to_wire()).unwrap();

        assert_eq!(wire["type"], "cell");
        assert_eq!(wire["payload"]["mcc"], "310");
        assert!((wire["ts"].as_f64().unwrap() - 1_700_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_address_string_format() {
        let rec = CellRecord {
            composite_id: "x".into(),
            pseudo_address: [0x02, 0xAB, 0x00, 0x10, 0xFF, 0x01],
            rat: String::new(),
            channel: String::new(),
            pci: String::new(),
            rssi: 0,
            rsrp: 0,
            rsrq: 0,
            band: None,
            dl_freq_mhz: None,
            ul_freq_mhz: None,
            registered: false,
        };
        assert_eq!(rec.address_string(), "02:AB:00:10:FF:01");
    }
}
