//! Cell record decoder: one raw JSON line in, one canonical record out.
//!
//! Input is a single line from the feed, expected to be a JSON object in
//! one of two shapes: an envelope with a `cells` array (plus optional
//! location fields), or a flat single-cell object for backward
//! compatibility. Malformed or identity-less lines fail with a
//! [`DecodeError`] and are dropped by the caller; they never stop the
//! stream.

use crate::bands;
use crate::error::DecodeError;
use crate::identity;
use crate::json::{value_display, JsonObject};
use crate::types::{CellRecord, LocationUpdate, TagMap};

/// Channel-number field names in fixed priority order; first present wins.
pub const CHANNEL_KEYS: &[&str] = &["nrarfcn", "earfcn", "arfcn"];

/// Feed-provided full identity keys, preferred over the built composite.
pub const FULL_ID_KEYS: &[&str] = &["full_cell_key", "full_cell_id"];

/// Result of decoding one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub record: CellRecord,
    pub tags: TagMap,
    pub location: Option<LocationUpdate>,
    /// Number of non-primary cells reported alongside the chosen one.
    pub neighbors: usize,
}

/// Decode one raw line into a canonical cell record plus tag map.
pub fn decode_line(line: &[u8]) -> Result<Decoded, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(line)?;
    let envelope = JsonObject::from_value(&value).ok_or(DecodeError::NotAnObject)?;

    let (cell, neighbors) = select_primary_cell(envelope);

    // Identity: feed-provided full key wins, else the built composite.
    let mcc = cell.display_string("mcc").unwrap_or_default();
    let mnc = cell.display_string("mnc").unwrap_or_default();
    let area = if cell.has("tac") {
        cell.display_string("tac").unwrap_or_default()
    } else {
        cell.display_string("lac").unwrap_or_default()
    };
    let cid = if cell.has("full_cell_id") {
        cell.display_string("full_cell_id").unwrap_or_default()
    } else {
        cell.display_string("cid").unwrap_or_default()
    };
    let composite = identity::composite_id(&mcc, &mnc, &area, &cid);

    let identity_key = cell
        .first_display(FULL_ID_KEYS)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| composite.clone());
    if identity_key.is_empty() {
        return Err(DecodeError::IdentityMissing);
    }
    let composite_id = if composite.is_empty() {
        identity_key.clone()
    } else {
        composite
    };
    let pseudo_address = identity::pseudo_address(&identity_key);

    // Channel and band resolution.
    let channel = cell.first_display(CHANNEL_KEYS).unwrap_or_default();
    let channel_num = cell
        .first_i64(CHANNEL_KEYS)
        .and_then(|c| u32::try_from(c).ok());
    let band = cell
        .get_i64("band")
        .and_then(|b| u16::try_from(b).ok())
        .or_else(|| channel_num.and_then(bands::resolve_band));

    // A zero signal reading means "missing"; fall back to rsrp so the
    // stored signal is meaningful.
    let mut rssi = cell.get_i64("rssi").unwrap_or(0);
    let rsrp = cell.get_i64("rsrp").unwrap_or(0);
    if rssi == 0 && rsrp != 0 {
        rssi = rsrp;
    }
    let rsrq = cell.get_i64("rsrq").unwrap_or(0);

    let (dl_freq_mhz, ul_freq_mhz) = match (channel_num, band) {
        (Some(ch), Some(b)) => bands::frequencies(b, ch),
        _ => (None, None),
    };

    let record = CellRecord {
        composite_id,
        pseudo_address,
        rat: cell.display_string("rat").unwrap_or_default(),
        channel,
        pci: cell.display_string("pci").unwrap_or_default(),
        rssi,
        rsrp,
        rsrq,
        band,
        dl_freq_mhz,
        ul_freq_mhz,
        registered: cell.get_bool("registered").unwrap_or(false),
    };

    // Derived tags first; raw fields never overwrite them.
    let mut tags = TagMap::new();
    tags.insert("cell.full_composite".into(), record.composite_id.clone());
    if let Some(b) = band {
        tags.insert("cell.band".into(), b.to_string());
    }
    if let Some(dl) = dl_freq_mhz {
        tags.insert("cell.dl_freq_mhz".into(), format!("{:.3}", dl));
    }
    if let Some(ul) = ul_freq_mhz {
        tags.insert("cell.ul_freq_mhz".into(), format!("{:.3}", ul));
    }
    add_tags(&mut tags, envelope);
    add_tags(&mut tags, cell);

    let location = match (envelope.get_f64("lat"), envelope.get_f64("lon")) {
        (Some(lat), Some(lon)) => Some(LocationUpdate {
            lat,
            lon,
            alt_m: envelope.get_f64("alt_m"),
            speed_mps: envelope.get_f64("speed_mps"),
            bearing_deg: envelope.get_f64("bearing_deg"),
        }),
        _ => None,
    };

    Ok(Decoded {
        record,
        tags,
        location,
        neighbors,
    })
}

/// Pick the primary cell: first `registered == true` entry of the `cells`
/// array, else the first entry; with no `cells` array the envelope itself
/// is the cell object (single-cell backward compatibility).
fn select_primary_cell(envelope: JsonObject<'_>) -> (JsonObject<'_>, usize) {
    if let Some(cells) = envelope.get_array("cells") {
        let objs: Vec<JsonObject<'_>> =
            cells.iter().filter_map(JsonObject::from_value).collect();
        if let Some(first) = objs.first().copied() {
            let primary = objs
                .iter()
                .copied()
                .find(|c| c.get_bool("registered").unwrap_or(false))
                .unwrap_or(first);
            return (primary, objs.len() - 1);
        }
    }
    (envelope, 0)
}

/// Add every primitive field of `obj` under a `cell.` key prefix, keeping
/// whatever is already present.
fn add_tags(tags: &mut TagMap, obj: JsonObject<'_>) {
    for (key, value) in obj.iter() {
        let Some(sval) = value_display(value) else {
            continue;
        };
        if sval.is_empty() {
            continue;
        }
        tags.entry(format!("cell.{}", key)).or_insert(sval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(line: &str) -> Decoded {
        decode_line(line.as_bytes()).unwrap()
    }

    #[test]
    fn test_end_to_end_single_cell() {
        let d = decode(r#"{"mcc":"310","mnc":"260","tac":"5","cid":"1234","earfcn":1300,"rssi":-85}"#);
        assert_eq!(d.record.composite_id, "310260-5-1234");
        assert_eq!(d.record.band, Some(3));
        assert_eq!(d.record.channel, "1300");
        assert_eq!(d.record.rssi, -85);
        assert!((d.record.dl_freq_mhz.unwrap() - 1815.0).abs() < 1e-9);
        assert_eq!(d.record.pseudo_address[0], 0x02);
        assert_eq!(d.neighbors, 0);
    }

    #[test]
    fn test_registered_cell_selected_regardless_of_position() {
        let d = decode(
            r#"{"cells":[
                {"cid":"1","mcc":"310","mnc":"260","registered":false},
                {"cid":"2","mcc":"310","mnc":"260","registered":true},
                {"cid":"3","mcc":"310","mnc":"260","registered":false}
            ]}"#,
        );
        assert_eq!(d.record.composite_id, "310260--2");
        assert!(d.record.registered);
        assert_eq!(d.neighbors, 2);
    }

    #[test]
    fn test_no_registered_cell_falls_back_to_first() {
        let d = decode(
            r#"{"cells":[
                {"cid":"7","mcc":"310","mnc":"260","registered":false},
                {"cid":"8","mcc":"310","mnc":"260","registered":false}
            ]}"#,
        );
        assert_eq!(d.record.composite_id, "310260--7");
        assert!(!d.record.registered);
    }

    #[test]
    fn test_signal_fallback_only_when_rssi_zero() {
        let d = decode(r#"{"cid":"1","rssi":0,"rsrp":-95}"#);
        assert_eq!(d.record.rssi, -95);
        assert_eq!(d.record.rsrp, -95);

        let d = decode(r#"{"cid":"1","rssi":-80,"rsrp":-95}"#);
        assert_eq!(d.record.rssi, -80);
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let line = r#"{"mcc":"310","mnc":"260","tac":"5","cid":"1234"}"#;
        let a = decode(line);
        let b = decode(line);
        assert_eq!(a.record.composite_id, b.record.composite_id);
        assert_eq!(a.record.pseudo_address, b.record.pseudo_address);
    }

    #[test]
    fn test_full_cell_key_preferred_for_identity() {
        let with_key = decode(r#"{"full_cell_key":"310-260-5-99","mcc":"310","mnc":"260"}"#);
        let without = decode(r#"{"mcc":"310","mnc":"260"}"#);
        assert_ne!(with_key.record.pseudo_address, without.record.pseudo_address);
        // The built composite is still reported when identity segments exist.
        assert_eq!(with_key.record.composite_id, "310260--");
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = decode_line(br#"{"mcc":"310","#).unwrap_err();
        assert_eq!(err.kind(), "parse");

        let err = decode_line(b"[1,2,3]").unwrap_err();
        assert_eq!(err.kind(), "not-an-object");
    }

    #[test]
    fn test_identity_missing_is_dropped() {
        let err = decode_line(br#"{"rssi":-80,"earfcn":1300}"#).unwrap_err();
        assert_eq!(err.kind(), "identity-missing");

        let err = decode_line(br#"{"cells":[{"rssi":-80}]}"#).unwrap_err();
        assert_eq!(err.kind(), "identity-missing");
    }

    #[test]
    fn test_channel_priority_and_numeric_string() {
        let d = decode(r#"{"cid":"1","nrarfcn":"633984","earfcn":1300}"#);
        assert_eq!(d.record.channel, "633984");
        // NR channel is out of the LTE range table; band stays unresolved.
        assert_eq!(d.record.band, None);
        assert_eq!(d.record.dl_freq_mhz, None);
    }

    #[test]
    fn test_explicit_band_wins_over_derivation() {
        // EARFCN 1300 would derive band 3; the explicit field wins.
        let d = decode(r#"{"cid":"1","earfcn":1300,"band":2}"#);
        assert_eq!(d.record.band, Some(2));
        // DL = 1930 + 0.1 * (1300 - 600)
        assert!((d.record.dl_freq_mhz.unwrap() - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_tdd_band_leaves_uplink_unresolved() {
        let d = decode(r#"{"cid":"1","earfcn":38000}"#);
        assert_eq!(d.record.band, Some(38));
        assert!(d.record.dl_freq_mhz.is_some());
        assert_eq!(d.record.ul_freq_mhz, None);
        assert!(!d.tags.contains_key("cell.ul_freq_mhz"));
    }

    #[test]
    fn test_lac_used_when_tac_absent() {
        let d = decode(r#"{"mcc":"310","mnc":"260","lac":"44","cid":"9"}"#);
        assert_eq!(d.record.composite_id, "310260-44-9");
    }

    #[test]
    fn test_tags_cover_envelope_and_cell() {
        let d = decode(
            r#"{"lat":1.0,"lon":2.0,"accuracy_m":4.5,
                "cells":[{"cid":"1","mcc":"310","mnc":"260","earfcn":1300,"registered":true}]}"#,
        );
        assert_eq!(d.tags.get("cell.full_composite").unwrap(), "310260--1");
        assert_eq!(d.tags.get("cell.band").unwrap(), "3");
        assert_eq!(d.tags.get("cell.dl_freq_mhz").unwrap(), "1815.000");
        assert_eq!(d.tags.get("cell.mcc").unwrap(), "310");
        assert_eq!(d.tags.get("cell.accuracy_m").unwrap(), "4.5");
        assert_eq!(d.tags.get("cell.registered").unwrap(), "true");
        // The cells array itself is not a primitive and produces no tag.
        assert!(!d.tags.contains_key("cell.cells"));
    }

    #[test]
    fn test_derived_tags_never_overwritten() {
        let d = decode(r#"{"cid":"1","earfcn":1300,"full_composite":"spoofed"}"#);
        assert_eq!(d.tags.get("cell.full_composite").unwrap(), "--1");
    }

    #[test]
    fn test_location_extraction() {
        let d = decode(
            r#"{"lat":35.68,"lon":139.69,"alt_m":40.0,"speed_mps":1.5,"bearing_deg":270.0,
                "cells":[{"cid":"1"}]}"#,
        );
        let loc = d.location.unwrap();
        assert!((loc.lat - 35.68).abs() < 1e-9);
        assert_eq!(loc.alt_m, Some(40.0));
        assert_eq!(loc.bearing_deg, Some(270.0));

        let d = decode(r#"{"lat":35.68,"cells":[{"cid":"1"}]}"#);
        assert!(d.location.is_none());
    }
}
