//! Device identity synthesis.
//!
//! The device-tracking boundary keys devices on link-layer-shaped 6-byte
//! addresses, so every cell identity is mapped to a deterministic pseudo
//! address. The hash is a fixed, published algorithm (FNV-1a 64-bit) so
//! the mapping survives process restarts and is identical across builds
//! and platforms. Collisions are acceptable; the address exists only to
//! give the tracker a stable key, not a uniqueness guarantee.

/// FNV-1a 64-bit offset basis.
const FNV64_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a 64-bit prime.
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a 64-bit hash.
pub fn fnv1a_64(data: &[u8]) -> u64 {
    let mut hash = FNV64_OFFSET;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV64_PRIME);
    }
    hash
}

/// Build the 6-byte pseudo address for an identity string.
///
/// Byte 0 is always 0x02 (locally administered, unicast), so the result
/// can never collide with a real hardware vendor address. Bytes 1..=5
/// carry bits 39..0 of the identity hash.
pub fn pseudo_address(id: &str) -> [u8; 6] {
    let hv = fnv1a_64(id.as_bytes());
    [
        0x02,
        (hv >> 32) as u8,
        (hv >> 24) as u8,
        (hv >> 16) as u8,
        (hv >> 8) as u8,
        hv as u8,
    ]
}

/// Build the composite cell id `mcc + mnc + "-" + area + "-" + cid`.
///
/// Separators are always present and empty fields render as empty
/// segments. Returns an empty string when every segment is empty, which
/// the decoder treats as "no identity".
pub fn composite_id(mcc: &str, mnc: &str, area: &str, cid: &str) -> String {
    if mcc.is_empty() && mnc.is_empty() && area.is_empty() && cid.is_empty() {
        return String::new();
    }
    format!("{}{}-{}-{}", mcc, mnc, area, cid)
}
