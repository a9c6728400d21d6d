//! Frame forwarder: one decoded feed line in, at most one capture frame
//! out.
//!
//! The forwarder sits between the reframer and the host boundary. Every
//! line that decodes produces exactly one frame and one device update;
//! lines that fail to decode are dropped here and never reach the host.
//! A bad line has no effect on the lines around it.

use std::sync::Arc;

use bytes::Bytes;
use log::{debug, info};

use cellstream_protocol::{
    decode_line, CellRecord, LocationUpdate, ProtocolFrame, TagMap,
};

/// Delivery side of the host capture boundary. Fire-and-forget; slow or
/// absent consumers are the sink's problem, not the feed's.
pub trait FrameSink: Send + Sync {
    fn deliver(&self, frame: &ProtocolFrame);
}

/// Device-tracking side of the host boundary.
pub trait DeviceSink: Send + Sync {
    fn update(&self, record: &CellRecord, tags: &TagMap, location: Option<&LocationUpdate>);
}

/// Device sink that only logs what the tracker would receive.
pub struct LogDeviceSink;

impl DeviceSink for LogDeviceSink {
    fn update(&self, record: &CellRecord, tags: &TagMap, _location: Option<&LocationUpdate>) {
        debug!(
            "device {} composite={} tags={}",
            record.address_string(),
            record.composite_id,
            tags.len()
        );
    }
}

pub struct Forwarder {
    frame_sink: Arc<dyn FrameSink>,
    device_sink: Arc<dyn DeviceSink>,
    frames: u64,
    dropped: u64,
}

impl Forwarder {
    pub fn new(frame_sink: Arc<dyn FrameSink>, device_sink: Arc<dyn DeviceSink>) -> Self {
        Self {
            frame_sink,
            device_sink,
            frames: 0,
            dropped: 0,
        }
    }

    /// Process one complete line from the reframer. `captured_us` is the
    /// wall-clock time the line's newline was observed.
    pub fn handle_line(&mut self, line: &[u8], captured_us: i64) {
        let decoded = match decode_line(line) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.dropped += 1;
                debug!("dropped line ({}): {}", e.kind(), e);
                return;
            }
        };

        let frame = ProtocolFrame::cell(captured_us, Bytes::copy_from_slice(line));
        self.frame_sink.deliver(&frame);
        self.device_sink
            .update(&decoded.record, &decoded.tags, decoded.location.as_ref());
        self.frames += 1;

        let rat = if decoded.record.rat.is_empty() {
            "?"
        } else {
            &decoded.record.rat
        };
        let gps = decoded
            .location
            .map(|l| format!(" gps=({:.5},{:.5})", l.lat, l.lon))
            .unwrap_or_default();
        info!(
            "{} {} rssi={} band={} neighbors={}{}",
            rat,
            decoded.record.composite_id,
            decoded.record.rssi,
            decoded
                .record
                .band
                .map(|b| b.to_string())
                .unwrap_or_else(|| "?".into()),
            decoded.neighbors,
            gps
        );
    }

    pub fn frames_forwarded(&self) -> u64 {
        self.frames
    }

    pub fn lines_dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectFrames(Mutex<Vec<ProtocolFrame>>);

    impl FrameSink for CollectFrames {
        fn deliver(&self, frame: &ProtocolFrame) {
            self.0.lock().unwrap().push(frame.clone());
        }
    }

    #[derive(Default)]
    struct CollectDevices(Mutex<Vec<String>>);

    impl DeviceSink for CollectDevices {
        fn update(&self, record: &CellRecord, _tags: &TagMap, _location: Option<&LocationUpdate>) {
            self.0.lock().unwrap().push(record.composite_id.clone());
        }
    }

    fn forwarder() -> (Forwarder, Arc<CollectFrames>, Arc<CollectDevices>) {
        let frames = Arc::new(CollectFrames::default());
        let devices = Arc::new(CollectDevices::default());
        let fwd = Forwarder::new(frames.clone(), devices.clone());
        (fwd, frames, devices)
    }

    #[test]
    fn test_one_frame_per_decoded_line() {
        let (mut fwd, frames, devices) = forwarder();
        let line = br#"{"mcc":"310","mnc":"260","tac":"5","cid":"77","rssi":-80}"#;
        fwd.handle_line(line, 1_000_000);
        fwd.handle_line(line, 2_000_000);

        let frames = frames.0.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload.as_ref(), line);
        assert_eq!(frames[0].timestamp_us, 1_000_000);
        assert_eq!(frames[1].timestamp_us, 2_000_000);
        assert_eq!(
            devices.0.lock().unwrap().as_slice(),
            ["310260-5-77", "310260-5-77"]
        );
        assert_eq!(fwd.frames_forwarded(), 2);
    }

    #[test]
    fn test_malformed_line_produces_nothing() {
        let (mut fwd, frames, devices) = forwarder();
        fwd.handle_line(b"{truncated", 1);
        fwd.handle_line(b"[1,2,3]", 2);
        fwd.handle_line(b"{}", 3);

        assert!(frames.0.lock().unwrap().is_empty());
        assert!(devices.0.lock().unwrap().is_empty());
        assert_eq!(fwd.lines_dropped(), 3);
    }

    #[test]
    fn test_oversized_line_yields_no_frame() {
        use crate::reader::buffer::LineBuffer;

        let (mut fwd, frames, _devices) = forwarder();
        let mut buffer = LineBuffer::new(32);

        // an oversized record fills the buffer without a newline
        buffer.push(&[b'x'; 32]);
        for line in buffer.take_lines() {
            fwd.handle_line(&line, 0);
        }
        assert!(buffer.resync_on_overflow().is_some());

        // its tail arrives, then a well-formed line
        buffer.push(b"xxxx\"}\n{\"mcc\":\"310\",\"cid\":\"7\"}\n");
        for line in buffer.take_lines() {
            fwd.handle_line(&line, 0);
        }

        let frames = frames.0.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].payload.ends_with(b"\"cid\":\"7\"}"));
    }

    #[test]
    fn test_bad_line_does_not_disturb_neighbors() {
        let (mut fwd, frames, _devices) = forwarder();
        let good = br#"{"mcc":"310","mnc":"260","tac":"5","cid":"77"}"#;
        fwd.handle_line(good, 1);
        fwd.handle_line(b"garbage", 2);
        fwd.handle_line(good, 3);

        let frames = frames.0.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].timestamp_us, 3);
        assert_eq!(fwd.lines_dropped(), 1);
    }
}
