//! `getStats()` が返す JSON の形

use serde::Serialize;

use webscope_channel::ChannelStats;
use webscope_stream::{Reconstructor, ReconstructorStats};

/// 受信側の統計
///
/// ```json
/// {
///   "window_len": 4000,
///   "retention_bound": 4000,
///   "sequence_id": 1234,
///   "stream": { "frames": 1300, "extended": 1200, "saturated": 0, "resynced": 3,
///               "dropped": 97, "malformed": 0, "highest_sequence_id": 1234 }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ReceiverReport {
    pub window_len: usize,
    pub retention_bound: usize,
    pub sequence_id: Option<u16>,
    pub stream: ReconstructorStats,
}

impl ReceiverReport {
    pub fn of(reconstructor: &Reconstructor) -> Self {
        ReceiverReport {
            window_len: reconstructor.window().map_or(0, |w| w.len()),
            retention_bound: reconstructor.retention_bound(),
            sequence_id: reconstructor.sequence_id(),
            stream: reconstructor.stats(),
        }
    }
}

/// チャンネル側の統計
#[derive(Debug, Serialize)]
pub struct ChannelReport {
    pub label: String,
    pub phase: &'static str,
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub messages_received: u64,
    pub bytes_received: u64,
    pub unhandled: u64,
    pub frames_published: u64,
    pub publish_failures: u64,
}

/// `ScopeChannel.getStats()` の全体
#[derive(Debug, Serialize)]
pub struct ScopeChannelReport {
    pub channel: ChannelReport,
    pub receiver: ReceiverReport,
}

impl ChannelReport {
    pub fn new(label: &str, phase: &'static str, stats: ChannelStats, published: u64, failed: u64) -> Self {
        ChannelReport {
            label: label.to_string(),
            phase,
            messages_sent: stats.messages_sent,
            bytes_sent: stats.bytes_sent,
            messages_received: stats.messages_received,
            bytes_received: stats.bytes_received,
            unhandled: stats.unhandled,
            frames_published: published,
            publish_failures: failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webscope_frame::{encode, Sample, SampleBatch};

    #[test]
    fn test_receiver_report_json() {
        let mut r = Reconstructor::new(8);
        let report = serde_json::to_value(ReceiverReport::of(&r)).unwrap();
        assert_eq!(report["window_len"], 0);
        assert!(report["sequence_id"].is_null());

        let frame = encode(&SampleBatch::new(3, vec![Sample::new(1.0, 0.1), Sample::new(2.0, 0.1)]));
        r.on_frame(&frame).unwrap();
        r.on_frame(&[1, 2, 3]).unwrap_err();

        let report = serde_json::to_value(ReceiverReport::of(&r)).unwrap();
        assert_eq!(report["window_len"], 2);
        assert_eq!(report["retention_bound"], 8);
        assert_eq!(report["sequence_id"], 3);
        assert_eq!(report["stream"]["frames"], 2);
        assert_eq!(report["stream"]["malformed"], 1);
        assert_eq!(report["stream"]["highest_sequence_id"], 3);
    }

    #[test]
    fn test_channel_report_json() {
        let stats = ChannelStats { messages_sent: 2, bytes_sent: 36, ..ChannelStats::default() };
        let report = serde_json::to_value(ChannelReport::new("webscope_data", "open", stats, 2, 1)).unwrap();
        assert_eq!(report["label"], "webscope_data");
        assert_eq!(report["phase"], "open");
        assert_eq!(report["bytes_sent"], 36);
        assert_eq!(report["publish_failures"], 1);
    }
}
