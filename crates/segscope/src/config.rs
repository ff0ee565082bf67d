use std::{num::NonZeroU32, time::Duration};

/// Construction-time configuration for the whole inspection run.
///
/// Every component receives the values it needs from here; nothing reads
/// process-global state.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    /// Maximum number of segments inspected concurrently. Bounds outbound
    /// HTTP connections and analyzer child processes.
    pub workers: NonZeroU32,

    /// Transport-continuity analyzer command. May contain arguments,
    /// e.g. `"tsreport -legacy"`.
    pub tsreport_command: String,

    /// Container-metadata analyzer command.
    pub mediainfo_command: String,

    /// Duration prober command.
    pub ffprobe_command: String,

    /// Wall-clock limit for a single analyzer invocation. The child
    /// process is killed on expiry.
    pub analyzer_timeout: Duration,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            workers: NonZeroU32::new(10).unwrap(),
            tsreport_command: "tsreport".to_string(),
            mediainfo_command: "mediainfo".to_string(),
            ffprobe_command: "ffprobe".to_string(),
            analyzer_timeout: Duration::from_secs(30),
        }
    }
}
