use std::time::Duration;

use serde::Deserialize;
use tokio::io::DuplexStream;

use crate::{
    analyzer::{build_command, run_with_temp_file, Analyzer},
    error::{SegscopeError, SegscopeResult},
};

/// Declared duration and codec facts for one elementary stream, as
/// reported by the duration prober.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamProbe {
    #[serde(default)]
    pub codec_type: String,
    #[serde(default)]
    pub start_pts: i64,
    /// Seconds, kept textual until consumed.
    #[serde(default)]
    pub duration: String,
}

impl StreamProbe {
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration.parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub audio: Option<StreamProbe>,
    pub video: Option<StreamProbe>,
}

#[derive(Deserialize)]
struct RawProbe {
    #[serde(default)]
    streams: Vec<StreamProbe>,
}

/// Duration prober. Produces structured JSON; needs a seekable input, so
/// the stream is spooled to a temporary file first.
pub struct FfprobeAnalyzer {
    command: String,
    timeout: Duration,
}

impl FfprobeAnalyzer {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }
}

impl Analyzer for FfprobeAnalyzer {
    type Report = ProbeReport;

    const NAME: &'static str = "ffprobe";

    fn run(
        &self,
        input: DuplexStream,
    ) -> impl std::future::Future<Output = SegscopeResult<Self::Report>> + Send {
        let command = self.command.clone();
        let timeout = self.timeout;
        async move {
            let mut cmd = build_command(&command, Self::NAME)?;
            cmd.args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ]);
            let output = run_with_temp_file(cmd, input, Self::NAME, timeout).await?;
            parse_probe_report(&output)
        }
    }
}

/// Classifies the probed streams into the audio/video slots by codec
/// type; unrecognized codec types are ignored.
pub fn parse_probe_report(output: &str) -> SegscopeResult<ProbeReport> {
    let raw: RawProbe =
        serde_json::from_str(output).map_err(|error| SegscopeError::AnalyzerError {
            analyzer: FfprobeAnalyzer::NAME,
            message: format!("malformed probe output: {error}"),
        })?;

    let mut report = ProbeReport::default();
    for stream in raw.streams {
        match stream.codec_type.as_str() {
            "audio" => report.audio = Some(stream),
            "video" => report.video = Some(stream),
            _ => {}
        }
    }
    Ok(report)
}
