use std::{sync::LazyLock, time::Duration};

use regex::Regex;
use tokio::io::DuplexStream;

use crate::{
    analyzer::{build_command, run_with_stdin, Analyzer},
    error::{SegscopeError, SegscopeResult},
};

/// MPEG-TS system clock ticks per second. PTS/DTS values divided by this
/// give wall-clock seconds.
pub const TS_CLOCK_RATE: f64 = 90_000.0;

static PTS_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"PTS\s+(\d+)").unwrap());
static DTS_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"DTS\s+(\d+)").unwrap());

/// PTS/DTS boundaries of one elementary stream within a segment, in
/// transport clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTiming {
    pub start_pts: i64,
    pub end_pts: i64,
    pub start_dts: i64,
    pub end_dts: i64,
}

impl StreamTiming {
    pub fn start_seconds(&self) -> f64 {
        self.start_pts as f64 / TS_CLOCK_RATE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportReport {
    pub audio: Option<StreamTiming>,
    pub video: Option<StreamTiming>,
}

/// Transport-continuity analyzer, fed over stdin.
pub struct TsReportAnalyzer {
    command: String,
    timeout: Duration,
}

impl TsReportAnalyzer {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }
}

impl Analyzer for TsReportAnalyzer {
    type Report = TransportReport;

    const NAME: &'static str = "tsreport";

    fn run(
        &self,
        input: DuplexStream,
    ) -> impl std::future::Future<Output = SegscopeResult<Self::Report>> + Send {
        let command = self.command.clone();
        let timeout = self.timeout;
        async move {
            let mut cmd = build_command(&command, Self::NAME)?;
            cmd.args(["-v", "-stdin", "-timing"]);
            let output = run_with_stdin(cmd, input, Self::NAME, timeout).await?;
            parse_transport_report(&output)
        }
    }
}

/// Extracts per-stream PTS/DTS boundaries from the analyzer's text
/// output.
///
/// A line containing `Stream ID:` opens a block; the block's PTS line
/// sits four lines below it, followed by an optional DTS line. The first
/// block seen for a stream fixes the start values, every block updates
/// the end values. A block whose marker is neither `Audio` nor `Video`
/// is skipped.
pub fn parse_transport_report(output: &str) -> SegscopeResult<TransportReport> {
    let lines: Vec<&str> = output.lines().collect();
    let mut report = TransportReport::default();

    for (i, line) in lines.iter().enumerate() {
        if !line.contains("Stream ID:") || i + 4 >= lines.len() {
            continue;
        }

        let pts = parse_timestamp(&PTS_VALUE, lines[i + 4])?;
        let mut dts = pts;
        if let Some(dts_line) = lines.get(i + 5) {
            if dts_line.contains("DTS") {
                dts = parse_timestamp(&DTS_VALUE, dts_line)?;
            }
        }

        let slot = if line.contains("Audio") {
            &mut report.audio
        } else if line.contains("Video") {
            &mut report.video
        } else {
            continue;
        };
        let timing = slot.get_or_insert(StreamTiming {
            start_pts: pts,
            end_pts: pts,
            start_dts: dts,
            end_dts: dts,
        });
        timing.end_pts = pts;
        timing.end_dts = dts;
    }

    Ok(report)
}

fn parse_timestamp(pattern: &Regex, line: &str) -> SegscopeResult<i64> {
    let capture = pattern
        .captures(line)
        .ok_or_else(|| SegscopeError::ParseError(format!("no timestamp in line {line:?}")))?;
    capture[1]
        .parse()
        .map_err(|_| SegscopeError::ParseError(format!("invalid timestamp in line {line:?}")))
}
