//! Stub analyzer collaborators. Each one fully drains its input (the
//! correlator's tee relies on that) and derives its report from the
//! segment body, so tests can tell which segment produced which report.

use segscope::{
    Analyzer, MetadataFacts, ProbeReport, SegscopeError, SegscopeResult, StreamProbe,
    StreamTiming, TransportReport,
};
use tokio::io::{AsyncReadExt, DuplexStream};

async fn read_body(mut input: DuplexStream) -> SegscopeResult<String> {
    let mut body = String::new();
    input.read_to_string(&mut body).await?;
    Ok(body)
}

/// Parses the segment body as a decimal audio start PTS.
pub struct StubTransport;

impl Analyzer for StubTransport {
    type Report = TransportReport;

    const NAME: &'static str = "stub-transport";

    fn run(
        &self,
        input: DuplexStream,
    ) -> impl std::future::Future<Output = SegscopeResult<Self::Report>> + Send {
        async move {
            let body = read_body(input).await?;
            let start_pts: i64 = body
                .trim()
                .parse()
                .map_err(|_| SegscopeError::ParseError(body.clone()))?;
            Ok(TransportReport {
                audio: Some(StreamTiming {
                    start_pts,
                    end_pts: start_pts + 540_000,
                    start_dts: start_pts,
                    end_dts: start_pts + 540_000,
                }),
                video: None,
            })
        }
    }
}

/// Echoes the segment body into the writing-library fact.
pub struct StubMetadata;

impl Analyzer for StubMetadata {
    type Report = MetadataFacts;

    const NAME: &'static str = "stub-mediainfo";

    fn run(
        &self,
        input: DuplexStream,
    ) -> impl std::future::Future<Output = SegscopeResult<Self::Report>> + Send {
        async move {
            let body = read_body(input).await?;
            Ok(MetadataFacts {
                writing_library: body.trim().to_string(),
                ..Default::default()
            })
        }
    }
}

/// Reports a fixed 6s audio duration, with the segment body echoed into
/// the stream's start_pts.
pub struct StubProbe;

impl Analyzer for StubProbe {
    type Report = ProbeReport;

    const NAME: &'static str = "stub-ffprobe";

    fn run(
        &self,
        input: DuplexStream,
    ) -> impl std::future::Future<Output = SegscopeResult<Self::Report>> + Send {
        async move {
            let body = read_body(input).await?;
            Ok(ProbeReport {
                audio: Some(StreamProbe {
                    codec_type: "audio".to_string(),
                    start_pts: body.trim().parse().unwrap_or_default(),
                    duration: "6.0".to_string(),
                }),
                video: None,
            })
        }
    }
}

/// Drains its input, then fails.
pub struct FailingProbe;

impl Analyzer for FailingProbe {
    type Report = ProbeReport;

    const NAME: &'static str = "stub-ffprobe";

    fn run(
        &self,
        input: DuplexStream,
    ) -> impl std::future::Future<Output = SegscopeResult<Self::Report>> + Send {
        async move {
            read_body(input).await?;
            Err(SegscopeError::AnalyzerError {
                analyzer: Self::NAME,
                message: "exit status: 1".to_string(),
            })
        }
    }
}
