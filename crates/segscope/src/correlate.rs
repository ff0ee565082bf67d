use futures::TryStreamExt;
use reqwest::{Client, Url};
use tokio::io::AsyncWriteExt;

use crate::{
    analyzer::{
        container::{MediaInfoAnalyzer, MetadataFacts},
        duration::{FfprobeAnalyzer, ProbeReport},
        transport::{StreamTiming, TransportReport, TsReportAnalyzer},
        Analyzer,
    },
    config::InspectorConfig,
    error::{SegscopeError, SegscopeResult},
    fetch::fetch_segment_stream,
};

/// Buffer between the tee and each analyzer. A slow analyzer
/// back-pressures the copier once its buffer is full, which in turn
/// throttles the HTTP read.
const TEE_BUFFER_SIZE: usize = 64 * 1024;

/// Everything the three analyzers extracted from one segment. Immutable
/// once built; a missing elementary stream is `None`, never a zeroed
/// struct.
#[derive(Debug, Clone, Default)]
pub struct SegmentInspection {
    pub audio: Option<StreamTiming>,
    pub video: Option<StreamTiming>,
    pub probe: ProbeReport,
    pub metadata: MetadataFacts,
}

/// Downloads a segment once and drives the three analyzers over copies
/// of its byte stream.
pub struct SegmentCorrelator<T, C, D> {
    client: Client,
    transport: T,
    container: C,
    duration: D,
}

/// The correlator wired to the external analyzer processes.
pub type ProcessCorrelator =
    SegmentCorrelator<TsReportAnalyzer, MediaInfoAnalyzer, FfprobeAnalyzer>;

impl ProcessCorrelator {
    pub fn from_config(client: Client, config: &InspectorConfig) -> Self {
        Self::new(
            client,
            TsReportAnalyzer::new(config.tsreport_command.as_str(), config.analyzer_timeout),
            MediaInfoAnalyzer::new(config.mediainfo_command.as_str(), config.analyzer_timeout),
            FfprobeAnalyzer::new(config.ffprobe_command.as_str(), config.analyzer_timeout),
        )
    }
}

impl<T, C, D> SegmentCorrelator<T, C, D>
where
    T: Analyzer<Report = TransportReport>,
    C: Analyzer<Report = MetadataFacts>,
    D: Analyzer<Report = ProbeReport>,
{
    pub fn new(client: Client, transport: T, container: C, duration: D) -> Self {
        Self {
            client,
            transport,
            container,
            duration,
        }
    }

    /// Fetches the segment once and fans its bytes out to the three
    /// analyzers, then merges their reports.
    ///
    /// Fail-fast: any analyzer failure fails the whole inspection, there
    /// is no partial result.
    pub async fn inspect(&self, url: Url) -> SegscopeResult<SegmentInspection> {
        let stream = fetch_segment_stream(&self.client, url).await?;

        let (transport_writer, transport_reader) = tokio::io::duplex(TEE_BUFFER_SIZE);
        let (container_writer, container_reader) = tokio::io::duplex(TEE_BUFFER_SIZE);
        let (duration_writer, duration_reader) = tokio::io::duplex(TEE_BUFFER_SIZE);

        let copier = async move {
            let mut writers = [transport_writer, container_writer, duration_writer];
            futures::pin_mut!(stream);
            while let Some(chunk) = stream.try_next().await? {
                for writer in writers.iter_mut() {
                    writer
                        .write_all(&chunk)
                        .await
                        .map_err(SegscopeError::IOError)?;
                }
            }
            // dropping the writers signals end-of-stream to the analyzers
            Ok::<_, SegscopeError>(())
        };

        let (copy_result, transport, metadata, probe) = tokio::join!(
            copier,
            self.transport.run(transport_reader),
            self.container.run(container_reader),
            self.duration.run(duration_reader),
        );

        // A transport failure while copying is the root cause. A write
        // failure only happens when an analyzer dropped its end early,
        // and that analyzer's own result carries the better diagnosis.
        let copy_result = match copy_result {
            Err(error @ SegscopeError::RequestError(_)) => return Err(error),
            other => other,
        };
        let transport = transport?;
        let metadata = metadata?;
        let probe = probe?;
        copy_result?;

        Ok(SegmentInspection {
            audio: transport.audio,
            video: transport.video,
            probe,
            metadata,
        })
    }
}
