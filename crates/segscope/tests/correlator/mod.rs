use reqwest::{Client, Url};
use segscope::{SegmentCorrelator, SegscopeError};
use wiremock::MockServer;

use crate::{
    mock_body,
    stubs::{FailingProbe, StubMetadata, StubProbe, StubTransport},
};

#[tokio::test]
async fn test_all_three_analyzers_see_the_same_bytes() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mock_body(&server, "/segment_0.ts", "450000").await;

    let correlator =
        SegmentCorrelator::new(Client::new(), StubTransport, StubMetadata, StubProbe);
    let url = Url::parse(&format!("{}/segment_0.ts", server.uri()))?;
    let inspection = correlator.inspect(url).await?;

    let audio = inspection.audio.expect("audio timing");
    assert_eq!(audio.start_pts, 450000);
    assert_eq!(inspection.metadata.writing_library, "450000");
    assert_eq!(inspection.probe.audio.expect("audio probe").start_pts, 450000);
    Ok(())
}

#[tokio::test]
async fn test_missing_stream_stays_none() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mock_body(&server, "/segment_0.ts", "0").await;

    let correlator =
        SegmentCorrelator::new(Client::new(), StubTransport, StubMetadata, StubProbe);
    let url = Url::parse(&format!("{}/segment_0.ts", server.uri()))?;
    let inspection = correlator.inspect(url).await?;

    // the stub transport never reports video
    assert!(inspection.video.is_none());
    assert!(inspection.probe.video.is_none());
    Ok(())
}

#[tokio::test]
async fn test_one_failing_analyzer_fails_the_whole_inspection() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mock_body(&server, "/segment_0.ts", "450000").await;

    let correlator =
        SegmentCorrelator::new(Client::new(), StubTransport, StubMetadata, FailingProbe);
    let url = Url::parse(&format!("{}/segment_0.ts", server.uri()))?;
    let error = correlator.inspect(url).await.unwrap_err();

    assert!(matches!(
        error,
        SegscopeError::AnalyzerError {
            analyzer: "stub-ffprobe",
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn test_non_success_status_is_a_fetch_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    // no mock mounted: wiremock answers 404

    let correlator =
        SegmentCorrelator::new(Client::new(), StubTransport, StubMetadata, StubProbe);
    let url = Url::parse(&format!("{}/missing.ts", server.uri()))?;
    let error = correlator.inspect(url).await.unwrap_err();

    assert!(matches!(error, SegscopeError::HttpError(status) if status.as_u16() == 404));
    Ok(())
}
