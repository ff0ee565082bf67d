use std::num::NonZeroU32;

use reqwest::{Client, Url};
use segscope::{
    correlate_report, InspectionDispatcher, MediaSegmentRef, SegmentCorrelator, SegscopeError,
};
use wiremock::MockServer;

use crate::{
    init_tracing, mock_body,
    stubs::{StubMetadata, StubProbe, StubTransport},
};

fn segment_refs(server_uri: &str, count: usize) -> Vec<MediaSegmentRef> {
    (0..count)
        .map(|i| MediaSegmentRef {
            index: i,
            uri: format!("segment_{i}.ts"),
            url: Url::parse(&format!("{server_uri}/segment_{i}.ts")).unwrap(),
            duration: 6.0,
        })
        .collect()
}

async fn mock_segments(server: &MockServer, count: usize) {
    for i in 0..count {
        // body encodes the expected audio start PTS of segment i
        mock_body(server, &format!("/segment_{i}.ts"), (i * 540_000).to_string()).await;
    }
}

fn dispatcher(workers: u32) -> InspectionDispatcher<StubTransport, StubMetadata, StubProbe> {
    let correlator = SegmentCorrelator::new(Client::new(), StubTransport, StubMetadata, StubProbe);
    InspectionDispatcher::new(correlator, NonZeroU32::new(workers).unwrap())
}

#[tokio::test]
async fn test_output_order_is_playlist_order() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    mock_segments(&server, 12).await;
    let segments = segment_refs(&server.uri(), 12);

    for workers in [1, 3, 8] {
        let inspections = dispatcher(workers).inspect_all(&segments).await?;
        assert_eq!(inspections.len(), 12);
        for (i, inspection) in inspections.iter().enumerate() {
            assert_eq!(
                inspection.audio.expect("audio timing").start_pts,
                (i * 540_000) as i64,
                "workers={workers} segment={i}"
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_worker_count_does_not_change_the_report() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mock_segments(&server, 12).await;
    let segments = segment_refs(&server.uri(), 12);

    let sequential = dispatcher(1).inspect_all(&segments).await?;
    let concurrent = dispatcher(12).inspect_all(&segments).await?;

    assert_eq!(
        correlate_report(&segments, &sequential),
        correlate_report(&segments, &concurrent)
    );
    Ok(())
}

#[tokio::test]
async fn test_first_error_aborts_with_segment_context() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    for i in 0..6 {
        // segment 2's body does not parse as a PTS, so its inspection fails
        let body = if i == 2 {
            "garbage".to_string()
        } else {
            (i * 540_000).to_string()
        };
        mock_body(&server, &format!("/segment_{i}.ts"), body).await;
    }
    let segments = segment_refs(&server.uri(), 6);

    let error = dispatcher(4).inspect_all(&segments).await.unwrap_err();
    match error {
        SegscopeError::SegmentError { index, uri, source } => {
            assert_eq!(index, 2);
            assert!(uri.contains("segment_2.ts"));
            assert!(matches!(*source, SegscopeError::ParseError(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_empty_playlist_yields_empty_output() -> anyhow::Result<()> {
    let inspections = dispatcher(4).inspect_all(&[]).await?;
    assert!(inspections.is_empty());
    Ok(())
}
