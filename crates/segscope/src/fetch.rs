use bytes::Bytes;
use futures::Stream;
use reqwest::{Client, Url};

use crate::error::{SegscopeError, SegscopeResult};

/// Opens a single byte stream for a segment.
///
/// The response body is never buffered here; the caller consumes the
/// stream exactly once and fans the chunks out to the analyzers.
pub async fn fetch_segment_stream(
    client: &Client,
    url: Url,
) -> SegscopeResult<impl Stream<Item = reqwest::Result<Bytes>>> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        if let Ok(body) = response.text().await {
            tracing::warn!("Error body: {body}");
        }
        return Err(SegscopeError::HttpError(status));
    }

    Ok(response.bytes_stream())
}
