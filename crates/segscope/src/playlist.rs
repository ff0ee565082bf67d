use m3u8_rs::{MediaPlaylist, Playlist};
use reqwest::{Client, Url};

use crate::error::{SegscopeError, SegscopeResult};

/// One segment of a media playlist, ready for inspection.
#[derive(Debug, Clone)]
pub struct MediaSegmentRef {
    /// Position in the playlist, starting from 0.
    pub index: usize,
    /// Raw URI as written in the playlist, kept for display.
    pub uri: String,
    /// Absolute URL, resolved against the playlist URL.
    pub url: Url,
    /// Duration declared by the `#EXTINF` tag, in seconds.
    pub duration: f64,
}

/// Fetches and parses a playlist, following master playlists down to a
/// media playlist.
///
/// With `variant` set, the master entry at that index is followed.
/// Without it, the best variant is selected by resolution, then
/// framerate, then bandwidth.
#[async_recursion::async_recursion]
pub async fn resolve_media_playlist(
    client: &Client,
    url: Url,
    variant: Option<usize>,
) -> SegscopeResult<(Url, MediaPlaylist)> {
    tracing::debug!("Fetching playlist {url}");

    let m3u8_bytes = {
        let response = client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(SegscopeError::HttpError(response.status()));
        }
        response.bytes().await?
    };
    let playlist = m3u8_rs::parse_playlist_res(&m3u8_bytes)
        .map_err(|_| SegscopeError::M3u8ParseError(url.to_string()))?;

    match playlist {
        Playlist::MasterPlaylist(pl) => {
            let mut variants = pl.variants;
            if variants.is_empty() {
                return Err(SegscopeError::M3u8ParseError(url.to_string()));
            }

            let picked = match variant {
                Some(requested) => {
                    variants
                        .get(requested)
                        .ok_or(SegscopeError::NoVariant {
                            requested,
                            available: variants.len(),
                        })?
                }
                None => {
                    tracing::info!(
                        "Master playlist input detected. Auto selecting best quality streams."
                    );
                    variants.sort_by(|a, b| {
                        // compare resolution first
                        if let (Some(a), Some(b)) = (a.resolution, b.resolution) {
                            if a.width != b.width {
                                return b.width.cmp(&a.width);
                            }
                        }

                        // compare framerate then
                        if let (Some(a), Some(b)) = (a.frame_rate, b.frame_rate) {
                            let a = a as u64;
                            let b = b as u64;
                            if a != b {
                                return b.cmp(&a);
                            }
                        }

                        // compare bandwidth finally
                        b.bandwidth.cmp(&a.bandwidth)
                    });
                    &variants[0]
                }
            };

            let url = url.join(&picked.uri)?;
            tracing::info!(
                "Selected variant: {url}; Bandwidth: {bandwidth}",
                bandwidth = picked.bandwidth
            );
            resolve_media_playlist(client, url, None).await
        }
        Playlist::MediaPlaylist(pl) => Ok((url, pl)),
    }
}

/// Flattens a media playlist into the ordered segment list, resolving
/// relative URIs against the playlist URL.
pub fn segment_list(
    playlist_url: &Url,
    playlist: &MediaPlaylist,
) -> SegscopeResult<Vec<MediaSegmentRef>> {
    let mut segments = Vec::with_capacity(playlist.segments.len());
    for (index, segment) in playlist.segments.iter().enumerate() {
        let url = playlist_url.join(&segment.uri)?;
        segments.push(MediaSegmentRef {
            index,
            uri: segment.uri.clone(),
            url,
            duration: segment.duration as f64,
        });
    }
    Ok(segments)
}
