use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegscopeError {
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("Invalid m3u8 file: {0}")]
    M3u8ParseError(String),

    #[error("Variant {requested} requested, but playlist only has {available} variant(s)")]
    NoVariant { requested: usize, available: usize },

    #[error("{analyzer} failed: {message}")]
    AnalyzerError {
        analyzer: &'static str,
        message: String,
    },

    #[error("{analyzer} did not finish within {timeout:?}")]
    AnalyzerTimeout {
        analyzer: &'static str,
        timeout: Duration,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Segment #{index} ({uri}): {source}")]
    SegmentError {
        index: usize,
        uri: String,
        #[source]
        source: Box<SegscopeError>,
    },

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    MissingExecutable(#[from] which::Error),
}

pub type SegscopeResult<T> = Result<T, SegscopeError>;
