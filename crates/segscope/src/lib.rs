//! Inspects the segments of an HLS media playlist for timing defects
//! (gaps, overlaps, audio/video drift) by correlating three independent
//! analyzers over every segment's raw bytes.
//!
//! ```text
//! ┌──────────┐           ┌────────────────────┐
//! │ Playlist ├──────────►│     Dispatcher     │  W concurrent
//! └──────────┘ segments  │    [Semaphore W]   │  correlators
//!                        └─────────┬──────────┘
//!                                  │ one HTTP stream per segment
//!                        ┌─────────▼──────────┐
//!                        │     Correlator     │
//!                        │   tee ×3 (duplex)  │
//!                        └──┬──────┬───────┬──┘
//!                           │      │       │
//!                      tsreport mediainfo ffprobe
//!                           │      │       │
//!                        └──┴──────┴───────┴──► SegmentInspection
//!
//!   ordered inspections ──► continuity reducer ──► report table
//! ```
//!
//! The dispatcher preserves playlist order regardless of completion
//! order; the reducer is strictly sequential because every row depends
//! on the previous segment's state.

pub mod analyzer;
pub mod config;
pub mod correlate;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod playlist;
pub mod report;
pub mod util;

pub use analyzer::{
    container::{MediaInfoAnalyzer, MetadataFacts},
    duration::{FfprobeAnalyzer, ProbeReport, StreamProbe},
    transport::{StreamTiming, TransportReport, TsReportAnalyzer, TS_CLOCK_RATE},
    Analyzer,
};
pub use config::InspectorConfig;
pub use correlate::{ProcessCorrelator, SegmentCorrelator, SegmentInspection};
pub use dispatch::InspectionDispatcher;
pub use error::{SegscopeError, SegscopeResult};
pub use playlist::{resolve_media_playlist, segment_list, MediaSegmentRef};
pub use report::{correlate_report, render_report, CorrelationState, ReportRow};
