use crate::{correlate::SegmentInspection, playlist::MediaSegmentRef, util::url_path_tail};

/// Rendered for a report field that has no value.
const PLACEHOLDER: &str = " ";

/// Characters of the URI tail kept in the report.
const URI_TAIL: usize = 25;

/// Minimum rendered cell width.
const MIN_CELL_WIDTH: usize = 5;
/// Spaces between columns.
const CELL_PADDING: usize = 2;

const COLUMNS: [&str; 19] = [
    "Segment #",
    "Duration",
    "Audio",
    "Video",
    "Unique Audio",
    "Elapsed",
    "Audio",
    "Video",
    "AV Diff",
    "URI",
    "Audio PTS",
    "Diff",
    "Cumulative Overlap",
    "Video PTS",
    "Diff",
    "DTS",
    "Writing Lib",
    "Delay to Video",
    "Color",
];

/// Running accumulator for the sequential correlation pass. Lives for
/// one reduction over one playlist.
#[derive(Debug, Default)]
pub struct CorrelationState {
    elapsed: f64,
    elapsed_audio: f64,
    elapsed_video: f64,
    cumulative_overlap: f64,
}

impl CorrelationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cumulative_overlap(&self) -> f64 {
        self.cumulative_overlap
    }

    /// Folds one segment into the running state and produces its report
    /// row. Must be called in playlist order; every metric depends on
    /// the previous segment.
    pub fn fold_segment(
        &mut self,
        segment: &MediaSegmentRef,
        inspection: &SegmentInspection,
        previous: Option<&SegmentInspection>,
    ) -> ReportRow {
        self.elapsed += segment.duration;

        let video_duration = inspection
            .probe
            .video
            .as_ref()
            .and_then(|video| video.duration_secs());
        if let Some(video_duration) = video_duration {
            self.elapsed_video += video_duration;
        }

        let audio_duration = inspection
            .probe
            .audio
            .as_ref()
            .and_then(|audio| audio.duration_secs());
        let unique_audio = audio_duration.map(|audio_duration| {
            let mut unique = audio_duration;
            let prev_timing = previous.and_then(|prev| prev.audio);
            let prev_duration = previous
                .and_then(|prev| prev.probe.audio.as_ref())
                .and_then(|audio| audio.duration_secs());
            if let (Some(current), Some(prev_timing), Some(prev_duration)) =
                (inspection.audio, prev_timing, prev_duration)
            {
                // Overlapping audio across the segment boundary: the
                // packager re-encoded part of the previous segment's
                // audio into this one.
                let overlap =
                    prev_timing.start_seconds() + prev_duration - current.start_seconds();
                if overlap > 0.0 {
                    // Once triggered, the accumulator only grows and
                    // discounts every later segment's unique audio.
                    self.cumulative_overlap += overlap;
                    unique -= self.cumulative_overlap;
                }
            }
            self.elapsed_audio += unique;
            unique
        });

        let audio_pts = inspection.audio.map(|audio| (audio.start_pts, audio.end_pts));
        let audio_pts_diff = match (inspection.audio, previous.and_then(|prev| prev.audio)) {
            (Some(current), Some(prev)) => Some(current.start_pts - prev.end_pts),
            _ => None,
        };
        let video_pts = inspection.video.map(|video| (video.start_pts, video.end_pts));
        let video_pts_diff = match (inspection.video, previous.and_then(|prev| prev.video)) {
            (Some(current), Some(prev)) => Some(current.start_pts - prev.end_pts),
            _ => None,
        };
        // The DTS range only carries information when it differs from
        // the PTS range.
        let video_dts = inspection
            .video
            .map(|video| (video.start_dts, video.end_dts))
            .filter(|dts| video_pts != Some(*dts));

        ReportRow {
            index: segment.index,
            manifest_duration: segment.duration,
            audio_duration,
            video_duration,
            unique_audio,
            elapsed: self.elapsed,
            elapsed_audio: self.elapsed_audio,
            elapsed_video: self.elapsed_video,
            av_drift: self.elapsed_audio - self.elapsed_video,
            uri: url_path_tail(&segment.uri, URI_TAIL),
            audio_pts,
            audio_pts_diff,
            cumulative_overlap: self.cumulative_overlap,
            video_pts,
            video_pts_diff,
            video_dts,
            writing_library: inspection.metadata.writing_library.clone(),
            delay_to_video: inspection.metadata.delay_relative_to_video.clone(),
            color_primaries: inspection.metadata.color_primaries.clone(),
        }
    }
}

/// One rendered line of the report. Absent fields are explicit and map
/// to a placeholder when rendered.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub index: usize,
    pub manifest_duration: f64,
    pub audio_duration: Option<f64>,
    pub video_duration: Option<f64>,
    pub unique_audio: Option<f64>,
    pub elapsed: f64,
    pub elapsed_audio: f64,
    pub elapsed_video: f64,
    pub av_drift: f64,
    pub uri: String,
    pub audio_pts: Option<(i64, i64)>,
    pub audio_pts_diff: Option<i64>,
    pub cumulative_overlap: f64,
    pub video_pts: Option<(i64, i64)>,
    pub video_pts_diff: Option<i64>,
    pub video_dts: Option<(i64, i64)>,
    pub writing_library: String,
    pub delay_to_video: String,
    pub color_primaries: String,
}

impl ReportRow {
    fn cells(&self) -> Vec<String> {
        let range = |value: Option<(i64, i64)>| match value {
            Some((start, end)) => format!("{start} - {end}"),
            None => PLACEHOLDER.to_string(),
        };
        let diff = |value: Option<i64>| match value {
            Some(value) => value.to_string(),
            None => PLACEHOLDER.to_string(),
        };
        let seconds = |value: Option<f64>| match value {
            Some(value) => format_seconds(value),
            None => PLACEHOLDER.to_string(),
        };
        let text = |value: String| {
            if value.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                value
            }
        };

        vec![
            self.index.to_string(),
            format_seconds(self.manifest_duration),
            seconds(self.audio_duration),
            seconds(self.video_duration),
            seconds(self.unique_audio),
            format_seconds(self.elapsed),
            format_seconds(self.elapsed_audio),
            format_seconds(self.elapsed_video),
            format_seconds(self.av_drift),
            self.uri.clone(),
            range(self.audio_pts),
            diff(self.audio_pts_diff),
            format_seconds(self.cumulative_overlap),
            range(self.video_pts),
            diff(self.video_pts_diff),
            range(self.video_dts),
            text(self.writing_library.chars().take(3).collect()),
            text(self.delay_to_video.clone()),
            text(self.color_primaries.clone()),
        ]
    }
}

/// Renders the header, a dash separator preserving each header's width,
/// and one line per row, padded to fixed-width columns.
pub fn render_report(rows: &[ReportRow]) -> String {
    let mut lines: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 2);
    lines.push(COLUMNS.iter().map(|column| column.to_string()).collect());
    lines.push(
        COLUMNS
            .iter()
            .map(|column| "-".repeat(column.chars().count()))
            .collect(),
    );
    lines.extend(rows.iter().map(ReportRow::cells));

    let mut widths = vec![MIN_CELL_WIDTH; COLUMNS.len()];
    for line in &lines {
        for (i, cell) in line.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count() + CELL_PADDING);
        }
    }

    let mut out = String::new();
    for line in &lines {
        let mut rendered = String::new();
        for (i, cell) in line.iter().enumerate() {
            rendered.push_str(cell);
            if i + 1 < line.len() {
                for _ in cell.chars().count()..widths[i] {
                    rendered.push(' ');
                }
            }
        }
        out.push_str(rendered.trim_end());
        out.push('\n');
    }
    out
}

/// Reduces the ordered inspections into the final report table.
pub fn correlate_report(segments: &[MediaSegmentRef], inspections: &[SegmentInspection]) -> String {
    let mut state = CorrelationState::new();
    let mut rows = Vec::with_capacity(inspections.len());
    let mut previous: Option<&SegmentInspection> = None;
    for (segment, inspection) in segments.iter().zip(inspections) {
        rows.push(state.fold_segment(segment, inspection, previous));
        previous = Some(inspection);
    }
    render_report(&rows)
}

/// Signed seconds with millisecond precision, `1m3.25s` style.
pub fn format_seconds(value: f64) -> String {
    let millis = (value.abs() * 1000.0).round() as u64;
    let sign = if value < 0.0 && millis > 0 { "-" } else { "" };
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1000;
    let frac = format!("{:03}", millis % 1000);
    let frac = frac.trim_end_matches('0');
    let frac = if frac.is_empty() {
        String::new()
    } else {
        format!(".{frac}")
    };

    if minutes > 0 {
        format!("{sign}{minutes}m{seconds}{frac}s")
    } else {
        format!("{sign}{seconds}{frac}s")
    }
}
