use std::{sync::LazyLock, time::Duration};

use regex::Regex;
use tokio::io::DuplexStream;

use crate::{
    analyzer::{build_command, run_with_temp_file, Analyzer},
    error::SegscopeResult,
};

static DELAY_RELATIVE_TO_VIDEO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Delay relative to video\s+:\s+(-?\d+)ms").unwrap());
static WRITING_LIBRARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Writing library\s+:\s+(.+)").unwrap());
static COLOR_PRIMARIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Color primaries\s+:\s+(.+)").unwrap());

/// Free-text container facts scoped to the whole segment. A fact the
/// analyzer did not report stays empty; that is a reportable state, not
/// an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFacts {
    /// Audio delay relative to video, in milliseconds, as reported.
    pub delay_relative_to_video: String,
    pub writing_library: String,
    pub color_primaries: String,
}

/// Container-metadata analyzer. The tool needs a seekable input, so the
/// stream is spooled to a temporary file first.
pub struct MediaInfoAnalyzer {
    command: String,
    timeout: Duration,
}

impl MediaInfoAnalyzer {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }
}

impl Analyzer for MediaInfoAnalyzer {
    type Report = MetadataFacts;

    const NAME: &'static str = "mediainfo";

    fn run(
        &self,
        input: DuplexStream,
    ) -> impl std::future::Future<Output = SegscopeResult<Self::Report>> + Send {
        let command = self.command.clone();
        let timeout = self.timeout;
        async move {
            let cmd = build_command(&command, Self::NAME)?;
            let output = run_with_temp_file(cmd, input, Self::NAME, timeout).await?;
            Ok(parse_metadata_facts(&output))
        }
    }
}

/// Matches the known line patterns; everything else is ignored. The last
/// occurrence of a pattern wins.
pub fn parse_metadata_facts(output: &str) -> MetadataFacts {
    let mut facts = MetadataFacts::default();
    for line in output.lines() {
        if let Some(capture) = DELAY_RELATIVE_TO_VIDEO.captures(line) {
            facts.delay_relative_to_video = capture[1].to_string();
        }
        if let Some(capture) = WRITING_LIBRARY.captures(line) {
            facts.writing_library = capture[1].trim().to_string();
        }
        if let Some(capture) = COLOR_PRIMARIES.captures(line) {
            facts.color_primaries = capture[1].trim().to_string();
        }
    }
    facts
}
