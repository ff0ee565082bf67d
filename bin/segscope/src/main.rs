use std::{num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use reqwest::{Client, Url};
use segscope::{
    correlate_report, resolve_media_playlist, segment_list, InspectionDispatcher,
    InspectorConfig, ProcessCorrelator,
};

#[derive(Parser, Debug, Clone)]
pub struct SegscopeArgs {
    /// Debug output
    #[clap(long, alias = "debug")]
    verbose: bool,

    /// Number of segments inspected concurrently
    #[clap(long, default_value = "10")]
    workers: NonZeroU32,

    /// Variant to pick for a multi-variant playlist. Defaults to the
    /// best variant by resolution, framerate, then bandwidth.
    #[clap(long)]
    variant: Option<usize>,

    /// Transport-continuity analyzer command, may contain arguments
    #[clap(long, default_value = "tsreport")]
    tsreport: String,

    /// Container-metadata analyzer command
    #[clap(long, default_value = "mediainfo")]
    mediainfo: String,

    /// Duration prober command
    #[clap(long, default_value = "ffprobe")]
    ffprobe: String,

    /// Per-analyzer timeout in seconds
    #[clap(long, default_value = "30")]
    timeout: u64,

    /// m3u8 url to inspect
    m3u8: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = SegscopeArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    if args.verbose {
                        tracing_subscriber::filter::LevelFilter::DEBUG
                    } else {
                        tracing_subscriber::filter::LevelFilter::INFO
                    }
                    .into(),
                )
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = InspectorConfig {
        workers: args.workers,
        tsreport_command: args.tsreport,
        mediainfo_command: args.mediainfo,
        ffprobe_command: args.ffprobe,
        analyzer_timeout: Duration::from_secs(args.timeout),
    };

    let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

    let url = Url::from_str(&args.m3u8)?;
    tracing::info!("Inspecting {url}");
    let (playlist_url, playlist) = resolve_media_playlist(&client, url, args.variant).await?;
    let segments = segment_list(&playlist_url, &playlist)?;
    tracing::info!("{} segments to inspect", segments.len());

    let correlator = ProcessCorrelator::from_config(client, &config);
    let dispatcher = InspectionDispatcher::new(correlator, config.workers);
    let inspections = dispatcher.inspect_all(&segments).await?;

    print!("{}", correlate_report(&segments, &inspections));

    Ok(())
}
