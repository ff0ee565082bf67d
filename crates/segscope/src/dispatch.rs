use std::{num::NonZeroU32, sync::Arc};

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::{
    analyzer::{
        container::MetadataFacts, duration::ProbeReport, transport::TransportReport, Analyzer,
    },
    correlate::{SegmentCorrelator, SegmentInspection},
    error::{SegscopeError, SegscopeResult},
    playlist::MediaSegmentRef,
};

/// Fans the playlist's segments out to at most `workers` concurrent
/// correlator runs and collects the inspections back in playlist order.
///
/// ```text
/// ┌──────────┐  Segment 0   ┌──────────────────┐
/// │          ├──────────────►                  ├───┐
/// │          │  Segment 1   │   Correlators    │   │ inspect
/// │ Playlist ├──────────────►   [Semaphore W]  ◄───┘
/// │          │     ...      │                  │
/// │          │  Segment N   │      [MPSC]      ├─────► (index, result)
/// └──────────┘──────────────►                  │             │
///                           └──────────────────┘             ▼
///                                              inspections in playlist order
/// ```
pub struct InspectionDispatcher<T, C, D> {
    correlator: Arc<SegmentCorrelator<T, C, D>>,
    workers: NonZeroU32,
}

impl<T, C, D> InspectionDispatcher<T, C, D>
where
    T: Analyzer<Report = TransportReport>,
    C: Analyzer<Report = MetadataFacts>,
    D: Analyzer<Report = ProbeReport>,
{
    pub fn new(correlator: SegmentCorrelator<T, C, D>, workers: NonZeroU32) -> Self {
        Self {
            correlator: Arc::new(correlator),
            workers,
        }
    }

    /// Inspects every segment, at most `workers` at a time. `workers` is
    /// a resource-control knob bounding outbound HTTP connections and
    /// analyzer processes, not a correctness requirement.
    ///
    /// Output order is playlist order regardless of completion order.
    /// The first failed inspection cancels every in-flight and pending
    /// segment and is returned with its segment context attached.
    pub async fn inspect_all(
        &self,
        segments: &[MediaSegmentRef],
    ) -> SegscopeResult<Vec<SegmentInspection>> {
        let total = segments.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let permits = Arc::new(Semaphore::new(self.workers.get() as usize));
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(total);

        for segment in segments.iter().cloned() {
            let permits = permits.clone();
            let cancel = cancel.clone();
            let correlator = self.correlator.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return,
                    permit = permits.acquire_owned() => permit.unwrap(),
                };

                tracing::info!("Starting segment #{}: {}", segment.index, segment.url);
                let result = tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = correlator.inspect(segment.url.clone()) => result,
                };
                tracing::debug!(
                    "Finished segment #{}: success={}",
                    segment.index,
                    result.is_ok()
                );
                let _ = tx.send((segment.index, result)).await;
            });
        }
        drop(tx);

        let mut slots: Vec<Option<SegmentInspection>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);
        let mut filled = 0;
        while let Some((index, result)) = rx.recv().await {
            match result {
                Ok(inspection) => {
                    slots[index] = Some(inspection);
                    filled += 1;
                    if filled == total {
                        break;
                    }
                }
                Err(error) => {
                    cancel.cancel();
                    return Err(SegscopeError::SegmentError {
                        index,
                        uri: segments[index].url.to_string(),
                        source: Box::new(error),
                    });
                }
            }
        }

        Ok(slots
            .into_iter()
            .map(|slot| slot.expect("all inspections accounted for"))
            .collect())
    }
}
