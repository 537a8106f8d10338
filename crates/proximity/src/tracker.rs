// Location Tracker - owns a platform location watch and normalizes what it delivers

use crate::platform::LocationSource;
use crate::{LocationEvent, Position, RawFix, RawLocationEvent, Result, WatchId, WatchOptions};
use chrono::Utc;
use shared::Coordinate;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct LocationTracker {
    source: Arc<dyn LocationSource>,
    options: WatchOptions,
}

impl LocationTracker {
    pub fn new(source: Arc<dyn LocationSource>, options: WatchOptions) -> Self {
        Self { source, options }
    }

    /// Begin a continuous watch. The returned handle clears it when stopped or dropped.
    pub fn start(&self) -> Result<WatchHandle> {
        let (sink, events) = mpsc::unbounded_channel();
        let id = self.source.watch(self.options, sink)?;

        info!(
            "Location watch {} started on {} (high accuracy: {})",
            id.0,
            self.source.platform_name(),
            self.options.high_accuracy
        );

        Ok(WatchHandle {
            source: Arc::clone(&self.source),
            id: Some(id),
            events,
            latest: None,
        })
    }

    /// Stop a watch. Safe to call more than once.
    pub fn stop(&self, handle: &mut WatchHandle) {
        handle.stop();
    }
}

/// A live location subscription. Dropping it cancels the platform watch.
pub struct WatchHandle {
    source: Arc<dyn LocationSource>,
    id: Option<WatchId>,
    events: mpsc::UnboundedReceiver<RawLocationEvent>,
    latest: Option<Position>,
}

impl WatchHandle {
    /// Wait for the next usable event. Returns `None` once the watch is stopped.
    pub async fn next_event(&mut self) -> Option<LocationEvent> {
        loop {
            if self.id.is_none() {
                return None;
            }
            let raw = self.events.recv().await?;
            if let Some(event) = self.accept(raw) {
                return Some(event);
            }
        }
    }

    /// Non-blocking variant of [`next_event`](Self::next_event)
    pub fn try_next_event(&mut self) -> Option<LocationEvent> {
        while self.id.is_some() {
            let raw = self.events.try_recv().ok()?;
            if let Some(event) = self.accept(raw) {
                return Some(event);
            }
        }
        None
    }

    fn accept(&mut self, raw: RawLocationEvent) -> Option<LocationEvent> {
        match raw {
            RawLocationEvent::Fix(fix) => {
                let position = normalize(fix)?;
                if let Some(latest) = self.latest {
                    if position.captured_at < latest.captured_at {
                        debug!(
                            "Ignoring stale fix from {} (latest is {})",
                            position.captured_at, latest.captured_at
                        );
                        return None;
                    }
                }
                self.latest = Some(position);
                Some(LocationEvent::Position(position))
            }
            RawLocationEvent::Error(error) => {
                warn!("Location watch reported: {}", error);
                Some(LocationEvent::Error(error))
            }
        }
    }

    /// Most recent accepted position
    pub fn latest(&self) -> Option<Position> {
        self.latest
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(id) = self.id.take() {
            self.source.clear_watch(id);
            self.events.close();
            info!("Location watch {} stopped", id.0);
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("id", &self.id)
            .field("latest", &self.latest)
            .finish()
    }
}

/// Turn a raw platform fix into a position, dropping fixes that are not numbers.
pub fn normalize(fix: RawFix) -> Option<Position> {
    let coordinate = Coordinate::new(fix.latitude, fix.longitude);
    if !coordinate.is_finite() {
        warn!(
            "Dropping malformed fix: lat={}, lng={}",
            fix.latitude, fix.longitude
        );
        return None;
    }

    Some(Position {
        coordinate,
        captured_at: fix.timestamp.unwrap_or_else(Utc::now),
        accuracy_m: fix.accuracy_m.filter(|a| a.is_finite() && *a >= 0.0),
    })
}
