// Platform abstraction layer for the hunt
// The location watch and the camera are host capabilities; the core only sees these traits.

use crate::{CameraError, FacingMode, LocationError, RawLocationEvent, StreamId, WatchId, WatchOptions};
use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::mpsc;

/// Where a platform location watch delivers its events
pub type LocationSink = mpsc::UnboundedSender<RawLocationEvent>;

/// Continuous location subscription provided by the host
pub trait LocationSource: Send + Sync + Debug {
    /// Begin a long-lived watch. Events may arrive zero or many times.
    fn watch(
        &self,
        options: WatchOptions,
        sink: LocationSink,
    ) -> std::result::Result<WatchId, LocationError>;

    /// Cancel a watch. Unknown ids are ignored.
    fn clear_watch(&self, id: WatchId);

    /// Get the platform name
    fn platform_name(&self) -> &str;
}

/// Live video capture provided by the host
#[async_trait]
pub trait CameraDevice: Send + Sync + Debug {
    /// Open a stream from a camera with the given facing
    async fn open(&self, facing: FacingMode) -> std::result::Result<StreamId, CameraError>;

    /// Stop every track of a stream. Unknown ids are ignored.
    fn close(&self, stream: StreamId);

    /// Get the platform name
    fn platform_name(&self) -> &str;
}

/// Scriptable in-process platform, used by tests and the demo walk
pub mod sim {
    use super::*;
    use crate::RawFix;
    use shared::Coordinate;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use std::time::Duration;
    use tracing::{debug, info};

    #[derive(Debug, Default)]
    struct LocationInner {
        next_id: u64,
        watches: HashMap<WatchId, LocationSink>,
        denied: bool,
        watch_calls: u32,
        clear_calls: u32,
        last_options: Option<WatchOptions>,
    }

    #[derive(Debug, Default)]
    pub struct SimulatedLocationSource {
        inner: Mutex<LocationInner>,
    }

    impl SimulatedLocationSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// A source whose user has refused location access
        pub fn denying() -> Self {
            let source = Self::default();
            source.lock().denied = true;
            source
        }

        fn lock(&self) -> MutexGuard<'_, LocationInner> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Deliver a fix to every active watch. Returns how many watches received it.
        pub fn push_fix(&self, fix: RawFix) -> usize {
            self.broadcast(RawLocationEvent::Fix(fix))
        }

        pub fn move_to(&self, coordinate: Coordinate) -> usize {
            self.push_fix(RawFix::at(coordinate.latitude, coordinate.longitude))
        }

        pub fn push_error(&self, error: LocationError) -> usize {
            self.broadcast(RawLocationEvent::Error(error))
        }

        fn broadcast(&self, event: RawLocationEvent) -> usize {
            let mut inner = self.lock();
            // Receivers that went away are pruned like a browser drops dead callbacks
            inner.watches.retain(|_, sink| sink.send(event).is_ok());
            inner.watches.len()
        }

        /// The host stops delivering to every watch without being asked to.
        /// Returns how many watches were ended.
        pub fn end_watches(&self) -> usize {
            let mut inner = self.lock();
            let ended = inner.watches.len();
            inner.watches.clear();
            ended
        }

        pub fn active_watches(&self) -> usize {
            self.lock().watches.len()
        }

        pub fn watch_calls(&self) -> u32 {
            self.lock().watch_calls
        }

        pub fn clear_calls(&self) -> u32 {
            self.lock().clear_calls
        }

        pub fn last_options(&self) -> Option<WatchOptions> {
            self.lock().last_options
        }
    }

    impl LocationSource for SimulatedLocationSource {
        fn watch(
            &self,
            options: WatchOptions,
            sink: LocationSink,
        ) -> std::result::Result<WatchId, LocationError> {
            let mut inner = self.lock();
            inner.watch_calls += 1;
            inner.last_options = Some(options);

            if inner.denied {
                debug!("Simulated location watch refused");
                return Err(LocationError::PermissionDenied);
            }

            inner.next_id += 1;
            let id = WatchId(inner.next_id);
            inner.watches.insert(id, sink);
            info!("Simulated location watch {} started", id.0);
            Ok(id)
        }

        fn clear_watch(&self, id: WatchId) {
            let mut inner = self.lock();
            inner.clear_calls += 1;
            if inner.watches.remove(&id).is_some() {
                info!("Simulated location watch {} cleared", id.0);
            }
        }

        fn platform_name(&self) -> &str {
            "Simulated location"
        }
    }

    #[derive(Debug)]
    struct CameraInner {
        next_id: u64,
        outcomes: HashMap<FacingMode, std::result::Result<(), CameraError>>,
        open_delay: Option<Duration>,
        open_streams: HashSet<StreamId>,
        open_calls: u32,
        close_calls: u32,
        released: u32,
    }

    #[derive(Debug)]
    pub struct SimulatedCamera {
        inner: Mutex<CameraInner>,
    }

    impl Default for SimulatedCamera {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SimulatedCamera {
        /// A device with both a rear and a front camera that always opens
        pub fn new() -> Self {
            Self {
                inner: Mutex::new(CameraInner {
                    next_id: 0,
                    outcomes: HashMap::from([
                        (FacingMode::Environment, Ok(())),
                        (FacingMode::User, Ok(())),
                    ]),
                    open_delay: None,
                    open_streams: HashSet::new(),
                    open_calls: 0,
                    close_calls: 0,
                    released: 0,
                }),
            }
        }

        pub fn with_outcome(
            self,
            facing: FacingMode,
            outcome: std::result::Result<(), CameraError>,
        ) -> Self {
            self.lock().outcomes.insert(facing, outcome);
            self
        }

        /// Every facing fails with the same error
        pub fn failing(error: CameraError) -> Self {
            Self::new()
                .with_outcome(FacingMode::Environment, Err(error))
                .with_outcome(FacingMode::User, Err(error))
        }

        pub fn with_open_delay(self, delay: Duration) -> Self {
            self.lock().open_delay = Some(delay);
            self
        }

        fn lock(&self) -> MutexGuard<'_, CameraInner> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        pub fn open_calls(&self) -> u32 {
            self.lock().open_calls
        }

        pub fn close_calls(&self) -> u32 {
            self.lock().close_calls
        }

        /// Streams that were actually stopped
        pub fn released(&self) -> u32 {
            self.lock().released
        }

        pub fn active_streams(&self) -> usize {
            self.lock().open_streams.len()
        }
    }

    #[async_trait]
    impl CameraDevice for SimulatedCamera {
        async fn open(&self, facing: FacingMode) -> std::result::Result<StreamId, CameraError> {
            let delay = {
                let mut inner = self.lock();
                inner.open_calls += 1;
                inner.open_delay
            };

            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut inner = self.lock();
            let outcome = inner
                .outcomes
                .get(&facing)
                .copied()
                .unwrap_or(Err(CameraError::DeviceUnavailable));
            outcome?;

            inner.next_id += 1;
            let id = StreamId(inner.next_id);
            inner.open_streams.insert(id);
            debug!("Simulated {} camera stream {} opened", facing, id.0);
            Ok(id)
        }

        fn close(&self, stream: StreamId) {
            let mut inner = self.lock();
            inner.close_calls += 1;
            if inner.open_streams.remove(&stream) {
                inner.released += 1;
                debug!("Simulated camera stream {} closed", stream.0);
            }
        }

        fn platform_name(&self) -> &str {
            "Simulated camera"
        }
    }
}
