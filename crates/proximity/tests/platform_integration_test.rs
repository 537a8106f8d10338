// Integration tests for the platform seams
// Tests the location watch and camera lifecycles against the simulated host

use proximity::platform::sim::{SimulatedCamera, SimulatedLocationSource};
use proximity::{
    CameraConstraints, CameraError, CameraSession, CameraState, FacingMode, LocationError,
    LocationEvent, LocationTracker, ProximityError, RawFix, WatchOptions,
};
use shared::Coordinate;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_pending, assert_ready, task};

const QUAD: Coordinate = Coordinate::new(28.364, 77.534);

#[test]
fn test_watch_wakes_on_fix() {
    let source = Arc::new(SimulatedLocationSource::new());
    let tracker = LocationTracker::new(source.clone(), WatchOptions::default());
    let mut handle = tracker.start().unwrap();

    let mut next = task::spawn(handle.next_event());
    assert_pending!(next.poll());

    source.move_to(QUAD);
    assert!(next.is_woken());
    match assert_ready!(next.poll()) {
        Some(LocationEvent::Position(position)) => assert_eq!(position.coordinate, QUAD),
        other => panic!("expected a position, got {:?}", other),
    }
}

#[test]
fn test_malformed_fix_keeps_waiting() {
    let source = Arc::new(SimulatedLocationSource::new());
    let tracker = LocationTracker::new(source.clone(), WatchOptions::default());
    let mut handle = tracker.start().unwrap();

    source.push_fix(RawFix::at(f64::NAN, 77.534));
    let mut next = task::spawn(handle.next_event());
    assert_pending!(next.poll());
}

#[tokio::test]
async fn test_two_watches_are_independent() {
    let source = Arc::new(SimulatedLocationSource::new());
    let tracker = LocationTracker::new(source.clone(), WatchOptions::default());
    let mut first = tracker.start().unwrap();
    let mut second = tracker.start().unwrap();
    assert_eq!(source.active_watches(), 2);

    tracker.stop(&mut first);
    assert_eq!(source.active_watches(), 1);
    assert!(first.next_event().await.is_none());

    assert_eq!(source.push_error(LocationError::Unavailable), 1);
    assert_eq!(
        second.next_event().await,
        Some(LocationEvent::Error(LocationError::Unavailable))
    );
}

#[tokio::test]
async fn test_denied_watch_is_reported() {
    let source = Arc::new(SimulatedLocationSource::denying());
    let tracker = LocationTracker::new(source.clone(), WatchOptions::default());

    let result = tracker.start();
    assert!(matches!(
        result,
        Err(ProximityError::Location(LocationError::PermissionDenied))
    ));
    assert_eq!(source.active_watches(), 0);
}

#[tokio::test]
async fn test_camera_stream_lifecycle() {
    let device = Arc::new(SimulatedCamera::new());
    let session = CameraSession::new(device.clone());
    assert_eq!(session.state(), CameraState::Idle);

    let stream = session.acquire(CameraConstraints::default()).await.unwrap();
    assert_eq!(stream.facing(), FacingMode::Environment);
    assert!(stream.is_live());
    assert_eq!(device.active_streams(), 1);

    // A released session can be reopened
    drop(stream);
    assert_eq!(session.state(), CameraState::Released);
    let again = session.acquire(CameraConstraints::default()).await.unwrap();
    assert!(again.is_live());
    assert_eq!(device.open_calls(), 2);
    assert_eq!(device.released(), 1);
}

#[tokio::test]
async fn test_camera_front_only_device_falls_back() {
    let device = Arc::new(
        SimulatedCamera::new().with_outcome(FacingMode::Environment, Err(CameraError::DeviceUnavailable)),
    );
    let session = CameraSession::new(device.clone());

    let stream = session.acquire(CameraConstraints::default()).await.unwrap();
    assert_eq!(stream.facing(), FacingMode::User);
    assert_eq!(
        session.state(),
        CameraState::Streaming {
            facing: FacingMode::User
        }
    );
}

#[tokio::test]
async fn test_camera_release_while_opening_closes_late_stream() {
    let device = Arc::new(SimulatedCamera::new().with_open_delay(Duration::from_millis(50)));
    let session = CameraSession::new(device.clone());

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.acquire(CameraConstraints::default()).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.state(), CameraState::Requesting);
    session.release();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(ProximityError::CameraReleased)));
    assert_eq!(device.active_streams(), 0);
    assert_eq!(session.state(), CameraState::Released);
}

#[tokio::test]
async fn test_reentered_view_keeps_camera_over_stale_request() {
    let device = Arc::new(SimulatedCamera::new().with_open_delay(Duration::from_millis(50)));
    let first_view = CameraSession::new(device.clone());
    let second_view = first_view.clone();

    let stale = {
        let session = first_view.clone();
        tokio::spawn(async move { session.acquire(CameraConstraints::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    first_view.release();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let fresh = tokio::spawn(async move { second_view.acquire(CameraConstraints::default()).await });

    assert!(matches!(
        stale.await.unwrap(),
        Err(ProximityError::CameraReleased)
    ));
    let stream = fresh.await.unwrap().unwrap();
    assert!(stream.is_live());
    assert_eq!(device.active_streams(), 1);

    drop(stream);
    assert_eq!(device.active_streams(), 0);
    assert_eq!(first_view.state(), CameraState::Released);
}

#[tokio::test]
async fn test_acquire_after_cancelled_request() {
    let device = Arc::new(SimulatedCamera::new().with_open_delay(Duration::from_millis(50)));
    let session = CameraSession::new(device.clone());

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.acquire(CameraConstraints::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());
    assert_eq!(session.state(), CameraState::Idle);

    let stream = session.acquire(CameraConstraints::default()).await.unwrap();
    assert!(stream.is_live());
    assert_eq!(device.open_calls(), 2);
    assert_eq!(device.active_streams(), 1);
}
