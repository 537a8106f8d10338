// Error handling tests

use proximity::{CameraError, ErrorCategory, ErrorContext, LocationError, ProximityError};
use uuid::Uuid;

#[test]
fn test_error_variants_display() {
    let errors = vec![
        ProximityError::Location(LocationError::PermissionDenied),
        ProximityError::Location(LocationError::Unavailable),
        ProximityError::Location(LocationError::Timeout),
        ProximityError::Camera(CameraError::PermissionDenied),
        ProximityError::Camera(CameraError::DeviceUnavailable),
        ProximityError::TargetNotFound("drop-9".to_string()),
    ];

    for error in errors {
        let display_msg = format!("{}", error);
        assert!(!display_msg.is_empty());
    }
}

#[test]
fn test_conversions_from_capability_errors() {
    let err: ProximityError = LocationError::Timeout.into();
    assert!(matches!(err, ProximityError::Location(LocationError::Timeout)));

    let err: ProximityError = CameraError::DeviceUnavailable.into();
    assert!(matches!(err, ProximityError::Camera(CameraError::DeviceUnavailable)));
}

#[test]
fn test_camera_messages_give_remediation_steps() {
    let denied = ProximityError::Camera(CameraError::PermissionDenied).user_message();
    assert!(denied.contains("allow access"));
    assert!(denied.contains("reopen"));

    let missing = ProximityError::Camera(CameraError::DeviceUnavailable).user_message();
    assert!(missing.contains("Close other apps"));
}

#[test]
fn test_location_messages_read_as_searching() {
    assert!(LocationError::Unavailable.user_message().contains("Searching"));
    assert!(LocationError::Timeout.user_message().contains("searching"));
    assert!(LocationError::PermissionDenied.user_message().contains("settings"));
}

#[test]
fn test_error_context_builder() {
    let session_id = Uuid::new_v4();

    let context = ErrorContext::new()
        .with_session_id(session_id)
        .with_target_id("drop-1")
        .with_info("Additional context");

    assert_eq!(context.session_id, Some(session_id));
    assert_eq!(context.target_id, Some("drop-1".to_string()));
    assert_eq!(context.additional_info, Some("Additional context".to_string()));
}

#[test]
fn test_error_context_partial() {
    let context = ErrorContext::new().with_target_id("drop-2");

    assert_eq!(context.target_id.as_deref(), Some("drop-2"));
    assert_eq!(context.session_id, None);
    assert_eq!(context.additional_info, None);
}

#[test]
fn test_error_categories() {
    assert_eq!(
        ProximityError::Location(LocationError::PermissionDenied).category(),
        ErrorCategory::Permission
    );
    assert_eq!(
        ProximityError::Location(LocationError::Timeout).category(),
        ErrorCategory::Location
    );
    assert_eq!(
        ProximityError::Camera(CameraError::PermissionDenied).category(),
        ErrorCategory::Permission
    );
    assert_eq!(
        ProximityError::Camera(CameraError::DeviceUnavailable).category(),
        ErrorCategory::Device
    );
    assert_eq!(ProximityError::CameraRequestPending.category(), ErrorCategory::Device);
    assert_eq!(
        ProximityError::TargetNotFound("x".to_string()).category(),
        ErrorCategory::NotFound
    );
    assert_eq!(
        ProximityError::InvalidInput("x".to_string()).category(),
        ErrorCategory::Validation
    );
}

#[test]
fn test_error_category_display() {
    assert_eq!(ErrorCategory::Permission.to_string(), "permission");
    assert_eq!(ErrorCategory::Location.to_string(), "location");
    assert_eq!(ErrorCategory::Device.to_string(), "device");
    assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
    assert_eq!(ErrorCategory::Validation.to_string(), "validation");
    assert_eq!(ErrorCategory::Internal.to_string(), "internal");
}

#[test]
fn test_all_errors_have_user_messages() {
    let errors = vec![
        ProximityError::Location(LocationError::PermissionDenied),
        ProximityError::Location(LocationError::Unavailable),
        ProximityError::Location(LocationError::Timeout),
        ProximityError::Camera(CameraError::PermissionDenied),
        ProximityError::Camera(CameraError::DeviceUnavailable),
        ProximityError::CameraRequestPending,
        ProximityError::CameraAlreadyActive,
        ProximityError::CameraReleased,
        ProximityError::NoPositionFix,
        ProximityError::TargetNotFound("test".to_string()),
        ProximityError::InvalidInput("test".to_string()),
        ProximityError::InternalError("test".to_string()),
    ];

    for error in errors {
        let msg = error.user_message();
        assert!(!msg.is_empty(), "Error {:?} has empty user message", error);
        assert!(msg.len() > 10, "Error {:?} has too short user message", error);
    }
}

#[test]
fn test_error_logging_with_context() {
    let error = ProximityError::Camera(CameraError::DeviceUnavailable);
    let context = ErrorContext::new()
        .with_session_id(Uuid::new_v4())
        .with_target_id("drop-3")
        .with_info("reveal");

    // This should not panic
    error.log_with_context(&context);
}
