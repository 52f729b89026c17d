//! Integration tests for the status endpoint.

mod common;

use axum::http::StatusCode;
use onair_schedule::application::scheduler::FireOutcome;

#[tokio::test]
async fn test_status_before_first_cycle() {
    // Arrange
    let station = common::build_test_station(1);

    // Act
    let (status, json) = common::get_json(station.app(), "/status").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert!(json["chapter"].is_null());
    assert_eq!(json["cycles_fired"], 0);
    assert_eq!(json["cycles_skipped"], 0);
    assert_eq!(json["next_cycle_at"], "2026-01-15T10:30:00Z");
    assert_eq!(json["music"]["source"], "Radio/Musica");
    assert_eq!(json["music"]["state"], "owner_off");
    assert_eq!(json["pending_speech"], 0);
}

#[tokio::test]
async fn test_status_after_a_cycle_reports_chapter_and_open_music_window() {
    // Arrange
    let station = common::build_test_station(12);

    // Act
    let outcome = station.state.scheduler.fire().await;
    let (status, json) = common::get_json(station.app(), "/status").await;

    // Assert
    assert!(matches!(outcome, FireOutcome::Completed(_)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chapter"], 12);
    assert_eq!(json["cycles_fired"], 1);
    assert_eq!(json["music"]["state"], "owner_on");
    assert_eq!(station.plane.last_state(5), Some(true));
}
