// Processing status unit tests

use watermarker::status::*;

#[test]
fn test_full_cycle_and_reentry() {
    let tracker = StatusTracker::new();
    assert_eq!(tracker.status(), ProcessingStatus::Idle);

    let ticket = tracker.begin();
    assert!(tracker.finish(ticket, false));
    assert_eq!(tracker.status(), ProcessingStatus::Error);

    // New input re-enters the machine
    tracker.reset();
    assert_eq!(tracker.status(), ProcessingStatus::Idle);
    let ticket = tracker.begin();
    assert!(tracker.finish(ticket, true));
    assert_eq!(tracker.status(), ProcessingStatus::Success);
}

#[tokio::test]
async fn test_superseded_request_cannot_overwrite() {
    let tracker = StatusTracker::new();
    let slow = tracker.begin();
    let fast = tracker.begin();

    let handle = {
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.finish(fast, true) })
    };
    assert!(handle.await.unwrap());

    assert!(!tracker.finish(slow, false));
    assert_eq!(tracker.status(), ProcessingStatus::Success);
    assert_eq!(tracker.generation(), fast.generation());
}
