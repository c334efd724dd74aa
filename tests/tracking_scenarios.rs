use byte_tracker::{BBox, ByteTracker, Detection};

fn det(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> Detection {
    Detection { tlbr: BBox::new(x1, y1, x2, y2), score, class_name: "person".into() }
}

#[test]
fn single_object_steady_motion_keeps_one_id() {
    let mut tracker = ByteTracker::new(30.0, 30, 0.5, None, 0.8).unwrap();

    let mut id = None;
    for frame in 0..10u32 {
        let shift = frame as f64 * 5.0;
        let out = tracker.update(&[det(100.0 + shift, 100.0, 150.0 + shift, 200.0, 0.9)]);

        if frame == 0 {
            assert!(out.is_empty(), "frame 0 should be tentative");
            continue;
        }

        assert_eq!(out.len(), 1);
        assert!(out[0].track_id > 0);
        match id {
            None => id = Some(out[0].track_id),
            Some(existing) => assert_eq!(out[0].track_id, existing),
        }

        if frame >= 3 {
            assert!((out[0].tlwh.x - (100.0 + shift)).abs() < 2.0);
        }
    }
}

#[test]
fn birth_is_tentative_until_second_association() {
    let mut tracker = ByteTracker::new(30.0, 30, 0.5, None, 0.8).unwrap();

    let out = tracker.update(&[det(0.0, 0.0, 100.0, 200.0, 0.9)]);
    assert!(out.is_empty());

    let out = tracker.update(&[det(2.0, 0.0, 102.0, 200.0, 0.9)]);
    assert_eq!(out.len(), 1);
}

#[test]
fn id_recovered_through_short_occlusion() {
    let mut tracker = ByteTracker::new(30.0, 30, 0.5, None, 0.8).unwrap();

    let mut id = None;
    for frame in 0..5 {
        let out = tracker.update(&[det(100.0, 100.0, 150.0, 200.0, 0.9)]);
        if frame >= 1 {
            id = Some(out[0].track_id);
        }
    }
    let id = id.unwrap();

    for _ in 0..3 {
        tracker.update(&[]);
    }

    let mut recovered = None;
    for _ in 0..7 {
        let out = tracker.update(&[det(100.0, 100.0, 150.0, 200.0, 0.9)]);
        if !out.is_empty() {
            recovered = Some(out[0].track_id);
            break;
        }
    }

    assert_eq!(recovered, Some(id), "reappearance within max_time_lost should keep the original id");
}

#[test]
fn id_is_lost_past_the_buffer_timeout() {
    // track_buffer=1 at frame_rate=30 -> max_time_lost = round(30/30 * 1) = 1.
    let mut tracker = ByteTracker::new(30.0, 1, 0.5, None, 0.8).unwrap();

    let mut first_id = None;
    for frame in 0..2 {
        let out = tracker.update(&[det(100.0, 100.0, 150.0, 200.0, 0.9)]);
        if frame == 1 {
            first_id = Some(out[0].track_id);
        }
    }
    let first_id = first_id.unwrap();

    // Occlusion far longer than max_time_lost.
    for _ in 0..40 {
        tracker.update(&[]);
    }

    let out = tracker.update(&[det(100.0, 100.0, 150.0, 200.0, 0.9)]);
    // Reappearance after timeout mints a new, larger id (and is tentative again).
    if let Some(obj) = out.first() {
        assert_ne!(obj.track_id, first_id);
    } else {
        let out = tracker.update(&[det(101.0, 100.0, 151.0, 200.0, 0.9)]);
        assert_eq!(out.len(), 1);
        assert_ne!(out[0].track_id, first_id);
    }
}

#[test]
fn low_confidence_dip_rescues_existing_track() {
    let mut tracker = ByteTracker::new(30.0, 30, 0.5, None, 0.8).unwrap();

    tracker.update(&[det(100.0, 100.0, 150.0, 200.0, 0.9)]);
    let out = tracker.update(&[det(101.0, 100.0, 151.0, 200.0, 0.9)]);
    let id = out[0].track_id;

    // Score drops below track_thresh (0.5) but above a near-zero floor;
    // round 2's plain-IoU association should still recover it.
    let out = tracker.update(&[det(102.0, 100.0, 152.0, 200.0, 0.3)]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].track_id, id);
}
