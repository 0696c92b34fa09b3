//! Randomized drag sequences against the selection invariants
//!
//! A fixed-seed LCG drives the pointer so failures reproduce.

use pettalk_editor::selection::{
    Handle, SegmentSelector, SelectionStatus, MAX_DURATION, MIN_DURATION,
};

const EPS: f64 = 1e-9;
const TRACK_WIDTH: f64 = 640.0;

struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    /// Uniform in `[lo, hi)`
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (self.next_u32() as f64 / u32::MAX as f64) * (hi - lo)
    }

    fn handle(&mut self) -> Handle {
        match self.next_u32() % 3 {
            0 => Handle::Start,
            1 => Handle::End,
            _ => Handle::Track,
        }
    }
}

fn assert_bounds(selector: &SegmentSelector, context: &str) {
    let r = selector.range();
    let d = selector.duration();
    assert!(r.start >= -EPS, "{}: start {} < 0", context, r.start);
    assert!(r.end <= d + EPS, "{}: end {} > duration {}", context, r.end, d);
    assert!(r.start < r.end, "{}: start {} >= end {}", context, r.start, r.end);
}

#[test]
fn test_random_drags_keep_window_valid() {
    let mut rng = Lcg(0x5eed);

    for _ in 0..200 {
        let duration = rng.range(0.5, 120.0);
        let mut selector = SegmentSelector::new(duration);

        for step in 0..50 {
            let x0 = rng.range(0.0, TRACK_WIDTH);
            selector.pointer_down(rng.handle(), x0);
            for _ in 0..(rng.next_u32() % 6) {
                // Pointer may wander off the track in either direction
                let x = rng.range(-TRACK_WIDTH, 2.0 * TRACK_WIDTH);
                selector.pointer_move(x, TRACK_WIDTH);
                assert_bounds(&selector, &format!("duration {} step {}", duration, step));
            }
            selector.pointer_up();

            if duration >= MIN_DURATION {
                let width = selector.range().width();
                assert!(
                    width >= MIN_DURATION - EPS && width <= MAX_DURATION + EPS,
                    "duration {} step {}: width {}",
                    duration,
                    step,
                    width
                );
                assert!(selector.can_complete());
                assert!(selector.complete().is_ok());
            } else {
                assert!(!selector.can_complete());
                assert!(matches!(selector.status(), SelectionStatus::TooShort { .. }));
            }
        }
    }
}

#[test]
fn test_random_track_drags_preserve_width() {
    let mut rng = Lcg(42);

    for _ in 0..100 {
        let duration = rng.range(MIN_DURATION, 300.0);
        let mut selector = SegmentSelector::new(duration);
        let width = selector.range().width();

        selector.pointer_down(Handle::Track, TRACK_WIDTH / 2.0);
        for _ in 0..20 {
            selector.pointer_move(rng.range(-TRACK_WIDTH, 2.0 * TRACK_WIDTH), TRACK_WIDTH);
            assert!((selector.range().width() - width).abs() < 1e-6);
            assert_bounds(&selector, "track drag");
        }
        selector.pointer_up();
    }
}

#[test]
fn test_moves_after_release_are_ignored() {
    let mut selector = SegmentSelector::new(60.0);
    selector.pointer_down(Handle::Track, 100.0);
    selector.pointer_move(200.0, TRACK_WIDTH);
    selector.pointer_up();
    let settled = selector.range();

    selector.pointer_move(600.0, TRACK_WIDTH);
    assert_eq!(selector.range(), settled);
}

#[test]
fn test_disabled_selector_ignores_everything() {
    for duration in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let mut selector = SegmentSelector::new(duration);
        selector.pointer_down(Handle::End, 10.0);
        selector.pointer_move(300.0, TRACK_WIDTH);
        assert!(!selector.is_dragging());
        assert_eq!(selector.status(), SelectionStatus::Unavailable);
        assert!(selector.complete().is_err());
    }
}
