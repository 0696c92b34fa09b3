//! Dual-handle range selection state machine
//!
//! Pointer and touch input on a one-dimensional track is reduced to three
//! events: pointer-down on a target, pointer-move with an absolute client X,
//! and pointer-up/leave. Each event is handled synchronously.
//!
//! Drag deltas are always measured from the X position and window captured at
//! pointer-down, so repeated moves never accumulate rounding drift.

use super::{
    SelectionRange, SelectionStatus, MAX_DURATION, MIN_DURATION, WIDTH_EPSILON,
};
use crate::error::{Error, Result};
use tracing::debug;

/// What the pointer went down on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Start,
    End,
    /// The track between or around the handles; moves the whole window
    Track,
}

/// Interaction state with the values captured at pointer-down
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    DraggingStart { origin_x: f64, start0: f64 },
    DraggingEnd { origin_x: f64, end0: f64 },
    DraggingBoth { origin_x: f64, start0: f64, end0: f64 },
}

/// Turns pointer deltas into a validated selection window
#[derive(Debug, Clone)]
pub struct SegmentSelector {
    duration: f64,
    range: SelectionRange,
    state: DragState,
}

impl SegmentSelector {
    /// Create a selector for media of the given duration.
    ///
    /// A zero, negative or non-finite duration produces a disabled selector:
    /// every interaction is ignored and `status()` reports `Unavailable`.
    pub fn new(duration: f64) -> Self {
        if !duration.is_finite() || duration <= 0.0 {
            debug!("Selector disabled: unusable duration {}", duration);
            return Self {
                duration: 0.0,
                range: SelectionRange::new(0.0, 0.0),
                state: DragState::Idle,
            };
        }

        Self {
            duration,
            range: SelectionRange::new(0.0, duration.min(MIN_DURATION + 1.0)),
            state: DragState::Idle,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn range(&self) -> SelectionRange {
        self.range
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.duration > 0.0
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    /// Begin a drag on `target` at horizontal position `client_x`.
    pub fn pointer_down(&mut self, target: Handle, client_x: f64) {
        if !self.is_enabled() || !client_x.is_finite() {
            return;
        }

        let SelectionRange { start, end } = self.range;
        self.state = match target {
            Handle::Start => DragState::DraggingStart {
                origin_x: client_x,
                start0: start,
            },
            Handle::End => DragState::DraggingEnd {
                origin_x: client_x,
                end0: end,
            },
            Handle::Track => DragState::DraggingBoth {
                origin_x: client_x,
                start0: start,
                end0: end,
            },
        };
    }

    /// Apply a pointer move on a track `track_width` pixels wide.
    ///
    /// Ignored while idle, and for a zero-width track.
    pub fn pointer_move(&mut self, client_x: f64, track_width: f64) {
        if !self.is_enabled()
            || !client_x.is_finite()
            || !track_width.is_finite()
            || track_width <= 0.0
        {
            return;
        }

        let duration = self.duration;
        let to_seconds = |origin_x: f64| (client_x - origin_x) / track_width * duration;

        match self.state {
            DragState::Idle => {}
            DragState::DraggingStart { origin_x, start0 } => {
                self.range.start = self.constrain_start(start0 + to_seconds(origin_x));
            }
            DragState::DraggingEnd { origin_x, end0 } => {
                self.range.end = self.constrain_end(end0 + to_seconds(origin_x));
            }
            DragState::DraggingBoth {
                origin_x,
                start0,
                end0,
            } => {
                self.range = self.shift_window(start0, end0, to_seconds(origin_x));
            }
        }
    }

    /// Pointer released or left the track
    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }

    pub fn status(&self) -> SelectionStatus {
        if !self.is_enabled() {
            return SelectionStatus::Unavailable;
        }

        let width = self.range.width();
        if width < MIN_DURATION - WIDTH_EPSILON {
            SelectionStatus::TooShort {
                by: MIN_DURATION - width,
            }
        } else if width > MAX_DURATION + WIDTH_EPSILON {
            SelectionStatus::TooLong {
                by: width - MAX_DURATION,
            }
        } else {
            SelectionStatus::Ready
        }
    }

    pub fn can_complete(&self) -> bool {
        self.status().is_ready()
    }

    /// Hand out the final window, or a range error describing why it is not
    /// submittable.
    pub fn complete(&self) -> Result<SelectionRange> {
        match self.status() {
            SelectionStatus::Ready => Ok(self.range),
            SelectionStatus::TooShort { by } => Err(Error::Range(format!(
                "selection is {:.2}s shorter than the {}s minimum",
                by, MIN_DURATION
            ))),
            SelectionStatus::TooLong { by } => Err(Error::Range(format!(
                "selection is {:.2}s longer than the {}s maximum",
                by, MAX_DURATION
            ))),
            SelectionStatus::Unavailable => {
                Err(Error::Range("media has no usable duration".to_string()))
            }
        }
    }

    fn constrain_start(&self, proposed: f64) -> f64 {
        let end = self.range.end;
        let mut start = proposed.max(0.0).min(end - MIN_DURATION).max(0.0);
        if end - start > MAX_DURATION {
            start = (end - MAX_DURATION).max(0.0);
        }
        start.min(self.duration)
    }

    fn constrain_end(&self, proposed: f64) -> f64 {
        let start = self.range.start;
        let mut end = proposed.min(self.duration);
        if end < start + MIN_DURATION {
            end = (start + MIN_DURATION).min(self.duration);
        }
        if end - start > MAX_DURATION {
            end = (start + MAX_DURATION).min(self.duration);
        }
        end.max(0.0)
    }

    fn shift_window(&self, start0: f64, end0: f64, delta: f64) -> SelectionRange {
        let width = end0 - start0;
        let mut start = start0 + delta;
        let mut end = end0 + delta;

        if start < 0.0 {
            start = 0.0;
            end = width;
        }
        if end > self.duration {
            end = self.duration;
            start = self.duration - width;
        }

        SelectionRange::new(start.max(0.0), end)
    }
}
