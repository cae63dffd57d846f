//! # Canvas State
//!
//! Everything the client remembers between solves: the variable map, the
//! overlay labels and whether a request is outstanding. State only changes
//! through [`CanvasState::apply`], so the request builder always sees the
//! result of every completed solve.

use crate::overlay::OverlayLabel;
use crate::surface::Point;
use mathpad_gateway::{SolveRequest, SolveResultRecord, VariableMap};

/// Something that happened on the pad
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// A request was sent
    SolveStarted,
    /// The gateway answered with records; `anchor` is where the drawing was
    SolveSucceeded {
        records: Vec<SolveResultRecord>,
        anchor: Point,
    },
    /// The request failed; nothing else changes
    SolveFailed,
    LabelDragged {
        index: usize,
        position: Point,
    },
    /// Wipe labels, variables and strokes
    Reset,
}

/// What the caller must do to the drawing surface after an event
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEffect {
    Keep,
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasState {
    variables: VariableMap,
    labels: Vec<OverlayLabel>,
    in_flight: bool,
}

impl CanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    pub fn labels(&self) -> &[OverlayLabel] {
        &self.labels
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Snapshot the current variables into a request for `image`
    pub fn build_request(&self, image: impl Into<String>) -> SolveRequest {
        SolveRequest::new(image, self.variables.clone())
    }

    pub fn apply(&mut self, event: CanvasEvent) -> SurfaceEffect {
        match event {
            CanvasEvent::SolveStarted => {
                self.in_flight = true;
                SurfaceEffect::Keep
            }
            CanvasEvent::SolveSucceeded { records, anchor } => {
                self.in_flight = false;

                for record in records.iter().filter(|r| r.is_assignment) {
                    tracing::debug!(name = %record.expression, value = %record.result, "variable assigned");
                    self.variables.assign(record.expression.clone(), record.result.clone());
                }

                match records.first() {
                    Some(first) => {
                        self.labels.push(OverlayLabel::from_record(first, anchor));
                        SurfaceEffect::Clear
                    }
                    None => SurfaceEffect::Keep,
                }
            }
            CanvasEvent::SolveFailed => {
                self.in_flight = false;
                SurfaceEffect::Keep
            }
            CanvasEvent::LabelDragged { index, position } => {
                match self.labels.get_mut(index) {
                    Some(label) => label.drag_to(position),
                    None => tracing::debug!(index, labels = self.labels.len(), "drag of unknown label ignored"),
                }
                SurfaceEffect::Keep
            }
            CanvasEvent::Reset => {
                *self = Self::default();
                SurfaceEffect::Clear
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn succeeded(records: Vec<SolveResultRecord>) -> CanvasEvent {
        CanvasEvent::SolveSucceeded {
            records,
            anchor: Point::new(50.0, 25.0),
        }
    }

    #[test]
    fn test_assignment_folds_before_next_request() {
        let mut state = CanvasState::new();
        let _ = state.apply(succeeded(vec![SolveResultRecord::assignment("x", "2")]));

        let request = state.build_request("data:image/png;base64,AAAA");
        assert_eq!(request.variables.get("x"), Some("2"));
        assert_eq!(request.image.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_plain_records_leave_variables_alone() {
        let mut state = CanvasState::new();
        let _ = state.apply(succeeded(vec![
            SolveResultRecord::new("2+2", "4"),
            SolveResultRecord::new("y", "5"),
        ]));
        assert!(state.variables().is_empty());
    }

    #[test]
    fn test_every_assignment_folds_and_later_wins() {
        let mut state = CanvasState::new();
        let _ = state.apply(succeeded(vec![
            SolveResultRecord::assignment("x", "2"),
            SolveResultRecord::assignment("y", "5"),
        ]));
        let _ = state.apply(succeeded(vec![SolveResultRecord::assignment("x", "9")]));

        assert_eq!(state.variables().get("x"), Some("9"));
        assert_eq!(state.variables().get("y"), Some("5"));
    }

    #[test]
    fn test_one_label_per_success() {
        let mut state = CanvasState::new();
        let effect = state.apply(succeeded(vec![
            SolveResultRecord::new("2+2", "4"),
            SolveResultRecord::new("3*3", "9"),
        ]));
        assert_eq!(effect, SurfaceEffect::Clear);

        let effect = state.apply(succeeded(vec![SolveResultRecord::assignment("x", "2")]));
        assert_eq!(effect, SurfaceEffect::Clear);

        let texts: Vec<_> = state.labels().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["2+2 = 4", "x = 2"]);
        assert_eq!(state.labels()[0].position, Point::new(50.0, 25.0));
    }

    #[test]
    fn test_empty_success_keeps_surface() {
        let mut state = CanvasState::new();
        assert_eq!(state.apply(succeeded(Vec::new())), SurfaceEffect::Keep);
        assert!(state.labels().is_empty());
    }

    #[test]
    fn test_in_flight_tracking() {
        let mut state = CanvasState::new();
        let _ = state.apply(CanvasEvent::SolveStarted);
        assert!(state.is_in_flight());

        let _ = state.apply(CanvasEvent::SolveFailed);
        assert!(!state.is_in_flight());
        assert!(state.labels().is_empty());

        let _ = state.apply(CanvasEvent::SolveStarted);
        let _ = state.apply(succeeded(vec![SolveResultRecord::new("1", "1")]));
        assert!(!state.is_in_flight());
    }

    #[test]
    fn test_failure_changes_nothing_else() {
        let mut state = CanvasState::new();
        let _ = state.apply(succeeded(vec![SolveResultRecord::assignment("x", "2")]));
        let before = state.clone();

        let _ = state.apply(CanvasEvent::SolveStarted);
        assert_eq!(state.apply(CanvasEvent::SolveFailed), SurfaceEffect::Keep);
        assert_eq!(state, before);
    }

    #[test]
    fn test_drag_moves_one_label() {
        let mut state = CanvasState::new();
        let _ = state.apply(succeeded(vec![SolveResultRecord::new("a", "1")]));
        let _ = state.apply(succeeded(vec![SolveResultRecord::new("b", "2")]));

        let _ = state.apply(CanvasEvent::LabelDragged {
            index: 1,
            position: Point::new(1.0, 2.0),
        });
        assert_eq!(state.labels()[0].position, Point::new(50.0, 25.0));
        assert_eq!(state.labels()[1].position, Point::new(1.0, 2.0));

        let before = state.clone();
        let _ = state.apply(CanvasEvent::LabelDragged {
            index: 7,
            position: Point::new(9.0, 9.0),
        });
        assert_eq!(state, before);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = CanvasState::new();
        let _ = state.apply(succeeded(vec![SolveResultRecord::assignment("x", "2")]));

        assert_eq!(state.apply(CanvasEvent::Reset), SurfaceEffect::Clear);
        assert_eq!(state, CanvasState::new());

        // resetting twice is harmless
        assert_eq!(state.apply(CanvasEvent::Reset), SurfaceEffect::Clear);
        assert!(state.build_request("x").variables.is_empty());
    }
}
