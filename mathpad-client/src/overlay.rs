//! Result labels floating over the canvas

use crate::surface::Point;
use mathpad_gateway::SolveResultRecord;
use serde::{Deserialize, Serialize};

/// A draggable `"expr = result"` label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayLabel {
    pub text: String,
    pub position: Point,
}

impl OverlayLabel {
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }

    pub fn from_record(record: &SolveResultRecord, position: Point) -> Self {
        Self::new(format!("{} = {}", record.expression, record.result), position)
    }

    pub fn drag_to(&mut self, position: Point) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_text() {
        let label = OverlayLabel::from_record(
            &SolveResultRecord::new("2+2", "4"),
            Point::new(12.0, 8.5),
        );
        assert_eq!(label.text, "2+2 = 4");
        assert_eq!(label.position, Point::new(12.0, 8.5));
    }

    #[test]
    fn test_drag() {
        let mut label = OverlayLabel::new("x = 2", Point::default());
        label.drag_to(Point::new(40.0, 60.0));
        assert_eq!(label.position, Point::new(40.0, 60.0));
        assert_eq!(label.text, "x = 2");
    }
}
