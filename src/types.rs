//! Shared geometry types.

use serde::{Deserialize, Serialize};

/// A rectangle representing geometry.
///
/// Positions are signed because decorations can be dragged partly off
/// screen; sizes are unsigned like the X protocol's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Same rectangle moved to a new origin
    pub fn at(self, x: i32, y: i32) -> Self {
        Self { x, y, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_at_keeps_size() {
        let rect = Rect::new(10, 20, 100, 200).at(-5, 7);
        assert_eq!(rect, Rect::new(-5, 7, 100, 200));
    }

    #[test]
    fn test_rect_serialization() {
        let json = serde_json::to_string(&Rect::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, r#"{"x":1,"y":2,"width":3,"height":4}"#);
    }
}
