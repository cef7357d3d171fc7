use keel_formats::FrameRect;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }
}

impl From<FrameRect> for Rect {
    fn from(frame: FrameRect) -> Self {
        Rect::new(
            frame.x as f64,
            frame.y as f64,
            frame.width as f64,
            frame.height as f64,
        )
    }
}

/// Anchor compass-point of a positioning frame: which point of the target
/// rect anchors the virtual-to-real transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrigin {
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl AxisOrigin {
    /// Fractional position of this anchor within a rect, per axis.
    pub fn anchor_fraction(self) -> (f64, f64) {
        match self {
            AxisOrigin::TopLeft => (0.0, 0.0),
            AxisOrigin::Top => (0.5, 0.0),
            AxisOrigin::TopRight => (1.0, 0.0),
            AxisOrigin::Left => (0.0, 0.5),
            AxisOrigin::Center => (0.5, 0.5),
            AxisOrigin::Right => (1.0, 0.5),
            AxisOrigin::BottomLeft => (0.0, 1.0),
            AxisOrigin::Bottom => (0.5, 1.0),
            AxisOrigin::BottomRight => (1.0, 1.0),
        }
    }

    pub const ALL: [AxisOrigin; 9] = [
        AxisOrigin::TopLeft,
        AxisOrigin::Top,
        AxisOrigin::TopRight,
        AxisOrigin::Left,
        AxisOrigin::Center,
        AxisOrigin::Right,
        AxisOrigin::BottomLeft,
        AxisOrigin::Bottom,
        AxisOrigin::BottomRight,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rect_converts_to_engine_units() {
        let frame = FrameRect {
            x: 10,
            y: 20,
            width: 100,
            height: 50,
        };
        let rect = Rect::from(frame);
        assert_eq!(rect.origin, Point::new(10.0, 20.0));
        assert_eq!(rect.size, Size::new(100.0, 50.0));
        assert_eq!(rect.center(), Point::new(60.0, 45.0));
    }

    #[test]
    fn anchor_fractions_cover_the_compass() {
        assert_eq!(AxisOrigin::TopLeft.anchor_fraction(), (0.0, 0.0));
        assert_eq!(AxisOrigin::Center.anchor_fraction(), (0.5, 0.5));
        assert_eq!(AxisOrigin::BottomRight.anchor_fraction(), (1.0, 1.0));
        assert_eq!(AxisOrigin::Bottom.anchor_fraction(), (0.5, 1.0));
    }
}
