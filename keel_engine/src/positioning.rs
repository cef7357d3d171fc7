use serde::Serialize;

use crate::error::EngineError;
use crate::geometry::{AxisOrigin, Point, Rect, Size};
use crate::scene::{SceneEntity, TextEntity};

/// How the virtual target rect scales into the viewport. All modes multiply
/// with the explicit scaling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Virtual units map 1:1 (times the scaling factor).
    Normal,
    /// Uniform scale, the whole target visible (letterboxed).
    AspectFit,
    /// Uniform scale, the viewport fully covered (cropped).
    AspectFill,
    /// Independent per-axis scale filling the viewport exactly.
    Stretch,
}

/// Bidirectional mapping between the fixed virtual scene space and the real
/// viewport.
///
/// The scaled target rect is centered in the viewport; the axis origin picks
/// the compass point of the target rect that anchors the transform, the axis
/// placement (when set) pins that anchor to a literal pixel regardless of
/// viewport size, the direction flips growth away from the anchor, and the
/// displacement adds a final pixel offset. Viewport size is read from the
/// render surface at transform time, never cached here.
#[derive(Debug, Clone, PartialEq)]
pub struct PositioningFrame {
    target: Rect,
    scaling_mode: ScalingMode,
    scaling_factor: f64,
    axis_origin: AxisOrigin,
    axis_placement: Option<Point>,
    axis_direction: Point,
    axis_displacement: Point,
    entity_anchor: Point,
}

impl PositioningFrame {
    pub fn new(
        target_size: Size,
        axis_origin: AxisOrigin,
        scaling_mode: ScalingMode,
    ) -> Result<Self, EngineError> {
        if target_size.width <= 0.0 || target_size.height <= 0.0 {
            return Err(EngineError::InvalidConfiguration {
                reason: format!(
                    "target size must be positive, got {}x{}",
                    target_size.width, target_size.height
                ),
            });
        }
        Ok(PositioningFrame {
            target: Rect {
                origin: Point::ZERO,
                size: target_size,
            },
            scaling_mode,
            scaling_factor: 1.0,
            axis_origin,
            axis_placement: None,
            axis_direction: Point::new(1.0, 1.0),
            axis_displacement: Point::ZERO,
            entity_anchor: Point::new(0.5, 0.5),
        })
    }

    pub fn target(&self) -> Rect {
        self.target
    }

    pub fn scaling_mode(&self) -> ScalingMode {
        self.scaling_mode
    }

    pub fn scaling_factor(&self) -> f64 {
        self.scaling_factor
    }

    pub fn axis_origin(&self) -> AxisOrigin {
        self.axis_origin
    }

    pub fn set_axis_origin(&mut self, origin: AxisOrigin) {
        self.axis_origin = origin;
    }

    pub fn set_target_origin(&mut self, origin: Point) {
        self.target.origin = origin;
    }

    /// Pin the anchor to a fixed pixel instead of recomputing it from the
    /// viewport on resize.
    pub fn set_axis_placement(&mut self, placement: Option<Point>) {
        self.axis_placement = placement;
    }

    pub fn set_axis_displacement(&mut self, displacement: Point) {
        self.axis_displacement = displacement;
    }

    /// Degenerate parameters are rejected here, at configuration time, so a
    /// bad frame never reaches transform math.
    pub fn set_scaling_factor(&mut self, factor: f64) -> Result<(), EngineError> {
        if factor == 0.0 || !factor.is_finite() {
            return Err(EngineError::InvalidConfiguration {
                reason: format!("scaling factor must be finite and non-zero, got {factor}"),
            });
        }
        self.scaling_factor = factor;
        Ok(())
    }

    /// Direction components must be exactly ±1; anything else silently
    /// degenerates the transform and is rejected.
    pub fn set_axis_direction(&mut self, x: f64, y: f64) -> Result<(), EngineError> {
        if x.abs() != 1.0 || y.abs() != 1.0 {
            return Err(EngineError::InvalidConfiguration {
                reason: format!("axis direction components must be ±1, got ({x}, {y})"),
            });
        }
        self.axis_direction = Point::new(x, y);
        Ok(())
    }

    pub fn set_entity_anchor(&mut self, anchor: Point) {
        self.entity_anchor = anchor;
    }

    fn effective_scale(&self, viewport: Size) -> (f64, f64) {
        // Transform inverses divide by the viewport-derived scale.
        debug_assert!(
            viewport.width > 0.0 && viewport.height > 0.0,
            "viewport dimensions must be positive, got {}x{}",
            viewport.width,
            viewport.height
        );
        let base = match self.scaling_mode {
            ScalingMode::Normal => (1.0, 1.0),
            ScalingMode::Stretch => (
                viewport.width / self.target.size.width,
                viewport.height / self.target.size.height,
            ),
            ScalingMode::AspectFit => {
                let ratio = (viewport.width / self.target.size.width)
                    .min(viewport.height / self.target.size.height);
                (ratio, ratio)
            }
            ScalingMode::AspectFill => {
                let ratio = (viewport.width / self.target.size.width)
                    .max(viewport.height / self.target.size.height);
                (ratio, ratio)
            }
        };
        (base.0 * self.scaling_factor, base.1 * self.scaling_factor)
    }

    /// Real-viewport pixel the anchor sits at: the compass point of the
    /// scaled, centered target rect, unless an axis placement pins it.
    fn anchor_in_viewport(&self, viewport: Size) -> Point {
        if let Some(placement) = self.axis_placement {
            return placement;
        }
        let (sx, sy) = self.effective_scale(viewport);
        let scaled_width = self.target.size.width * sx;
        let scaled_height = self.target.size.height * sy;
        let origin_x = (viewport.width - scaled_width) / 2.0;
        let origin_y = (viewport.height - scaled_height) / 2.0;
        let (fx, fy) = self.axis_origin.anchor_fraction();
        Point::new(origin_x + fx * scaled_width, origin_y + fy * scaled_height)
    }

    /// Map a virtual point into real viewport pixels.
    pub fn translate_point_to(&self, point: Point, viewport: Size) -> Point {
        let (sx, sy) = self.effective_scale(viewport);
        let anchor = self.anchor_in_viewport(viewport);
        let (fx, fy) = self.axis_origin.anchor_fraction();
        let local_x = point.x - self.target.origin.x - fx * self.target.size.width;
        let local_y = point.y - self.target.origin.y - fy * self.target.size.height;
        Point::new(
            anchor.x + self.axis_direction.x * local_x * sx + self.axis_displacement.x,
            anchor.y + self.axis_direction.y * local_y * sy + self.axis_displacement.y,
        )
    }

    /// Exact algebraic inverse of [`translate_point_to`] for the same frame
    /// state and viewport.
    pub fn translate_point_from(&self, point: Point, viewport: Size) -> Point {
        let (sx, sy) = self.effective_scale(viewport);
        let anchor = self.anchor_in_viewport(viewport);
        let (fx, fy) = self.axis_origin.anchor_fraction();
        let local_x = (point.x - self.axis_displacement.x - anchor.x) / sx * self.axis_direction.x;
        let local_y = (point.y - self.axis_displacement.y - anchor.y) / sy * self.axis_direction.y;
        Point::new(
            local_x + self.target.origin.x + fx * self.target.size.width,
            local_y + self.target.origin.y + fy * self.target.size.height,
        )
    }

    fn position_framed(
        &self,
        position: Point,
        size: Size,
        anchor: Option<Point>,
        offset: Point,
        viewport: Size,
    ) -> Rect {
        let (sx, sy) = self.effective_scale(viewport);
        let anchor = anchor.unwrap_or(self.entity_anchor);
        let scaled = Size::new(size.width * sx, size.height * sy);
        let translated = self.translate_point_to(position, viewport);
        Rect {
            origin: Point::new(
                translated.x - anchor.x * scaled.width + offset.x,
                translated.y - anchor.y * scaled.height + offset.y,
            ),
            size: scaled,
        }
    }

    /// Real-space draw rect for a scene entity. The entity's declared
    /// position is its anchor point (center by default), not its top-left.
    pub fn position_scene_entity(&self, entity: &SceneEntity, viewport: Size) -> Rect {
        self.position_framed(
            entity.position,
            entity.size,
            entity.anchor,
            Point::ZERO,
            viewport,
        )
    }

    /// Offset variant for nested placement: the offset is literal real-space
    /// pixels applied after the full transform.
    pub fn position_scene_entity_with_offset(
        &self,
        entity: &SceneEntity,
        offset: Point,
        viewport: Size,
    ) -> Rect {
        self.position_framed(entity.position, entity.size, entity.anchor, offset, viewport)
    }

    pub fn position_text_entity(&self, entity: &TextEntity, viewport: Size) -> Rect {
        self.position_framed(
            entity.position,
            entity.size,
            entity.anchor,
            Point::ZERO,
            viewport,
        )
    }

    pub fn position_text_entity_with_offset(
        &self,
        entity: &TextEntity,
        offset: Point,
        viewport: Size,
    ) -> Rect {
        self.position_framed(entity.position, entity.size, entity.anchor, offset, viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_formats::ElementKind;

    fn frame(origin: AxisOrigin, mode: ScalingMode) -> PositioningFrame {
        PositioningFrame::new(Size::new(1920.0, 1080.0), origin, mode).unwrap()
    }

    fn assert_close(a: Point, b: Point) {
        let tolerance = 1e-9 * (1.0 + b.x.abs().max(b.y.abs()));
        assert!(
            (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn round_trip_across_origins_scales_and_viewports() {
        let viewports = [
            Size::new(1920.0, 1080.0),
            Size::new(1280.0, 720.0),
            Size::new(800.0, 1200.0),
        ];
        let scales = [0.5, 1.0, 2.0, 3.25];
        let modes = [
            ScalingMode::Normal,
            ScalingMode::AspectFit,
            ScalingMode::AspectFill,
            ScalingMode::Stretch,
        ];
        let points = [
            Point::ZERO,
            Point::new(960.0, 540.0),
            Point::new(-37.5, 1312.25),
            Point::new(1920.0, 1080.0),
        ];

        for mode in modes {
            for origin in AxisOrigin::ALL {
                for scale in scales {
                    let mut frame = frame(origin, mode);
                    frame.set_scaling_factor(scale).unwrap();
                    frame.set_axis_direction(-1.0, 1.0).unwrap();
                    frame.set_axis_displacement(Point::new(12.0, -8.0));
                    for viewport in viewports {
                        for point in points {
                            let there = frame.translate_point_to(point, viewport);
                            let back = frame.translate_point_from(there, viewport);
                            assert_close(back, point);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn center_anchor_maps_target_center_to_placement() {
        let mut frame = frame(AxisOrigin::Center, ScalingMode::Normal);
        frame.set_axis_placement(Some(Point::new(960.0, 540.0)));

        let center = Point::new(1920.0 / 2.0, 1080.0 / 2.0);
        let mapped = frame.translate_point_to(center, Size::new(640.0, 480.0));
        assert_close(mapped, Point::new(960.0, 540.0));

        // The placement pins the anchor independent of viewport size.
        let mapped = frame.translate_point_to(center, Size::new(3840.0, 2160.0));
        assert_close(mapped, Point::new(960.0, 540.0));
    }

    #[test]
    fn normal_mode_centers_target_in_viewport() {
        let frame = frame(AxisOrigin::TopLeft, ScalingMode::Normal);
        let viewport = Size::new(2120.0, 1280.0);
        // Target is centered: 100px margins on both axes.
        let mapped = frame.translate_point_to(Point::ZERO, viewport);
        assert_close(mapped, Point::new(100.0, 100.0));
    }

    #[test]
    fn bottom_anchored_entities_grow_upward() {
        let mut frame = frame(AxisOrigin::Bottom, ScalingMode::Normal);
        frame.set_axis_direction(1.0, -1.0).unwrap();
        let viewport = Size::new(1920.0, 1080.0);

        let at_anchor = frame.translate_point_to(Point::new(960.0, 1080.0), viewport);
        assert_close(at_anchor, Point::new(960.0, 1080.0));

        // With the Y direction flipped, growth from the anchor runs upward:
        // 100 virtual units past the bottom edge land 100 pixels above it.
        let above = frame.translate_point_to(Point::new(960.0, 1180.0), viewport);
        assert_close(above, Point::new(960.0, 980.0));
    }

    #[test]
    fn stretch_mode_fills_the_viewport() {
        let frame = frame(AxisOrigin::TopLeft, ScalingMode::Stretch);
        let viewport = Size::new(3840.0, 540.0);
        let mapped = frame.translate_point_to(Point::new(1920.0, 1080.0), viewport);
        assert_close(mapped, Point::new(3840.0, 540.0));
    }

    #[test]
    #[should_panic(expected = "viewport dimensions must be positive")]
    fn zero_viewport_is_a_caller_bug() {
        let frame = frame(AxisOrigin::TopLeft, ScalingMode::Stretch);
        frame.translate_point_to(Point::ZERO, Size::new(0.0, 720.0));
    }

    #[test]
    fn zero_scaling_factor_is_rejected() {
        let mut frame = frame(AxisOrigin::Center, ScalingMode::Normal);
        let err = frame.set_scaling_factor(0.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
        assert!(frame.set_scaling_factor(2.0).is_ok());
    }

    #[test]
    fn non_unit_directions_are_rejected() {
        let mut frame = frame(AxisOrigin::Center, ScalingMode::Normal);
        assert!(frame.set_axis_direction(0.0, 1.0).is_err());
        assert!(frame.set_axis_direction(1.0, 2.0).is_err());
        assert!(frame.set_axis_direction(-1.0, -1.0).is_ok());
    }

    #[test]
    fn degenerate_target_size_is_rejected() {
        let err =
            PositioningFrame::new(Size::new(0.0, 1080.0), AxisOrigin::Center, ScalingMode::Normal)
                .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
    }

    #[test]
    fn entities_are_centered_on_their_position_by_default() {
        let frame = frame(AxisOrigin::TopLeft, ScalingMode::Normal);
        let viewport = Size::new(1920.0, 1080.0);
        let entity = SceneEntity::new(
            ElementKind::Sprite,
            "backdrop",
            Point::new(960.0, 540.0),
            Size::new(200.0, 100.0),
        );

        let rect = frame.position_scene_entity(&entity, viewport);
        assert_close(rect.origin, Point::new(860.0, 490.0));
        assert_eq!(rect.size, Size::new(200.0, 100.0));

        let offset_rect =
            frame.position_scene_entity_with_offset(&entity, Point::new(10.0, 20.0), viewport);
        assert_close(offset_rect.origin, Point::new(870.0, 510.0));
    }

    #[test]
    fn text_entities_take_real_space_offsets() {
        let frame = frame(AxisOrigin::TopLeft, ScalingMode::Normal);
        let viewport = Size::new(1920.0, 1080.0);
        let mut text = TextEntity::new("hint", Point::new(100.0, 200.0), Size::new(80.0, 20.0));
        text.anchor = Some(Point::ZERO);

        // Top-left anchored: the position is the rect origin directly.
        let rect = frame.position_text_entity(&text, viewport);
        assert_close(rect.origin, Point::new(100.0, 200.0));

        // The offset is literal pixels applied after the transform.
        let shifted =
            frame.position_text_entity_with_offset(&text, Point::new(5.0, -5.0), viewport);
        assert_close(shifted.origin, Point::new(105.0, 195.0));
        assert_eq!(shifted.size, Size::new(80.0, 20.0));
    }

    #[test]
    fn entity_anchor_overrides_the_frame_default() {
        let mut frame = frame(AxisOrigin::TopLeft, ScalingMode::Normal);
        let viewport = Size::new(1920.0, 1080.0);

        // Frame-level default: bottom-right anchored entities hang up-left
        // of their position.
        frame.set_entity_anchor(Point::new(1.0, 1.0));
        let entity = SceneEntity::new(
            ElementKind::Sprite,
            "corner",
            Point::new(100.0, 200.0),
            Size::new(80.0, 20.0),
        );
        let rect = frame.position_scene_entity(&entity, viewport);
        assert_close(rect.origin, Point::new(20.0, 180.0));

        // A per-entity anchor wins over the frame default.
        let mut pinned = entity.clone();
        pinned.anchor = Some(Point::ZERO);
        let rect = frame.position_scene_entity(&pinned, viewport);
        assert_close(rect.origin, Point::new(100.0, 200.0));
    }
}
