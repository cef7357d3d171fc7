use std::collections::BTreeMap;

use keel_formats::ElementKind;
use serde::Serialize;

use crate::geometry::{Point, Rect, Size};
use crate::positioning::PositioningFrame;

/// Supplies the current viewport dimensions. The positioning frame reads
/// this at transform time rather than caching renderer state.
///
/// Implementations must report positive dimensions; the transforms divide
/// by the viewport-derived scale.
pub trait RenderSurface {
    fn window_size(&self) -> Size;
}

/// Fixed-size surface backing tests and offline tooling.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessSurface {
    size: Size,
}

impl HeadlessSurface {
    pub fn new(size: Size) -> Self {
        HeadlessSurface { size }
    }
}

impl RenderSurface for HeadlessSurface {
    fn window_size(&self) -> Size {
        self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WindowId(u64);

/// A positioned sprite/image/control entity. `position` and `size` are in
/// virtual scene units; `draw_frame` is the resolved real-space rect.
#[derive(Debug, Clone)]
pub struct SceneEntity {
    pub kind: ElementKind,
    pub value: String,
    pub position: Point,
    pub size: Size,
    /// Per-entity override of the frame's default anchor fraction.
    pub anchor: Option<Point>,
    pub draw_frame: Rect,
}

impl SceneEntity {
    pub fn new(kind: ElementKind, value: &str, position: Point, size: Size) -> Self {
        SceneEntity {
            kind,
            value: value.to_string(),
            position,
            size,
            anchor: None,
            draw_frame: Rect::default(),
        }
    }
}

/// A positioned text run.
#[derive(Debug, Clone)]
pub struct TextEntity {
    pub text: String,
    pub position: Point,
    pub size: Size,
    pub anchor: Option<Point>,
    pub draw_frame: Rect,
}

impl TextEntity {
    pub fn new(text: &str, position: Point, size: Size) -> Self {
        TextEntity {
            text: text.to_string(),
            position,
            size,
            anchor: None,
            draw_frame: Rect::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SceneNode {
    Entity(SceneEntity),
    Text(TextEntity),
}

impl SceneNode {
    pub fn draw_frame(&self) -> Rect {
        match self {
            SceneNode::Entity(entity) => entity.draw_frame,
            SceneNode::Text(text) => text.draw_frame,
        }
    }
}

/// One widget mirrored into an immediate-mode window.
#[derive(Debug, Clone)]
pub struct ImmediateWidget {
    pub name: String,
    pub kind: ElementKind,
    pub frame: Rect,
    pub value: String,
}

/// Description handed to the immediate-mode UI layer. Backgrounds are not
/// mirrored; immediate-mode windows draw native chrome.
#[derive(Debug, Clone)]
pub struct ImmediateWindow {
    pub title: String,
    pub size: Size,
    pub widgets: Vec<ImmediateWidget>,
}

/// A presentable scene: a positioning frame plus the entity tree spawned
/// into it. Single-threaded by design; all mutation happens on the engine
/// thread between frames.
#[derive(Debug)]
pub struct Scene {
    name: String,
    positioning: PositioningFrame,
    next_id: u64,
    nodes: BTreeMap<EntityId, SceneNode>,
    windows: BTreeMap<WindowId, ImmediateWindow>,
}

impl Scene {
    pub fn new(name: &str, positioning: PositioningFrame) -> Self {
        Scene {
            name: name.to_string(),
            positioning,
            next_id: 0,
            nodes: BTreeMap::new(),
            windows: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positioning(&self) -> &PositioningFrame {
        &self.positioning
    }

    pub fn positioning_mut(&mut self) -> &mut PositioningFrame {
        &mut self.positioning
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Position the entity through this scene's frame and add it to the
    /// tree.
    pub fn spawn_entity(
        &mut self,
        mut entity: SceneEntity,
        surface: &dyn RenderSurface,
    ) -> EntityId {
        entity.draw_frame = self
            .positioning
            .position_scene_entity(&entity, surface.window_size());
        let id = EntityId(self.allocate_id());
        self.nodes.insert(id, SceneNode::Entity(entity));
        id
    }

    /// Offset variant for children placed relative to an already-transformed
    /// parent.
    pub fn spawn_entity_with_offset(
        &mut self,
        mut entity: SceneEntity,
        offset: Point,
        surface: &dyn RenderSurface,
    ) -> EntityId {
        entity.draw_frame =
            self.positioning
                .position_scene_entity_with_offset(&entity, offset, surface.window_size());
        let id = EntityId(self.allocate_id());
        self.nodes.insert(id, SceneNode::Entity(entity));
        id
    }

    pub fn spawn_text(&mut self, mut text: TextEntity, surface: &dyn RenderSurface) -> EntityId {
        text.draw_frame = self
            .positioning
            .position_text_entity(&text, surface.window_size());
        let id = EntityId(self.allocate_id());
        self.nodes.insert(id, SceneNode::Text(text));
        id
    }

    pub fn remove_entities(&mut self, ids: &[EntityId]) {
        for id in ids {
            self.nodes.remove(id);
        }
    }

    pub fn node(&self, id: EntityId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (EntityId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn entity_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn register_window(&mut self, window: ImmediateWindow) -> WindowId {
        let id = WindowId(self.allocate_id());
        self.windows.insert(id, window);
        id
    }

    pub fn remove_window(&mut self, id: WindowId) {
        self.windows.remove(&id);
    }

    pub fn window(&self, id: WindowId) -> Option<&ImmediateWindow> {
        self.windows.get(&id)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AxisOrigin;
    use crate::positioning::ScalingMode;

    fn scene() -> Scene {
        let positioning = PositioningFrame::new(
            Size::new(1920.0, 1080.0),
            AxisOrigin::TopLeft,
            ScalingMode::Normal,
        )
        .unwrap();
        Scene::new("test", positioning)
    }

    #[test]
    fn spawned_entities_get_draw_frames() {
        let mut scene = scene();
        let surface = HeadlessSurface::new(Size::new(1920.0, 1080.0));

        let id = scene.spawn_entity(
            SceneEntity::new(
                ElementKind::Sprite,
                "hero",
                Point::new(960.0, 540.0),
                Size::new(64.0, 64.0),
            ),
            &surface,
        );

        let node = scene.node(id).expect("node exists");
        let frame = node.draw_frame();
        assert_eq!(frame.origin, Point::new(928.0, 508.0));
        assert_eq!(frame.size, Size::new(64.0, 64.0));
    }

    #[test]
    fn offset_spawns_shift_the_resolved_frame() {
        let mut scene = scene();
        let surface = HeadlessSurface::new(Size::new(1920.0, 1080.0));

        let entity = SceneEntity::new(
            ElementKind::Image,
            "panel",
            Point::new(960.0, 540.0),
            Size::new(64.0, 64.0),
        );
        let plain = scene.spawn_entity(entity.clone(), &surface);
        let shifted = scene.spawn_entity_with_offset(entity, Point::new(30.0, -10.0), &surface);

        let plain_frame = scene.node(plain).expect("plain node").draw_frame();
        let shifted_frame = scene.node(shifted).expect("shifted node").draw_frame();
        assert_eq!(plain_frame.origin, Point::new(928.0, 508.0));
        assert_eq!(shifted_frame.origin, Point::new(958.0, 498.0));
        assert_eq!(shifted_frame.size, plain_frame.size);
    }

    #[test]
    fn removal_only_touches_named_ids() {
        let mut scene = scene();
        let surface = HeadlessSurface::new(Size::new(1920.0, 1080.0));
        let keep = scene.spawn_text(
            TextEntity::new("title", Point::new(100.0, 100.0), Size::new(200.0, 20.0)),
            &surface,
        );
        let drop = scene.spawn_entity(
            SceneEntity::new(
                ElementKind::Image,
                "bg",
                Point::ZERO,
                Size::new(10.0, 10.0),
            ),
            &surface,
        );

        scene.remove_entities(&[drop]);
        assert!(scene.node(keep).is_some());
        assert!(scene.node(drop).is_none());
        assert_eq!(scene.entity_count(), 1);
    }

    #[test]
    fn windows_register_and_remove() {
        let mut scene = scene();
        let id = scene.register_window(ImmediateWindow {
            title: "debug".into(),
            size: Size::new(400.0, 300.0),
            widgets: Vec::new(),
        });
        assert_eq!(scene.window_count(), 1);
        assert_eq!(scene.window(id).unwrap().title, "debug");
        scene.remove_window(id);
        assert_eq!(scene.window_count(), 0);
    }
}
