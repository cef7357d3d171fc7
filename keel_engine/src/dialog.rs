use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use keel_formats::ElementKind;

use crate::descriptor::ResourceDescriptor;
use crate::error::EngineError;
use crate::geometry::{Point, Rect, Size};
use crate::layout_source::{DialogLayoutElement, DialogLayoutSource, PresentationMode};
use crate::scene::{
    EntityId, ImmediateWidget, ImmediateWindow, RenderSurface, Scene, SceneEntity, TextEntity,
    WindowId,
};

/// Pixel height reserved for the top/bottom strips of a stretchable
/// background.
const STRETCH_CAP_HEIGHT: f64 = 32.0;

/// Control-to-dialog stickiness bits, resolved at configuration time against
/// the dialog's declared size. Independent per edge: both edges sticky means
/// the control stretches, neither means it stays centered. This is a second
/// anchoring system, separate from the positioning frame's axis origin
/// (which governs dialog-to-viewport placement at presentation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorFlags {
    pub left: bool,
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
}

impl AnchorFlags {
    pub const TOP_LEFT: AnchorFlags = AnchorFlags {
        left: true,
        top: true,
        right: false,
        bottom: false,
    };

    pub const CENTERED: AnchorFlags = AnchorFlags {
        left: false,
        top: false,
        right: false,
        bottom: false,
    };

    pub const STRETCH: AnchorFlags = AnchorFlags {
        left: true,
        top: true,
        right: true,
        bottom: true,
    };
}

impl Default for AnchorFlags {
    fn default() -> Self {
        AnchorFlags::TOP_LEFT
    }
}

/// A named, typed, framed element produced for one layout item, prior to
/// becoming a live scene entity.
#[derive(Debug, Clone)]
pub struct ControlDefinition {
    pub name: String,
    pub kind: ElementKind,
    pub frame: Rect,
    pub anchor: AnchorFlags,
    pub value: String,
}

impl ControlDefinition {
    /// Apply the spring/strut anchor against a resize from `source` (the
    /// layout's native size) to `declared` (the configuration's size).
    pub fn resolved_frame(&self, declared: Size, source: Size) -> Rect {
        let grow_x = declared.width - source.width;
        let grow_y = declared.height - source.height;
        let mut frame = self.frame;

        match (self.anchor.left, self.anchor.right) {
            (true, true) => frame.size.width += grow_x,
            (false, true) => frame.origin.x += grow_x,
            (true, false) => {}
            (false, false) => frame.origin.x += grow_x / 2.0,
        }
        match (self.anchor.top, self.anchor.bottom) {
            (true, true) => frame.size.height += grow_y,
            (false, true) => frame.origin.y += grow_y,
            (true, false) => {}
            (false, false) => frame.origin.y += grow_y / 2.0,
        }
        frame
    }
}

/// Background imagery behind a scene-entity dialog. Descriptors, not pixels:
/// image loading belongs to the renderer.
#[derive(Debug, Clone, Default)]
pub enum DialogBackground {
    #[default]
    None,
    Single(ResourceDescriptor),
    Stretchable {
        top: ResourceDescriptor,
        fill: ResourceDescriptor,
        bottom: ResourceDescriptor,
    },
}

/// Per-element answer from the `build` callback: the control's name plus any
/// overrides. Returning `None` from the callback skips the element entirely.
#[derive(Debug, Clone, Default)]
pub struct ControlSpec {
    pub name: String,
    pub kind: Option<ElementKind>,
    pub frame: Option<Rect>,
    pub anchor: Option<AnchorFlags>,
    pub value: Option<String>,
}

impl ControlSpec {
    pub fn named(name: &str) -> Self {
        ControlSpec {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_frame(mut self, frame: Rect) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_anchor(mut self, anchor: AnchorFlags) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }
}

/// Template for presentable dialogs.
///
/// Built once from a layout source; each `build` call snapshots the control
/// set into an independent `Dialog` instance. Control names are unique
/// within one configuration.
#[derive(Debug)]
pub struct DialogConfiguration {
    layout: DialogLayoutSource,
    size: Size,
    background: DialogBackground,
    controls: Vec<ControlDefinition>,
    index: HashMap<String, usize>,
}

impl DialogConfiguration {
    pub fn new(layout: DialogLayoutSource) -> Self {
        let size = layout.size();
        DialogConfiguration {
            layout,
            size,
            background: DialogBackground::None,
            controls: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn layout(&self) -> &DialogLayoutSource {
        &self.layout
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn set_background(&mut self, background: DialogBackground) {
        self.background = background;
    }

    pub fn controls(&self) -> &[ControlDefinition] {
        &self.controls
    }

    /// Synthesize the named control set and instantiate a dialog.
    ///
    /// The legacy formats carry no element names, so the callback assigns
    /// one per element (and may override kind, frame, anchor, or value).
    /// Elements the callback declines produce no control.
    pub fn build<F>(&mut self, mut configure: F) -> Result<Dialog, EngineError>
    where
        F: FnMut(usize, &DialogLayoutElement) -> Option<ControlSpec>,
    {
        self.controls.clear();
        self.index.clear();

        for (position, element) in self.layout.elements().iter().enumerate() {
            let Some(spec) = configure(position, element) else {
                continue;
            };
            if self.index.contains_key(&spec.name) {
                // Leave no half-built control set behind.
                self.controls.clear();
                self.index.clear();
                return Err(EngineError::DuplicateControlName { name: spec.name });
            }

            let definition = ControlDefinition {
                kind: spec.kind.unwrap_or(element.kind),
                frame: spec.frame.unwrap_or(element.frame),
                anchor: spec.anchor.unwrap_or_default(),
                value: spec.value.unwrap_or_else(|| element.value.clone()),
                name: spec.name,
            };
            self.index
                .insert(definition.name.clone(), self.controls.len());
            self.controls.push(definition);
        }

        Ok(self.instantiate())
    }

    /// Snapshot the current control set into a fresh dialog instance,
    /// without re-running the naming callback. Used to stamp out further
    /// dialogs after `build`, including any `configure_element` tweaks made
    /// since.
    pub fn instantiate(&self) -> Dialog {
        Dialog::from_configuration(self)
    }

    pub fn named_element(&self, name: &str) -> Result<&ControlDefinition, EngineError> {
        self.index
            .get(name)
            .map(|&position| &self.controls[position])
            .ok_or_else(|| EngineError::UnknownControlName {
                name: name.to_string(),
            })
    }

    /// Adjust one control in place; affects dialogs instantiated afterwards.
    pub fn configure_element<F>(&mut self, name: &str, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut ControlDefinition),
    {
        let position = *self
            .index
            .get(name)
            .ok_or_else(|| EngineError::UnknownControlName {
                name: name.to_string(),
            })?;
        f(&mut self.controls[position]);
        Ok(())
    }
}

#[derive(Debug)]
enum Attachment {
    Entities(Weak<RefCell<Scene>>, Vec<EntityId>),
    Window(Weak<RefCell<Scene>>, WindowId),
}

/// A live, presentable dialog instance.
///
/// Holds only a weak reference to its presenting scene: a dialog never
/// outlives or owns the scene. Presenting into a different scene re-parents
/// the dialog; the prior scene's entities are torn down first.
#[derive(Debug)]
pub struct Dialog {
    mode: PresentationMode,
    frame: Rect,
    size: Size,
    background: DialogBackground,
    controls: Vec<ControlDefinition>,
    attachment: Option<Attachment>,
}

impl Dialog {
    fn from_configuration(configuration: &DialogConfiguration) -> Self {
        let source = configuration.layout.size();
        let controls = configuration
            .controls
            .iter()
            .map(|control| ControlDefinition {
                frame: control.resolved_frame(configuration.size, source),
                ..control.clone()
            })
            .collect();

        Dialog {
            mode: configuration.layout.mode(),
            frame: configuration.layout.frame(),
            size: configuration.size,
            background: configuration.background.clone(),
            controls,
            attachment: None,
        }
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn controls(&self) -> &[ControlDefinition] {
        &self.controls
    }

    pub fn is_presented(&self) -> bool {
        self.attachment.is_some()
    }

    /// Spawn this dialog into `scene`. Immediate-UI layouts register an
    /// immediate-mode window; everything else becomes a scene-entity tree
    /// positioned through the scene's frame.
    pub fn present_in_scene(&mut self, scene: &Rc<RefCell<Scene>>, surface: &dyn RenderSurface) {
        self.dismiss();

        match self.mode {
            PresentationMode::ImmediateUi => {
                let window = ImmediateWindow {
                    title: String::new(),
                    size: self.size,
                    widgets: self
                        .controls
                        .iter()
                        .map(|control| ImmediateWidget {
                            name: control.name.clone(),
                            kind: control.kind,
                            frame: control.frame,
                            value: control.value.clone(),
                        })
                        .collect(),
                };
                let id = scene.borrow_mut().register_window(window);
                self.attachment = Some(Attachment::Window(Rc::downgrade(scene), id));
            }
            PresentationMode::SceneEntity => {
                let mut ids = Vec::new();
                {
                    let mut scene = scene.borrow_mut();
                    self.spawn_background(&mut scene, surface, &mut ids);
                    for control in &self.controls {
                        ids.push(self.spawn_control(control, &mut scene, surface));
                    }
                }
                self.attachment = Some(Attachment::Entities(Rc::downgrade(scene), ids));
            }
        }
    }

    /// Tear down whatever this dialog spawned, if the owning scene is still
    /// alive.
    pub fn dismiss(&mut self) {
        match self.attachment.take() {
            Some(Attachment::Entities(scene, ids)) => {
                if let Some(scene) = scene.upgrade() {
                    scene.borrow_mut().remove_entities(&ids);
                }
            }
            Some(Attachment::Window(scene, id)) => {
                if let Some(scene) = scene.upgrade() {
                    scene.borrow_mut().remove_window(id);
                }
            }
            None => {}
        }
    }

    fn spawn_background(
        &self,
        scene: &mut Scene,
        surface: &dyn RenderSurface,
        ids: &mut Vec<EntityId>,
    ) {
        match &self.background {
            DialogBackground::None => {}
            DialogBackground::Single(image) => {
                let entity = SceneEntity::new(
                    ElementKind::Image,
                    &image.describe(),
                    self.frame.center(),
                    self.frame.size,
                );
                ids.push(scene.spawn_entity(entity, surface));
            }
            DialogBackground::Stretchable { top, fill, bottom } => {
                let cap = STRETCH_CAP_HEIGHT.min(self.frame.size.height / 2.0);
                let middle = self.frame.size.height - 2.0 * cap;
                let x = self.frame.origin.x + self.frame.size.width / 2.0;

                let strips = [
                    (top, self.frame.origin.y + cap / 2.0, cap),
                    (fill, self.frame.origin.y + cap + middle / 2.0, middle),
                    (
                        bottom,
                        self.frame.origin.y + self.frame.size.height - cap / 2.0,
                        cap,
                    ),
                ];
                for (image, center_y, height) in strips {
                    let entity = SceneEntity::new(
                        ElementKind::Image,
                        &image.describe(),
                        Point::new(x, center_y),
                        Size::new(self.frame.size.width, height),
                    );
                    ids.push(scene.spawn_entity(entity, surface));
                }
            }
        }
    }

    fn spawn_control(
        &self,
        control: &ControlDefinition,
        scene: &mut Scene,
        surface: &dyn RenderSurface,
    ) -> EntityId {
        // Control frames are dialog-relative; lift them into scene space.
        let center = Point::new(
            self.frame.origin.x + control.frame.origin.x + control.frame.size.width / 2.0,
            self.frame.origin.y + control.frame.origin.y + control.frame.size.height / 2.0,
        );

        match control.kind {
            ElementKind::Label | ElementKind::TextArea | ElementKind::Help => scene.spawn_text(
                TextEntity::new(&control.value, center, control.frame.size),
                surface,
            ),
            _ => scene.spawn_entity(
                SceneEntity::new(control.kind, &control.value, center, control.frame.size),
                surface,
            ),
        }
    }
}
