use keel_formats::{DitlRecord, DlogRecord, ElementKind, SceneInterfaceRecord};

use crate::descriptor::ResourceDescriptor;
use crate::error::EngineError;
use crate::geometry::{Rect, Size};
use crate::script_host::{CompiledScript, ScriptHost};
use crate::store::ResourceResolver;

/// Resource type of the engine's native scene-interface format.
pub const SCENE_INTERFACE_TYPE: &str = "scïn";

/// Resource type of the legacy dialog template.
pub const DIALOG_TYPE: &str = "DLOG";

/// Resource type of the legacy dialog item list.
pub const ITEM_LIST_TYPE: &str = "DITL";

/// Resource type of attached Lua script sources.
pub const SCRIPT_TYPE: &str = "LuaS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    /// Spawn scene entities for every control.
    SceneEntity,
    /// Mirror controls into an immediate-mode debug UI window.
    ImmediateUi,
}

/// One normalized layout item. The frame stays in the source format's
/// coordinate space (top-left origin, y-down); translation to real pixels
/// happens at positioning time.
#[derive(Debug)]
pub struct DialogLayoutElement {
    pub kind: ElementKind,
    pub frame: Rect,
    pub value: String,
    pub script: Option<CompiledScript>,
}

/// Normalized view over the two on-disk interface formats.
///
/// Construction resolves the backing resource once and owns the resulting
/// element list; elements are read-only afterwards and preserve source
/// declaration order.
#[derive(Debug)]
pub struct DialogLayoutSource {
    mode: PresentationMode,
    flags: u16,
    frame: Rect,
    elements: Vec<DialogLayoutElement>,
}

impl DialogLayoutSource {
    /// Build a layout from a descriptor.
    ///
    /// With an explicit type the descriptor must name one of the two layout
    /// formats. Without one, the scene-interface format is probed first and
    /// the legacy dialog second. A `DLOG` requires its companion `DITL`
    /// (named by the record's item-list id) to exist up front.
    ///
    /// `scripts` is the optional compilation context: when absent, attached
    /// script references are left uncompiled, which is a valid state.
    pub fn from_descriptor(
        descriptor: &ResourceDescriptor,
        resolver: &dyn ResourceResolver,
        scripts: Option<&ScriptHost>,
    ) -> Result<Self, EngineError> {
        match descriptor.type_code() {
            Some(SCENE_INTERFACE_TYPE) => Self::load_scene_interface(descriptor, resolver, scripts),
            Some(DIALOG_TYPE) => Self::load_dialog(descriptor, resolver),
            Some(other) => Err(EngineError::UnsupportedResourceType {
                type_code: other.to_string(),
            }),
            None => {
                let scene = descriptor.retyped(SCENE_INTERFACE_TYPE);
                if resolver.exists(&scene) {
                    return Self::load_scene_interface(&scene, resolver, scripts);
                }
                let dialog = descriptor.retyped(DIALOG_TYPE);
                if resolver.exists(&dialog) {
                    return Self::load_dialog(&dialog, resolver);
                }
                Err(EngineError::NoMatchingResource {
                    descriptor: descriptor.describe(),
                })
            }
        }
    }

    fn load_scene_interface(
        descriptor: &ResourceDescriptor,
        resolver: &dyn ResourceResolver,
        scripts: Option<&ScriptHost>,
    ) -> Result<Self, EngineError> {
        let data = resolver.data_for(descriptor)?;
        let record = SceneInterfaceRecord::parse(data)?;

        let mode = if record.uses_immediate_ui() {
            PresentationMode::ImmediateUi
        } else {
            PresentationMode::SceneEntity
        };
        let frame = Rect::new(0.0, 0.0, record.width as f64, record.height as f64);

        let mut elements = Vec::with_capacity(record.children.len());
        for child in &record.children {
            let script = child
                .script_id
                .and_then(|id| compile_attached_script(id, descriptor, resolver, scripts));
            elements.push(DialogLayoutElement {
                kind: child.kind,
                frame: child.frame.into(),
                value: child.value.clone(),
                script,
            });
        }

        Ok(DialogLayoutSource {
            mode,
            flags: record.flags,
            frame,
            elements,
        })
    }

    fn load_dialog(
        descriptor: &ResourceDescriptor,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self, EngineError> {
        let data = resolver.data_for(descriptor)?;
        let dialog = DlogRecord::parse(data)?;

        let item_list = dialog.interface_list as i64;
        let companion = rescope(descriptor, ITEM_LIST_TYPE, item_list);
        if !resolver.exists(&companion) {
            return Err(EngineError::MissingCompanionResource {
                dialog: if dialog.title.is_empty() {
                    descriptor.describe()
                } else {
                    dialog.title.clone()
                },
                item_list,
            });
        }

        let items = DitlRecord::parse(resolver.data_for(&companion)?)?;

        let elements = items
            .items
            .into_iter()
            .map(|item| DialogLayoutElement {
                kind: item.kind,
                frame: item.frame.into(),
                value: item.info,
                script: None,
            })
            .collect();

        Ok(DialogLayoutSource {
            // The legacy format has no immediate-mode flag.
            mode: PresentationMode::SceneEntity,
            flags: 0,
            frame: dialog.bounds.into(),
            elements,
        })
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
    }

    pub fn size(&self) -> Size {
        self.frame.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.frame.size = size;
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// The elements in source declaration order. This 0-based slice is the
    /// real representation.
    pub fn elements(&self) -> &[DialogLayoutElement] {
        &self.elements
    }

    /// Legacy 1-based access, matching the item numbering of the classic
    /// item-list format. Compatibility shim only; new code should index
    /// `elements()` directly.
    pub fn element_at(&self, index: usize) -> Result<&DialogLayoutElement, EngineError> {
        if index == 0 || index > self.elements.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                count: self.elements.len(),
            });
        }
        Ok(&self.elements[index - 1])
    }
}

/// Fetch and compile one attached script. Every failure path warns and
/// yields `None`: a broken script never aborts layout construction.
fn compile_attached_script(
    script_id: i64,
    descriptor: &ResourceDescriptor,
    resolver: &dyn ResourceResolver,
    scripts: Option<&ScriptHost>,
) -> Option<CompiledScript> {
    let host = scripts?;
    let script_descriptor = rescope(descriptor, SCRIPT_TYPE, script_id);
    let name = format!("{SCRIPT_TYPE}#{script_id}");

    let data = match resolver.data_for(&script_descriptor) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("[keel_engine] warning: script {name} unavailable: {err}");
            return None;
        }
    };
    let source = String::from_utf8_lossy(data);

    match host.compile(&name, &source) {
        Ok(script) => Some(script),
        Err(err) => {
            eprintln!("[keel_engine] warning: {err}");
            None
        }
    }
}

/// Companion descriptor: same namespace scope, different type and id.
fn rescope(descriptor: &ResourceDescriptor, type_code: &str, id: i64) -> ResourceDescriptor {
    let mut companion = ResourceDescriptor::new().with_type(type_code).with_id(id);
    for namespace in descriptor.namespaces() {
        companion = companion.with_namespace(namespace);
    }
    companion
}
