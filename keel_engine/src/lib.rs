//! Resource resolution and dialog/scene layout core.
//!
//! The pipeline: a [`namespace::ResourceNamespace`] builds a
//! [`descriptor::ResourceDescriptor`], the [`store::ArchiveStore`] resolves
//! it against every imported archive, a
//! [`layout_source::DialogLayoutSource`] normalizes the resolved bytes into
//! layout elements, a [`dialog::DialogConfiguration`] turns those into named
//! controls, and the scene's [`positioning::PositioningFrame`] maps
//! everything into real viewport pixels at presentation time.

pub mod descriptor;
pub mod dialog;
pub mod error;
pub mod geometry;
pub mod layout_source;
pub mod namespace;
pub mod positioning;
pub mod scene;
pub mod script_host;
pub mod store;

pub use descriptor::ResourceDescriptor;
pub use dialog::{
    AnchorFlags, ControlDefinition, ControlSpec, Dialog, DialogBackground, DialogConfiguration,
};
pub use error::EngineError;
pub use geometry::{AxisOrigin, Point, Rect, Size};
pub use layout_source::{
    DIALOG_TYPE, DialogLayoutElement, DialogLayoutSource, ITEM_LIST_TYPE, PresentationMode,
    SCENE_INTERFACE_TYPE, SCRIPT_TYPE,
};
pub use namespace::{GLOBAL_NAMESPACE, ResourceNamespace, UNIVERSAL_NAMESPACE};
pub use positioning::{PositioningFrame, ScalingMode};
pub use scene::{
    EntityId, HeadlessSurface, ImmediateWidget, ImmediateWindow, RenderSurface, Scene, SceneEntity,
    SceneNode, TextEntity, WindowId,
};
pub use script_host::{CompiledScript, ScriptHost};
pub use store::{ArchiveStore, ResourceRecord, ResourceResolver};
