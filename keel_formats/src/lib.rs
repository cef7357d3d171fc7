pub mod container;
pub mod ditl;
pub mod dlog;
pub mod element;
pub mod scin;

pub use container::{
    ContainerArchive, ContainerEntry, ContainerResource, build_container, write_container,
};
pub use ditl::{DitlItem, DitlRecord};
pub use dlog::DlogRecord;
pub use element::{ElementKind, FrameRect};
pub use scin::{FLAG_USE_IMMEDIATE_UI, SceneInterfaceChild, SceneInterfaceRecord};
