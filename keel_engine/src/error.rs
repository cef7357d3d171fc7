use thiserror::Error;

/// Failure taxonomy for the resolution and layout core.
///
/// Construction-time structural errors (missing resources, wrong types)
/// propagate out of the factory immediately; per-element script failures are
/// isolated and reported through the warning channel instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no resource matches {descriptor}")]
    NoMatchingResource { descriptor: String },

    #[error("dialog '{dialog}' references missing item list DITL #{item_list}")]
    MissingCompanionResource { dialog: String, item_list: i64 },

    #[error("resource type '{type_code}' cannot describe a dialog layout")]
    UnsupportedResourceType { type_code: String },

    #[error("element index {index} is out of range 1..={count}")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("invalid positioning configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("no control named '{name}' in this configuration")]
    UnknownControlName { name: String },

    #[error("duplicate control name '{name}'")]
    DuplicateControlName { name: String },

    #[error("script '{name}' failed to compile: {message}")]
    ScriptCompilation { name: String, message: String },

    #[error("script '{name}' failed while running: {message}")]
    ScriptRuntime { name: String, message: String },

    #[error("malformed resource data: {0}")]
    MalformedResource(#[from] anyhow::Error),
}
