use std::fmt;

use serde::Serialize;

use crate::namespace::{GLOBAL_NAMESPACE, UNIVERSAL_NAMESPACE};
use crate::store::ResourceResolver;

/// Immutable query-by-example value for locating archived resources.
///
/// Every field is independently optional; an unset field matches any value.
/// The namespace list carries one entry per name of the namespace that
/// produced the descriptor, in insertion order and never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResourceDescriptor {
    type_code: Option<String>,
    id: Option<i64>,
    name: Option<String>,
    namespaces: Vec<String>,
}

impl ResourceDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unscoped descriptor matching every resource of one type, regardless
    /// of namespace tagging.
    pub fn all_of_type(type_code: &str) -> Self {
        ResourceDescriptor {
            type_code: Some(type_code.to_string()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, type_code: &str) -> Self {
        self.type_code = Some(type_code.to_string());
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespaces.push(namespace.to_string());
        self
    }

    /// Copy of this descriptor with the type replaced. Used when probing an
    /// untyped descriptor against the known layout formats.
    pub fn retyped(&self, type_code: &str) -> Self {
        let mut copy = self.clone();
        copy.type_code = Some(type_code.to_string());
        copy
    }

    pub fn type_code(&self) -> Option<&str> {
        self.type_code.as_deref()
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// True when the namespace list places no restriction on matches: either
    /// no entries at all, or the universal sentinel is present.
    pub fn is_namespace_unrestricted(&self) -> bool {
        self.namespaces.is_empty()
            || self.namespaces.iter().any(|ns| ns == UNIVERSAL_NAMESPACE)
    }

    /// Would a resource tagged `tag` (or untagged, `None`) satisfy this
    /// descriptor's namespace restriction?
    pub fn matches_namespace_tag(&self, tag: Option<&str>) -> bool {
        if self.is_namespace_unrestricted() {
            return true;
        }
        match tag {
            Some(tag) => self.namespaces.iter().any(|ns| ns == tag),
            None => self.namespaces.iter().any(|ns| ns == GLOBAL_NAMESPACE),
        }
    }

    /// Full match predicate a resolver applies per resource. Type and name
    /// are case-sensitive; the id is exact.
    pub fn matches(
        &self,
        type_code: &str,
        id: i64,
        name: Option<&str>,
        namespace_tag: Option<&str>,
    ) -> bool {
        if let Some(wanted) = self.type_code.as_deref() {
            if wanted != type_code {
                return false;
            }
        }
        if let Some(wanted) = self.id {
            if wanted != id {
                return false;
            }
        }
        if let Some(wanted) = self.name.as_deref() {
            if name != Some(wanted) {
                return false;
            }
        }
        self.matches_namespace_tag(namespace_tag)
    }

    pub fn exists(&self, resolver: &dyn ResourceResolver) -> bool {
        resolver.exists(self)
    }

    /// Human-readable summary. Diagnostic only; never used for equality or
    /// lookup.
    pub fn describe(&self) -> String {
        let type_part = self.type_code.as_deref().unwrap_or("????");
        let id_part = match self.id {
            Some(id) => format!("#{id}"),
            None => "#any".to_string(),
        };
        let mut out = format!("{type_part}.{id_part}");
        if let Some(name) = self.name.as_deref() {
            out.push_str(&format!(" name<{name}>"));
        }
        if !self.namespaces.is_empty() {
            let list: Vec<&str> = self
                .namespaces
                .iter()
                .map(|ns| if ns.is_empty() { "global" } else { ns.as_str() })
                .collect();
            out.push_str(&format!(" ns<{}>", list.join(", ")));
        }
        out
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
