use crate::descriptor::ResourceDescriptor;
use crate::error::EngineError;
use crate::store::{ResourceRecord, ResourceResolver};

/// Name of the global namespace: untagged resources live here.
pub const GLOBAL_NAMESPACE: &str = "";

/// Name of the universal namespace: matches every resource regardless of tag.
pub const UNIVERSAL_NAMESPACE: &str = "*";

/// An ordered, non-unique set of namespace names scoping resource lookups.
///
/// Insertion order is meaningful: the first name is the primary name, and
/// descriptor factories append one namespace entry per name in that order.
/// A namespace constructed from no names normalizes to the universal
/// namespace: "no scope" behaves as "any scope".
///
/// Namespaces never decide lookup precedence; descriptor construction here
/// is lookup-policy-free and the tie-break rules live in the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNamespace {
    names: Vec<String>,
}

impl ResourceNamespace {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Self::universal();
        }
        ResourceNamespace { names }
    }

    pub fn named(name: &str) -> Self {
        ResourceNamespace {
            names: vec![name.to_string()],
        }
    }

    pub fn global() -> Self {
        Self::named(GLOBAL_NAMESPACE)
    }

    pub fn universal() -> Self {
        Self::named(UNIVERSAL_NAMESPACE)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `"*"` for the universal namespace, otherwise the first name in the
    /// list. The empty-list fallback returns the global sentinel, though the
    /// construction invariant keeps the list non-empty.
    pub fn primary_name(&self) -> &str {
        if self.is_universal() {
            return UNIVERSAL_NAMESPACE;
        }
        self.names
            .first()
            .map(String::as_str)
            .unwrap_or(GLOBAL_NAMESPACE)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    pub fn is_global(&self) -> bool {
        self.has_name(GLOBAL_NAMESPACE)
    }

    pub fn is_universal(&self) -> bool {
        self.has_name(UNIVERSAL_NAMESPACE)
    }

    /// Append `other`'s names. Not a set union: duplicates are preserved and
    /// the primary name never changes.
    pub fn add_namespace(&mut self, other: &ResourceNamespace) {
        self.names.extend(other.names.iter().cloned());
    }

    /// Invoke `f` once per name, each wrapped as a single-name namespace.
    /// Fans multi-name lookups out into several single-name descriptor
    /// builds.
    pub fn each_name<F>(&self, mut f: F)
    where
        F: FnMut(ResourceNamespace),
    {
        for name in &self.names {
            f(ResourceNamespace::named(name));
        }
    }

    fn descriptor(&self) -> ResourceDescriptor {
        let mut descriptor = ResourceDescriptor::new();
        self.each_name(|ns| {
            descriptor = std::mem::take(&mut descriptor).with_namespace(ns.primary_name());
        });
        descriptor
    }

    pub fn identified_resource(&self, id: i64) -> ResourceDescriptor {
        self.descriptor().with_id(id)
    }

    pub fn typed_resource(&self, type_code: &str) -> ResourceDescriptor {
        self.descriptor().with_type(type_code)
    }

    pub fn named_resource(&self, name: &str) -> ResourceDescriptor {
        self.descriptor().with_name(name)
    }

    pub fn typed_identified_resource(&self, type_code: &str, id: i64) -> ResourceDescriptor {
        self.descriptor().with_type(type_code).with_id(id)
    }

    pub fn typed_named_resource(&self, type_code: &str, name: &str) -> ResourceDescriptor {
        self.descriptor().with_type(type_code).with_name(name)
    }

    pub fn identified_named_resource(&self, id: i64, name: &str) -> ResourceDescriptor {
        self.descriptor().with_id(id).with_name(name)
    }

    pub fn typed_identified_named_resource(
        &self,
        type_code: &str,
        id: i64,
        name: &str,
    ) -> ResourceDescriptor {
        self.descriptor()
            .with_type(type_code)
            .with_id(id)
            .with_name(name)
    }

    /// True when this namespace can answer lookups at all: universal always
    /// can, otherwise at least one imported resource must carry one of our
    /// names (or be untagged while we include the global sentinel).
    pub fn contains_resources(&self, resolver: &dyn ResourceResolver) -> bool {
        if self.is_universal() {
            return true;
        }
        !resolver.resolve(&self.descriptor()).is_empty()
    }

    pub fn resources_of_type<'a>(
        &self,
        type_code: &str,
        resolver: &'a dyn ResourceResolver,
    ) -> Vec<&'a ResourceRecord> {
        resolver.resolve(&self.typed_resource(type_code))
    }

    /// First match for the type, in resolver precedence order. Zero matches
    /// is a hard error; callers that anticipate absence should guard with
    /// `exists()` first.
    pub fn first_resource_of<'a>(
        &self,
        type_code: &str,
        resolver: &'a dyn ResourceResolver,
    ) -> Result<&'a ResourceRecord, EngineError> {
        let descriptor = self.typed_resource(type_code);
        resolver
            .resolve(&descriptor)
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NoMatchingResource {
                descriptor: descriptor.describe(),
            })
    }

    /// Best match for type and id under the resolver's documented
    /// precedence.
    pub fn resource_for_id<'a>(
        &self,
        type_code: &str,
        id: i64,
        resolver: &'a dyn ResourceResolver,
    ) -> Result<&'a ResourceRecord, EngineError> {
        let descriptor = self.typed_identified_resource(type_code, id);
        resolver
            .best(&descriptor)
            .ok_or_else(|| EngineError::NoMatchingResource {
                descriptor: descriptor.describe(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_list_normalizes_to_universal() {
        let namespace = ResourceNamespace::new(Vec::<String>::new());
        assert!(namespace.is_universal());
        assert_eq!(namespace.primary_name(), "*");
    }

    #[test]
    fn primary_name_is_first_inserted() {
        let namespace = ResourceNamespace::new(["mod-a", "mod-b"]);
        assert_eq!(namespace.primary_name(), "mod-a");
        assert!(namespace.has_name("mod-b"));
        assert!(!namespace.has_name("mod-c"));
        assert!(!namespace.is_global());
        assert!(!namespace.is_universal());
    }

    #[test]
    fn add_namespace_appends_and_keeps_duplicates() {
        let mut namespace = ResourceNamespace::named("mod-a");
        namespace.add_namespace(&ResourceNamespace::new(["mod-b", "mod-a"]));
        assert_eq!(namespace.names(), ["mod-a", "mod-b", "mod-a"]);
        assert_eq!(namespace.primary_name(), "mod-a");
    }

    #[test]
    fn descriptor_fan_out_preserves_order() {
        let namespace = ResourceNamespace::new(["A", "B"]);
        let descriptor = namespace.identified_resource(5);
        assert_eq!(descriptor.id(), Some(5));
        assert_eq!(descriptor.namespaces(), ["A", "B"]);
    }

    #[test]
    fn each_name_wraps_single_name_namespaces() {
        let namespace = ResourceNamespace::new(["A", "B", "A"]);
        let mut seen = Vec::new();
        namespace.each_name(|ns| {
            assert_eq!(ns.names().len(), 1);
            seen.push(ns.primary_name().to_string());
        });
        assert_eq!(seen, ["A", "B", "A"]);
    }

    #[test]
    fn factory_combinations_set_their_fields() {
        let namespace = ResourceNamespace::named("ui");
        let descriptor = namespace.typed_identified_named_resource("DLOG", 128, "about");
        assert_eq!(descriptor.type_code(), Some("DLOG"));
        assert_eq!(descriptor.id(), Some(128));
        assert_eq!(descriptor.name(), Some("about"));
        assert_eq!(descriptor.namespaces(), ["ui"]);

        let descriptor = namespace.typed_named_resource("PICT", "splash");
        assert_eq!(descriptor.type_code(), Some("PICT"));
        assert_eq!(descriptor.id(), None);
        assert_eq!(descriptor.name(), Some("splash"));
    }

    #[test]
    fn global_and_universal_sentinels() {
        assert!(ResourceNamespace::global().is_global());
        assert_eq!(ResourceNamespace::global().primary_name(), "");
        assert!(ResourceNamespace::universal().is_universal());
        assert_eq!(ResourceNamespace::universal().primary_name(), "*");
    }
}
