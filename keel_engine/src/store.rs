use std::path::Path;

use anyhow::{Context, Result, bail};
use keel_formats::ContainerArchive;
use walkdir::WalkDir;

use crate::descriptor::ResourceDescriptor;
use crate::error::EngineError;

/// One resource copied out of an imported archive.
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub type_code: String,
    pub id: i64,
    pub name: Option<String>,
    /// Namespace tag; `None` means the resource lives in the global
    /// namespace.
    pub namespace: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug)]
struct ImportedArchive {
    source: String,
    records: Vec<ResourceRecord>,
}

/// The archive lookup contract the resolution core consumes.
pub trait ResourceResolver {
    /// All records matching the descriptor, in precedence order (the first
    /// entry is the best match).
    fn resolve(&self, descriptor: &ResourceDescriptor) -> Vec<&ResourceRecord>;

    fn best(&self, descriptor: &ResourceDescriptor) -> Option<&ResourceRecord>;

    fn exists(&self, descriptor: &ResourceDescriptor) -> bool {
        self.best(descriptor).is_some()
    }

    /// Payload of the best match, or `NoMatchingResource`.
    fn data_for(&self, descriptor: &ResourceDescriptor) -> Result<&[u8], EngineError> {
        self.best(descriptor)
            .map(|record| record.data.as_slice())
            .ok_or_else(|| EngineError::NoMatchingResource {
                descriptor: descriptor.describe(),
            })
    }
}

/// In-process store over every imported archive.
///
/// Imports are the single mutation point and happen before gameplay-time
/// resolution; all query paths take `&self`. Precedence is deterministic:
/// the most-recently-imported archive wins, within one archive a record
/// tagged with a non-global namespace beats an untagged record, and
/// remaining ties fall to record declaration order.
#[derive(Debug, Default)]
pub struct ArchiveStore {
    archives: Vec<ImportedArchive>,
}

impl ArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a single KRSR container file.
    pub fn import_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let archive = ContainerArchive::open(path.as_ref())
            .with_context(|| format!("importing {}", path.as_ref().display()))?;

        let records: Vec<ResourceRecord> = archive
            .entries()
            .iter()
            .map(|entry| ResourceRecord {
                type_code: entry.type_code.clone(),
                id: entry.id,
                name: entry.name.clone(),
                namespace: entry.namespace.clone(),
                data: archive.read_entry_bytes(entry).to_vec(),
            })
            .collect();

        let count = records.len();
        self.archives.push(ImportedArchive {
            source: archive.path().display().to_string(),
            records,
        });
        Ok(count)
    }

    /// Recursively import every `.krsr` container under `root`. Unreadable
    /// containers are skipped with a warning; finding none at all is an
    /// error.
    pub fn import_directory<P: AsRef<Path>>(&mut self, root: P) -> Result<usize> {
        let root = root.as_ref();
        if !root.is_dir() {
            bail!("{} is not a directory", root.display());
        }

        let mut paths: Vec<_> = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("krsr"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut imported = 0;
        for path in paths {
            match self.import_file(&path) {
                Ok(count) => imported += count,
                Err(err) => {
                    eprintln!(
                        "[keel_engine] warning: failed to import {}: {:?}",
                        path.display(),
                        err
                    );
                }
            }
        }

        if self.archives.is_empty() {
            bail!("no resource containers found in {}", root.display());
        }
        Ok(imported)
    }

    /// Register records directly, as if an archive had been imported. The
    /// scripting layer uses this for mod-provided in-memory resources.
    pub fn import_records(&mut self, source: &str, records: Vec<ResourceRecord>) {
        self.archives.push(ImportedArchive {
            source: source.to_string(),
            records,
        });
    }

    pub fn archive_sources(&self) -> Vec<&str> {
        self.archives
            .iter()
            .map(|archive| archive.source.as_str())
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.archives.iter().map(|a| a.records.len()).sum()
    }

    /// Every record with its source archive, newest archive first. Feeds
    /// the manifest dump.
    pub fn records(&self) -> impl Iterator<Item = (&str, &ResourceRecord)> {
        self.archives.iter().rev().flat_map(|archive| {
            archive
                .records
                .iter()
                .map(move |record| (archive.source.as_str(), record))
        })
    }
}

fn record_matches(descriptor: &ResourceDescriptor, record: &ResourceRecord) -> bool {
    descriptor.matches(
        &record.type_code,
        record.id,
        record.name.as_deref(),
        record.namespace.as_deref(),
    )
}

impl ResourceResolver for ArchiveStore {
    fn resolve(&self, descriptor: &ResourceDescriptor) -> Vec<&ResourceRecord> {
        let mut matches = Vec::new();
        for archive in self.archives.iter().rev() {
            let mut tagged = Vec::new();
            let mut untagged = Vec::new();
            for record in &archive.records {
                if record_matches(descriptor, record) {
                    if record.namespace.is_some() {
                        tagged.push(record);
                    } else {
                        untagged.push(record);
                    }
                }
            }
            matches.extend(tagged);
            matches.extend(untagged);
        }
        matches
    }

    fn best(&self, descriptor: &ResourceDescriptor) -> Option<&ResourceRecord> {
        self.resolve(descriptor).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::ResourceNamespace;

    fn record(type_code: &str, id: i64, namespace: Option<&str>, data: &[u8]) -> ResourceRecord {
        ResourceRecord {
            type_code: type_code.into(),
            id,
            name: None,
            namespace: namespace.map(Into::into),
            data: data.to_vec(),
        }
    }

    #[test]
    fn newest_archive_wins() {
        let mut store = ArchiveStore::new();
        store.import_records("base", vec![record("PICT", 5, None, b"base")]);
        store.import_records("patch", vec![record("PICT", 5, None, b"patch")]);

        let descriptor = ResourceDescriptor::new().with_type("PICT").with_id(5);
        let best = store.best(&descriptor).expect("match");
        assert_eq!(best.data, b"patch");
        assert_eq!(store.resolve(&descriptor).len(), 2);
    }

    #[test]
    fn tagged_record_beats_untagged_within_one_archive() {
        let mut store = ArchiveStore::new();
        store.import_records(
            "mixed",
            vec![
                record("PICT", 5, None, b"plain"),
                record("PICT", 5, Some("mod-a"), b"tagged"),
            ],
        );

        let descriptor = ResourceDescriptor::new().with_type("PICT").with_id(5);
        assert_eq!(store.best(&descriptor).unwrap().data, b"tagged");
    }

    #[test]
    fn global_scope_sees_only_untagged_records() {
        let mut store = ArchiveStore::new();
        store.import_records(
            "mixed",
            vec![
                record("PICT", 1, None, b"plain"),
                record("PICT", 2, Some("mod-a"), b"tagged"),
            ],
        );

        let global = ResourceNamespace::global().typed_resource("PICT");
        let hits = store.resolve(&global);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);

        let universal = ResourceNamespace::universal().typed_resource("PICT");
        assert_eq!(store.resolve(&universal).len(), 2);
    }

    #[test]
    fn data_for_reports_missing_resources() {
        let store = ArchiveStore::new();
        let descriptor = ResourceDescriptor::new().with_type("DLOG").with_id(9);
        let err = store.data_for(&descriptor).unwrap_err();
        assert!(matches!(err, EngineError::NoMatchingResource { .. }));
        assert!(err.to_string().contains("DLOG"));
    }

    #[test]
    fn namespace_contains_resources() {
        let mut store = ArchiveStore::new();
        store.import_records("mod", vec![record("PICT", 1, Some("mod-a"), b"x")]);

        assert!(ResourceNamespace::named("mod-a").contains_resources(&store));
        assert!(!ResourceNamespace::named("mod-b").contains_resources(&store));
        assert!(ResourceNamespace::universal().contains_resources(&store));
        // Nothing untagged imported, so the global namespace is empty.
        assert!(!ResourceNamespace::global().contains_resources(&store));
    }

    #[test]
    fn resource_for_id_uses_precedence() {
        let mut store = ArchiveStore::new();
        store.import_records("base", vec![record("snd ", 40, None, b"old")]);
        store.import_records("patch", vec![record("snd ", 40, Some("mod-a"), b"new")]);

        let namespace = ResourceNamespace::universal();
        let hit = namespace.resource_for_id("snd ", 40, &store).expect("hit");
        assert_eq!(hit.data, b"new");

        let err = namespace.resource_for_id("snd ", 41, &store).unwrap_err();
        assert!(matches!(err, EngineError::NoMatchingResource { .. }));
    }
}
