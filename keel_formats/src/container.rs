use std::fs::File;
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail, ensure};
use byteorder::{BigEndian, ByteOrder};
use memmap2::{Mmap, MmapOptions};

/// Magic prefixing every native resource container.
pub const CONTAINER_MAGIC: [u8; 4] = *b"KRSR";

/// Container revision understood by this crate.
pub const CONTAINER_VERSION: u16 = 1;

const HEADER_SIZE: usize = 14;
const ENTRY_SIZE: usize = 28;
const NO_STRING: u32 = u32::MAX;

/// One typed, identified, optionally-named resource inside a container.
#[derive(Debug, Clone)]
pub struct ContainerEntry {
    pub type_code: String,
    pub id: i64,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub offset: u64,
    pub size: u32,
}

impl ContainerEntry {
    pub fn data_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        let end = start + self.size as usize;
        start..end
    }
}

/// Memory-mapped view of a native `KRSR` resource container.
#[derive(Debug)]
pub struct ContainerArchive {
    path: PathBuf,
    mmap: Mmap,
    entries: Vec<ContainerEntry>,
}

impl ContainerArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)
            .with_context(|| format!("opening resource container at {}", path_buf.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("memory-mapping resource container {}", path_buf.display()))?;

        let entries = parse_entries(&mmap)
            .with_context(|| format!("parsing resource container {}", path_buf.display()))?;

        Ok(ContainerArchive {
            path: path_buf,
            mmap,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[ContainerEntry] {
        &self.entries
    }

    pub fn find_entry(&self, type_code: &str, id: i64) -> Option<&ContainerEntry> {
        self.entries
            .iter()
            .find(|entry| entry.type_code == type_code && entry.id == id)
    }

    pub fn read_entry_bytes(&self, entry: &ContainerEntry) -> &[u8] {
        let range = entry.data_range();
        &self.mmap[range]
    }
}

fn parse_entries(mmap: &Mmap) -> Result<Vec<ContainerEntry>> {
    ensure!(
        mmap.len() >= HEADER_SIZE,
        "container is too small to hold a header"
    );

    let header = &mmap[..HEADER_SIZE];
    if header[0..4] != CONTAINER_MAGIC {
        bail!("container missing KRSR signature");
    }

    let version = BigEndian::read_u16(&header[4..6]);
    ensure!(
        version == CONTAINER_VERSION,
        "unsupported container version {version}"
    );

    let entry_count = BigEndian::read_u32(&header[6..10]) as usize;
    let string_table_len = BigEndian::read_u32(&header[10..14]) as usize;

    let entries_bytes_len = entry_count
        .checked_mul(ENTRY_SIZE)
        .ok_or_else(|| anyhow!("container entry count overflow"))?;
    let strings_offset = HEADER_SIZE + entries_bytes_len;
    let strings_end = strings_offset
        .checked_add(string_table_len)
        .ok_or_else(|| anyhow!("container string table overflow"))?;
    ensure!(
        strings_end <= mmap.len(),
        "container truncated before string table"
    );

    let entries_block = &mmap[HEADER_SIZE..strings_offset];
    let strings_block = &mmap[strings_offset..strings_end];

    let mut entries = Vec::with_capacity(entry_count);

    for index in 0..entry_count {
        let base = index * ENTRY_SIZE;
        let entry_bytes = &entries_block[base..base + ENTRY_SIZE];

        let type_offset = BigEndian::read_u32(&entry_bytes[0..4]);
        let id = BigEndian::read_i64(&entry_bytes[4..12]);
        let name_offset = BigEndian::read_u32(&entry_bytes[12..16]);
        let namespace_offset = BigEndian::read_u32(&entry_bytes[16..20]);
        let data_offset = BigEndian::read_u32(&entry_bytes[20..24]) as usize;
        let size = BigEndian::read_u32(&entry_bytes[24..28]);

        let type_code = read_table_string(strings_block, type_offset)
            .with_context(|| format!("reading type code for entry {index}"))?
            .ok_or_else(|| anyhow!("entry {index} has no type code"))?;
        let name = read_table_string(strings_block, name_offset)
            .with_context(|| format!("reading name for entry {index}"))?;
        let namespace = read_table_string(strings_block, namespace_offset)
            .with_context(|| format!("reading namespace for entry {index}"))?;

        let end = data_offset
            .checked_add(size as usize)
            .ok_or_else(|| anyhow!("entry {index} size overflow"))?;
        ensure!(end <= mmap.len(), "entry {index} data extends beyond file");

        entries.push(ContainerEntry {
            type_code,
            id,
            name,
            namespace,
            offset: data_offset as u64,
            size,
        });
    }

    Ok(entries)
}

fn read_table_string(table: &[u8], offset: u32) -> Result<Option<String>> {
    if offset == NO_STRING {
        return Ok(None);
    }
    let offset = offset as usize;
    if offset >= table.len() {
        bail!("string offset {offset} beyond table length {}", table.len());
    }

    let mut end = offset;
    while end < table.len() && table[end] != 0 {
        end += 1;
    }

    let bytes = &table[offset..end];
    Ok(Some(String::from_utf8_lossy(bytes).into_owned()))
}

/// Owned form of a container entry, used when building archives.
#[derive(Debug, Clone)]
pub struct ContainerResource {
    pub type_code: String,
    pub id: i64,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub data: Vec<u8>,
}

/// Serialize resources into the `KRSR` container layout.
pub fn build_container(resources: &[ContainerResource]) -> Vec<u8> {
    let mut strings: Vec<u8> = Vec::new();
    let mut intern = |value: &str, strings: &mut Vec<u8>| -> u32 {
        let offset = strings.len() as u32;
        strings.extend_from_slice(value.as_bytes());
        strings.push(0);
        offset
    };

    struct PendingEntry {
        type_offset: u32,
        id: i64,
        name_offset: u32,
        namespace_offset: u32,
        data_len: u32,
    }

    let mut pending = Vec::with_capacity(resources.len());
    for resource in resources {
        let type_offset = intern(&resource.type_code, &mut strings);
        let name_offset = resource
            .name
            .as_deref()
            .map(|name| intern(name, &mut strings))
            .unwrap_or(NO_STRING);
        let namespace_offset = resource
            .namespace
            .as_deref()
            .map(|ns| intern(ns, &mut strings))
            .unwrap_or(NO_STRING);
        pending.push(PendingEntry {
            type_offset,
            id: resource.id,
            name_offset,
            namespace_offset,
            data_len: resource.data.len() as u32,
        });
    }

    let data_start = HEADER_SIZE + resources.len() * ENTRY_SIZE + strings.len();

    let mut out = Vec::new();
    out.extend_from_slice(&CONTAINER_MAGIC);
    out.extend_from_slice(&CONTAINER_VERSION.to_be_bytes());
    out.extend_from_slice(&(resources.len() as u32).to_be_bytes());
    out.extend_from_slice(&(strings.len() as u32).to_be_bytes());

    let mut data_offset = data_start as u32;
    for entry in &pending {
        out.extend_from_slice(&entry.type_offset.to_be_bytes());
        out.extend_from_slice(&entry.id.to_be_bytes());
        out.extend_from_slice(&entry.name_offset.to_be_bytes());
        out.extend_from_slice(&entry.namespace_offset.to_be_bytes());
        out.extend_from_slice(&data_offset.to_be_bytes());
        out.extend_from_slice(&entry.data_len.to_be_bytes());
        data_offset += entry.data_len;
    }

    out.extend_from_slice(&strings);
    for resource in resources {
        out.extend_from_slice(&resource.data);
    }
    out
}

/// Write resources to a container file on disk.
pub fn write_container<P: AsRef<Path>>(path: P, resources: &[ContainerResource]) -> Result<()> {
    let bytes = build_container(resources);
    let mut file = File::create(path.as_ref())
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    file.write_all(&bytes)
        .with_context(|| format!("writing {}", path.as_ref().display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn container_round_trips_through_disk() {
        let resources = vec![
            ContainerResource {
                type_code: "DLOG".into(),
                id: 128,
                name: Some("about box".into()),
                namespace: Some("ui".into()),
                data: b"dialog-bytes".to_vec(),
            },
            ContainerResource {
                type_code: "DITL".into(),
                id: 128,
                name: None,
                namespace: None,
                data: b"items".to_vec(),
            },
        ];

        let file = NamedTempFile::new().unwrap();
        write_container(file.path(), &resources).unwrap();

        let archive = ContainerArchive::open(file.path()).unwrap();
        assert_eq!(archive.entries().len(), 2);

        let dialog = archive.find_entry("DLOG", 128).expect("DLOG entry");
        assert_eq!(dialog.name.as_deref(), Some("about box"));
        assert_eq!(dialog.namespace.as_deref(), Some("ui"));
        assert_eq!(archive.read_entry_bytes(dialog), b"dialog-bytes");

        let items = archive.find_entry("DITL", 128).expect("DITL entry");
        assert!(items.name.is_none());
        assert!(items.namespace.is_none());
        assert_eq!(archive.read_entry_bytes(items), b"items");
    }

    #[test]
    fn entry_layout_matches_the_documented_grammar() {
        let resources = vec![ContainerResource {
            type_code: "scïn".into(),
            id: 0x0102_0304_0506_0708,
            name: None,
            namespace: Some("mod-a".into()),
            data: b"payload".to_vec(),
        }];
        let bytes = build_container(&resources);

        // Header: magic, version u16, entry count u32, string table length.
        assert_eq!(&bytes[0..4], b"KRSR");
        assert_eq!(BigEndian::read_u16(&bytes[4..6]), CONTAINER_VERSION);
        assert_eq!(BigEndian::read_u32(&bytes[6..10]), 1);
        let string_table_len = BigEndian::read_u32(&bytes[10..14]) as usize;
        // "scïn\0" (ï is two bytes in UTF-8) plus "mod-a\0".
        assert_eq!(string_table_len, 6 + 6);

        // One 28-byte entry: type offset u32, id i64, name offset u32,
        // namespace offset u32, data offset u32, data length u32.
        let entry = &bytes[HEADER_SIZE..HEADER_SIZE + ENTRY_SIZE];
        assert_eq!(BigEndian::read_u32(&entry[0..4]), 0);
        assert_eq!(BigEndian::read_i64(&entry[4..12]), 0x0102_0304_0506_0708);
        assert_eq!(BigEndian::read_u32(&entry[12..16]), NO_STRING);
        assert_eq!(BigEndian::read_u32(&entry[16..20]), 6);
        let data_offset = BigEndian::read_u32(&entry[20..24]) as usize;
        assert_eq!(data_offset, HEADER_SIZE + ENTRY_SIZE + string_table_len);
        assert_eq!(BigEndian::read_u32(&entry[24..28]), 7);

        // String table is NUL-terminated, then the payload blob.
        let strings = &bytes[HEADER_SIZE + ENTRY_SIZE..data_offset];
        assert_eq!(strings, "scïn\0mod-a\0".as_bytes());
        assert_eq!(&bytes[data_offset..], b"payload");
    }

    #[test]
    fn rejects_bad_signature() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"NOPE\x00\x01\x00\x00\x00\x00\x00\x00\x00\x00").unwrap();
        let err = ContainerArchive::open(file.path()).unwrap_err();
        assert!(format!("{err:?}").contains("KRSR signature"));
    }

    #[test]
    fn rejects_truncated_entry_data() {
        let resources = vec![ContainerResource {
            type_code: "scïn".into(),
            id: 1,
            name: None,
            namespace: None,
            data: vec![1, 2, 3, 4],
        }];
        let mut bytes = build_container(&resources);
        bytes.truncate(bytes.len() - 2);

        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), &bytes).unwrap();
        let err = ContainerArchive::open(file.path()).unwrap_err();
        assert!(format!("{err:?}").contains("extends beyond file"));
    }
}
