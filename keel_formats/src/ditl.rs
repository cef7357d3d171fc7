use std::io::Cursor;

use anyhow::{Context, Result, ensure};
use byteorder::{BigEndian, ReadBytesExt};

use crate::element::{
    ElementKind, FrameRect, align_even, element_kind_from_ditl, read_pascal_string,
};

/// One item from a classic dialog item list, already mapped into the unified
/// element vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DitlItem {
    pub kind: ElementKind,
    pub frame: FrameRect,
    pub info: String,
}

/// Classic dialog item list: item count, then that many items in declaration
/// order. Item order is meaningful; callers correlate items positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DitlRecord {
    pub items: Vec<DitlItem>,
}

impl DitlRecord {
    pub fn parse(input: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(input);
        let count = cursor.read_u16::<BigEndian>().context("DITL item count")? as usize;

        let mut items = Vec::with_capacity(count);
        for index in 0..count {
            let item = parse_item(&mut cursor).with_context(|| format!("DITL item {index}"))?;
            items.push(item);
        }

        Ok(DitlRecord { items })
    }

    /// Serialize back into the on-disk layout. Used for fixtures and tests.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.items.len() as u16).to_be_bytes());
        for item in &self.items {
            ensure!(
                item.info.len() <= u8::MAX as usize,
                "DITL info string longer than a Pascal string allows ({} bytes)",
                item.info.len()
            );
            out.extend_from_slice(&item.frame.y.to_be_bytes());
            out.extend_from_slice(&item.frame.x.to_be_bytes());
            out.extend_from_slice(&(item.frame.y + item.frame.height).to_be_bytes());
            out.extend_from_slice(&(item.frame.x + item.frame.width).to_be_bytes());
            out.push(ditl_byte_for_kind(item.kind));
            out.push(item.info.len() as u8);
            out.extend_from_slice(item.info.as_bytes());
            if out.len() % 2 == 1 {
                out.push(0);
            }
        }
        Ok(out)
    }
}

fn parse_item(cursor: &mut Cursor<&[u8]>) -> Result<DitlItem> {
    let top = cursor.read_i16::<BigEndian>().context("frame top")?;
    let left = cursor.read_i16::<BigEndian>().context("frame left")?;
    let bottom = cursor.read_i16::<BigEndian>().context("frame bottom")?;
    let right = cursor.read_i16::<BigEndian>().context("frame right")?;
    let frame = FrameRect::from_corners(top, left, bottom, right);

    let type_byte = cursor.read_u8().context("type byte")?;
    let kind = element_kind_from_ditl(type_byte)?;
    let info = read_pascal_string(cursor).context("info string")?;
    align_even(cursor);

    Ok(DitlItem { kind, frame, info })
}

fn ditl_byte_for_kind(kind: ElementKind) -> u8 {
    match kind {
        ElementKind::UserDefined => 0,
        ElementKind::Help => 1,
        ElementKind::Button => 4,
        ElementKind::Checkbox => 5,
        ElementKind::Radio => 6,
        ElementKind::Control => 7,
        ElementKind::Label => 8,
        ElementKind::TextField => 16,
        ElementKind::Image => 32,
        ElementKind::Disabled => 128,
        // Kinds the legacy format cannot express degrade to user items.
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: ElementKind, frame: FrameRect, info: &str) -> DitlItem {
        DitlItem {
            kind,
            frame,
            info: info.into(),
        }
    }

    #[test]
    fn preserves_declaration_order() {
        let record = DitlRecord {
            items: vec![
                item(
                    ElementKind::Button,
                    FrameRect::from_corners(100, 10, 120, 90),
                    "OK",
                ),
                item(
                    ElementKind::Checkbox,
                    FrameRect::from_corners(40, 10, 56, 200),
                    "Remember me",
                ),
                item(
                    ElementKind::Label,
                    FrameRect::from_corners(10, 10, 26, 200),
                    "Sign in",
                ),
            ],
        };

        let parsed = DitlRecord::parse(&record.to_bytes().unwrap()).expect("parse");
        assert_eq!(parsed.items.len(), 3);
        assert_eq!(parsed.items[0].kind, ElementKind::Button);
        assert_eq!(parsed.items[1].kind, ElementKind::Checkbox);
        assert_eq!(parsed.items[2].kind, ElementKind::Label);
        assert_eq!(parsed.items[1].info, "Remember me");
        assert_eq!(parsed, record);
    }

    #[test]
    fn odd_length_info_strings_stay_aligned() {
        let record = DitlRecord {
            items: vec![
                item(
                    ElementKind::Button,
                    FrameRect::from_corners(0, 0, 20, 80),
                    "Yes",
                ),
                item(
                    ElementKind::Button,
                    FrameRect::from_corners(0, 90, 20, 170),
                    "No",
                ),
            ],
        };
        let parsed = DitlRecord::parse(&record.to_bytes().unwrap()).expect("parse");
        assert_eq!(parsed.items[0].info, "Yes");
        assert_eq!(parsed.items[1].info, "No");
    }

    #[test]
    fn oversized_info_string_is_rejected_by_the_writer() {
        let record = DitlRecord {
            items: vec![item(
                ElementKind::Label,
                FrameRect::from_corners(0, 0, 20, 80),
                &"x".repeat(300),
            )],
        };
        let err = record.to_bytes().unwrap_err();
        assert!(format!("{err:?}").contains("Pascal string"));
    }

    #[test]
    fn truncated_item_names_its_index() {
        let record = DitlRecord {
            items: vec![item(
                ElementKind::Button,
                FrameRect::from_corners(0, 0, 20, 80),
                "OK",
            )],
        };
        let mut bytes = record.to_bytes().unwrap();
        bytes[1] = 2; // claim a second item that is not there
        let err = DitlRecord::parse(&bytes).unwrap_err();
        assert!(format!("{err:?}").contains("DITL item 1"));
    }
}
