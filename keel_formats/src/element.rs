use std::io::{Cursor, Read};

use anyhow::{Result, bail, ensure};
use serde::Serialize;

/// Unified element vocabulary shared by the legacy DITL item list and the
/// modern scene-interface resource. Raw type bytes/tags never leave this
/// crate; each parser maps into this enumeration at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Button,
    Label,
    TextArea,
    Image,
    TextField,
    Checkbox,
    List,
    ScrollArea,
    Grid,
    LabeledList,
    Canvas,
    Sprite,
    PopupButton,
    Slider,
    Table,
    Box,
    Radio,
    TabBar,
    Separator,
    UserDefined,
    Help,
    Disabled,
    Control,
}

/// An element frame in the source format's own coordinate space
/// (top-left origin, y-down). Conversion to engine units happens at
/// positioning time, not at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameRect {
    pub x: i16,
    pub y: i16,
    pub width: i16,
    pub height: i16,
}

impl FrameRect {
    /// Build a frame from the classic Toolbox rect order.
    pub fn from_corners(top: i16, left: i16, bottom: i16, right: i16) -> Self {
        FrameRect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// Read a Pascal string (length byte + bytes) from the cursor.
pub(crate) fn read_pascal_string(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let mut len = [0u8; 1];
    cursor
        .read_exact(&mut len)
        .map_err(|_| anyhow::anyhow!("record truncated reading string length"))?;
    let len = len[0] as usize;
    let mut bytes = vec![0u8; len];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| anyhow::anyhow!("record truncated reading {len}-byte string"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read a u16-length-prefixed string (modern resources store values this way).
pub(crate) fn read_prefixed_string(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| anyhow::anyhow!("record truncated reading {len}-byte string"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Skip a single pad byte when the cursor sits at an odd offset. Classic
/// records keep every item aligned to an even boundary.
pub(crate) fn align_even(cursor: &mut Cursor<&[u8]>) {
    if cursor.position() % 2 == 1 {
        cursor.set_position(cursor.position() + 1);
    }
}

pub(crate) fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    let len = cursor.get_ref().len() as u64;
    len.saturating_sub(cursor.position()) as usize
}

/// Map a legacy DITL type byte into the unified vocabulary.
///
/// The legacy values look bit-flag-like but observed archives use them as
/// discrete tags: user_item=0, help_item=1, button=4, checkbox=5, radio=6,
/// control=7, static_text=8, edit_text=16, icon=32, picture=64, disable=128.
pub fn element_kind_from_ditl(type_byte: u8) -> Result<ElementKind> {
    let kind = match type_byte {
        0 => ElementKind::UserDefined,
        1 => ElementKind::Help,
        4 => ElementKind::Button,
        5 => ElementKind::Checkbox,
        6 => ElementKind::Radio,
        7 => ElementKind::Control,
        8 => ElementKind::Label,
        16 => ElementKind::TextField,
        // Icons and pictures both land on Image; Sprite is reserved for the
        // scene-interface tag.
        32 | 64 => ElementKind::Image,
        128 => ElementKind::Disabled,
        other => bail!("unknown DITL item type byte {other}"),
    };
    Ok(kind)
}

/// Map a scene-interface child tag into the unified vocabulary.
pub fn element_kind_from_scene_tag(tag: u8) -> Result<ElementKind> {
    ensure!(tag <= 22, "unknown scene-interface element tag {tag}");
    let kind = match tag {
        0 => ElementKind::Button,
        1 => ElementKind::Label,
        2 => ElementKind::TextArea,
        3 => ElementKind::Image,
        4 => ElementKind::TextField,
        5 => ElementKind::Checkbox,
        6 => ElementKind::List,
        7 => ElementKind::ScrollArea,
        8 => ElementKind::Grid,
        9 => ElementKind::LabeledList,
        10 => ElementKind::Canvas,
        11 => ElementKind::Sprite,
        12 => ElementKind::PopupButton,
        13 => ElementKind::Slider,
        14 => ElementKind::Table,
        15 => ElementKind::Box,
        16 => ElementKind::Radio,
        17 => ElementKind::TabBar,
        18 => ElementKind::Separator,
        19 => ElementKind::UserDefined,
        20 => ElementKind::Help,
        21 => ElementKind::Disabled,
        _ => ElementKind::Control,
    };
    Ok(kind)
}

/// The tag the scene-interface format uses for a kind. Inverse of
/// [`element_kind_from_scene_tag`]; used when writing fixtures.
pub fn scene_tag_for_kind(kind: ElementKind) -> u8 {
    match kind {
        ElementKind::Button => 0,
        ElementKind::Label => 1,
        ElementKind::TextArea => 2,
        ElementKind::Image => 3,
        ElementKind::TextField => 4,
        ElementKind::Checkbox => 5,
        ElementKind::List => 6,
        ElementKind::ScrollArea => 7,
        ElementKind::Grid => 8,
        ElementKind::LabeledList => 9,
        ElementKind::Canvas => 10,
        ElementKind::Sprite => 11,
        ElementKind::PopupButton => 12,
        ElementKind::Slider => 13,
        ElementKind::Table => 14,
        ElementKind::Box => 15,
        ElementKind::Radio => 16,
        ElementKind::TabBar => 17,
        ElementKind::Separator => 18,
        ElementKind::UserDefined => 19,
        ElementKind::Help => 20,
        ElementKind::Disabled => 21,
        ElementKind::Control => 22,
    }
}
