use std::io::Cursor;

use anyhow::{Context, Result, ensure};
use byteorder::{BigEndian, ReadBytesExt};

use crate::element::{
    ElementKind, FrameRect, element_kind_from_scene_tag, read_prefixed_string, scene_tag_for_kind,
};

/// Flags word bit: present this interface through the immediate-mode UI
/// instead of spawning scene entities.
pub const FLAG_USE_IMMEDIATE_UI: u16 = 1 << 0;

/// One child element of a scene-interface resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneInterfaceChild {
    pub kind: ElementKind,
    pub frame: FrameRect,
    pub value: String,
    /// Id of an attached `LuaS` script resource; `None` when no script is
    /// attached.
    pub script_id: Option<i64>,
}

/// The engine's native interface description, superseding DLOG/DITL.
///
/// Layout (big-endian): flags u16, scene width i16, scene height i16,
/// child count u16; per child: type tag u8, frame x/y/width/height i16,
/// value (u16 length + bytes), script id i64 (0 = none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneInterfaceRecord {
    pub flags: u16,
    pub width: i16,
    pub height: i16,
    pub children: Vec<SceneInterfaceChild>,
}

impl SceneInterfaceRecord {
    pub fn parse(input: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(input);

        let flags = cursor.read_u16::<BigEndian>().context("scïn flags")?;
        let width = cursor.read_i16::<BigEndian>().context("scïn scene width")?;
        let height = cursor.read_i16::<BigEndian>().context("scïn scene height")?;
        let count = cursor.read_u16::<BigEndian>().context("scïn child count")? as usize;

        let mut children = Vec::with_capacity(count);
        for index in 0..count {
            let child =
                parse_child(&mut cursor).with_context(|| format!("scïn child {index}"))?;
            children.push(child);
        }

        Ok(SceneInterfaceRecord {
            flags,
            width,
            height,
            children,
        })
    }

    pub fn uses_immediate_ui(&self) -> bool {
        self.flags & FLAG_USE_IMMEDIATE_UI != 0
    }

    /// Serialize back into the on-disk layout. Used for fixtures and tests.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&(self.children.len() as u16).to_be_bytes());
        for child in &self.children {
            ensure!(
                child.value.len() <= u16::MAX as usize,
                "scïn value string longer than a u16 length allows ({} bytes)",
                child.value.len()
            );
            out.push(scene_tag_for_kind(child.kind));
            out.extend_from_slice(&child.frame.x.to_be_bytes());
            out.extend_from_slice(&child.frame.y.to_be_bytes());
            out.extend_from_slice(&child.frame.width.to_be_bytes());
            out.extend_from_slice(&child.frame.height.to_be_bytes());
            out.extend_from_slice(&(child.value.len() as u16).to_be_bytes());
            out.extend_from_slice(child.value.as_bytes());
            out.extend_from_slice(&child.script_id.unwrap_or(0).to_be_bytes());
        }
        Ok(out)
    }
}

fn parse_child(cursor: &mut Cursor<&[u8]>) -> Result<SceneInterfaceChild> {
    let tag = cursor.read_u8().context("type tag")?;
    let kind = element_kind_from_scene_tag(tag)?;

    let x = cursor.read_i16::<BigEndian>().context("frame x")?;
    let y = cursor.read_i16::<BigEndian>().context("frame y")?;
    let width = cursor.read_i16::<BigEndian>().context("frame width")?;
    let height = cursor.read_i16::<BigEndian>().context("frame height")?;
    let frame = FrameRect {
        x,
        y,
        width,
        height,
    };

    let value_len = cursor.read_u16::<BigEndian>().context("value length")? as usize;
    let value = read_prefixed_string(cursor, value_len).context("value string")?;

    let script_id = cursor.read_i64::<BigEndian>().context("script id")?;
    let script_id = (script_id != 0).then_some(script_id);

    Ok(SceneInterfaceChild {
        kind,
        frame,
        value,
        script_id,
    })
}
