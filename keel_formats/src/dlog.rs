use std::io::Cursor;

use anyhow::{Context, Result, ensure};
use byteorder::{BigEndian, ReadBytesExt};

use crate::element::{FrameRect, align_even, read_pascal_string, remaining};

/// Classic dialog template record.
///
/// Field order follows the Toolbox layout: bounds rect, procID, visible,
/// filler, goAway, filler, refCon, item-list id, title, auto-position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlogRecord {
    pub bounds: FrameRect,
    pub proc_id: i16,
    pub visible: bool,
    pub go_away: bool,
    pub ref_con: i32,
    pub interface_list: i16,
    pub title: String,
    pub auto_position: u16,
}

impl DlogRecord {
    pub fn parse(input: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(input);

        let top = cursor.read_i16::<BigEndian>().context("DLOG bounds top")?;
        let left = cursor.read_i16::<BigEndian>().context("DLOG bounds left")?;
        let bottom = cursor
            .read_i16::<BigEndian>()
            .context("DLOG bounds bottom")?;
        let right = cursor.read_i16::<BigEndian>().context("DLOG bounds right")?;
        let bounds = FrameRect::from_corners(top, left, bottom, right);

        let proc_id = cursor.read_i16::<BigEndian>().context("DLOG procID")?;
        let visible = cursor.read_u8().context("DLOG visible flag")? != 0;
        cursor.read_u8().context("DLOG filler")?;
        let go_away = cursor.read_u8().context("DLOG goAway flag")? != 0;
        cursor.read_u8().context("DLOG filler")?;
        let ref_con = cursor.read_i32::<BigEndian>().context("DLOG refCon")?;
        let interface_list = cursor
            .read_i16::<BigEndian>()
            .context("DLOG item-list id")?;
        let title = read_pascal_string(&mut cursor).context("DLOG title")?;

        align_even(&mut cursor);
        let auto_position = if remaining(&cursor) >= 2 {
            cursor.read_u16::<BigEndian>().context("DLOG auto-position")?
        } else {
            0
        };

        Ok(DlogRecord {
            bounds,
            proc_id,
            visible,
            go_away,
            ref_con,
            interface_list,
            title,
            auto_position,
        })
    }

    /// Serialize back into the on-disk layout. Used for fixtures and tests.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        ensure!(
            self.title.len() <= u8::MAX as usize,
            "DLOG title longer than a Pascal string allows ({} bytes)",
            self.title.len()
        );
        let mut out = Vec::new();
        out.extend_from_slice(&self.bounds.y.to_be_bytes());
        out.extend_from_slice(&self.bounds.x.to_be_bytes());
        out.extend_from_slice(&(self.bounds.y + self.bounds.height).to_be_bytes());
        out.extend_from_slice(&(self.bounds.x + self.bounds.width).to_be_bytes());
        out.extend_from_slice(&self.proc_id.to_be_bytes());
        out.push(self.visible as u8);
        out.push(0);
        out.push(self.go_away as u8);
        out.push(0);
        out.extend_from_slice(&self.ref_con.to_be_bytes());
        out.extend_from_slice(&self.interface_list.to_be_bytes());
        out.push(self.title.len() as u8);
        out.extend_from_slice(self.title.as_bytes());
        if out.len() % 2 == 1 {
            out.push(0);
        }
        out.extend_from_slice(&self.auto_position.to_be_bytes());
        Ok(out)
    }
}
