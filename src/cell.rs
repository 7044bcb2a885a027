//! Per-cell layout for each of the four B-tree page kinds (part of C5), and
//! the overflow-page reader (C13) that reconstructs a payload that spilled
//! past its cell's local storage.

use crate::error::EngineError;
use crate::page::Pager;
use crate::record::Record;
use crate::varint::VarInt;
use anyhow::{Context, Result};
use log::debug;

pub struct TableLeafCell {
    pub rowid: i64,
    pub record: Record,
}

pub struct TableInteriorCell {
    pub left_child_page: u32,
    pub key_rowid: i64,
}

pub struct IndexLeafCell {
    pub record: Record,
}

pub struct IndexInteriorCell {
    pub left_child_page: u32,
    pub record: Record,
}

impl TableLeafCell {
    pub fn parse(cell: &[u8], pager: &mut Pager) -> Result<Self> {
        let payload_size = VarInt::read(cell).context("table leaf payload size varint")?;
        let mut pos = payload_size.consumed as usize;

        let rowid_varint = VarInt::read(&cell[pos..]).context("table leaf rowid varint")?;
        pos += rowid_varint.consumed as usize;

        let payload = materialize_payload(
            pager,
            &cell[pos..],
            payload_size.value,
            local_payload_len_table_leaf(pager.page_size, payload_size.value),
        )?;

        Ok(TableLeafCell {
            rowid: rowid_varint.value as i64,
            record: Record::decode(&payload)?,
        })
    }
}

impl TableInteriorCell {
    pub fn parse(cell: &[u8]) -> Result<Self> {
        let left_child_page = u32::from_be_bytes(
            cell.get(..4)
                .context("table interior left child pointer")?
                .try_into()?,
        );
        let key_rowid = VarInt::read(&cell[4..]).context("table interior key rowid")?;
        Ok(TableInteriorCell {
            left_child_page,
            key_rowid: key_rowid.value as i64,
        })
    }
}

impl IndexLeafCell {
    pub fn parse(cell: &[u8], pager: &mut Pager) -> Result<Self> {
        let payload_size = VarInt::read(cell).context("index leaf payload size varint")?;
        let pos = payload_size.consumed as usize;

        let payload = materialize_payload(
            pager,
            &cell[pos..],
            payload_size.value,
            local_payload_len_index(pager.page_size, payload_size.value),
        )?;

        Ok(IndexLeafCell {
            record: Record::decode(&payload)?,
        })
    }
}

impl IndexInteriorCell {
    pub fn parse(cell: &[u8], pager: &mut Pager) -> Result<Self> {
        let left_child_page = u32::from_be_bytes(
            cell.get(..4)
                .context("index interior left child pointer")?
                .try_into()?,
        );
        let payload_size =
            VarInt::read(&cell[4..]).context("index interior payload size varint")?;
        let pos = 4 + payload_size.consumed as usize;

        let payload = materialize_payload(
            pager,
            &cell[pos..],
            payload_size.value,
            local_payload_len_index(pager.page_size, payload_size.value),
        )?;

        Ok(IndexInteriorCell {
            left_child_page,
            record: Record::decode(&payload)?,
        })
    }
}

/// Table-leaf local payload threshold per the SQLite format: `X = U - 35`,
/// falling back to the `M`/`K` spill formula once `P > X`.
fn local_payload_len_table_leaf(usable_size: usize, payload_size: u64) -> usize {
    let x = usable_size.saturating_sub(35);
    spill_formula(usable_size, payload_size, x)
}

/// Index leaf/interior local payload threshold: `X = ((U-12)*64/255) - 23`.
fn local_payload_len_index(usable_size: usize, payload_size: u64) -> usize {
    let x = ((usable_size.saturating_sub(12)) * 64 / 255).saturating_sub(23);
    spill_formula(usable_size, payload_size, x)
}

fn spill_formula(usable_size: usize, payload_size: u64, x: usize) -> usize {
    if payload_size as usize <= x {
        return payload_size as usize;
    }
    let m = ((usable_size.saturating_sub(12)) * 32 / 255).saturating_sub(23);
    let k = m + ((payload_size as usize - m) % usable_size.saturating_sub(4).max(1));
    if k <= x {
        k
    } else {
        m
    }
}

/// Reconstructs a cell's full payload. `tail` starts right after the
/// varint(s) preceding the payload bytes; it contains at least
/// `local_len` bytes of payload followed, only if `total_size > local_len`,
/// by a 4-byte overflow page pointer.
fn materialize_payload(
    pager: &mut Pager,
    tail: &[u8],
    total_size: u64,
    local_len: usize,
) -> Result<Vec<u8>> {
    let local = tail
        .get(..local_len)
        .context("cell payload shorter than computed local length")?;

    if total_size as usize == local_len {
        return Ok(local.to_vec());
    }

    let overflow_start = u32::from_be_bytes(
        tail.get(local_len..local_len + 4)
            .context("missing overflow page pointer")?
            .try_into()?,
    );

    debug!(
        "payload spills past local page (total={total_size}, local={local_len}), following overflow chain from page {overflow_start}"
    );

    let mut out = local.to_vec();
    let mut remaining = total_size as usize - local_len;
    let mut next_page = overflow_start;

    while remaining > 0 {
        if next_page == 0 {
            return Err(EngineError::Corrupt("overflow chain truncated".into()).into());
        }
        let page_bytes = pager.read_raw_page(next_page)?;
        let linked_next = u32::from_be_bytes(page_bytes[..4].try_into()?);
        let usable = page_bytes.len() - 4;
        let take = remaining.min(usable);
        out.extend_from_slice(&page_bytes[4..4 + take]);
        remaining -= take;
        next_page = linked_next;
    }

    Ok(out)
}
