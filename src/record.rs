//! Record decoder (C6).
//!
//! A record is a header of serial types followed by a body of values. The
//! header's own varint gives its total length (including itself); walking
//! it yields one serial type per column, and those serial types' lengths
//! give the prefix-sum offsets of each column's bytes in the body.

use crate::serial_type::{SerialType, Value};
use crate::varint::VarInt;
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Record {
    serial_types: Vec<SerialType>,
    col_offset: Vec<usize>,
    body: Vec<u8>,
}

impl Record {
    /// Decodes a record from a fully-materialized payload (overflow pages
    /// already followed and concatenated, if any).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let header_size_varint = VarInt::read(payload).context("record header size varint")?;
        let mut pos = header_size_varint.consumed as usize;
        let header_end = header_size_varint.value as usize;

        let mut serial_types = Vec::new();
        while pos < header_end {
            let st = VarInt::read(&payload[pos..]).context("record serial type varint")?;
            pos += st.consumed as usize;
            serial_types.push(SerialType::from_code(st.value)?);
        }

        let mut col_offset = Vec::with_capacity(serial_types.len());
        let mut running = 0usize;
        for st in &serial_types {
            col_offset.push(running);
            running += st.payload_len();
        }

        let body = payload
            .get(header_end..header_end + running)
            .context("record body shorter than declared column lengths")?
            .to_vec();

        Ok(Record {
            serial_types,
            col_offset,
            body,
        })
    }

    pub fn column_count(&self) -> usize {
        self.serial_types.len()
    }

    /// Decodes column `i`. Returns `None` if the record has fewer columns
    /// than requested (e.g. after `ALTER TABLE ... ADD COLUMN`); callers
    /// should treat a missing trailing column as `Value::Null`.
    pub fn column(&self, i: usize) -> Result<Option<Value>> {
        let Some(st) = self.serial_types.get(i) else {
            return Ok(None);
        };
        let start = self.col_offset[i];
        let end = start + st.payload_len();
        Ok(Some(st.decode(&self.body[start..end])?))
    }

    pub fn all_columns(&self) -> Result<Vec<Value>> {
        (0..self.column_count())
            .map(|i| Ok(self.column(i)?.unwrap_or(Value::Null)))
            .collect()
    }
}
