//! Page reader (C4) and B-tree page header parser (C5).

use crate::byte_reader::{u16_be, u32_be};
use crate::error::EngineError;
use anyhow::{Context, Result};
use log::trace;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

pub const FILE_HEADER_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    TableLeaf,
    TableInterior,
    IndexLeaf,
    IndexInterior,
}

impl PageKind {
    pub fn from_byte(b: u8) -> Result<Self> {
        Ok(match b {
            0x0D => PageKind::TableLeaf,
            0x05 => PageKind::TableInterior,
            0x0A => PageKind::IndexLeaf,
            0x02 => PageKind::IndexInterior,
            other => {
                return Err(EngineError::Corrupt(format!("unknown page kind byte {other:#04x}")).into())
            }
        })
    }

    pub fn is_interior(&self) -> bool {
        matches!(self, PageKind::TableInterior | PageKind::IndexInterior)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, PageKind::TableLeaf | PageKind::TableInterior)
    }

    pub fn header_size(&self) -> usize {
        if self.is_interior() {
            12
        } else {
            8
        }
    }
}

/// A single page's raw bytes plus the byte offset within those bytes where
/// its B-tree page header begins (100 for page 1, 0 otherwise).
#[derive(Debug, Clone)]
pub struct Page {
    pub page_no: u32,
    pub bytes: Vec<u8>,
    pub header_offset: usize,
    pub kind: PageKind,
    pub num_cells: u16,
    pub right_most_child: Option<u32>,
}

impl Page {
    fn parse(page_no: u32, bytes: Vec<u8>) -> Result<Self> {
        let header_offset = if page_no == 1 { FILE_HEADER_SIZE } else { 0 };
        let kind = PageKind::from_byte(
            *bytes
                .get(header_offset)
                .context("page buffer shorter than header offset")?,
        )?;
        let num_cells = u16_be(&bytes[header_offset + 3..])?;
        let right_most_child = if kind.is_interior() {
            Some(u32_be(&bytes[header_offset + 8..])?)
        } else {
            None
        };

        Ok(Page {
            page_no,
            bytes,
            header_offset,
            kind,
            num_cells,
            right_most_child,
        })
    }

    /// Offset of the `i`th entry of the cell pointer array, resolved to an
    /// absolute byte offset into `self.bytes` where the cell itself starts.
    pub fn cell_offset(&self, i: u16) -> Result<usize> {
        if i >= self.num_cells {
            return Err(EngineError::Corrupt(format!(
                "cell index {i} out of range (num_cells={})",
                self.num_cells
            ))
            .into());
        }
        let array_start = self.header_offset + self.kind.header_size();
        let entry = array_start + i as usize * 2;
        Ok(u16_be(&self.bytes[entry..])? as usize)
    }

    pub fn cell_bytes(&self, i: u16) -> Result<&[u8]> {
        Ok(&self.bytes[self.cell_offset(i)?..])
    }
}

/// Reads whole pages from a single-file SQLite database by 1-based page
/// number. Page size is fixed for the lifetime of a `Pager` (it is read
/// once from the file header and never changes mid-query, matching the
/// read-only, no-write scope of this engine).
pub struct Pager {
    file: File,
    pub page_size: usize,
}

impl Pager {
    pub fn open(path: &str) -> Result<Self> {
        let mut file = File::open(path).with_context(|| format!("opening {path}"))?;
        let page_size = read_page_size(&mut file)?;
        Ok(Pager { file, page_size })
    }

    pub fn read_page(&mut self, page_no: u32) -> Result<Page> {
        if page_no == 0 {
            return Err(EngineError::Corrupt("page numbers are 1-based".into()).into());
        }
        trace!("reading page {page_no} (page_size={})", self.page_size);

        let offset = (page_no as u64 - 1) * self.page_size as u64;
        self.file.seek(SeekFrom::Start(offset))?;

        let mut buf = vec![0u8; self.page_size];
        self.file.read_exact(&mut buf)?;

        Page::parse(page_no, buf)
    }

    /// Reads an overflow page in full, returning its raw bytes (the first
    /// four bytes of which are the next overflow page number, 0 if none).
    pub fn read_raw_page(&mut self, page_no: u32) -> Result<Vec<u8>> {
        let offset = (page_no as u64 - 1) * self.page_size as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.page_size];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

fn read_page_size(file: &mut File) -> Result<usize> {
    let mut header = [0u8; FILE_HEADER_SIZE];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut header)?;
    let raw = u16_be(&header[16..18])?;
    // the on-disk convention maps the literal value 1 to a 65536-byte page,
    // since 65536 itself does not fit in an unsigned 16-bit field.
    Ok(if raw == 1 { 65536 } else { raw as usize })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_kind_from_byte() {
        assert_eq!(PageKind::from_byte(0x0D).unwrap(), PageKind::TableLeaf);
        assert_eq!(PageKind::from_byte(0x05).unwrap(), PageKind::TableInterior);
        assert_eq!(PageKind::from_byte(0x0A).unwrap(), PageKind::IndexLeaf);
        assert_eq!(PageKind::from_byte(0x02).unwrap(), PageKind::IndexInterior);
        assert!(PageKind::from_byte(0x01).is_err());
    }

    #[test]
    fn header_sizes() {
        assert_eq!(PageKind::TableLeaf.header_size(), 8);
        assert_eq!(PageKind::IndexLeaf.header_size(), 8);
        assert_eq!(PageKind::TableInterior.header_size(), 12);
        assert_eq!(PageKind::IndexInterior.header_size(), 12);
    }
}
