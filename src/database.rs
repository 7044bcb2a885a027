//! Top-level engine wiring (ambient, not a spec module of its own): opens a
//! file, reads its header, and loads the schema catalog, so the CLI and the
//! planner share one `Database` handle per invocation.

use crate::byte_reader::u16_be;
use crate::page::{Pager, FILE_HEADER_SIZE};
use crate::schema::SchemaCatalog;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;

/// The subset of the 100-byte file header this engine actually needs.
/// Everything else (freelist bookkeeping, WAL format version, vacuum
/// settings) is irrelevant to read-only querying and is not decoded.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub page_size: usize,
}

impl FileHeader {
    fn read_from(file: &mut File) -> Result<Self> {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        file.read_exact(&mut buf).context("reading file header")?;
        let raw = u16_be(&buf[16..18])?;
        let page_size = if raw == 1 { 65536 } else { raw as usize };
        Ok(FileHeader { page_size })
    }
}

pub struct Database {
    pub header: FileHeader,
    pub pager: Pager,
    pub catalog: SchemaCatalog,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let mut file = File::open(path).with_context(|| format!("opening {path}"))?;
        let header = FileHeader::read_from(&mut file)?;

        let mut pager = Pager::open(path)?;
        let catalog = SchemaCatalog::load(&mut pager)?;

        Ok(Database {
            header,
            pager,
            catalog,
        })
    }

    /// `.dbinfo`'s "number of tables" line, reproducing the schema root
    /// page's raw `num_cells` fidelity gap (§9).
    pub fn schema_root_cell_count(&mut self) -> Result<u16> {
        SchemaCatalog::root_page_cell_count(&mut self.pager)
    }

    /// `.tables`' output: user table names in schema insertion order.
    pub fn table_names(&self) -> Vec<String> {
        self.catalog
            .user_tables()
            .map(|e| e.tbl_name.clone())
            .collect()
    }
}
