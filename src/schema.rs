//! Schema catalog (C7): indexes `sqlite_schema` (page 1) by object type and
//! table name.

use crate::page::Pager;
use crate::scan::for_each_leaf_cell;
use crate::serial_type::Value;
use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct SchemaEntry {
    pub obj_type: String,
    pub name: String,
    pub tbl_name: String,
    pub root_page: i64,
    pub sql: String,
}

pub struct SchemaCatalog {
    pub entries: Vec<SchemaEntry>,
}

impl SchemaCatalog {
    /// Reads every row of `sqlite_schema`. Page 1 is always a table b-tree;
    /// if it has grown past a single page its root becomes an interior
    /// page, so the walk goes through the same generic table-scan
    /// traversal used everywhere else rather than assuming a bare leaf.
    pub fn load(pager: &mut Pager) -> Result<Self> {
        let mut entries = Vec::new();

        for_each_leaf_cell(pager, 1, |cell| {
            let row = cell.record.all_columns()?;
            if row.len() != 5 {
                bail!("sqlite_schema row has {} columns, expected 5", row.len());
            }

            entries.push(SchemaEntry {
                obj_type: text_column(&row[0], "type")?,
                name: text_column(&row[1], "name")?,
                tbl_name: text_column(&row[2], "tbl_name")?,
                root_page: int_column(&row[3], "rootpage")?,
                sql: text_column(&row[4], "sql")?,
            });

            Ok(())
        })?;

        Ok(SchemaCatalog { entries })
    }

    /// The cell count of the schema root page, exactly as `.dbinfo` reports
    /// it. This deliberately over-counts when indexes/views are present and
    /// under-counts for a multi-page schema root — a documented fidelity
    /// gap of the `.dbinfo` meta-command, not a planner decision.
    pub fn root_page_cell_count(pager: &mut Pager) -> Result<u16> {
        Ok(pager.read_page(1)?.num_cells)
    }

    pub fn find_table(&self, table_name: &str) -> Option<&SchemaEntry> {
        self.entries
            .iter()
            .find(|e| e.obj_type == "table" && e.tbl_name == table_name)
    }

    /// Finds an index on `table` whose first indexed column matches
    /// `where_col` case-insensitively. Column extraction itself is the
    /// DDL parser's job (C8); this only filters schema rows by object type
    /// and owning table.
    pub fn indexes_for_table<'a>(&'a self, table: &str) -> impl Iterator<Item = &'a SchemaEntry> {
        self.entries
            .iter()
            .filter(move |e| e.obj_type == "index" && e.tbl_name == table)
    }

    pub fn user_tables(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.iter().filter(|e| e.obj_type == "table")
    }
}

fn text_column(value: &Value, field: &str) -> Result<String> {
    match value {
        Value::Text(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        Value::Null => Ok(String::new()),
        other => bail!("expected text in schema column {field}, got {other:?}"),
    }
}

fn int_column(value: &Value, field: &str) -> Result<i64> {
    value
        .as_int()
        .with_context(|| format!("expected integer in schema column {field}, got {value:?}"))
}
