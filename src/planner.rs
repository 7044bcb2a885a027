//! Query planner (C12): decides between the `COUNT(*)` fast path, an
//! index probe + rowid point lookup, or a full table scan.

use crate::cell::TableLeafCell;
use crate::ddl::{self, TableDef};
use crate::index;
use crate::page::Pager;
use crate::record::Record;
use crate::schema::{SchemaCatalog, SchemaEntry};
use crate::scan;
use crate::serial_type::Value;
use crate::sql::{Projection, SelectStmt};
use anyhow::Result;
use log::debug;

struct MatchedRow {
    rowid: i64,
    record: Record,
}

impl From<TableLeafCell> for MatchedRow {
    fn from(cell: TableLeafCell) -> Self {
        MatchedRow {
            rowid: cell.rowid,
            record: cell.record,
        }
    }
}

/// Executes a parsed `SELECT`, returning one already-`|`-joined line per
/// result row (or a single line for `COUNT(*)`). Per §7, a missing table
/// or an unknown WHERE column never produce a hard error: they resolve to
/// `0`/zero rows as specified.
pub fn execute_select(
    pager: &mut Pager,
    catalog: &SchemaCatalog,
    stmt: &SelectStmt,
) -> Result<Vec<String>> {
    let Some(table_entry) = catalog.find_table(&stmt.table) else {
        debug!("planner: table {:?} not found in schema", stmt.table);
        return Ok(match stmt.projection {
            Projection::CountStar => vec!["0".to_string()],
            Projection::Columns(_) => Vec::new(),
        });
    };

    let table_def = ddl::parse_create_table(&table_entry.sql)?;
    let root_page = table_entry.root_page as u32;

    // Every projected column name must resolve before any row is read: an
    // unknown projection column short-circuits the whole query to a single
    // empty line rather than producing one blank field per matched row.
    let col_indices = match &stmt.projection {
        Projection::Columns(cols) => {
            let mut indices = Vec::with_capacity(cols.len());
            for col in cols {
                match table_def.column_index(col) {
                    Some(idx) => indices.push(idx),
                    None => {
                        debug!("planner: projection references unknown column {col:?}, short-circuiting to empty line");
                        return Ok(vec![String::new()]);
                    }
                }
            }
            Some(indices)
        }
        Projection::CountStar => None,
    };

    if matches!(stmt.projection, Projection::CountStar) && stmt.where_clause.is_none() {
        debug!("planner: COUNT(*) fast path on page {root_page}");
        let count = scan::count_rows(pager, root_page)?;
        return Ok(vec![count.to_string()]);
    }

    let rows = collect_rows(
        pager,
        catalog,
        &table_def,
        root_page,
        &stmt.table,
        &stmt.where_clause,
    )?;

    match col_indices {
        None => Ok(vec![rows.len().to_string()]),
        Some(col_indices) => rows
            .iter()
            .map(|row| project_line(&table_def, row, &col_indices))
            .collect(),
    }
}

fn collect_rows(
    pager: &mut Pager,
    catalog: &SchemaCatalog,
    table_def: &TableDef,
    root_page: u32,
    table_name: &str,
    where_clause: &Option<(String, String)>,
) -> Result<Vec<MatchedRow>> {
    let Some((where_col, where_val)) = where_clause else {
        debug!("planner: full scan, no predicate");
        let mut rows = Vec::new();
        scan::for_each_leaf_cell(pager, root_page, |cell| {
            rows.push(cell.into());
            Ok(())
        })?;
        return Ok(rows);
    };

    let Some(where_idx) = table_def.column_index(where_col) else {
        debug!("planner: WHERE references unknown column {where_col:?}, zero rows");
        return Ok(Vec::new());
    };

    if let Some(index_entry) = find_usable_index(catalog, table_name, where_col) {
        debug!(
            "planner: index probe on {:?} (root page {})",
            index_entry.name, index_entry.root_page
        );
        let rowids = index::probe_index(pager, index_entry.root_page as u32, where_val.as_bytes())?;
        let mut rows = Vec::with_capacity(rowids.len());
        for rowid in rowids {
            if let Some(cell) = index::lookup_rowid(pager, root_page, rowid)? {
                rows.push(cell.into());
            }
        }
        return Ok(rows);
    }

    debug!("planner: full scan with row-level filter on column {where_col:?}");
    let mut rows = Vec::new();
    scan::for_each_leaf_cell(pager, root_page, |cell| {
        if resolve_value(table_def, cell.rowid, &cell.record, where_idx)?.comparison_bytes()
            == where_val.as_bytes()
        {
            rows.push(cell.into());
        }
        Ok(())
    })?;
    Ok(rows)
}

/// Finds an index on `table` whose first indexed column matches
/// `where_col` case-insensitively (C12 step 2's planner condition).
fn find_usable_index<'a>(
    catalog: &'a SchemaCatalog,
    table: &str,
    where_col: &str,
) -> Option<&'a SchemaEntry> {
    catalog.indexes_for_table(table).find(|entry| {
        ddl::parse_create_index(&entry.sql)
            .ok()
            .and_then(|def| def.first_column().map(|c| c.eq_ignore_ascii_case(where_col)))
            .unwrap_or(false)
    })
}

/// A rowid-alias column is stored as NULL; its true value is the cell's
/// rowid (§3, "Rowid alias").
fn resolve_value(table_def: &TableDef, rowid: i64, record: &Record, idx: usize) -> Result<Value> {
    if table_def.rowid_alias_index == Some(idx) {
        Ok(Value::Int(rowid))
    } else {
        Ok(record.column(idx)?.unwrap_or(Value::Null))
    }
}

/// Renders one output row. `col_indices` are already-resolved column
/// positions (the caller guarantees every name resolved before any row was
/// read, so there is no "unknown column" case left to handle here).
fn project_line(table_def: &TableDef, row: &MatchedRow, col_indices: &[usize]) -> Result<String> {
    let mut parts = Vec::with_capacity(col_indices.len());
    for &idx in col_indices {
        let bytes = resolve_value(table_def, row.rowid, &row.record, idx)?.display_bytes();
        parts.push(String::from_utf8_lossy(&bytes).into_owned());
    }
    Ok(parts.join("|"))
}
