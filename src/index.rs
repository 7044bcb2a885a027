//! Index probe (C10) and rowid point lookup (C11).
//!
//! Per §7/§4.14, a corrupt or unreadable page encountered partway through a
//! descent only drops the subtree rooted there: the error is logged at
//! `warn!` and the probe/lookup completes with whatever it already found,
//! rather than failing the whole command.

use crate::cell::{IndexInteriorCell, IndexLeafCell, TableInteriorCell, TableLeafCell};
use crate::page::{Pager, PageKind};
use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, warn};

/// Descends the index B-tree rooted at `root_page` collecting the rowids of
/// every entry whose first indexed column equals `where_value` (compared
/// byte-lexicographically). Returns them deduplicated and sorted ascending;
/// there is no cap on the result size.
pub fn probe_index(pager: &mut Pager, root_page: u32, where_value: &[u8]) -> Result<Vec<i64>> {
    let mut rowids = Vec::new();
    descend_index(pager, root_page, where_value, &mut rowids);
    Ok(rowids.into_iter().sorted_unstable().dedup().collect())
}

fn descend_index(pager: &mut Pager, page_no: u32, where_value: &[u8], out: &mut Vec<i64>) {
    let page = match pager.read_page(page_no) {
        Ok(page) => page,
        Err(err) => {
            warn!("skipping index page {page_no}: {err:#}");
            return;
        }
    };

    match page.kind {
        PageKind::IndexLeaf => {
            debug!("index leaf page {page_no}: {} cells", page.num_cells);
            for i in 0..page.num_cells {
                let parsed = page
                    .cell_bytes(i)
                    .map(|b| b.to_vec())
                    .and_then(|bytes| IndexLeafCell::parse(&bytes, pager));
                let cell = match parsed {
                    Ok(cell) => cell,
                    Err(err) => {
                        warn!("skipping index cell {i} on page {page_no}: {err:#}");
                        continue;
                    }
                };
                let key0 = match index_key0(&cell.record) {
                    Ok(key0) => key0,
                    Err(err) => {
                        warn!("skipping index cell {i} on page {page_no}: {err:#}");
                        continue;
                    }
                };
                if key0 != where_value {
                    continue;
                }
                match trailing_rowid(&cell.record) {
                    Ok(rowid) => out.push(rowid),
                    Err(err) => warn!("skipping index cell {i} on page {page_no}: {err:#}"),
                }
            }
        }
        PageKind::IndexInterior => {
            let mut next_child = None;
            for i in 0..page.num_cells {
                let parsed = page
                    .cell_bytes(i)
                    .map(|b| b.to_vec())
                    .and_then(|bytes| IndexInteriorCell::parse(&bytes, pager));
                let cell = match parsed {
                    Ok(cell) => cell,
                    Err(err) => {
                        warn!("skipping index interior cell {i} on page {page_no}: {err:#}");
                        continue;
                    }
                };
                let key0 = match index_key0(&cell.record) {
                    Ok(key0) => key0,
                    Err(err) => {
                        warn!("skipping index interior cell {i} on page {page_no}: {err:#}");
                        continue;
                    }
                };
                // Either strictly less than, or equal (equal keys may
                // straddle a page boundary, so the leftmost candidate
                // subtree is always explored in that case too).
                if where_value < key0.as_slice() || where_value == key0.as_slice() {
                    next_child = Some(cell.left_child_page);
                    break;
                }
            }
            match next_child.or(page.right_most_child) {
                Some(child) => descend_index(pager, child, where_value, out),
                None => warn!("index interior page {page_no} has no right-most child, skipping subtree"),
            }
        }
        other => warn!("skipping index page {page_no}: expected index b-tree page, found {other:?}"),
    }
}

fn index_key0(record: &crate::record::Record) -> Result<Vec<u8>> {
    record
        .column(0)?
        .context("index record has no columns")
        .map(|v| v.comparison_bytes())
}

fn trailing_rowid(record: &crate::record::Record) -> Result<i64> {
    let last = record.column_count().checked_sub(1).context("index record is empty")?;
    record
        .column(last)?
        .context("index record missing trailing rowid column")?
        .as_int()
        .context("index record's trailing column is not an integer rowid")
}

/// Descends the table B-tree rooted at `root_page` to the leaf cell whose
/// rowid equals `target_rowid`, or `None` if no such row exists (including
/// when a corrupt subtree along the way made it impossible to find one).
pub fn lookup_rowid(pager: &mut Pager, root_page: u32, target_rowid: i64) -> Result<Option<TableLeafCell>> {
    let page = match pager.read_page(root_page) {
        Ok(page) => page,
        Err(err) => {
            warn!("skipping page {root_page}: {err:#}");
            return Ok(None);
        }
    };

    match page.kind {
        PageKind::TableLeaf => {
            for i in 0..page.num_cells {
                let result = page
                    .cell_bytes(i)
                    .map(|b| b.to_vec())
                    .and_then(|bytes| TableLeafCell::parse(&bytes, pager));
                match result {
                    Ok(cell) if cell.rowid == target_rowid => return Ok(Some(cell)),
                    Ok(_) => {}
                    Err(err) => warn!("skipping cell {i} on page {root_page}: {err:#}"),
                }
            }
            Ok(None)
        }
        PageKind::TableInterior => {
            let mut next_child = None;
            for i in 0..page.num_cells {
                match page.cell_bytes(i).and_then(TableInteriorCell::parse) {
                    Ok(cell) if cell.key_rowid >= target_rowid => {
                        next_child = Some(cell.left_child_page);
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => warn!("skipping child pointer cell {i} on page {root_page}: {err:#}"),
                }
            }
            match next_child.or(page.right_most_child) {
                Some(child) => lookup_rowid(pager, child, target_rowid),
                None => {
                    warn!("table interior page {root_page} has no right-most child, skipping subtree");
                    Ok(None)
                }
            }
        }
        other => {
            warn!("skipping page {root_page}: expected table b-tree page, found {other:?}");
            Ok(None)
        }
    }
}
