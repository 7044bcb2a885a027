//! End-to-end tests against synthetic, in-memory-built `.db` files.
//!
//! There is no `sqlite3` binary in this crate's dependency set to shell out
//! to, so each fixture below is assembled by hand at the byte level: a
//! 100-byte file header followed by one or more 4096-byte pages, built with
//! the small helpers in this file rather than pulled from a pre-baked
//! binary fixture.

use pretty_assertions::assert_eq;
use sqlite_query_engine::database::Database;
use sqlite_query_engine::{index, planner, sql};
use std::sync::atomic::{AtomicU32, Ordering};

const PAGE_SIZE: usize = 4096;

// ---- byte-level fixture builders -----------------------------------------

/// Encodes `v` as a single-byte SQLite varint. Every value used by the
/// fixtures below (row counts, short string lengths, small rowids) fits in
/// one byte, so the 2-9 byte continuation forms are exercised by
/// `src/varint.rs`'s own unit tests rather than here.
fn varint(v: u64) -> Vec<u8> {
    assert!(v < 128, "fixture value {v} needs a multi-byte varint");
    vec![v as u8]
}

fn text_col(s: &str) -> (u64, Vec<u8>) {
    (13 + 2 * s.len() as u64, s.as_bytes().to_vec())
}

fn int_col(v: i64) -> (u64, Vec<u8>) {
    (1, vec![v as u8])
}

fn null_col() -> (u64, Vec<u8>) {
    (0, Vec::new())
}

/// Builds a record: a header of serial-type varints (preceded by the
/// header's own total length) followed by the column bodies.
fn record(cols: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let mut header_body = Vec::new();
    for (st, _) in cols {
        header_body.extend(varint(*st));
    }
    let header_size = 1 + header_body.len();
    let mut out = varint(header_size as u64);
    out.extend(header_body);
    for (_, body) in cols {
        out.extend(body);
    }
    out
}

fn table_leaf_cell(rowid: i64, record_bytes: &[u8]) -> Vec<u8> {
    let mut out = varint(record_bytes.len() as u64);
    out.extend(varint(rowid as u64));
    out.extend_from_slice(record_bytes);
    out
}

fn index_leaf_cell(record_bytes: &[u8]) -> Vec<u8> {
    let mut out = varint(record_bytes.len() as u64);
    out.extend_from_slice(record_bytes);
    out
}

fn index_interior_cell(left_child: u32, record_bytes: &[u8]) -> Vec<u8> {
    let mut out = left_child.to_be_bytes().to_vec();
    out.extend(varint(record_bytes.len() as u64));
    out.extend_from_slice(record_bytes);
    out
}

struct PageBuilder {
    is_first: bool,
    kind: u8,
    right_most_child: Option<u32>,
    /// Already-encoded cells, in the order the cell pointer array should
    /// list them (i.e. key order, not physical layout order).
    cells: Vec<Vec<u8>>,
}

impl PageBuilder {
    fn build(&self) -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        let header_offset = if self.is_first { 100 } else { 0 };
        let is_interior = self.kind == 0x05 || self.kind == 0x02;
        let header_size = if is_interior { 12 } else { 8 };

        page[header_offset] = self.kind;

        let num_cells = self.cells.len() as u16;
        page[header_offset + 3..header_offset + 5].copy_from_slice(&num_cells.to_be_bytes());

        let mut cursor = PAGE_SIZE;
        let mut offsets = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            cursor -= cell.len();
            page[cursor..cursor + cell.len()].copy_from_slice(cell);
            offsets.push(cursor as u16);
        }
        page[header_offset + 5..header_offset + 7].copy_from_slice(&(cursor as u16).to_be_bytes());

        if let Some(rm) = self.right_most_child {
            page[header_offset + 8..header_offset + 12].copy_from_slice(&rm.to_be_bytes());
        }

        let ptr_start = header_offset + header_size;
        for (i, off) in offsets.iter().enumerate() {
            let p = ptr_start + i * 2;
            page[p..p + 2].copy_from_slice(&off.to_be_bytes());
        }

        page
    }
}

fn file_header(page_size: u16) -> [u8; 100] {
    let mut h = [0u8; 100];
    h[0..16].copy_from_slice(b"SQLite format 3\0");
    h[16..18].copy_from_slice(&page_size.to_be_bytes());
    h[18] = 1;
    h[19] = 1;
    h[21] = 64;
    h[22] = 32;
    h[23] = 32;
    h
}

static FIXTURE_COUNTER: AtomicU32 = AtomicU32::new(0);

fn write_db(pages: Vec<Vec<u8>>) -> std::path::PathBuf {
    let id = FIXTURE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "sqlite_query_engine_test_{}_{id}.db",
        std::process::id()
    ));

    let mut first = pages[0].clone();
    first[0..100].copy_from_slice(&file_header(PAGE_SIZE as u16));

    let mut buf = Vec::with_capacity(PAGE_SIZE * pages.len());
    buf.extend(first);
    for p in &pages[1..] {
        buf.extend_from_slice(p);
    }

    std::fs::write(&path, buf).expect("writing synthetic fixture");
    path
}

fn schema_row(obj_type: &str, name: &str, tbl_name: &str, root_page: i64, sql: &str) -> Vec<u8> {
    record(&[
        text_col(obj_type),
        text_col(name),
        text_col(tbl_name),
        int_col(root_page),
        text_col(sql),
    ])
}

// ---- S1-S3: plain table, no rowid alias, no WHERE ------------------------

fn build_simple_table_db() -> std::path::PathBuf {
    let schema_cell = table_leaf_cell(
        1,
        &schema_row("table", "t", "t", 2, "CREATE TABLE t(a,b)"),
    );
    let page1 = PageBuilder {
        is_first: true,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![schema_cell],
    }
    .build();

    let row1 = table_leaf_cell(1, &record(&[int_col(1), int_col(2)]));
    let row2 = table_leaf_cell(2, &record(&[int_col(3), int_col(4)]));
    let page2 = PageBuilder {
        is_first: false,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![row1, row2],
    }
    .build();

    write_db(vec![page1, page2])
}

#[test]
fn s1_dbinfo_reports_page_size_and_table_count() {
    let path = build_simple_table_db();
    let mut db = Database::open(path.to_str().unwrap()).unwrap();
    assert_eq!(db.header.page_size, PAGE_SIZE);
    assert_eq!(db.schema_root_cell_count().unwrap(), 1);
}

#[test]
fn s2_tables_lists_user_table_names() {
    let path = build_simple_table_db();
    let db = Database::open(path.to_str().unwrap()).unwrap();
    assert_eq!(db.table_names(), vec!["t".to_string()]);
}

#[test]
fn s3_count_star_uses_fast_path_over_whole_tree() {
    let path = build_simple_table_db();
    let mut db = Database::open(path.to_str().unwrap()).unwrap();
    let stmt = sql::parse_select("SELECT count(*) FROM t").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &stmt).unwrap();
    assert_eq!(rows, vec!["2".to_string()]);
}

#[test]
fn unknown_projection_column_short_circuits_to_one_empty_line() {
    let path = build_simple_table_db();
    let mut db = Database::open(path.to_str().unwrap()).unwrap();

    let stmt = sql::parse_select("SELECT badcol FROM t").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &stmt).unwrap();
    assert_eq!(rows, vec![String::new()]);

    // A mix of a known and an unknown column still yields exactly one
    // empty line, not one blank-field line per matched row.
    let stmt = sql::parse_select("SELECT badcol, a FROM t").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &stmt).unwrap();
    assert_eq!(rows, vec![String::new()]);
}

#[test]
fn empty_table_scan_produces_no_rows_and_count_zero() {
    let schema_cell = table_leaf_cell(
        1,
        &schema_row("table", "empty", "empty", 2, "CREATE TABLE empty(a)"),
    );
    let page1 = PageBuilder {
        is_first: true,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![schema_cell],
    }
    .build();
    let page2 = PageBuilder {
        is_first: false,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![],
    }
    .build();
    let path = write_db(vec![page1, page2]);

    let mut db = Database::open(path.to_str().unwrap()).unwrap();

    let count_stmt = sql::parse_select("SELECT count(*) FROM empty").unwrap();
    let count = planner::execute_select(&mut db.pager, &db.catalog, &count_stmt).unwrap();
    assert_eq!(count, vec!["0".to_string()]);

    let scan_stmt = sql::parse_select("SELECT a FROM empty").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &scan_stmt).unwrap();
    assert!(rows.is_empty());
}

// ---- S4-S5: rowid-alias substitution and WHERE filtering -----------------

fn build_rowid_alias_table_db() -> std::path::PathBuf {
    let schema_cell = table_leaf_cell(
        1,
        &schema_row(
            "table",
            "c",
            "c",
            2,
            "CREATE TABLE c(id INTEGER PRIMARY KEY,name TEXT,age INT)",
        ),
    );
    let page1 = PageBuilder {
        is_first: true,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![schema_cell],
    }
    .build();

    // id is a rowid alias: stored as NULL, its value is the cell's rowid.
    let row1 = table_leaf_cell(
        1,
        &record(&[null_col(), text_col("alice"), int_col(30)]),
    );
    let row2 = table_leaf_cell(
        2,
        &record(&[null_col(), text_col("bob"), int_col(40)]),
    );
    let page2 = PageBuilder {
        is_first: false,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![row1, row2],
    }
    .build();

    write_db(vec![page1, page2])
}

#[test]
fn s4_projection_substitutes_rowid_for_rowid_alias_column() {
    let path = build_rowid_alias_table_db();
    let mut db = Database::open(path.to_str().unwrap()).unwrap();
    let stmt = sql::parse_select("SELECT name, id FROM c").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &stmt).unwrap();
    assert_eq!(rows, vec!["alice|1".to_string(), "bob|2".to_string()]);
}

#[test]
fn s5_where_on_rowid_alias_column_filters_by_value() {
    let path = build_rowid_alias_table_db();
    let mut db = Database::open(path.to_str().unwrap()).unwrap();
    let stmt = sql::parse_select("SELECT name FROM c WHERE id = 2").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &stmt).unwrap();
    assert_eq!(rows, vec!["bob".to_string()]);
}

#[test]
fn where_on_unknown_column_yields_zero_rows() {
    let path = build_rowid_alias_table_db();
    let mut db = Database::open(path.to_str().unwrap()).unwrap();
    let stmt = sql::parse_select("SELECT name FROM c WHERE nope = 2").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &stmt).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn missing_table_yields_zero_for_count_and_empty_for_columns() {
    let path = build_rowid_alias_table_db();
    let mut db = Database::open(path.to_str().unwrap()).unwrap();

    let count_stmt = sql::parse_select("SELECT count(*) FROM ghost").unwrap();
    let count = planner::execute_select(&mut db.pager, &db.catalog, &count_stmt).unwrap();
    assert_eq!(count, vec!["0".to_string()]);

    let col_stmt = sql::parse_select("SELECT name FROM ghost").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &col_stmt).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn malformed_sql_fails_to_parse() {
    assert!(sql::parse_select("SELECT a FROM t WHERE a = 1 OR b = 2").is_err());
}

// ---- S6: indexed equality lookup, sorted + deduplicated rowids -----------

#[test]
fn s6_indexed_where_returns_sorted_deduped_rowids() {
    let schema_p = schema_row("table", "p", "p", 3, "CREATE TABLE p(id INTEGER PRIMARY KEY,country TEXT)");
    let schema_pc = schema_row("index", "pc", "p", 4, "CREATE INDEX pc ON p(country)");
    let page1 = PageBuilder {
        is_first: true,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![
            table_leaf_cell(1, &schema_p),
            table_leaf_cell(2, &schema_pc),
        ],
    }
    .build();

    let page2_unused = vec![0u8; PAGE_SIZE];

    let p_row1 = table_leaf_cell(1, &record(&[null_col(), text_col("US")]));
    let p_row2 = table_leaf_cell(2, &record(&[null_col(), text_col("FR")]));
    let p_row3 = table_leaf_cell(3, &record(&[null_col(), text_col("US")]));
    let page3 = PageBuilder {
        is_first: false,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![p_row1, p_row2, p_row3],
    }
    .build();

    // index key order: FR(2), US(1), US(3)
    let idx_fr = index_leaf_cell(&record(&[text_col("FR"), int_col(2)]));
    let idx_us1 = index_leaf_cell(&record(&[text_col("US"), int_col(1)]));
    let idx_us3 = index_leaf_cell(&record(&[text_col("US"), int_col(3)]));
    let page4 = PageBuilder {
        is_first: false,
        kind: 0x0A,
        right_most_child: None,
        cells: vec![idx_fr, idx_us1, idx_us3],
    }
    .build();

    let path = write_db(vec![page1, page2_unused, page3, page4]);
    let mut db = Database::open(path.to_str().unwrap()).unwrap();

    let stmt = sql::parse_select("SELECT id FROM p WHERE country = 'US'").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &stmt).unwrap();
    assert_eq!(rows, vec!["1".to_string(), "3".to_string()]);
}

// ---- multi-level index: traversal descends an 0x02 interior node --------

#[test]
fn multi_level_index_descends_interior_node() {
    // page1 is never read as a b-tree (only its 100-byte file header
    // matters); the index tree lives on pages 2-4.
    let page1 = vec![0u8; PAGE_SIZE];

    let leaf_a = index_leaf_cell(&record(&[text_col("A"), int_col(10)]));
    let leaf_b = index_leaf_cell(&record(&[text_col("B"), int_col(11)]));
    let page3_leaf1 = PageBuilder {
        is_first: false,
        kind: 0x0A,
        right_most_child: None,
        cells: vec![leaf_a, leaf_b],
    }
    .build();

    let leaf_m = index_leaf_cell(&record(&[text_col("M"), int_col(12)]));
    let leaf_z = index_leaf_cell(&record(&[text_col("Z"), int_col(13)]));
    let page4_leaf2 = PageBuilder {
        is_first: false,
        kind: 0x0A,
        right_most_child: None,
        cells: vec![leaf_m, leaf_z],
    }
    .build();

    // interior cell's separator key is "M" (leaf2's first key); values
    // less than or equal to it descend left into leaf1, anything greater
    // falls through to the right-most child, leaf2.
    let interior_cell = index_interior_cell(3, &record(&[text_col("M"), int_col(12)]));
    let page2_root = PageBuilder {
        is_first: false,
        kind: 0x02,
        right_most_child: Some(4),
        cells: vec![interior_cell],
    }
    .build();

    let path = write_db(vec![page1, page2_root, page3_leaf1, page4_leaf2]);
    let mut pager = sqlite_query_engine::page::Pager::open(path.to_str().unwrap()).unwrap();

    let left = index::probe_index(&mut pager, 2, b"A").unwrap();
    assert_eq!(left, vec![10]);

    let right = index::probe_index(&mut pager, 2, b"Z").unwrap();
    assert_eq!(right, vec![13]);
}

// ---- projection idempotence (Testable Property 7) ------------------------

#[test]
fn projection_idempotence_repeats_the_same_column() {
    let path = build_simple_table_db();
    let mut db = Database::open(path.to_str().unwrap()).unwrap();
    let stmt = sql::parse_select("SELECT a, a, a FROM t").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &stmt).unwrap();
    assert_eq!(rows, vec!["1|1|1".to_string(), "3|3|3".to_string()]);
}

// ---- corrupt subtree is swallowed, not fatal to the whole command ---------

#[test]
fn unreadable_child_page_drops_only_that_subtree() {
    // An interior root with one good child (a leaf with two rows) and a
    // right-most child pointing at a page number past the end of the file.
    // That subtree is unreadable; the rest of the tree must still scan.
    let schema_cell = table_leaf_cell(
        1,
        &schema_row("table", "t2", "t2", 2, "CREATE TABLE t2(a,b)"),
    );
    let page1 = PageBuilder {
        is_first: true,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![schema_cell],
    }
    .build();

    let row1 = table_leaf_cell(1, &record(&[int_col(1), int_col(2)]));
    let row2 = table_leaf_cell(2, &record(&[int_col(3), int_col(4)]));
    let page3_leaf = PageBuilder {
        is_first: false,
        kind: 0x0D,
        right_most_child: None,
        cells: vec![row1, row2],
    }
    .build();

    let interior_cell = {
        let mut out = 3u32.to_be_bytes().to_vec(); // left child: the good leaf
        out.extend(varint(2)); // key_rowid
        out
    };
    let page2_root = PageBuilder {
        is_first: false,
        kind: 0x05,
        right_most_child: Some(99), // past the end of the file
        cells: vec![interior_cell],
    }
    .build();

    let path = write_db(vec![page1, page2_root, page3_leaf]);
    let mut db = Database::open(path.to_str().unwrap()).unwrap();

    let scan_stmt = sql::parse_select("SELECT a FROM t2").unwrap();
    let rows = planner::execute_select(&mut db.pager, &db.catalog, &scan_stmt).unwrap();
    assert_eq!(rows, vec!["1".to_string(), "3".to_string()]);

    let count_stmt = sql::parse_select("SELECT count(*) FROM t2").unwrap();
    let count = planner::execute_select(&mut db.pager, &db.catalog, &count_stmt).unwrap();
    assert_eq!(count, vec!["2".to_string()]);
}
