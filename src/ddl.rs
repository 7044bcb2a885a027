//! DDL mini-parser (C8): extracts just enough from `CREATE TABLE` and
//! `CREATE INDEX` statements to resolve column names to record positions
//! and detect rowid-alias columns. This is not a general SQL parser — it
//! assumes the `sql` text came from `sqlite_schema` and was therefore
//! already accepted by a real SQLite `CREATE` grammar.

use anyhow::{bail, Result};
use regex::Regex;

#[derive(Debug, Clone)]
pub struct TableDef {
    pub columns: Vec<String>,
    /// Index into `columns` of the `INTEGER PRIMARY KEY` rowid alias, if any.
    pub rowid_alias_index: Option<usize>,
}

impl TableDef {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone)]
pub struct IndexDef {
    pub table: String,
    pub columns: Vec<String>,
}

impl IndexDef {
    pub fn first_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }
}

pub fn parse_create_table(sql: &str) -> Result<TableDef> {
    let colspecs = column_list(sql)?;

    let mut columns = Vec::with_capacity(colspecs.len());
    let mut rowid_alias_index = None;

    for (i, spec) in colspecs.iter().enumerate() {
        let name = first_token(spec);
        if name.is_empty() {
            continue;
        }

        if rowid_alias_index.is_none() && is_rowid_alias(spec) {
            rowid_alias_index = Some(i);
        }

        columns.push(name);
    }

    Ok(TableDef {
        columns,
        rowid_alias_index,
    })
}

pub fn parse_create_index(sql: &str) -> Result<IndexDef> {
    let upper = sql.to_uppercase();
    let on_pos = upper.find(" ON ").ok_or_else(|| {
        anyhow::anyhow!("CREATE INDEX statement missing ON clause: {sql:?}")
    })?;

    let after_on = &sql[on_pos + 4..];
    let paren_start = after_on
        .find('(')
        .ok_or_else(|| anyhow::anyhow!("CREATE INDEX statement missing column list: {sql:?}"))?;
    let table = after_on[..paren_start].trim().trim_matches(|c| c == '"' || c == '`').to_string();

    let colspecs = column_list(after_on)?;
    let columns = colspecs
        .iter()
        .map(|c| first_token(c))
        .filter(|c| !c.is_empty())
        .collect();

    Ok(IndexDef { table, columns })
}

/// Finds the outermost `( ... )` group in `sql` and splits its contents at
/// top-level commas (tracking parenthesis depth, so a `CHECK(a > b)` or a
/// nested type doesn't get split in the middle).
fn column_list(sql: &str) -> Result<Vec<String>> {
    let bytes = sql.as_bytes();
    let open = bytes
        .iter()
        .position(|&b| b == b'(')
        .ok_or_else(|| anyhow::anyhow!("no column list found in: {sql:?}"))?;

    let mut depth = 0i32;
    let mut close = None;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close.ok_or_else(|| anyhow::anyhow!("unbalanced parentheses in: {sql:?}"))?;

    let inner = &sql[open + 1..close];

    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        parts.push(last.to_string());
    }

    if parts.is_empty() {
        bail!("empty column list in: {sql:?}");
    }

    Ok(parts)
}

fn first_token(colspec: &str) -> String {
    colspec
        .trim()
        .trim_matches(|c| c == '"' || c == '`' || c == '[' || c == ']')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c| c == '"' || c == '`')
        .to_uppercase()
}

/// A column is a rowid alias iff its uppercased definition contains
/// `PRIMARY KEY` and either `INTEGER` or the standalone token `INT`.
fn is_rowid_alias(colspec: &str) -> bool {
    let upper = colspec.to_uppercase();
    let has_primary_key = Regex::new(r"PRIMARY\s+KEY").unwrap().is_match(&upper);
    let has_integer_kind = upper.contains("INTEGER") || Regex::new(r"\bINT\b").unwrap().is_match(&upper);
    has_primary_key && has_integer_kind
}
