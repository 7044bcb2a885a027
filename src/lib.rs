//! A read-only query engine over the SQLite 3 on-disk file format.
//!
//! Split into a library and a thin CLI binary (`main.rs`) so integration
//! tests can exercise the planner directly against synthetic fixtures.

pub mod byte_reader;
pub mod cell;
pub mod database;
pub mod ddl;
pub mod error;
pub mod index;
pub mod page;
pub mod planner;
pub mod record;
pub mod scan;
pub mod schema;
pub mod serial_type;
pub mod sql;
pub mod varint;

pub use database::Database;
pub use sql::{parse_select, Projection, SelectStmt};
