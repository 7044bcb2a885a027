use anyhow::{bail, Result};
use env_logger::Env;
use sqlite_query_engine::database::Database;
use sqlite_query_engine::planner;
use sqlite_query_engine::sql;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = std::env::args().collect::<Vec<_>>();
    match args.len() {
        0 | 1 => bail!("Missing <database path> and <command>"),
        2 => bail!("Missing <command>"),
        _ => {}
    }

    let db_path = &args[1];
    let command = args[2..].join(" ");
    let command = command.trim();

    let mut db = Database::open(db_path)?;

    if command.eq_ignore_ascii_case(".dbinfo") {
        println!("database page size: {}", db.header.page_size);
        println!("number of tables: {}", db.schema_root_cell_count()?);
        return Ok(());
    }

    if command.eq_ignore_ascii_case(".tables") {
        println!("{}", db.table_names().join(" "));
        return Ok(());
    }

    if command.get(..6).is_some_and(|p| p.eq_ignore_ascii_case("SELECT")) {
        // malformed SQL and missing schema objects/columns are not hard
        // errors here (§7): they resolve to an empty line / zero rows.
        match sql::parse_select(command) {
            Ok(stmt) => {
                let rows = planner::execute_select(&mut db.pager, &db.catalog, &stmt)?;
                for row in rows {
                    println!("{row}");
                }
            }
            Err(_) => println!(),
        }
        return Ok(());
    }

    bail!("Unknown command: {command}")
}
