use std::{
    fs::File,
    io::{BufReader, Write},
    process::ExitCode,
};

use jet3::{
    Database, DatabaseError,
    executor::scan::{ScanIterator, Scanner},
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing_subscriber::EnvFilter;

const HISTORY_FILE: &str = ".jet3_history";
const DEFAULT_SCAN_LIMIT: usize = 20;

type Db = Database<BufReader<File>>;

fn print_help() {
    println!(
        r#"
Available commands:
  tables                 - List user tables
  systables              - List all tables, system tables included
  describe <table>       - Show the columns of a table
  scan <table> [limit]   - Print rows of a table (default limit {})
  pages <table>          - Show the data pages owned by a table
  help, h                - Show this help message
  clear                  - Clear the screen
  exit, quit, q          - Exit
"#,
        DEFAULT_SCAN_LIMIT
    );
}

fn list_tables(db: &Db, include_system: bool) -> Result<(), DatabaseError> {
    for table in db.tables()? {
        if table.is_system && !include_system {
            continue;
        }
        let marker = if table.is_system { " [system]" } else { "" };
        println!("{}{}", table, marker);
    }
    Ok(())
}

fn describe(db: &Db, name: &str) -> Result<(), DatabaseError> {
    let def = db.table_definition(name)?;
    println!("{} ({} rows)", def.name, def.num_rows);
    for column in &def.columns {
        let mut notes = Vec::new();
        if column.is_fixed {
            notes.push(format!("fixed@{}", column.fixed_offset));
        } else {
            notes.push(format!("var#{}", column.var_index));
        }
        if column.is_auto_long {
            notes.push("autoincrement".to_string());
        }
        if column.is_auto_uuid {
            notes.push("autouuid".to_string());
        }
        println!(
            "  {:>3}  {:<24} {:<10} {}",
            column.num,
            column.name,
            column.data_type.to_string(),
            notes.join(", ")
        );
    }
    Ok(())
}

fn scan(db: &Db, name: &str, limit: usize) -> Result<(), DatabaseError> {
    let scanner = db.rows(name)?;
    let header: Vec<String> = scanner
        .definition()
        .columns
        .iter()
        .map(|c| c.name.clone())
        .collect();
    println!("{}", header.join(" | "));

    let mut shown = 0;
    for row in ScanIterator::new(scanner).take(limit) {
        let row = row?;
        let fields: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
        println!("{}", fields.join(" | "));
        shown += 1;
    }
    println!("({} rows)", shown);
    Ok(())
}

fn pages(db: &Db, name: &str) -> Result<(), DatabaseError> {
    let pages = db.table_pages(name)?;
    let listed: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
    println!("{} pages: {}", pages.len(), listed.join(", "));
    Ok(())
}

fn process_command(db: &Db, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    let Some(verb) = parts.next() else {
        return true;
    };
    let argument = parts.next();

    let result = match (verb.to_lowercase().as_str(), argument) {
        ("exit" | "quit" | "q", _) => {
            println!("Goodbye!");
            return false;
        }
        ("help" | "h", _) => {
            print_help();
            Ok(())
        }
        ("clear", _) => {
            print!("\x1B[2J\x1B[1;1H");
            let _ = std::io::stdout().flush();
            Ok(())
        }
        ("tables", _) => list_tables(db, false),
        ("systables", _) => list_tables(db, true),
        ("describe", Some(table)) => describe(db, table),
        ("pages", Some(table)) => pages(db, table),
        ("scan", Some(table)) => {
            let limit = parts
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap_or(DEFAULT_SCAN_LIMIT);
            scan(db, table, limit)
        }
        (other, None) if matches!(other, "describe" | "pages" | "scan") => {
            println!("Usage: {} <table>", other);
            Ok(())
        }
        _ => {
            println!("Unknown command: {} (try 'help')", command.trim());
            Ok(())
        }
    };

    if let Err(err) = result {
        println!("Error: {}", err);
    }
    true
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: jet3 <database.mdb>");
        return ExitCode::FAILURE;
    };

    let db = match Database::open(&path) {
        Ok(db) => db,
        Err(err) => {
            eprintln!("Failed to open {}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "Opened {} ({} catalog entries). Type 'help' for commands.",
        path,
        db.catalog().len()
    );

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Failed to start line editor: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let _ = rl.load_history(HISTORY_FILE);

    loop {
        match rl.readline("jet3> ") {
            Ok(line) => {
                let command = line.trim().to_string();
                if command.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&command);
                if !process_command(&db, &command) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    ExitCode::SUCCESS
}
