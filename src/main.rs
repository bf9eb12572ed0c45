use std::io::Write;

use rustyline::{DefaultEditor, error::ReadlineError};
use slotdb::{
    Config, StorageManager,
    executor::create_table::TableSchemaBuilder,
    storage::schema::TableSchema,
    types::{error::DatabaseError, record::Row},
};
use tracing_subscriber::{EnvFilter, fmt};

const HISTORY_FILE: &str = ".slotdb_history";

fn read_multiline_command(rl: &mut DefaultEditor) -> rustyline::Result<String> {
    let mut input = String::new();
    let mut prompt = "slotdb> ".to_string();

    loop {
        let line = rl.readline(&prompt)?;
        let trimmed_line = line.trim_end();

        // Check if line ends with backslash (multiline continuation)
        if let Some(continued) = trimmed_line.strip_suffix('\\') {
            input.push_str(continued);
            input.push(' ');
            prompt = "     -> ".to_string();
        } else {
            input.push_str(trimmed_line);
            break;
        }
    }

    Ok(input)
}

fn print_help() {
    println!(
        r#"
Available commands:
  create <table> <col>:<width>[:pk] ...   - Create a table (at least one pk column)
  insert <table> <v1>,<v2>,...            - Insert one tuple
  delete <table> <pk1>,<pk2>,...          - Delete the tuple with this primary key
  get <table> <pk1>,<pk2>,...             - Look up one tuple by primary key
  scan <table>                            - Print every tuple
  join <t1>.<col1> <t2>.<col2>            - Hash equi-join of two tables
  freelist <table>                        - Show the free list of a table
  tables                                  - List tables
  drop <table>                            - Remove a table
  help, h                                 - Show this help message
  clear                                   - Clear the screen
  exit, quit, q                           - Exit

Use '\' at the end of a line for multiline input.
"#
    );
}

fn split_values(input: &str) -> Vec<String> {
    input.split(',').map(|v| v.trim().to_string()).collect()
}

fn print_rows(header: &[String], rows: &[Row]) {
    println!("{}", header.join("  |  "));
    for row in rows {
        println!("{}", row.texts().join("  |  "));
    }
    println!("({} rows)", rows.len());
}

fn parse_create(table_name: &str, definitions: &[&str]) -> Result<TableSchema, DatabaseError> {
    let mut builder = TableSchemaBuilder::new(table_name);
    for definition in definitions {
        let parts: Vec<&str> = definition.split(':').collect();
        let (name, width, pk) = match parts.as_slice() {
            [name, width] => (*name, *width, false),
            [name, width, flag] if flag.eq_ignore_ascii_case("pk") => (*name, *width, true),
            _ => {
                return Err(DatabaseError::InvalidSchema {
                    reason: format!("bad column definition '{}'", definition),
                });
            }
        };
        let width = width.parse::<usize>().map_err(|_| DatabaseError::InvalidSchema {
            reason: format!("bad width in '{}'", definition),
        })?;
        builder = if pk {
            builder.add_primary_key_column(name, width)
        } else {
            builder.add_column(name, width)
        };
    }
    builder.build()
}

fn parse_join_side(side: &str) -> Result<(&str, &str), DatabaseError> {
    side.split_once('.').ok_or_else(|| DatabaseError::InvalidData {
        details: format!("expected <table>.<column>, got '{}'", side),
    })
}

fn execute(storage: &mut StorageManager, command: &str) -> Result<(), DatabaseError> {
    let (verb, rest) = command.split_once(' ').unwrap_or((command, ""));
    let rest = rest.trim();
    let (table, args) = rest.split_once(' ').unwrap_or((rest, ""));
    let args = args.trim();

    match verb.to_lowercase().as_str() {
        "create" => {
            let definitions: Vec<&str> = args.split_whitespace().collect();
            storage.create_table(parse_create(table, &definitions)?)?;
            println!("Table '{}' created", table);
        }
        "insert" => {
            let slot = storage.insert_tuple(table, Row::new(
                split_values(args).into_iter().map(String::into_bytes).collect(),
            ))?;
            println!("Inserted into slot {}", slot);
        }
        "delete" => {
            let slot = storage.delete_tuple(table, &split_values(args))?;
            println!("Deleted slot {}", slot);
        }
        "get" => {
            let schema = storage.get_table_schema(table)?;
            match storage.get_by_pk(table, &split_values(args))? {
                Some(row) => print_rows(&schema.column_names(), &[row]),
                None => println!("No matching tuple"),
            }
        }
        "scan" => {
            let schema = storage.get_table_schema(table)?;
            let rows = storage.scan_table(table)?;
            print_rows(&schema.column_names(), &rows);
        }
        "join" => {
            let left = parse_join_side(table)?;
            let right = parse_join_side(args)?;
            let result = storage.hash_equi_join(left, right)?;
            let rows: Vec<Row> = result
                .decode_rows()?
                .into_iter()
                .map(|(mut l, r)| {
                    l.values.extend(r.values);
                    l
                })
                .collect();
            print_rows(&result.column_names(), &rows);
        }
        "freelist" => {
            let free_list = storage.free_list(table)?;
            let nodes: Vec<String> = free_list.nodes.iter().map(|s| s.to_string()).collect();
            println!("free: [{}] then linear from {}", nodes.join(", "), free_list.append_cursor);
        }
        "tables" => {
            let names = storage.get_table_names();
            if names.is_empty() {
                println!("No tables");
            }
            for name in names {
                println!(" -> {}", name);
            }
        }
        "drop" => {
            storage.drop_table(table)?;
            println!("Table '{}' dropped", table);
        }
        other => println!("Unknown command '{}', type 'help'", other),
    }
    Ok(())
}

fn process_command(storage: &mut StorageManager, command: &str) -> bool {
    let cmd = command.trim();

    match cmd.to_lowercase().as_str() {
        "exit" | "quit" | "q" => {
            println!("Goodbye!");
            return false;
        }
        "help" | "h" => print_help(),
        "clear" => {
            print!("\x1B[2J\x1B[1;1H");
            let _ = std::io::stdout().flush();
        }
        "" => {}
        _ => {
            if let Err(e) = execute(storage, cmd) {
                println!("Error: {}", e);
            }
        }
    }

    true
}

fn main() -> rustyline::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,slotdb=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = match std::env::args().nth(1) {
        Some(root) => Config::rooted_at(root),
        None => Config::default(),
    };
    tracing::info!("slotdb v{}", slotdb::VERSION);

    let mut storage = match StorageManager::open(config) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            std::process::exit(1);
        }
    };

    let mut rl = DefaultEditor::new()?;
    let _ = rl.load_history(HISTORY_FILE);

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim().to_string();
                if !command.is_empty() {
                    rl.add_history_entry(&command)?;
                }
                if !process_command(&mut storage, &command) {
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
    Ok(())
}
