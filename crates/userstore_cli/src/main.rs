//! Command-line probe for the user store.
//!
//! # Responsibility
//! - Run one DAO operation per invocation against a database file.
//! - Print exactly one JSON value on stdout; errors go to stderr.
//!
//! Usage: `userstore_cli [--db PATH] <insert ID NAME true|false | get ID | active ID | clear | count | version>`

use log::info;
use serde_json::{json, Value};
use std::process::ExitCode;
use userstore_core::db::{open_db, open_db_in_memory};
use userstore_core::{core_version, default_log_level, init_logging, SqliteUserDao, User, UserDao};

const LOG_LEVEL_ENV: &str = "USERSTORE_LOG_LEVEL";
const LOG_DIR_ENV: &str = "USERSTORE_LOG_DIR";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Insert(User),
    Get(String),
    Active(String),
    Clear,
    Count,
    Version,
}

#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    db_path: Option<String>,
    command: Command,
}

fn main() -> ExitCode {
    if let Err(err) = setup_logging() {
        eprintln!("logging disabled: {err}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    match run(invocation) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging() -> Result<(), String> {
    let Ok(log_dir) = std::env::var(LOG_DIR_ENV) else {
        return Ok(());
    };
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
    init_logging(&level, &log_dir)
}

fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut rest = args;
    let mut db_path = None;
    if let [flag, path, tail @ ..] = rest {
        if flag == "--db" {
            db_path = Some(path.clone());
            rest = tail;
        }
    }

    let command = match rest {
        [cmd, id, name, active] if cmd == "insert" => {
            let is_active = active
                .parse::<bool>()
                .map_err(|_| format!("expected true|false, got `{active}`"))?;
            Command::Insert(User::with_id(id.as_str(), name.as_str(), is_active))
        }
        [cmd, id] if cmd == "get" => Command::Get(id.clone()),
        [cmd, id] if cmd == "active" => Command::Active(id.clone()),
        [cmd] if cmd == "clear" => Command::Clear,
        [cmd] if cmd == "count" => Command::Count,
        [cmd] if cmd == "version" => Command::Version,
        _ => return Err(usage()),
    };

    Ok(Invocation { db_path, command })
}

fn usage() -> String {
    "usage: userstore_cli [--db PATH] <insert ID NAME true|false | get ID | active ID | clear | count | version>"
        .to_string()
}

fn run(invocation: Invocation) -> Result<Value, Box<dyn std::error::Error>> {
    if invocation.command == Command::Version {
        return Ok(json!(core_version()));
    }

    let conn = match invocation.db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let dao = SqliteUserDao::try_new(&conn)?;

    let output = match invocation.command {
        Command::Insert(user) => {
            dao.insert_user(&user)?;
            serde_json::to_value(&user)?
        }
        Command::Get(id) => serde_json::to_value(dao.get_user_by_id(&id)?)?,
        Command::Active(id) => json!(dao.is_user_active(&id)?),
        Command::Clear => {
            dao.delete_all_users()?;
            Value::Null
        }
        Command::Count => json!(dao.count_users()?),
        Command::Version => json!(core_version()),
    };
    info!("event=cli_command module=cli status=ok");
    Ok(output)
}
