mod args;
mod logging;

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use sql_stream::params::parse_typed_literal;
use sql_stream::{Database, DatabaseOptions, Record};
use tracing::Level;

use crate::args::Args;
use crate::logging::LogWriter;

fn main() -> ExitCode {
    let args = Args::parse();

    let writer = match LogWriter::new(args.log.clone()) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("cannot open log file: {e}");
            return ExitCode::FAILURE;
        }
    };
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(level)
        .init();

    match run(&args, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_options(args: &Args) -> Result<DatabaseOptions, Box<dyn Error>> {
    let mut options = match &args.config {
        Some(path) => DatabaseOptions::from_json(&fs::read_to_string(path)?)?,
        None => DatabaseOptions::new(&args.db),
    };
    if let Some(mode) = args.error_mode {
        options.error_mode = mode;
    }
    Ok(options)
}

/// One output line: the row's values rendered and joined with tabs.
fn format_row(record: &Record) -> String {
    record
        .values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\t")
}

fn run(args: &Args, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let options = load_options(args)?;
    let db = Database::try_with_options(&options)?;
    if let Some(setup) = &args.setup {
        db.execute_batch(setup)?;
    }

    let mut binder = db.prepare(args.sql.as_str())?;
    for raw in &args.params {
        binder.bind(parse_typed_literal(raw)?)?;
    }

    if args.header {
        writeln!(out, "{}", binder.column_names().join("\t"))?;
    }

    let mut write_error = None;
    binder.for_each_record(|record| {
        if write_error.is_none()
            && let Err(e) = writeln!(out, "{}", format_row(&record))
        {
            write_error = Some(e);
        }
    })?;
    if let Some(e) = write_error {
        return Err(e.into());
    }
    drop(binder);

    tracing::info!(
        changes = db.changes(),
        last_insert_rowid = db.last_insert_rowid(),
        "statement complete"
    );

    let suppressed = db.suppressed_error_count();
    if suppressed > 0 {
        let last = db.take_suppressed_error().unwrap_or_default();
        return Err(format!("{suppressed} error(s) recorded, last: {last}").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run_cli(argv: &[&str]) -> Result<String, Box<dyn Error>> {
        let args = Args::try_parse_from(std::iter::once("sqlstream").chain(argv.iter().copied()))?;
        let mut out = Vec::new();
        run(&args, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn typed_params_print_tab_separated() -> Result<(), Box<dyn Error>> {
        let out = run_cli(&[
            "-p", "i:5", "-p", "t:x", "-p", "x:00ff", "-p", "null", "-p", "f:1", "-p", "b:true",
            "select ?, ?, ?, ?, ?, ?",
        ])?;
        assert_eq!(out, "5\tx\tx'00ff'\tNULL\t1.0\t1\n");
        Ok(())
    }

    #[test]
    fn rows_persist_between_runs_and_print_with_header() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let db = dir.path().join("cli.db");
        let db = db.to_str().ok_or("non-utf8 temp path")?;

        run_cli(&[
            "--db",
            db,
            "--setup",
            "create table t(id integer primary key, name text, score real)",
            "-p",
            "t:ann",
            "-p",
            "f:2.5",
            "insert into t(name, score) values (?, ?)",
        ])?;
        run_cli(&["--db", db, "-p", "bob", "-p", "i:3", "insert into t(name, score) values (?, ?)"])?;

        let out = run_cli(&["--db", db, "--header", "select id, name, score from t order by id"])?;
        assert_eq!(out, "id\tname\tscore\n1\tann\t2.5\n2\tbob\t3.0\n");
        Ok(())
    }

    #[test]
    fn recorded_errors_fail_the_run() {
        let err = run_cli(&["--error-mode", "record", "selec nonsense"]).unwrap_err();
        assert!(err.to_string().contains("recorded"), "unexpected: {err}");
    }

    #[test]
    fn bad_inputs_are_errors() {
        assert!(run_cli(&["-p", "i:five", "select ?"]).is_err());
        assert!(run_cli(&["-p", "i:1", "-p", "i:2", "select ?"]).is_err());
        assert!(run_cli(&["selec nonsense"]).is_err());
    }
}
