use std::path::PathBuf;

use clap::Parser;
use sql_stream::ErrorMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run one SQL statement through sql-stream and print its rows"
)]
pub(crate) struct Args {
    /// Database path; `:memory:` opens a scratch database.
    #[arg(long, default_value = ":memory:")]
    pub(crate) db: PathBuf,
    /// JSON options file. Takes precedence over --db.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub(crate) error_mode: Option<ErrorMode>,
    /// Typed parameter, repeatable: i:42, f:1.5, t:text, b:true, x:00ff, j:{...}, null.
    #[arg(long = "param", short = 'p')]
    pub(crate) params: Vec<String>,
    /// Statements to run (`;`-separated) before the main one.
    #[arg(long)]
    pub(crate) setup: Option<String>,
    /// Print column names first.
    #[arg(long)]
    pub(crate) header: bool,
    /// Also append log output to this file.
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
    #[arg(long, short = 'v')]
    pub(crate) verbose: bool,
    pub(crate) sql: String,
}
