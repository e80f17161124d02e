use std::fmt;
use std::net::SocketAddr;

use app::router;
use app::telemetry::init_tracing;
use services::{AppServices, Clock, completion_from_env};
use storage::sqlite::SqliteRepository;

const DEFAULT_DB_URL: &str = "sqlite://tutor.sqlite3";
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5050;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPort { raw: String },
    InvalidDbUrl { raw: String },
    InvalidBind { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPort { raw } => write!(f, "invalid --port value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidBind { raw } => write!(f, "invalid --bind value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  tutor serve   [--db <sqlite_url>] [--bind <addr>] [--port <port>] [--dry-run]");
    eprintln!("  tutor migrate [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --bind {DEFAULT_BIND}");
    eprintln!("  --port {DEFAULT_PORT}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TUTOR_DB_URL, TUTOR_BIND, PORT, TUTOR_AI_DRY_RUN, TUTOR_LOG, TUTOR_LOG_JSON");
    eprintln!("  TUTOR_AI_API_KEY (or ANTHROPIC_API_KEY), TUTOR_AI_BASE_URL, TUTOR_AI_MODEL,");
    eprintln!("  TUTOR_AI_MAX_TOKENS, TUTOR_AI_TIMEOUT_SECS");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    Migrate,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "serve" => Some(Self::Serve),
            "migrate" => Some(Self::Migrate),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    addr: SocketAddr,
    dry_run: bool,
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TUTOR_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url(DEFAULT_DB_URL.into()), normalize_sqlite_url);
        let mut bind = std::env::var("TUTOR_BIND").unwrap_or_else(|_| DEFAULT_BIND.into());
        let mut port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let mut dry_run = env_flag("TUTOR_AI_DRY_RUN");

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bind" => bind = require_value(args, "--bind")?,
                "--port" => {
                    let value = require_value(args, "--port")?;
                    port = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPort { raw: value.clone() })?;
                }
                "--dry-run" => dry_run = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let addr = format!("{bind}:{port}")
            .parse()
            .map_err(|_| ArgsError::InvalidBind { raw: bind })?;

        Ok(Self {
            db_url,
            addr,
            dry_run,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("could not listen for ctrl-c; shutting down");
    }
    tracing::info!("shutdown requested");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    dotenv::dotenv().ok();
    init_tracing();

    let mut argv: Vec<String> = std::env::args().skip(1).collect();
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Serve,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Serve,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;

    match cmd {
        Command::Migrate => {
            let repo = SqliteRepository::connect(&parsed.db_url).await?;
            repo.migrate().await?;
            tracing::info!(db = %parsed.db_url, "database migrated");
            Ok(())
        }
        Command::Serve => {
            let completion = completion_from_env(parsed.dry_run).inspect_err(|_| {
                eprintln!("set TUTOR_AI_API_KEY or pass --dry-run");
            })?;
            let services =
                AppServices::new_sqlite(&parsed.db_url, completion, Clock::system()).await?;

            let listener = tokio::net::TcpListener::bind(parsed.addr).await?;
            tracing::info!(addr = %parsed.addr, db = %parsed.db_url, "tutor listening");
            axum::serve(listener, router(services))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
