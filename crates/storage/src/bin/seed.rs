use std::fmt;

use chrono::{DateTime, Utc};
use storage::repository::{NewSessionRecord, NewUserRecord, Storage, StorageError};
use tutor_core::model::{CounterDelta, DEFAULT_SUBJECT, Language, POINTS_PER_SOLVE};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    users: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUsers { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUsers { raw } => write!(f, "invalid --users value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("TUTOR_DB_URL").unwrap_or_else(|_| "sqlite:tutor.sqlite3?mode=rwc".into());
        let mut users = std::env::var("TUTOR_SEED_USERS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--users" => {
                    let value = require_value(&mut args, "--users")?;
                    users = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidUsers { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, users, now })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:tutor.sqlite3?mode=rwc)");
    eprintln!("  --users <n>               Number of demo students to insert (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TUTOR_DB_URL, TUTOR_SEED_USERS");
}

const LANGUAGES: [Language; 3] = [Language::En, Language::Fr, Language::He];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut inserted = 0_u32;
    for i in 0..args.users {
        let language = LANGUAGES[(i as usize) % LANGUAGES.len()];
        let record = NewUserRecord {
            username: format!("student{}", i + 1),
            email: format!("student{}@example.com", i + 1),
            preferred_language: language,
            created_at: now,
        };
        let user = match storage.users.insert_user(record).await {
            Ok(user) => user,
            // Re-running the seed keeps existing demo users.
            Err(StorageError::Conflict) => continue,
            Err(err) => return Err(err.into()),
        };

        // One open session per student with a little history.
        let solved = i % 3;
        let initial = CounterDelta {
            attempted: solved + 1,
            solved,
            hints: 1,
            score: solved * POINTS_PER_SOLVE,
        };
        storage
            .sessions
            .create_session(NewSessionRecord {
                user_id: user.id(),
                subject: DEFAULT_SUBJECT.to_string(),
                started_at: now,
                initial,
            })
            .await?;
        inserted += 1;
    }

    println!(
        "Seeded {inserted} students (of {} requested) into {}",
        args.users, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
