use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quiz_core::model::{Quiz, QuizDraft};
use services::{
    Clock, HttpLeaderboardRepository, LeaderboardHttpConfig, LeaderboardService, ProgressStore,
    QuizLoopService,
};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod runner;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSeed { raw: String },
    InvalidDbUrl { raw: String },
    MissingQuiz,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingQuiz => write!(f, "no quiz file given (use --quiz or QUIZ_FILE)"),
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
    eprintln!("  cargo run -p app -- take        --quiz <file.json> [--db <sqlite_url>] [--seed <n>]");
    eprintln!("  cargo run -p app -- leaderboard --quiz <file.json> [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- history     [--quiz <file.json>] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Shared flags:");
    eprintln!("  --leaderboard-url <base_url>   use a remote leaderboard instead of the local one");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!();
    eprintln!("Environment (a .env file is read if present):");
    eprintln!("  QUIZ_DB_URL, QUIZ_FILE, QUIZ_LEADERBOARD_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    Leaderboard,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "leaderboard" => Some(Self::Leaderboard),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    quiz_path: Option<PathBuf>,
    leaderboard_url: Option<String>,
    seed: Option<u64>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--quiz" => {
                    parsed.quiz_path = Some(PathBuf::from(require_value(args, "--quiz")?));
                }
                "--leaderboard-url" => {
                    let value = require_value(args, "--leaderboard-url")?;
                    parsed.leaderboard_url = Some(value).filter(|v| !v.trim().is_empty());
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let seed = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    parsed.seed = Some(seed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn from_env() -> Self {
        Self {
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url),
            quiz_path: std::env::var_os("QUIZ_FILE").map(PathBuf::from),
            leaderboard_url: None,
            seed: None,
        }
    }

    fn require_quiz(&self) -> Result<&Path, ArgsError> {
        self.quiz_path.as_deref().ok_or(ArgsError::MissingQuiz)
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
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
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

    let path = Path::new(path);
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

/// Read and validate a quiz in the site's JSON format.
fn load_quiz(path: &Path) -> Result<Quiz, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let draft: QuizDraft = serde_json::from_str(&raw)?;
    let quiz = draft.validate().map_err(quiz_core::Error::from)?;
    tracing::debug!(quiz_id = %quiz.id(), questions = quiz.len(), path = %path.display(), "loaded quiz");
    Ok(quiz)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Without a subcommand, take the quiz.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Take,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Take,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let mut parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if parsed.leaderboard_url.is_none() {
        parsed.leaderboard_url = LeaderboardHttpConfig::from_env().map(|config| config.base_url);
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let mut storage = Storage::sqlite(&parsed.db_url).await?;
    if let Some(base_url) = &parsed.leaderboard_url {
        let remote = HttpLeaderboardRepository::new(LeaderboardHttpConfig::new(base_url.as_str()))?;
        storage = storage.with_leaderboard(Arc::new(remote));
        tracing::info!(%base_url, "using remote leaderboard");
    }

    let clock = Clock::system();
    let progress = ProgressStore::new(Arc::clone(&storage.values));
    let leaderboard = LeaderboardService::new(clock, Arc::clone(&storage.leaderboard));

    match cmd {
        Command::Take => {
            let quiz = Arc::new(load_quiz(parsed.require_quiz()?)?);
            let mut loop_svc = QuizLoopService::new(clock, progress);
            if let Some(seed) = parsed.seed {
                loop_svc = loop_svc.with_seed(seed);
            }
            runner::take(&loop_svc, &leaderboard, quiz).await?;
        }
        Command::Leaderboard => {
            let quiz = load_quiz(parsed.require_quiz()?)?;
            let view = leaderboard.view(quiz.id()).await;
            runner::print_leaderboard(&quiz, &view);
        }
        Command::History => {
            let quiz_id = match parsed.quiz_path.as_deref() {
                Some(path) => Some(load_quiz(path)?.id().clone()),
                None => None,
            };
            let results = match &quiz_id {
                Some(id) => progress.history_for(id).await,
                None => progress.history().await,
            };
            runner::print_history(&results);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
