use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{QuestionSet, QuizSettings};
use quiz_core::{ProgressDocument, QuestionBank};
use services::{Clock, ProgressService, QuizContext, QuizSession};
use storage::files;
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod play;

use play::RoundEnd;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidRoundSize { raw: String },
    InvalidDbUrl { raw: String },
    MissingFile { command: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidRoundSize { raw } => {
                write!(f, "invalid --round-size value: {raw} (must be > 0)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingFile { command } => write!(f, "{command} requires --file <path>"),
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
    eprintln!("  cargo run -p app -- play   [--questions <path>] [--db <sqlite_url>] [--round-size <n>]");
    eprintln!("  cargo run -p app -- export --file <path> [--questions <path>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- import --file <path> [--questions <path>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- report [--questions <path>] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --questions questions.json");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  --round-size 50");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_QUESTIONS, QUIZ_DB_URL, QUIZ_ROUND_SIZE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Export,
    Import,
    Report,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "export" => Some(Self::Export),
            "import" => Some(Self::Import),
            "report" => Some(Self::Report),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Export => "export",
            Self::Import => "import",
            Self::Report => "report",
        }
    }
}

struct Args {
    questions: PathBuf,
    db_url: String,
    settings: QuizSettings,
    file: Option<PathBuf>,
}

fn parse_round_size(raw: &str) -> Option<QuizSettings> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .and_then(|n| QuizSettings::new(n).ok())
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut questions = std::env::var("QUIZ_QUESTIONS")
            .ok()
            .map_or_else(|| PathBuf::from("questions.json"), PathBuf::from);
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut settings = std::env::var("QUIZ_ROUND_SIZE")
            .ok()
            .and_then(|value| parse_round_size(&value))
            .unwrap_or_default();
        let mut file = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--questions" => {
                    questions = PathBuf::from(require_value(args, "--questions")?);
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--round-size" => {
                    let value = require_value(args, "--round-size")?;
                    settings = parse_round_size(&value)
                        .ok_or(ArgsError::InvalidRoundSize { raw: value })?;
                }
                "--file" => {
                    file = Some(PathBuf::from(require_value(args, "--file")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            questions,
            db_url,
            settings,
            file,
        })
    }

    fn require_file(&self, command: Command) -> Result<PathBuf, ArgsError> {
        self.file.clone().ok_or(ArgsError::MissingFile {
            command: command.name(),
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

fn init_logging() {
    // Quiz output goes to stdout, so logs stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let questions = files::read_question_set(&parsed.questions)?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let clock = Clock::default_clock();
    let progress = ProgressService::new(clock, Arc::clone(&storage.progress));

    match cmd {
        Command::Play => play(&progress, questions, parsed.settings, clock).await,
        Command::Export => {
            let path = parsed.require_file(cmd)?;
            let bank = latest_bank(&progress, &questions).await?;
            let document = progress.snapshot(&QuizSession::new(bank, clock));
            files::write_progress(&path, &document)?;
            println!("exported {} question states to {}", document.bank_state.states.len(), path.display());
            Ok(())
        }
        Command::Import => {
            let path = parsed.require_file(cmd)?;
            let document = files::read_progress(&path)?;
            let bank = restore_bank(questions, &document)?;
            let id = progress.save(&QuizSession::new(bank, clock)).await?;
            println!("imported {} as saved progress #{id}", path.display());
            Ok(())
        }
        Command::Report => {
            let bank = latest_bank(&progress, &questions).await?;
            print_report(&QuizSession::new(bank, clock));
            Ok(())
        }
    }
}

async fn latest_bank(
    progress: &ProgressService,
    questions: &QuestionSet,
) -> Result<QuestionBank, Box<dyn std::error::Error>> {
    match progress.load_latest(questions).await? {
        Some(bank) => Ok(bank),
        None => {
            tracing::info!("no saved progress, starting fresh");
            Ok(QuestionBank::new(questions.clone()))
        }
    }
}

fn restore_bank(
    questions: QuestionSet,
    document: &ProgressDocument,
) -> Result<QuestionBank, quiz_core::Error> {
    Ok(QuestionBank::import_state(questions, &document.bank_state)?)
}

async fn play(
    progress: &ProgressService,
    questions: QuestionSet,
    settings: QuizSettings,
    clock: Clock,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank = latest_bank(progress, &questions).await?;
    let mut context = QuizContext::from_bank(bank, settings, clock);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    loop {
        if context.session().is_round_complete() {
            println!("No questions available for this round.");
            break;
        }

        let end = play::play_round(context.session_mut(), &mut input, &mut output)?;
        play::print_summary(context.session(), &mut output)?;
        progress.save(context.session()).await?;

        if end == RoundEnd::Quit || !play::ask_another_round(&mut input, &mut output)? {
            break;
        }
        context.start_round();
    }

    print_report(context.session());
    Ok(())
}

fn print_report(session: &QuizSession) {
    let report = session.get_session_report();

    println!();
    println!("Category performance");
    for (category, performance) in &report.category_performance {
        let stats = &performance.report;
        let avg_time = performance
            .avg_time
            .map_or_else(|| "-".to_owned(), |secs| format!("{secs:.1}s"));
        println!(
            "  {category:<20} {:>4}/{:<4} {:>5.1}%  difficulty {:.2}  avg time {avg_time}",
            stats.correct_attempts,
            stats.total_attempts,
            stats.accuracy * 100.0,
            stats.avg_difficulty
        );
    }

    let metrics = &report.session_stats;
    println!();
    println!(
        "Session: {:.0}s, {:.1} questions/min, accuracy {:.0}%, streak {} (best {})",
        metrics.duration,
        metrics.questions_per_minute,
        metrics.accuracy * 100.0,
        metrics.streak,
        metrics.best_streak
    );

    let dist = &report.difficulty_distribution;
    println!(
        "Difficulty: easy {}  medium {}  hard {}",
        dist.easy, dist.medium, dist.hard
    );
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

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
