use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use round_core::model::{OPTION_LABELS, QuestionRecord};
use services::{
    AnswerOutcome, Clock, EngineError, HttpPlayerRegistry, QuestionBank, RegistryConfig, RoundConfig,
    RoundController, RoundDeps, RoundPhase, RoundSignal, RoundView,
};
use storage::repository::{SessionStore, Storage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const BUNDLED_QUESTIONS: &str = include_str!("../assets/questions.json");

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    EmptyName,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::EmptyName => write!(f, "--name must not be blank"),
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

struct Args {
    db_url: String,
    questions: Option<PathBuf>,
    player_name: Option<String>,
    backend: Option<String>,
    new_game: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--db <sqlite_url>] [--questions <file.json>] [--name <player>] [--backend <url>] [--new-game]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://round.sqlite3");
    eprintln!("  --questions <bundled pool>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ROUND_DB_URL, ROUND_QUESTIONS, ROUND_PLAYER_NAME, ROUND_BACKEND_URL, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ROUND_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://round.sqlite3".into(), normalize_sqlite_url);
        let mut questions = std::env::var("ROUND_QUESTIONS").ok().map(PathBuf::from);
        let mut player_name = std::env::var("ROUND_PLAYER_NAME").ok();
        let mut backend = None;
        let mut new_game = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--questions" => {
                    questions = Some(PathBuf::from(require_value(args, "--questions")?));
                }
                "--name" => {
                    let value = require_value(args, "--name")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::EmptyName);
                    }
                    player_name = Some(value);
                }
                "--backend" => backend = Some(require_value(args, "--backend")?),
                "--new-game" => new_game = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            questions,
            player_name,
            backend,
            new_game,
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

fn load_question_bank(
    path: Option<&PathBuf>,
    round_length: usize,
) -> Result<QuestionBank, Box<dyn std::error::Error>> {
    let json = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => BUNDLED_QUESTIONS.to_owned(),
    };
    Ok(QuestionBank::from_json_str(&json, round_length)?)
}

// ─── Terminal rendering ────────────────────────────────────────────────────────

fn render_question(view: &RoundView, question: &QuestionRecord) {
    let elapsed = view.elapsed.num_seconds();
    println!();
    println!(
        "Question {}/{}   score {}   {:02}:{:02}   path {}",
        view.question_number,
        view.total_questions,
        view.score,
        elapsed / 60,
        elapsed % 60,
        view.selected_path
    );
    println!("{}", question.text());
    for (label, option) in OPTION_LABELS.iter().zip(question.options()) {
        println!("  {label}) {option}");
    }
}

fn render_signals(signals: Vec<RoundSignal>) {
    for signal in signals {
        match signal {
            RoundSignal::AlreadyCompleted => {
                println!("Your result is already on the leaderboard.");
            }
            RoundSignal::Completed { score } => {
                println!("Threshold reached with {score} points. Result saved.");
            }
            RoundSignal::Warning(message) => println!("warning: {message}"),
            RoundSignal::ProceedPastRound => {
                println!("You may leave the round now or keep playing.");
            }
            RoundSignal::RoundEnded { completed: true } => println!("Round over. Well done!"),
            RoundSignal::RoundEnded { completed: false } => {
                println!("Round over. The threshold was not reached.");
            }
        }
    }
}

fn parse_option(input: &str) -> Option<usize> {
    let input = input.trim();
    if let Some(index) = OPTION_LABELS
        .iter()
        .position(|label| label.eq_ignore_ascii_case(input))
    {
        return Some(index);
    }
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .filter(|&index| index < OPTION_LABELS.len())
}

async fn play(round: &mut RoundController) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        render_signals(round.drain_signals());
        let view = round.view();
        if view.phase == RoundPhase::Terminal {
            println!("Final score: {}", view.score);
            return Ok(());
        }
        let Some(question) = view.question.as_ref() else {
            println!("No questions available.");
            return Ok(());
        };
        render_question(&view, question);

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        if line.trim().eq_ignore_ascii_case("q") {
            return Ok(());
        }
        let Some(option) = parse_option(&line) else {
            println!("Answer with A, B, C or D (q quits).");
            continue;
        };

        match round.answer(option).await {
            Ok(AnswerOutcome::Accepted(receipt)) => {
                println!("{}", if receipt.correct { "Correct." } else { "Wrong." });
            }
            Ok(AnswerOutcome::Ignored(_)) => {}
            Err(err) if answer_error_is_recoverable(&err) => {
                warn!(error = %err, "answer aborted");
                println!("That answer could not be recorded: {err}");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Errors after which the round state is unchanged and play can go on.
fn answer_error_is_recoverable(err: &EngineError) -> bool {
    matches!(
        err,
        EngineError::InvalidOption(_) | EngineError::PathIntegrity(_) | EngineError::Storage(_)
    )
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    if parsed.new_game {
        storage.sessions.clear().await?;
        info!(db = %parsed.db_url, "stored progress cleared");
    }

    let config = RoundConfig::default();
    let bank = load_question_bank(parsed.questions.as_ref(), config.round_length())?;
    let registry_config = match parsed.backend {
        Some(url) => RegistryConfig::new(url),
        None => RegistryConfig::from_env(),
    };
    let registry = HttpPlayerRegistry::new(registry_config);
    if !registry.enabled() {
        info!("no registry configured; results stay local");
    }

    let deps = RoundDeps {
        clock: Clock::system(),
        store: Arc::clone(&storage.sessions),
        questions: Arc::new(bank),
        registry: Arc::new(registry),
    };
    let mut round = RoundController::mount(deps, config, parsed.player_name).await?;
    play(&mut round).await
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use round_core::model::{NodeId, TreeError};

    #[test]
    fn options_accept_letters_and_numbers() {
        assert_eq!(parse_option("a"), Some(0));
        assert_eq!(parse_option(" D "), Some(3));
        assert_eq!(parse_option("2"), Some(1));
        assert_eq!(parse_option("0"), None);
        assert_eq!(parse_option("5"), None);
        assert_eq!(parse_option("e"), None);
    }

    #[test]
    fn bundled_pool_fills_a_default_round() {
        let bank = load_question_bank(None, RoundConfig::default().round_length()).unwrap();
        assert!(bank.pool_size() >= bank.round_length());
    }

    #[test]
    fn aborted_answers_keep_the_loop_running() {
        let broken_path = EngineError::PathIntegrity(TreeError::PathIntegrity {
            parent: NodeId::root(),
            missing: NodeId::root().child(0),
        });
        assert!(answer_error_is_recoverable(&broken_path));
        assert!(answer_error_is_recoverable(&EngineError::InvalidOption(4)));
        assert!(!answer_error_is_recoverable(&EngineError::Questions(
            services::QuestionSourceError::InsufficientPool {
                needed: 40,
                available: 0
            }
        )));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut args = ["--name", "  "].into_iter().map(String::from);
        assert!(matches!(Args::parse(&mut args), Err(ArgsError::EmptyName)));
    }

    #[test]
    fn new_game_flag_is_parsed() {
        let mut args = ["--new-game", "--db", "sqlite::memory:"]
            .into_iter()
            .map(String::from);
        let parsed = Args::parse(&mut args).unwrap();
        assert!(parsed.new_game);
        assert_eq!(parsed.db_url, "sqlite::memory:");
    }
}
