use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use quiz_core::model::Difficulty;
use services::QuizSettings;

/// Timed multiple-choice math quizzes in the terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub quiz: QuizArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one quiz session (the default)
    Play(QuizArgs),
    /// Show recently stored results
    History(HistoryArgs),
}

/// Overrides layered on top of the `QUIZ_*` environment.
#[derive(Args, Debug, Clone, Default)]
pub struct QuizArgs {
    /// Question category: addition, subtraction, multiplication, division, mixed
    #[arg(short, long)]
    pub category: Option<String>,

    /// easy, medium or hard
    #[arg(short, long)]
    pub difficulty: Option<Difficulty>,

    /// Number of questions
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Seconds per question
    #[arg(short, long)]
    pub time_limit: Option<u32>,

    /// Extra points per second left on the clock
    #[arg(long)]
    pub bonus_factor: Option<f64>,

    /// Target grade level passed to the AI supplier
    #[arg(long)]
    pub grade: Option<u8>,

    /// SQLite database for results (in-memory when omitted)
    #[arg(long)]
    pub db: Option<String>,

    /// Generate questions with the chat-completions API (falls back to local questions)
    #[arg(long)]
    pub ai: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Only show this category
    #[arg(short, long)]
    pub category: Option<String>,

    /// How many sessions to list
    #[arg(short, long, default_value_t = 10)]
    pub limit: u32,

    /// SQLite database holding results
    #[arg(long)]
    pub db: Option<String>,
}

impl Cli {
    /// The command to run, with top-level quiz flags folded into it.
    #[must_use]
    pub fn resolve(self) -> Command {
        match self.command {
            None => Command::Play(self.quiz),
            Some(Command::Play(args)) => Command::Play(args.or(self.quiz)),
            Some(Command::History(mut args)) => {
                args.category = args.category.or(self.quiz.category);
                args.db = args.db.or(self.quiz.db);
                Command::History(args)
            }
        }
    }
}

impl QuizArgs {
    /// Flags given after the subcommand win; the ones given before it fill the gaps.
    #[must_use]
    pub fn or(self, outer: QuizArgs) -> Self {
        Self {
            category: self.category.or(outer.category),
            difficulty: self.difficulty.or(outer.difficulty),
            count: self.count.or(outer.count),
            time_limit: self.time_limit.or(outer.time_limit),
            bonus_factor: self.bonus_factor.or(outer.bonus_factor),
            grade: self.grade.or(outer.grade),
            db: self.db.or(outer.db),
            ai: self.ai || outer.ai,
        }
    }

    /// Apply the flags that were given onto `settings`.
    pub fn apply(&self, settings: &mut QuizSettings) {
        if let Some(category) = &self.category {
            settings.category.clone_from(category);
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty;
        }
        if let Some(count) = self.count {
            settings.question_count = count;
        }
        if let Some(time_limit) = self.time_limit {
            settings.time_limit_secs = time_limit;
        }
        if let Some(bonus) = self.bonus_factor {
            settings.bonus_factor = bonus;
        }
        if let Some(grade) = self.grade {
            settings.grade_level = Some(grade);
        }
        if let Some(db) = &self.db {
            settings.db_url = Some(normalize_sqlite_url(db));
        }
    }
}

/// Turn a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and parent directories) so `SQLite` can open it.
///
/// # Errors
///
/// Returns an I/O error if the directory or file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Ok(());
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
