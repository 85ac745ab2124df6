mod cli;
mod play;

use clap::Parser;
use log::{info, warn};
use quiz_core::model::Category;
use services::{AiSettings, AppServices, Clock, QuizSettings};

use cli::{Cli, Command, HistoryArgs, QuizArgs};

async fn play(args: QuizArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = QuizSettings::from_env()?;
    args.apply(&mut settings);
    if let Some(url) = &settings.db_url {
        cli::prepare_sqlite_file(url)?;
    }

    let ai = if args.ai {
        let ai = AiSettings::from_env()?;
        if ai.is_none() {
            warn!("--ai given but QUIZ_AI_API_KEY is not set; using local questions");
        }
        ai
    } else {
        None
    };

    let services = AppServices::from_settings(&settings, ai, Clock::system()).await?;
    let mut controller = services.controller();
    controller.start_session().await?;
    println!(
        "{} {} questions, {}s each. Answer with the option number, h for a hint, q to quit.",
        settings.difficulty,
        controller.config().category(),
        controller.config().time_limit_secs()
    );

    if !play::run_session(&mut controller).await? {
        info!("session abandoned");
        println!("Quiz abandoned.");
        return Ok(());
    }

    let (id, results) = controller.finish().await?;
    play::print_results(id, &results);
    Ok(())
}

async fn history(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = QuizSettings::from_env()?;
    if let Some(db) = &args.db {
        settings.db_url = Some(cli::normalize_sqlite_url(db));
    }
    let Some(url) = settings.db_url.clone() else {
        println!("No results database configured (use --db or QUIZ_DB_URL).");
        return Ok(());
    };
    cli::prepare_sqlite_file(&url)?;

    let services = AppServices::from_settings(&settings, None, Clock::system()).await?;
    let results = services.results();
    let items = match &args.category {
        Some(raw) => {
            let category = Category::new(raw)?;
            results.for_category(&category, args.limit).await?
        }
        None => results.recent(args.limit).await?,
    };

    if items.is_empty() {
        println!("No sessions yet.");
        return Ok(());
    }
    for item in items {
        println!(
            "#{:<4} {}  {:<14} {:<6} {:>2}/{:<2} {:>5}  {:>3.0}%  {}s",
            item.id,
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.category.as_str(),
            item.difficulty.as_str(),
            item.correct_answers,
            item.total_questions,
            item.score,
            item.accuracy * 100.0,
            item.elapsed_seconds
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let outcome = match Cli::parse().resolve() {
        Command::History(args) => history(args).await,
        Command::Play(args) => play(args).await,
    };

    if let Err(err) = outcome {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
