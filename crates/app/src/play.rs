use std::time::Duration;

use log::debug;
use quiz_core::model::{Question, SessionResults};
use quiz_core::{AdvanceOutcome, AnswerChoice, SubmitOutcome, TickOutcome};
use services::QuizController;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, Instant, MissedTickBehavior};

/// What a line of player input asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Answer(usize),
    Hint,
    Quit,
    Unknown,
}

impl Input {
    /// Options are numbered from 1 on screen; numbers past `option_count` are not answers.
    #[must_use]
    pub fn parse(line: &str, option_count: usize) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "h" | "hint" => Self::Hint,
            "q" | "quit" => Self::Quit,
            other => match other.parse::<usize>() {
                Ok(n) if (1..=option_count).contains(&n) => Self::Answer(n - 1),
                _ => Self::Unknown,
            },
        }
    }
}

/// Run the started session to completion against stdin and a one-second timer.
///
/// Returns `false` if the player quit early.
///
/// # Errors
///
/// Returns an I/O error if stdin cannot be read.
pub async fn run_session(controller: &mut QuizController) -> std::io::Result<bool> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let second = Duration::from_secs(1);
    let mut ticker = time::interval_at(Instant::now() + second, second);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if !show_current(controller) {
        return Ok(true);
    }

    loop {
        let resolved = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(false);
                };
                let option_count = controller
                    .session()
                    .and_then(|s| s.current_question())
                    .map_or(0, |q| q.options().len());
                match Input::parse(&line, option_count) {
                    Input::Answer(index) => {
                        let question = controller.session().and_then(|s| s.current_question()).cloned();
                        match controller.submit_answer(AnswerChoice::Option(index)) {
                            SubmitOutcome::Accepted { is_correct, points_awarded } => {
                                if let Some(question) = &question {
                                    print_feedback(question, is_correct, points_awarded);
                                }
                                true
                            }
                            SubmitOutcome::Ignored => false,
                        }
                    }
                    Input::Hint => {
                        match controller.reveal_hint() {
                            Some(hint) => println!("Hint: {hint}"),
                            None => println!("No hint for this one."),
                        }
                        false
                    }
                    Input::Quit => return Ok(false),
                    Input::Unknown => {
                        println!("Type an option number, h for a hint, or q to quit.");
                        false
                    }
                }
            }
            _ = ticker.tick() => {
                let question = controller.session().and_then(|s| s.current_question()).cloned();
                match controller.tick() {
                    TickOutcome::Counting { time_remaining } => {
                        if time_remaining <= 5 || time_remaining % 10 == 0 {
                            println!("  {time_remaining}s left");
                        }
                        false
                    }
                    TickOutcome::TimedOut => {
                        if let Some(question) = &question {
                            println!("Time's up! The answer was {}.", question.correct_option());
                            print_explanation(question);
                        }
                        true
                    }
                    TickOutcome::Ignored => false,
                }
            }
        };

        if !resolved {
            continue;
        }

        match controller.advance() {
            AdvanceOutcome::NextQuestion { index } => {
                debug!("moving to question {index}");
                ticker.reset();
                show_current(controller);
            }
            AdvanceOutcome::Finished => return Ok(true),
            AdvanceOutcome::Ignored => {}
        }
    }
}

fn show_current(controller: &QuizController) -> bool {
    let Some(session) = controller.session() else {
        return false;
    };
    let Some(question) = session.current_question() else {
        return false;
    };
    let progress = session.progress();
    println!();
    println!(
        "Question {}/{}  (score {}, streak {}, {}s)",
        session.current_index() + 1,
        progress.total,
        session.score(),
        session.streak(),
        session.time_remaining()
    );
    println!("{}", question.prompt());
    for (n, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", n + 1);
    }
    true
}

fn print_feedback(question: &Question, is_correct: bool, points: u32) {
    if is_correct {
        println!("Correct! +{points}");
    } else {
        println!("Not quite. The answer was {}.", question.correct_option());
    }
    print_explanation(question);
}

fn print_explanation(question: &Question) {
    if let Some(explanation) = question.explanation() {
        println!("  {explanation}");
    }
}

pub fn print_results(id: i64, results: &SessionResults) {
    println!();
    println!("Finished! (saved as #{id})");
    println!(
        "  {}/{} correct ({:.0}%)",
        results.correct_answers(),
        results.total_questions(),
        results.accuracy() * 100.0
    );
    println!("  score       {}", results.score());
    println!("  best streak {}", results.best_streak());
    println!("  hints used  {}", results.hints_used());
    println!("  time        {}s", results.elapsed_seconds());
}
