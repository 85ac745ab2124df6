use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use quiz_core::model::{Difficulty, Question, QuestionDraft, QuestionId, SessionConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::shuffle::shuffle_options;
use super::{GenerationRequest, QuestionSupplier};
use crate::error::GenerationError;

const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    const ALL: [ArithmeticOp; 4] = [Self::Add, Self::Sub, Self::Mul, Self::Div];

    /// Operations covered by a category label; `mixed` covers all four.
    #[must_use]
    pub fn for_category(category: &str) -> Option<&'static [ArithmeticOp]> {
        match category {
            "addition" => Some(&Self::ALL[0..1]),
            "subtraction" => Some(&Self::ALL[1..2]),
            "multiplication" => Some(&Self::ALL[2..3]),
            "division" => Some(&Self::ALL[3..4]),
            "mixed" => Some(&Self::ALL),
            _ => None,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "−",
            ArithmeticOp::Mul => "×",
            ArithmeticOp::Div => "÷",
        }
    }
}

/// Operand ranges per difficulty tier:
/// easy stays single-digit, medium two-digit, hard three-digit for + and −,
/// with friendlier factors for × and ÷.
fn operand_range(op: ArithmeticOp, difficulty: Difficulty) -> (i64, i64) {
    match (op, difficulty) {
        (ArithmeticOp::Add | ArithmeticOp::Sub, Difficulty::Easy) => (0, 9),
        (ArithmeticOp::Add | ArithmeticOp::Sub, Difficulty::Medium) => (10, 99),
        (ArithmeticOp::Add | ArithmeticOp::Sub, Difficulty::Hard) => (100, 999),
        (ArithmeticOp::Mul, Difficulty::Easy) => (0, 5),
        (ArithmeticOp::Mul, Difficulty::Medium) => (2, 12),
        (ArithmeticOp::Mul, Difficulty::Hard) => (5, 20),
        (ArithmeticOp::Div, Difficulty::Easy) => (1, 9),
        (ArithmeticOp::Div, Difficulty::Medium) => (2, 12),
        (ArithmeticOp::Div, Difficulty::Hard) => (5, 20),
    }
}

struct Problem {
    op: ArithmeticOp,
    left: i64,
    right: i64,
    answer: i64,
}

impl Problem {
    fn generate<R: Rng + ?Sized>(op: ArithmeticOp, difficulty: Difficulty, rng: &mut R) -> Self {
        let (min, max) = operand_range(op, difficulty);
        match op {
            ArithmeticOp::Add => {
                let (left, right) = (rng.random_range(min..=max), rng.random_range(min..=max));
                Self { op, left, right, answer: left + right }
            }
            ArithmeticOp::Sub => {
                let left = rng.random_range(min..=max);
                let right = rng.random_range(0..=left);
                Self { op, left, right, answer: left - right }
            }
            ArithmeticOp::Mul => {
                let (left, right) = (rng.random_range(min..=max), rng.random_range(min..=max));
                Self { op, left, right, answer: left * right }
            }
            ArithmeticOp::Div => {
                // Whole-number quotients only.
                let divisor = rng.random_range(1..=max);
                let quotient = rng.random_range(min..=max);
                Self { op, left: divisor * quotient, right: divisor, answer: quotient }
            }
        }
    }

    fn prompt(&self) -> String {
        format!("{} {} {} = ?", self.left, self.op.symbol(), self.right)
    }

    fn hint(&self) -> String {
        match self.op {
            ArithmeticOp::Add => format!("Start at {} and count up {}.", self.left, self.right),
            ArithmeticOp::Sub => format!("Start at {} and count back {}.", self.left, self.right),
            ArithmeticOp::Mul => format!("Add {} to itself {} times.", self.left, self.right),
            ArithmeticOp::Div => format!(
                "How many groups of {} fit into {}?",
                self.right, self.left
            ),
        }
    }

    fn explanation(&self) -> String {
        format!(
            "{} {} {} = {}",
            self.left,
            self.op.symbol(),
            self.right,
            self.answer
        )
    }

    /// Three distinct, non-negative wrong answers close to the real one.
    fn distractors<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i64> {
        let spread = (self.answer / 10).max(3);
        let mut picked = BTreeSet::new();

        for _ in 0..32 {
            if picked.len() == OPTION_COUNT - 1 {
                break;
            }
            let delta = rng.random_range(1..=spread);
            let candidate = if rng.random_bool(0.5) {
                self.answer + delta
            } else {
                self.answer - delta
            };
            if candidate >= 0 && candidate != self.answer {
                picked.insert(candidate);
            }
        }

        let mut filler = self.answer + spread + 1;
        while picked.len() < OPTION_COUNT - 1 {
            picked.insert(filler);
            filler += 1;
        }

        picked.into_iter().collect()
    }
}

/// Local math question generator.
///
/// Needs no network access and is used as the fallback supplier.
pub struct ArithmeticSupplier {
    rng: Mutex<StdRng>,
}

impl ArithmeticSupplier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic generator for tests and reproducible drills.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn build(&self, request: &GenerationRequest) -> Result<Vec<Question>, GenerationError> {
        let ops = ArithmeticOp::for_category(request.category.as_str()).ok_or_else(|| {
            GenerationError::UnsupportedCategory(request.category.as_str().to_string())
        })?;
        if request.count > SessionConfig::MAX_QUESTION_COUNT {
            return Err(GenerationError::TooManyQuestions {
                requested: request.count,
                max: SessionConfig::MAX_QUESTION_COUNT,
            });
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        let mut questions = Vec::new();
        for n in 1..=u64::from(request.count) {
            let op = ops[rng.random_range(0..ops.len())];
            let problem = Problem::generate(op, request.difficulty, &mut *rng);

            let mut options = vec![problem.answer.to_string()];
            options.extend(problem.distractors(&mut *rng).iter().map(ToString::to_string));

            let question = QuestionDraft::new(problem.prompt(), options, 0)
                .with_hint(problem.hint())
                .with_explanation(problem.explanation())
                .validate(QuestionId::new(n))?;
            questions.push(shuffle_options(&question, &mut *rng));
        }
        Ok(questions)
    }
}

impl Default for ArithmeticSupplier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionSupplier for ArithmeticSupplier {
    async fn generate_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, GenerationError> {
        self.build(request)
    }
}
