use quiz_core::model::Question;
use rand::Rng;
use rand::seq::SliceRandom;

/// Returns `question` with its options in random order and the correct index remapped.
pub fn shuffle_options<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Question {
    let mut permutation: Vec<usize> = (0..question.options().len()).collect();
    permutation.shuffle(rng);
    question
        .reordered(&permutation)
        .unwrap_or_else(|| question.clone())
}
