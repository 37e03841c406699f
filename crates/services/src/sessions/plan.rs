use rand::Rng;
use rand::seq::SliceRandom;

use exam_core::model::{Question, QuestionId};

/// The frozen, randomized question sequence for one session.
///
/// Built exactly once at session preparation: the question list is shuffled,
/// and each question that presents discrete options gets an independently
/// shuffled option order. The resulting sequence never changes for the rest
/// of the session, so `question_order` can be stored on the score record and
/// replayed during review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    questions: Vec<Question>,
    question_order: Vec<QuestionId>,
}

impl SessionPlan {
    /// Shuffle `source` into a session plan. The input is not mutated.
    ///
    /// Uses the Fisher–Yates shuffle from `rand`, so the permutation is
    /// unbiased and O(n). Lists of length 0 or 1 come back unchanged.
    #[must_use]
    pub fn build<R: Rng + ?Sized>(source: &[Question], rng: &mut R) -> Self {
        let mut questions: Vec<Question> = source.to_vec();
        questions.shuffle(rng);

        let questions: Vec<Question> = questions
            .into_iter()
            .map(|question| {
                if question.kind().has_discrete_options() {
                    let mut options = question.options().to_vec();
                    options.shuffle(rng);
                    question.with_option_order(options)
                } else {
                    question
                }
            })
            .collect();

        let question_order = questions.iter().map(Question::id).collect();

        Self {
            questions,
            question_order,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_order(&self) -> &[QuestionId] {
        &self.question_order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<Question>, Vec<QuestionId>) {
        (self.questions, self.question_order)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
