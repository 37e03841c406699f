//! Pure answer evaluation.
//!
//! The same function decides correctness at submission time, for instant
//! feedback and for later review, so it must stay side-effect free and total:
//! malformed or missing answers resolve to "incorrect", never to an error.

use std::collections::BTreeSet;

use crate::model::{AnswerValue, CorrectAnswer, Question, QuestionKind};

/// Decide whether `candidate` answers `question` correctly.
///
/// - Single-choice / boolean: exact equality with the canonical value.
/// - Fill-in: candidate is trimmed, then compared case-sensitively.
/// - Multi-choice: order-independent set equality, no extras, no omissions.
/// - `None` or a shape that does not match the kind is incorrect.
#[must_use]
pub fn is_correct(question: &Question, candidate: Option<&AnswerValue>) -> bool {
    let Some(candidate) = candidate else {
        return false;
    };

    match (question.kind(), question.answer(), candidate) {
        (
            QuestionKind::SingleChoice | QuestionKind::Boolean,
            CorrectAnswer::Value(expected),
            AnswerValue::Value(got),
        ) => got == expected,
        (QuestionKind::FillIn, CorrectAnswer::Value(expected), AnswerValue::Value(got)) => {
            got.trim() == expected
        }
        (QuestionKind::MultiChoice, CorrectAnswer::ValueSet(expected), AnswerValue::Values(got)) => {
            let got: BTreeSet<&str> = got.iter().map(String::as_str).collect();
            // Duplicate selections collapse; equality still requires the
            // exact canonical set.
            got.len() == expected.len() && expected.iter().all(|v| got.contains(v.as_str()))
        }
        _ => false,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
