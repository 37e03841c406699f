use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("choice question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("fill-in question cannot declare options")]
    UnexpectedOptions,

    #[error("canonical answer '{0}' is not among the declared options")]
    AnswerNotAnOption(String),

    #[error("canonical answer set cannot be empty")]
    EmptyAnswerSet,

    #[error("canonical answer shape does not match question kind")]
    AnswerShapeMismatch,
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// The interaction style of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    /// One option from a list is correct.
    SingleChoice,
    /// A subset of options is correct; all of them must be selected.
    MultiChoice,
    /// True/false with a fixed presentation order.
    Boolean,
    /// Free text, matched exactly after trimming.
    FillIn,
}

impl QuestionKind {
    /// Whether this kind presents a shuffleable list of discrete options.
    ///
    /// Boolean questions keep their fixed true/false order; fill-in
    /// questions have no options at all.
    #[must_use]
    pub fn has_discrete_options(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }
}

//
// ─── CANONICAL ANSWER ──────────────────────────────────────────────────────────
//

/// The canonical correct answer for a question.
///
/// Single-choice, boolean and fill-in questions carry one value;
/// multi-choice questions carry a set of values compared order-independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectAnswer {
    Value(String),
    ValueSet(BTreeSet<String>),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single question in a quiz set.
///
/// Immutable once constructed; a session never edits question content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    prompt: String,
    image: Option<String>,
    options: Vec<String>,
    answer: CorrectAnswer,
    points: u32,
}

impl Question {
    /// Create a question, validating that its shape is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, a choice question
    /// has fewer than two options, a fill-in question declares options, the
    /// canonical answer does not match the kind, or a canonical value is not
    /// among the declared options.
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        prompt: impl Into<String>,
        options: Vec<String>,
        answer: CorrectAnswer,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        match kind {
            QuestionKind::SingleChoice | QuestionKind::MultiChoice => {
                if options.len() < 2 {
                    return Err(QuestionError::TooFewOptions(options.len()));
                }
            }
            QuestionKind::FillIn => {
                if !options.is_empty() {
                    return Err(QuestionError::UnexpectedOptions);
                }
            }
            QuestionKind::Boolean => {}
        }

        match (&kind, &answer) {
            (QuestionKind::MultiChoice, CorrectAnswer::ValueSet(values)) => {
                if values.is_empty() {
                    return Err(QuestionError::EmptyAnswerSet);
                }
                for value in values {
                    if !options.contains(value) {
                        return Err(QuestionError::AnswerNotAnOption(value.clone()));
                    }
                }
            }
            (QuestionKind::SingleChoice, CorrectAnswer::Value(value)) => {
                if !options.contains(value) {
                    return Err(QuestionError::AnswerNotAnOption(value.clone()));
                }
            }
            (QuestionKind::Boolean | QuestionKind::FillIn, CorrectAnswer::Value(_)) => {}
            _ => return Err(QuestionError::AnswerShapeMismatch),
        }

        Ok(Self {
            id,
            kind,
            prompt,
            image: None,
            options,
            answer,
            points: 1,
        })
    }

    /// Attach an image reference shown alongside the prompt.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Override the default point value of 1.
    #[must_use]
    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    /// Replace the option presentation order.
    ///
    /// Used by session preparation to freeze a shuffled order; `options` must
    /// be a permutation of the original list so the canonical answer stays
    /// among them.
    #[must_use]
    pub fn with_option_order(mut self, options: Vec<String>) -> Self {
        debug_assert_eq!(options.len(), self.options.len());
        self.options = options;
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer(&self) -> &CorrectAnswer {
        &self.answer
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
