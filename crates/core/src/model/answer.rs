use serde::{Deserialize, Serialize};

/// A test-taker's answer to one question.
///
/// Free-text and single-choice answers are a single value; multi-choice
/// answers are a collection of selected option values. The evaluator treats
/// a shape that does not match the question kind as simply incorrect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerValue {
    Value(String),
    Values(Vec<String>),
}

impl AnswerValue {
    /// Convenience constructor for a single text or option value.
    #[must_use]
    pub fn value(v: impl Into<String>) -> Self {
        Self::Value(v.into())
    }

    /// Convenience constructor for a multi-choice selection.
    #[must_use]
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values(values.into_iter().map(Into::into).collect())
    }

    /// True when the answer carries no usable content: whitespace-only text
    /// or an empty selection. Blank answers count as unanswered.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Value(text) => text.trim().is_empty(),
            Self::Values(values) => values.is_empty(),
        }
    }
}
