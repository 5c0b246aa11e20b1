use serde::Serialize;
use thiserror::Error;

pub(crate) const OPTION_COUNT: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum QuestionError {
    #[error("question {index}: question_text must not be empty")]
    EmptyText { index: usize },
    #[error("question {index}: exactly 4 options are required, got {actual}")]
    OptionCount { index: usize, actual: usize },
    #[error("question {index}: option {option} must not be empty")]
    EmptyOption { index: usize, option: usize },
    #[error("question {index}: correct_answer must be between 0 and 3, got {actual}")]
    CorrectAnswerOutOfRange { index: usize, actual: i64 },
    #[error("a test needs at least one question")]
    NoQuestions,
}

/// The four answer choices of a question, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct QuestionOptions([String; OPTION_COUNT]);

impl QuestionOptions {
    pub(crate) fn new(index: usize, options: Vec<String>) -> Result<Self, QuestionError> {
        let options: Vec<String> = options.into_iter().map(|option| option.trim().to_string()).collect();
        if let Some(option) = options.iter().position(String::is_empty) {
            return Err(QuestionError::EmptyOption { index, option });
        }
        let actual = options.len();
        let options: [String; OPTION_COUNT] =
            options.try_into().map_err(|_| QuestionError::OptionCount { index, actual })?;
        Ok(Self(options))
    }

    pub(crate) fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.0.into()
    }
}

/// Question that passed validation and may be written to the answer-key store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidatedQuestion {
    pub(crate) question_text: String,
    pub(crate) options: QuestionOptions,
    pub(crate) correct_answer: i16,
    pub(crate) explanation: Option<String>,
}

pub(crate) struct RawQuestion {
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: i64,
    pub(crate) explanation: Option<String>,
}

impl ValidatedQuestion {
    pub(crate) fn validate(index: usize, raw: RawQuestion) -> Result<Self, QuestionError> {
        let question_text = raw.question_text.trim().to_string();
        if question_text.is_empty() {
            return Err(QuestionError::EmptyText { index });
        }

        let options = QuestionOptions::new(index, raw.options)?;

        if !(0..OPTION_COUNT as i64).contains(&raw.correct_answer) {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index,
                actual: raw.correct_answer,
            });
        }

        let explanation = raw
            .explanation
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(Self {
            question_text,
            options,
            correct_answer: raw.correct_answer as i16,
            explanation,
        })
    }
}

pub(crate) fn validate_all(
    questions: impl IntoIterator<Item = RawQuestion>,
) -> Result<Vec<ValidatedQuestion>, QuestionError> {
    let validated = questions
        .into_iter()
        .enumerate()
        .map(|(index, raw)| ValidatedQuestion::validate(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    if validated.is_empty() {
        return Err(QuestionError::NoQuestions);
    }

    Ok(validated)
}
