use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::core::time::format_primitive;
use crate::db::models::{Question, Test, TestSummary};
use crate::services::questions::RawQuestion;

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionInput {
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: i64,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
}

impl From<QuestionInput> for RawQuestion {
    fn from(input: QuestionInput) -> Self {
        RawQuestion {
            question_text: input.question_text,
            options: input.options,
            correct_answer: input.correct_answer,
            explanation: input.explanation,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreate {
    #[validate(length(min = 1, max = 500, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[validate(custom(function = "validate_price"))]
    pub(crate) price: Decimal,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, max = 1440, message = "duration_minutes must be between 1 and 1440"))]
    pub(crate) duration_minutes: i32,
    pub(crate) questions: Vec<QuestionInput>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkQuestionsUpload {
    #[serde(alias = "testId")]
    pub(crate) test_id: String,
    pub(crate) questions: Vec<QuestionInput>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkUploadResponse {
    pub(crate) test_id: String,
    pub(crate) questions_added: u64,
    pub(crate) questions_count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: Decimal,
    pub(crate) duration_minutes: i32,
    pub(crate) questions_count: i64,
    pub(crate) created_at: String,
}

impl TestSummaryResponse {
    pub(crate) fn from_db(summary: TestSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            description: summary.description,
            price: summary.price,
            duration_minutes: summary.duration_minutes,
            questions_count: summary.questions_count,
            created_at: format_primitive(summary.created_at),
        }
    }
}

/// Admin view of a question, answer key included.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: i16,
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestDetailResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: Decimal,
    pub(crate) duration_minutes: i32,
    pub(crate) is_active: bool,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

impl TestDetailResponse {
    pub(crate) fn from_db(test: Test, questions: Vec<Question>) -> Self {
        Self {
            id: test.id,
            title: test.title,
            description: test.description,
            price: test.price,
            duration_minutes: test.duration_minutes,
            is_active: test.is_active,
            created_by: test.created_by,
            created_at: format_primitive(test.created_at),
            updated_at: format_primitive(test.updated_at),
            questions: questions
                .into_iter()
                .map(|question| QuestionResponse {
                    id: question.id,
                    question_text: question.question_text,
                    options: question.options.0,
                    correct_answer: question.correct_answer,
                    explanation: question.explanation,
                })
                .collect(),
        }
    }
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("price").with_message("price must be non-negative".into()));
    }
    if price.normalize().scale() > 2 {
        return Err(
            ValidationError::new("price").with_message("price must have at most 2 decimals".into())
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(price: serde_json::Value, duration: i32) -> TestCreate {
        serde_json::from_value(serde_json::json!({
            "title": "Polity Mock 1",
            "price": price,
            "duration_minutes": duration,
            "questions": []
        }))
        .expect("test create")
    }

    #[test]
    fn price_must_be_non_negative() {
        assert!(create(serde_json::json!(199.0), 30).validate().is_ok());
        assert!(create(serde_json::json!(0), 30).validate().is_ok());
        assert!(create(serde_json::json!(-1.5), 30).validate().is_err());
    }

    #[test]
    fn duration_must_be_positive() {
        assert!(create(serde_json::json!(10), 0).validate().is_err());
        assert!(create(serde_json::json!(10), 1).validate().is_ok());
    }
}
