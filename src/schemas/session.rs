use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::ResultSummary;
use crate::services::test_session::{IssuedTest, Solutions, SubmittedResult};

#[derive(Debug, Serialize)]
pub(crate) struct TakeQuestionResponse {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TakeTestResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: Decimal,
    pub(crate) duration_minutes: i32,
    pub(crate) session_id: String,
    pub(crate) started_at: String,
    pub(crate) deadline_at: String,
    pub(crate) remaining_seconds: i64,
    pub(crate) questions: Vec<TakeQuestionResponse>,
}

impl TakeTestResponse {
    pub(crate) fn from_issued(issued: IssuedTest) -> Self {
        Self {
            id: issued.test.id,
            title: issued.test.title,
            description: issued.test.description,
            price: issued.test.price,
            duration_minutes: issued.test.duration_minutes,
            session_id: issued.session.id,
            started_at: format_primitive(issued.session.started_at),
            deadline_at: format_primitive(issued.session.deadline_at),
            remaining_seconds: issued.remaining_seconds,
            questions: issued
                .questions
                .into_iter()
                .map(|question| TakeQuestionResponse {
                    id: question.id,
                    question_text: question.question_text,
                    options: question.options,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitTestRequest {
    pub(crate) answers: Vec<Option<i64>>,
    #[serde(default, alias = "timeTakenMinutes")]
    pub(crate) time_taken_minutes: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitTestResponse {
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) is_late: bool,
    pub(crate) elapsed_seconds: i64,
    pub(crate) completed_at: String,
}

impl SubmitTestResponse {
    pub(crate) fn from_submitted(submitted: SubmittedResult) -> Self {
        Self {
            score: submitted.outcome.score,
            total_questions: submitted.outcome.total_questions,
            percentage: submitted.outcome.percentage,
            is_late: submitted.is_late,
            elapsed_seconds: submitted.elapsed_seconds,
            completed_at: format_primitive(submitted.result.completed_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SolutionResponse {
    pub(crate) question_number: usize,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: i16,
    pub(crate) student_answer: Option<i32>,
    pub(crate) is_correct: bool,
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SolutionsResponse {
    pub(crate) test_id: String,
    pub(crate) test_title: String,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) is_late: bool,
    pub(crate) time_taken_minutes: Option<i32>,
    pub(crate) completed_at: String,
    pub(crate) solutions: Vec<SolutionResponse>,
}

impl SolutionsResponse {
    pub(crate) fn from_solutions(solutions: Solutions) -> Self {
        Self {
            test_id: solutions.test.id,
            test_title: solutions.test.title,
            score: solutions.result.score,
            total_questions: solutions.result.total_questions,
            percentage: solutions.result.percentage,
            is_late: solutions.result.is_late,
            time_taken_minutes: solutions.result.time_taken_minutes,
            completed_at: format_primitive(solutions.result.completed_at),
            solutions: solutions
                .items
                .into_iter()
                .enumerate()
                .map(|(index, item)| SolutionResponse {
                    question_number: index + 1,
                    question_text: item.question_text,
                    options: item.options,
                    correct_answer: item.correct_answer,
                    student_answer: item.student_answer,
                    is_correct: item.is_correct,
                    explanation: item.explanation,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultSummaryResponse {
    pub(crate) test_id: String,
    pub(crate) test_title: String,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) time_taken_minutes: Option<i32>,
    pub(crate) is_late: bool,
    pub(crate) completed_at: String,
}

impl ResultSummaryResponse {
    pub(crate) fn from_db(summary: ResultSummary) -> Self {
        Self {
            test_id: summary.test_id,
            test_title: summary.test_title,
            score: summary.score,
            total_questions: summary.total_questions,
            percentage: summary.percentage,
            time_taken_minutes: summary.time_taken_minutes,
            is_late: summary.is_late,
            completed_at: format_primitive(summary.completed_at),
        }
    }
}
